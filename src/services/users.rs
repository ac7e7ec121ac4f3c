//! Registration, profile updates, password changes and admin user management.

use log::info;
use std::sync::Arc;
use validator::Validate;

use crate::auth::PasswordHasher;
use crate::config::AdminSeed;
use crate::error::AppError;
use crate::models::{NewUser, PasswordChangeInput, User, UserInput, UserUpdate};
use crate::store::UserStore;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    /// Creates a regular (non-admin) account.
    pub async fn register(&self, input: UserInput) -> Result<User, AppError> {
        input.validate()?;
        self.ensure_unique(&input.username, &input.email, None).await?;

        let user = self
            .users
            .insert(NewUser {
                username: input.username,
                email: input.email,
                name: input.name,
                password_hash: self.hasher.hash(&input.password)?,
                is_admin: false,
            })
            .await?;
        info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Applies a partial profile update. Only the user or an admin may do this,
    /// and only an admin may grant or revoke admin rights.
    pub async fn update_profile(
        &self,
        id: i32,
        update: UserUpdate,
        actor: &User,
    ) -> Result<User, AppError> {
        update.validate()?;
        if actor.id != id && !actor.is_admin {
            return Err(AppError::Forbidden(
                "You do not have permission to update this user.".into(),
            ));
        }
        if update.is_admin.is_some() && !actor.is_admin {
            return Err(AppError::Forbidden(
                "Only administrators can change admin rights.".into(),
            ));
        }

        let mut user = self.find(id).await?;
        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(is_admin) = update.is_admin {
            user.is_admin = is_admin;
        }
        self.ensure_unique(&user.username, &user.email, Some(user.id)).await?;

        Ok(self.users.update(&user).await?)
    }

    /// Sets a new password on a user whose change permission was already resolved.
    pub async fn change_password(
        &self,
        mut target: User,
        input: PasswordChangeInput,
    ) -> Result<User, AppError> {
        if input.password != input.password_confirmation {
            return Err(AppError::BadRequest("Passwords do not match.".into()));
        }
        input.validate()?;

        target.password_hash = self.hasher.hash(&input.password)?;
        let user = self.users.update(&target).await?;
        info!("Password changed for user {}", user.id);
        Ok(user)
    }

    pub async fn list_users(&self, actor: &User) -> Result<Vec<User>, AppError> {
        require_admin(actor)?;
        Ok(self.users.list().await?)
    }

    pub async fn get_user(&self, id: i32, actor: &User) -> Result<User, AppError> {
        require_admin(actor)?;
        self.find(id).await
    }

    /// Deletes a user together with all of their tasks.
    pub async fn delete_user(&self, id: i32, actor: &User) -> Result<(), AppError> {
        require_admin(actor)?;
        if !self.users.delete(id).await? {
            return Err(AppError::NotFound("User not found.".into()));
        }
        info!("User {} deleted by admin {}", id, actor.id);
        Ok(())
    }

    /// Creates the configured administrator unless one already exists.
    pub async fn ensure_admin(&self, seed: &AdminSeed) -> Result<Option<User>, AppError> {
        if self.users.get_admin().await?.is_some() {
            return Ok(None);
        }
        let admin = self
            .users
            .insert(NewUser {
                username: seed.username.clone(),
                email: seed.email.clone(),
                name: seed.name.clone(),
                password_hash: self.hasher.hash(&seed.password)?,
                is_admin: true,
            })
            .await?;
        info!("Created administrator account {}", admin.username);
        Ok(Some(admin))
    }

    async fn find(&self, id: i32) -> Result<User, AppError> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".into()))
    }

    async fn ensure_unique(
        &self,
        username: &str,
        email: &str,
        excluding: Option<i32>,
    ) -> Result<(), AppError> {
        match self
            .users
            .find_conflicting(username, email, excluding)
            .await?
        {
            Some(existing) if existing.username == username => {
                Err(AppError::Conflict("Username already exists.".into()))
            }
            Some(_) => Err(AppError::Conflict("Email already exists.".into())),
            None => Ok(()),
        }
    }
}

fn require_admin(actor: &User) -> Result<(), AppError> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Administrator access required.".into()))
    }
}
