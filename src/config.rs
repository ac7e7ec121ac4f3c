//! Environment-driven configuration.
//!
//! `Config::from_env` is called once at start-up (after `dotenv`) and the
//! resulting values are handed to the services that need them. The auth core
//! only ever sees [`AuthConfig`].

use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    Missing(&'static str),
    /// A variable is set but cannot be parsed.
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Who, besides a valid reset-token holder, may set a new password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordChangePolicy {
    /// Only a `pwd_reset` token issued for the target grants the change.
    #[default]
    ResetTokenOnly,
    /// A reset token, or else the authenticated user changing their own password.
    ResetTokenOrSelf,
}

impl FromStr for PasswordChangePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reset_token_only" => Ok(PasswordChangePolicy::ResetTokenOnly),
            "reset_token_or_self" => Ok(PasswordChangePolicy::ResetTokenOrSelf),
            _ => Err(()),
        }
    }
}

/// Settings consumed by the token codec, the auth service and the reset flow.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub reset_url: String,
    pub sender: String,
    pub reset_dispatch_timeout: std::time::Duration,
    pub bcrypt_cost: u32,
    pub password_change_policy: PasswordChangePolicy,
}

impl AuthConfig {
    /// Builds a config with the documented defaults and the given secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: secret.into(),
            jwt_algorithm: Algorithm::HS256,
            access_token_ttl: Duration::minutes(30),
            refresh_token_ttl: Duration::minutes(60 * 24 * 7),
            reset_token_ttl: Duration::minutes(15),
            reset_url: "http://localhost:8080/reset-senha".to_string(),
            sender: "no-reply@localhost".to_string(),
            reset_dispatch_timeout: std::time::Duration::from_secs(10),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            password_change_policy: PasswordChangePolicy::ResetTokenOnly,
        }
    }
}

/// Account created on start-up when the store holds no administrator.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
}

pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub email_log_path: String,
    pub auth: AuthConfig,
    pub admin: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut auth = AuthConfig::with_secret(required("JWT_SECRET")?);
        auth.jwt_algorithm = parse_algorithm(&optional("JWT_ALGORITHM", "HS256"))?;
        auth.access_token_ttl = ttl_minutes("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        auth.refresh_token_ttl = ttl_minutes("REFRESH_TOKEN_EXPIRE_MINUTES", 60 * 24 * 7)?;
        auth.reset_token_ttl = ttl_minutes("RESET_TOKEN_EXPIRE_MINUTES", 15)?;
        auth.reset_url = optional("PWD_RESET_URL", &auth.reset_url);
        auth.sender = optional("SMTP_SENDER", &auth.sender);
        auth.reset_dispatch_timeout =
            std::time::Duration::from_secs(parsed("RESET_DISPATCH_TIMEOUT_SECONDS", 10)?);
        auth.bcrypt_cost = parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?;

        let policy = optional("PASSWORD_CHANGE_POLICY", "reset_token_only");
        auth.password_change_policy = policy.parse().map_err(|_| ConfigError::Invalid {
            key: "PASSWORD_CHANGE_POLICY",
            value: policy.clone(),
        })?;

        let admin = env::var("ADMIN_PASSWORD").ok().map(|password| AdminSeed {
            username: optional("ADMIN_USERNAME", "admin"),
            email: optional("ADMIN_EMAIL", "admin@example.com"),
            name: optional("ADMIN_NAME", "Administrador"),
            password,
        });

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_port: parsed("SERVER_PORT", 8080)?,
            server_host: optional("SERVER_HOST", "127.0.0.1"),
            email_log_path: optional("EMAIL_LOG_PATH", "email.log"),
            auth,
            admin,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn optional(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

/// Upper bound for any token lifetime: one year.
const MAX_TTL_MINUTES: i64 = 60 * 24 * 366;

// A ttl must be positive and small enough that `now + ttl` stays in range.
fn ttl_minutes(key: &'static str, default: i64) -> Result<Duration, ConfigError> {
    let minutes = parsed(key, default)?;
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        return Err(ConfigError::Invalid {
            key,
            value: minutes.to_string(),
        });
    }
    Duration::try_minutes(minutes).ok_or(ConfigError::Invalid {
        key,
        value: minutes.to_string(),
    })
}

// Only shared-secret algorithms make sense for a single server-held key.
fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    match Algorithm::from_str(value) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigError::Invalid {
            key: "JWT_ALGORITHM",
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;
    use std::sync::Mutex;

    lazy_static! {
        static ref ENV_LOCK: Mutex<()> = Mutex::new(());
    }

    const KEYS: &[&str] = &[
        "DATABASE_URL",
        "JWT_SECRET",
        "JWT_ALGORITHM",
        "SERVER_PORT",
        "SERVER_HOST",
        "ACCESS_TOKEN_EXPIRE_MINUTES",
        "REFRESH_TOKEN_EXPIRE_MINUTES",
        "RESET_TOKEN_EXPIRE_MINUTES",
        "PASSWORD_CHANGE_POLICY",
        "ADMIN_PASSWORD",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_config_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var("JWT_SECRET", "secret");

        let config = Config::from_env().unwrap();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.auth.jwt_algorithm, Algorithm::HS256);
        assert_eq!(config.auth.access_token_ttl, Duration::minutes(30));
        assert_eq!(config.auth.reset_token_ttl, Duration::minutes(15));
        assert_eq!(
            config.auth.password_change_policy,
            PasswordChangePolicy::ResetTokenOnly
        );
        assert!(config.admin.is_none());

        env::set_var("SERVER_PORT", "3000");
        env::set_var("SERVER_HOST", "0.0.0.0");
        env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", "5");
        env::set_var("PASSWORD_CHANGE_POLICY", "reset_token_or_self");
        env::set_var("ADMIN_PASSWORD", "admin123");

        let config = Config::from_env().unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.auth.access_token_ttl, Duration::minutes(5));
        assert_eq!(
            config.auth.password_change_policy,
            PasswordChangePolicy::ResetTokenOrSelf
        );
        assert_eq!(config.admin.unwrap().username, "admin");
        clear_env();
    }

    #[test]
    fn test_missing_and_invalid_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("DATABASE_URL", "postgres://test");

        assert_eq!(
            Config::from_env().err(),
            Some(ConfigError::Missing("JWT_SECRET"))
        );

        env::set_var("JWT_SECRET", "secret");
        env::set_var("JWT_ALGORITHM", "RS256");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { key: "JWT_ALGORITHM", .. })
        ));

        env::set_var("JWT_ALGORITHM", "HS512");
        env::set_var("SERVER_PORT", "not-a-port");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { key: "SERVER_PORT", .. })
        ));
        clear_env();
    }

    #[test]
    fn test_token_ttls_must_be_positive_and_bounded() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var("JWT_SECRET", "secret");

        for value in ["-5", "0", "600000000000", "9223372036854775807"] {
            env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", value);
            assert_eq!(
                Config::from_env().err(),
                Some(ConfigError::Invalid {
                    key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                    value: value.to_string(),
                }),
                "{}",
                value
            );
        }
        env::remove_var("ACCESS_TOKEN_EXPIRE_MINUTES");

        env::set_var("REFRESH_TOKEN_EXPIRE_MINUTES", "600000000000");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { key: "REFRESH_TOKEN_EXPIRE_MINUTES", .. })
        ));
        env::remove_var("REFRESH_TOKEN_EXPIRE_MINUTES");

        env::set_var("RESET_TOKEN_EXPIRE_MINUTES", "-1");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { key: "RESET_TOKEN_EXPIRE_MINUTES", .. })
        ));

        env::set_var("RESET_TOKEN_EXPIRE_MINUTES", "527040");
        let config = Config::from_env().unwrap();
        assert_eq!(config.auth.reset_token_ttl, Duration::minutes(527040));
        clear_env();
    }
}
