pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(auth::login)
        .service(auth::refresh_token)
        .service(
            // `/me` and `/reset-senha` must be registered before `/{id}`.
            web::scope("/usuarios")
                .service(users::register)
                .service(users::me)
                .service(users::list_users)
                .service(users::request_password_reset)
                .service(users::change_password)
                .service(users::get_user)
                .service(users::update_user)
                .service(users::delete_user),
        )
        .service(
            web::scope("/tarefas")
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}
