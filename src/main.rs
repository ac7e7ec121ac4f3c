use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use dotenv::dotenv;
use log::{info, warn};
use std::{io, sync::Arc};

use tarefas::{
    auth::AuthMiddleware, config::Config, notify::FileNotificationSink, routes, store::PgStore,
    AppState,
};

fn io_error(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(io_error)?;

    let store = Arc::new(PgStore::connect(&config.database_url).await.map_err(io_error)?);
    store.migrate().await.map_err(io_error)?;
    info!("Database ready");

    let sink = Arc::new(FileNotificationSink::new(&config.email_log_path));
    let state = AppState::new(store, sink, config.auth.clone());

    match &config.admin {
        Some(seed) => {
            state.users.ensure_admin(seed).await.map_err(io_error)?;
        }
        None => warn!("No ADMIN_PASSWORD set; skipping administrator seeding"),
    }

    info!("Starting server at {}", config.server_url());
    let bind_addr = (config.server_host.clone(), config.server_port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .configure(|cfg| state.register(cfg))
            .wrap(AuthMiddleware)
            .wrap(cors)
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind(bind_addr)?
    .run()
    .await
}
