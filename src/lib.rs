#![doc = "The `tarefas` library crate."]
#![doc = ""]
#![doc = "Authentication and authorization core of a task-management API: password"]
#![doc = "hashing, scoped JWTs, the auth decision engine and password-reset delivery,"]
#![doc = "plus the stores, services and routes that sit on top of them."]
#![doc = "The binary (`main.rs`) wires these into an Actix server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;
