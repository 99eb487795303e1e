#![doc = "The `taskdesk` library crate."]
#![doc = ""]
#![doc = "A personal task manager: users register, authenticate and manage a private"]
#![doc = "list of tasks over a JSON REST API. The crate holds the domain models, the"]
#![doc = "auth gate, storage backends, routes and error handling used by the binary"]
#![doc = "(`main.rs`), plus a small HTTP client with an explicit session lifecycle."]

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;
pub mod validation;

pub use crate::error::AppError;
pub use crate::models::{Task, TaskPriority, TaskStatus};
