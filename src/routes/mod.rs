pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::{web, HttpResponse};

use crate::auth::AuthMiddleware;
use crate::error::AppError;
use crate::models::MessageResponse;

/// Registers every route. `/health`, `/auth/register` and `/auth/login` are
/// public; `/auth/profile` and everything under `/tasks` sit behind `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(health::health)
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login)
                .service(
                    web::resource("/profile")
                        .wrap(AuthMiddleware)
                        .route(web::get().to(auth::get_profile))
                        .route(web::put().to(auth::update_profile)),
                ),
        )
        .service(
            web::scope("/tasks")
                .wrap(AuthMiddleware)
                .service(tasks::list_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}

/// Fallback for unmatched routes.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(MessageResponse::new("Route not found"))
}

/// Unreadable JSON bodies go through the same error boundary as everything else.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(format!("Invalid request body: {}", err)).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::BadRequest("Invalid ID format".into()).into())
}
