//! Application assembly shared by the binary and the integration tests.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, web};
use sqlx::postgres::PgPoolOptions;

use crate::auth::TokenService;
use crate::config::Config;
use crate::routes;
use crate::store::{MemoryTaskStore, MemoryUserStore, PgTaskStore, PgUserStore, TaskStore, UserStore};

/// Everything the handlers need, cloned into each worker.
#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<dyn TaskStore>,
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(tasks: Arc<dyn TaskStore>, users: Arc<dyn UserStore>, tokens: TokenService) -> Self {
        Self { tasks, users, tokens }
    }

    /// State backed by process-local stores.
    pub fn in_memory(tokens: TokenService) -> Self {
        Self::new(
            Arc::new(MemoryTaskStore::new()),
            Arc::new(MemoryUserStore::new()),
            tokens,
        )
    }

    /// Builds the state described by `config`: Postgres when `DATABASE_URL` is
    /// set (running pending migrations first), in-memory stores otherwise.
    pub async fn from_config(config: &Config) -> Result<Self, sqlx::Error> {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl());

        let Some(database_url) = config.database_url.as_deref() else {
            log::warn!("DATABASE_URL is not set; tasks and users are kept in memory only");
            return Ok(Self::in_memory(tokens));
        };

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("connected to Postgres and applied migrations");

        Ok(Self::new(
            Arc::new(PgTaskStore::new(pool.clone())),
            Arc::new(PgUserStore::new(pool)),
            tokens,
        ))
    }

    /// Registers the shared state and all routes on an app or scope.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::from(self.tasks.clone()))
            .app_data(web::Data::from(self.users.clone()))
            .app_data(web::Data::new(self.tokens.clone()))
            .configure(routes::config);
    }
}

/// CORS policy: a single configured origin with credentials, or any origin.
pub fn cors(origin: Option<&str>) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    match origin {
        Some(origin) => cors.allowed_origin(origin).supports_credentials(),
        None => cors.allow_any_origin(),
    }
}
