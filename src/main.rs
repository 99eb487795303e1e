use actix_web::{middleware::Logger, web, App, HttpServer};
use taskdesk::{app, config::Config, routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    let state = app::AppState::from_config(&config)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    log::info!("Starting server at {}", config.server_url());
    let cors_origin = config.cors_origin.clone();
    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(app::cors(cors_origin.as_deref()))
            .wrap(Logger::default())
            .configure(move |cfg| state.configure(cfg))
            .default_service(web::to(routes::not_found))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
