//! Main entry point for the campspot marketplace backend.
//! Serves the REST API and the front-end bundle.

use actix_files::Files;
use actix_web::{App, HttpServer, middleware::Logger, web};
use auth_services::jwt::JwtService;
use auth_services::service::AuthService;
use campspot_core::Marketplace;
use postgres::PgStore;
use postgres::database::*;
use std::sync::Arc;
use web_handlers::health;
use web_handlers::routes::*;

mod config;
use config::ServerConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    log::info!("Starting campspot server with {:?} overlap policy", config.overlap_policy);

    let pool = match create_connection_pool().await {
        Ok(pool) => {
            log::info!("Database pool created successfully");

            if let Err(e) = test_connection(&pool).await {
                log::error!("Database connection test failed: {}", e);
            }
            pool
        }
        Err(e) => {
            log::error!("Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        log::error!("Failed to apply migrations: {}", e);
        std::process::exit(1);
    }

    let market = web::Data::new(Marketplace::with_store(
        Arc::new(PgStore::new(pool.clone())),
        config.overlap_policy,
    ));
    let auth_service = web::Data::new(AuthService::new(pool));
    let jwt_service = JwtService::from_env();
    let jwt_data = web::Data::new(jwt_service.clone());

    let frontend_path = config.frontend_path.clone();
    log::info!("Frontend files location: {}", frontend_path);
    log::info!("Server will be available at: http://{}", config.bind_addr);

    HttpServer::new(move || {
        let accounts_jwt = jwt_service.clone();
        let market_jwt = jwt_service.clone();

        App::new()
            .app_data(market.clone())
            .app_data(auth_service.clone())
            .app_data(jwt_data.clone())
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .wrap(Logger::default())
            .route("/health", web::get().to(health))
            .configure(move |cfg| configure_accounts(cfg, accounts_jwt))
            .configure(move |cfg| configure_marketplace(cfg, market_jwt))
            .service(Files::new("/", frontend_path.clone()).index_file("index.html"))
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
