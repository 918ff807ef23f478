use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use taskline::auth::{AuthMiddleware, AuthService};
use taskline::config::Config;
use taskline::repository::{PgRefreshTokenRepository, PgUserRepository};
use taskline::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let auth = match AuthService::new(
        &config.tokens,
        config.hashing,
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgRefreshTokenRepository::new(pool)),
    ) {
        Ok(auth) => web::Data::new(auth),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let cors_origin = config.cors_origin.clone();
    log::info!("Starting Taskline server at {}", config.server_url());

    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .max_age(3600),
            None => Cors::default(),
        };

        App::new()
            .app_data(auth.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
