//! # Postline API Server
//!
//! The Actix-web HTTP server: accounts, posts, labels, blog posts and
//! content generation. Publishing happens in the separate `worker` binary.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use postline_core::ports::{ContentGenerator, PasswordService, TokenService};
use postline_infra::telemetry::{TelemetryConfig, init_telemetry};
use postline_infra::{Argon2PasswordService, GeminiGenerator, JwtTokenService};

mod config;
mod handlers;
mod middleware;
mod state;

use config::AppConfig;
use state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env("api-server"));

    let config = AppConfig::from_env();

    let generator: Arc<dyn ContentGenerator> = Arc::new(GeminiGenerator::from_env()?);
    let state = AppState::new(config.database.as_ref(), generator).await?;

    let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());
    let password_service: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

    tracing::info!(
        "Starting Postline API Server on {}:{}",
        config.host,
        config.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(token_service.clone()))
            .app_data(web::Data::new(password_service.clone()))
            .app_data(handlers::json_config())
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
