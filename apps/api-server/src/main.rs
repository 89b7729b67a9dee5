//! # Quill API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use quill_core::ports::{PasswordService, TokenService};
use quill_infra::{Argon2PasswordService, JwtTokenService};

mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

#[cfg(test)]
mod tests;

use config::AppConfig;
use middleware::rate_limit::TrustForwardedFor;
use state::{AppState, Repositories};
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!("Starting Quill API Server on {}:{}", config.host, config.port);

    let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));

    let repos = Repositories::from_config(&config).await?;
    let state = AppState::new(repos, passwords, tokens.clone());

    #[cfg(feature = "rate-limit")]
    let rate_limiter: Arc<dyn quill_core::ports::RateLimiter> = Arc::new(
        quill_infra::InMemoryRateLimiter::new(config.auth_rate_limit.clone()),
    );

    let trust_forwarded_for = config.trust_forwarded_for;
    if trust_forwarded_for {
        tracing::info!("Rate limits keyed on forwarded client addresses");
    }

    HttpServer::new(move || {
        let app = App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(tokens.clone()));

        #[cfg(feature = "rate-limit")]
        let app = app.app_data(web::Data::new(rate_limiter.clone()));

        let app = if trust_forwarded_for {
            app.app_data(web::Data::new(TrustForwardedFor))
        } else {
            app
        };

        app.configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
