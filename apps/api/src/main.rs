//! ConstructMate access gateway composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod redis_session_store;
mod state;

use axum::Router;
use constructmate_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, SessionStoreConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{
    build_app_state, build_memory_session_layer, build_redis_client, build_redis_session_layer,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let app_state = build_app_state(&config).await?;

    let app = match &config.session_store {
        SessionStoreConfig::Memory => build_router(
            app_state,
            &config.frontend_url,
            build_memory_session_layer(config.cookie_secure),
        )?,
        SessionStoreConfig::Redis { redis_url } => build_router(
            app_state,
            &config.frontend_url,
            build_redis_session_layer(build_redis_client(redis_url)?, config.cookie_secure),
        )?,
    };

    serve(app, &config).await
}

async fn serve(app: Router, config: &ApiConfig) -> Result<(), AppError> {
    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, upstream = %config.upstream_api_url, "constructmate api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))
}
