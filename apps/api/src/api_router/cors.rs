use axum::http::header::{CONTENT_TYPE, RETRY_AFTER};
use axum::http::{HeaderValue, Method};
use constructmate_core::AppError;
use tower_http::cors::CorsLayer;

/// Credentialed CORS for the frontend origin. `Retry-After` is exposed so the client can
/// back off while a guarded section is still pending.
pub(super) fn build_cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    Ok(CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([RETRY_AFTER]))
}

#[cfg(test)]
mod tests {
    use super::build_cors_layer;

    #[test]
    fn frontend_url_must_be_a_header_value() {
        assert!(build_cors_layer("http://localhost:3000").is_ok());
        assert!(build_cors_layer("http://localhost:3000\n").is_err());
    }
}
