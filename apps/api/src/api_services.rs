mod redis;
mod sessions;

use std::sync::Arc;

use constructmate_application::{
    AccessService, CredentialProvider, LoginService, ReferenceDataSource, SessionRegistry,
};
use constructmate_core::AppError;
use constructmate_infrastructure::{
    HttpCredentialProvider, HttpReferenceDataSource, InMemoryReferenceDataSource, UpstreamClient,
};
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub use redis::build_redis_client;
pub use sessions::{build_memory_session_layer, build_redis_session_layer};

pub async fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let upstream =
        UpstreamClient::with_timeout(config.upstream_api_url.clone(), config.upstream_timeout)?;

    let reference_data: Arc<dyn ReferenceDataSource> = match &config.reference_data_seed_path {
        Some(path) => Arc::new(InMemoryReferenceDataSource::load_seed(path).await?),
        None => {
            info!(upstream = %upstream.base_url(), "using upstream reference data");
            Arc::new(HttpReferenceDataSource::new(upstream.clone()))
        }
    };
    let credentials: Arc<dyn CredentialProvider> = Arc::new(HttpCredentialProvider::new(upstream));

    Ok(AppState {
        access_service: AccessService::new(reference_data.clone()),
        login_service: LoginService::new(credentials, reference_data),
        session_registry: Arc::new(SessionRegistry::new(sessions::session_idle_timeout())),
    })
}
