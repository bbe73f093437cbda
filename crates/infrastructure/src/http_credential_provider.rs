use async_trait::async_trait;
use constructmate_application::{CredentialProvider, LoginOutcome};
use constructmate_core::{AppError, AppResult};
use reqwest::Method;
use tracing::info;

use crate::UpstreamClient;
use crate::payloads::{LoginBody, parse_login};

/// Credential provider backed by the upstream login endpoint.
#[derive(Debug, Clone)]
pub struct HttpCredentialProvider {
    upstream: UpstreamClient,
}

impl HttpCredentialProvider {
    /// Creates a new HTTP credential provider.
    #[must_use]
    pub fn new(upstream: UpstreamClient) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl CredentialProvider for HttpCredentialProvider {
    async fn login(&self, user_name: &str, password: &str) -> AppResult<LoginOutcome> {
        let body = LoginBody {
            user_name,
            password,
        };

        match self
            .upstream
            .send_json(None, Method::POST, "Auth/login", &body)
            .await
        {
            Ok(response) => Ok(parse_login(&response)),
            Err(AppError::Unauthorized(_) | AppError::Validation(_) | AppError::NotFound(_)) => {
                info!("upstream refused login credentials");
                Ok(LoginOutcome::Rejected("Login failed.".to_owned()))
            }
            Err(error) => Err(error),
        }
    }
}
