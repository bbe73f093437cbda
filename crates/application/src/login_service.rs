use std::sync::Arc;

use constructmate_core::{AppError, AppResult, BearerToken, UserIdentity};
use tracing::{info, warn};

use crate::{AccessSession, CredentialProvider, LoginOutcome, ReferenceDataSource, decode_identity};

/// Identity established from a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    /// Credential presented on upstream calls.
    pub token: BearerToken,
    /// Identity decoded from the credential, enriched with the organisation when known.
    pub identity: UserIdentity,
    /// Display name of the organisation, when the lookup returned one.
    pub organisation_name: Option<String>,
}

impl LoginResult {
    /// Builds an access session bound to this identity.
    #[must_use]
    pub fn session(&self) -> AccessSession {
        AccessSession::authenticated(self.token.clone(), self.identity.clone())
    }
}

/// Application service exchanging credentials for identities.
#[derive(Clone)]
pub struct LoginService {
    credentials: Arc<dyn CredentialProvider>,
    reference_data: Arc<dyn ReferenceDataSource>,
}

impl LoginService {
    /// Creates a new login service.
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        reference_data: Arc<dyn ReferenceDataSource>,
    ) -> Self {
        Self {
            credentials,
            reference_data,
        }
    }

    /// Exchanges a user name and password for an established identity.
    pub async fn login(&self, user_name: &str, password: &str) -> AppResult<LoginResult> {
        let user_name = user_name.trim();
        if user_name.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "user name and password are required".to_owned(),
            ));
        }

        match self.credentials.login(user_name, password).await? {
            LoginOutcome::Issued(token) => self.establish(token).await,
            LoginOutcome::Rejected(message) => {
                info!(user_name, "login rejected by identity endpoint");
                Err(AppError::Unauthorized(message))
            }
        }
    }

    /// Decodes a credential and resolves the organisation when the claims lack one.
    ///
    /// A failed organisation lookup leaves the organisation unresolved; access then
    /// stays pending instead of failing the login.
    pub async fn establish(&self, token: BearerToken) -> AppResult<LoginResult> {
        if token.is_empty() {
            return Err(AppError::Unauthorized(
                "identity endpoint returned an empty credential".to_owned(),
            ));
        }

        let identity = decode_identity(&token).ok_or_else(|| {
            AppError::Unauthorized("credential does not carry readable claims".to_owned())
        })?;

        if identity.organisation_id().is_some() {
            return Ok(LoginResult {
                token,
                identity,
                organisation_name: None,
            });
        }

        let Some(email) = identity.email().map(str::to_owned) else {
            warn!("credential carries neither organisation nor email claim");
            return Ok(LoginResult {
                token,
                identity,
                organisation_name: None,
            });
        };

        match self.reference_data.find_organisation(&token, &email).await {
            Ok(Some(summary)) => Ok(LoginResult {
                identity: identity.with_organisation(summary.organisation_id),
                organisation_name: summary.organisation_name,
                token,
            }),
            Ok(None) => {
                warn!(email = %email, "no organisation found for user");
                Ok(LoginResult {
                    token,
                    identity,
                    organisation_name: None,
                })
            }
            Err(AppError::Unauthorized(message)) => Err(AppError::Unauthorized(message)),
            Err(error) => {
                warn!(email = %email, error = %error, "organisation lookup failed");
                Ok(LoginResult {
                    token,
                    identity,
                    organisation_name: None,
                })
            }
        }
    }
}
