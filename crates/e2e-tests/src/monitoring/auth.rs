//! Application-default credentials for the monitoring API.
//!
//! Resolution order: a service-account JSON file named by
//! `GOOGLE_APPLICATION_CREDENTIALS` (exchanged for a token via a signed JWT),
//! otherwise the GCE metadata server's default service account. Hermetic
//! tests use [`Authenticator::None`] to skip authentication entirely.

use goauth::auth::{JwtClaims, Token};
use goauth::credentials::Credentials;
pub use goauth::scopes::Scope;
use goauth::GoErr;
use smpl_jwt::Jwt;
use thiserror::Error;
use tracing::debug;

const CREDENTIALS_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

const SERVICE_ACCOUNT_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid GCP credentials file: {0}")]
    InvalidCredentials(GoErr),

    #[error("invalid RSA key in GCP credentials: {0}")]
    InvalidRsaKey(GoErr),

    #[error("failed to exchange service account JWT for a token: {0}")]
    TokenExchange(GoErr),

    #[error("failed to fetch a token from the metadata server: {0}")]
    Metadata(#[from] reqwest::Error),

    #[error("cannot parse metadata token response: {0}")]
    TokenParse(#[from] serde_json::Error),
}

/// Bearer-token provider for monitoring requests.
#[derive(Debug)]
pub enum Authenticator {
    /// A token obtained through the application-default flow.
    Token(Token),
    /// No authentication. For tests against a synthetic backend.
    None,
}

impl Authenticator {
    /// Resolve credentials the way the client libraries do by default.
    pub async fn application_default(scope: Scope) -> Result<Self, AuthError> {
        match std::env::var(CREDENTIALS_VAR) {
            Ok(path) => Self::from_credentials_file(&path, scope).await,
            Err(_) => Self::implicit().await,
        }
    }

    /// Exchange the service-account key in `path` for a scoped token.
    pub async fn from_credentials_file(path: &str, scope: Scope) -> Result<Self, AuthError> {
        let credentials = Credentials::from_file(path).map_err(AuthError::InvalidCredentials)?;
        let claims = JwtClaims::new(
            credentials.iss(),
            &[scope],
            credentials.token_uri(),
            None,
            None,
        );
        let rsa_key = credentials.rsa_key().map_err(AuthError::InvalidRsaKey)?;
        let jwt = Jwt::new(claims, rsa_key, None);

        debug!(iss = %credentials.iss(), token_uri = %credentials.token_uri(), "fetching GCP token");
        let token = goauth::get_token(&jwt, &credentials)
            .await
            .map_err(AuthError::TokenExchange)?;
        Ok(Self::Token(token))
    }

    /// Fetch the default service-account token from the metadata server.
    pub async fn implicit() -> Result<Self, AuthError> {
        debug!("fetching implicit GCP token from the metadata server");
        let body = reqwest::Client::new()
            .get(SERVICE_ACCOUNT_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let token = serde_json::from_str::<Token>(&body)?;
        Ok(Self::Token(token))
    }

    /// The `Authorization` header value, if this authenticator carries one.
    pub fn make_token(&self) -> Option<String> {
        match self {
            Self::Token(token) => {
                Some(format!("{} {}", token.token_type(), token.access_token()))
            }
            Self::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_authenticator_produces_no_header() {
        assert!(Authenticator::None.make_token().is_none());
    }

    #[test]
    fn token_formats_as_authorization_header() {
        let token: Token = serde_json::from_str(
            r#"{"access_token": "abc123", "token_type": "Bearer", "expires_in": 3600}"#,
        )
        .expect("token JSON should parse");

        let auth = Authenticator::Token(token);
        assert_eq!(auth.make_token().as_deref(), Some("Bearer abc123"));
    }

    #[test]
    fn malformed_token_body_is_a_parse_error() {
        let err = serde_json::from_str::<Token>("not json").expect_err("parse failure");
        assert!(AuthError::from(err).to_string().contains("parse"));
    }
}
