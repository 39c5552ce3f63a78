pub mod cache;
pub mod dev;
pub mod oidc;

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{AppConfig, AuthBackendKind};
pub use cache::{InMemoryCache, TokenCache};
pub use dev::DevAuthBackend;
pub use oidc::OidcAuthBackend;

/// Identity a request acts as, resolved by the authentication backend
#[derive(Debug, Clone)]
pub enum RequestUser {
    Anonymous,
    Authenticated(AuthenticatedUser),
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
    /// Groups the caller may act as; the first one is the default
    pub groups: Vec<String>,
}

impl RequestUser {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, RequestUser::Authenticated(_))
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            RequestUser::Anonymous => None,
            RequestUser::Authenticated(user) => Some(&user.username),
        }
    }

    pub fn groups(&self) -> &[String] {
        match self {
            RequestUser::Anonymous => &[],
            RequestUser::Authenticated(user) => &user.groups,
        }
    }

    /// The caller's default group; anonymous callers have none
    pub fn group(&self) -> Option<&str> {
        self.groups().first().map(String::as_str)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid Authorization header: {0}")]
    InvalidHeader(String),

    #[error("claim \"{0}\" missing from identity provider response")]
    MissingClaim(String),

    #[error("identity provider rejected the token")]
    TokenRejected,

    #[error("identity provider returned {status}")]
    Upstream { status: u16 },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    ImproperlyConfigured(String),
}

/// Extract the bearer token from the Authorization header.
/// An absent header is an anonymous request, not an error.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    let Some(header) = headers.get("authorization") else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| AuthError::InvalidHeader("header is not valid UTF-8".to_string()))?;

    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(AuthError::InvalidHeader(
            "expected exactly one token after the scheme".to_string(),
        ));
    }
    if !parts[0].eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidHeader(format!(
            "unsupported scheme \"{}\"",
            parts[0]
        )));
    }
    Ok(Some(parts[1].to_string()))
}

/// Cache key for resolved provider claims: `auth.<kind>.<sha256hex(token)>`
pub fn token_cache_key(kind: &str, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("auth.{}.{:x}", kind, hasher.finalize())
}

pub enum AuthBackend {
    Oidc(OidcAuthBackend),
    Dev(DevAuthBackend),
}

impl AuthBackend {
    /// Build the configured backend. The dev bypass is only selectable in
    /// debug mode.
    pub fn from_config(config: &AppConfig, cache: Arc<dyn TokenCache>) -> Result<Self, AuthError> {
        match config.auth.backend {
            AuthBackendKind::Dev => {
                if !config.debug {
                    return Err(AuthError::ImproperlyConfigured(
                        "The dev auth backend can only be used in debug mode!".to_string(),
                    ));
                }
                tracing::warn!("using the dev auth backend; all bearer tokens are accepted");
                Ok(AuthBackend::Dev(DevAuthBackend))
            }
            AuthBackendKind::Oidc => {
                Ok(AuthBackend::Oidc(OidcAuthBackend::new(config.auth.clone(), cache)))
            }
        }
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<RequestUser, AuthError> {
        match self {
            AuthBackend::Oidc(backend) => backend.authenticate(headers).await,
            AuthBackend::Dev(backend) => backend.authenticate(headers),
        }
    }
}
