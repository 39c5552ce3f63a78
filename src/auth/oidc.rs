use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use serde_json::Value;

use super::{bearer_token, token_cache_key, AuthError, AuthenticatedUser, RequestUser, TokenCache};
use crate::config::AuthConfig;

/// Resolves bearer tokens against an OIDC provider.
///
/// Tokens are looked up via the userinfo endpoint first. Providers answer
/// 401 there for client-credential tokens, so those fall back to token
/// introspection. Resolved claims are cached keyed by the token's hash so
/// repeated requests with the same token skip the provider round trip.
pub struct OidcAuthBackend {
    http: reqwest::Client,
    cache: Arc<dyn TokenCache>,
    config: AuthConfig,
}

impl OidcAuthBackend {
    pub fn new(config: AuthConfig, cache: Arc<dyn TokenCache>) -> Self {
        Self { http: reqwest::Client::new(), cache, config }
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<RequestUser, AuthError> {
        let Some(token) = bearer_token(headers)? else {
            return Ok(RequestUser::Anonymous);
        };

        let claims = self.resolve_claims(&token).await?;
        self.user_from_claims(&claims).map(RequestUser::Authenticated)
    }

    async fn resolve_claims(&self, token: &str) -> Result<Value, AuthError> {
        let userinfo_key = token_cache_key("userinfo", token);
        if let Some(claims) = self.cache.get(&userinfo_key).await {
            return Ok(claims);
        }
        let introspection_key = token_cache_key("introspection", token);
        if let Some(claims) = self.cache.get(&introspection_key).await {
            return Ok(claims);
        }

        let response = self
            .http
            .get(&self.config.userinfo_endpoint)
            .bearer_auth(token)
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            let claims: Value = response.json().await?;
            self.cache
                .set(&userinfo_key, claims.clone(), self.cache_ttl())
                .await;
            return Ok(claims);
        }
        if status.is_server_error() {
            return Err(AuthError::Upstream { status: status.as_u16() });
        }
        if status != reqwest::StatusCode::UNAUTHORIZED {
            return Err(AuthError::TokenRejected);
        }

        tracing::debug!("userinfo rejected token, trying introspection");
        let claims = self.introspect(token).await?;
        self.cache
            .set(&introspection_key, claims.clone(), self.cache_ttl())
            .await;
        Ok(claims)
    }

    async fn introspect(&self, token: &str) -> Result<Value, AuthError> {
        let mut request = self
            .http
            .post(&self.config.introspection_endpoint)
            .form(&[("token", token)]);
        if let Some(client_id) = &self.config.client_id {
            request = request.basic_auth(client_id, self.config.client_secret.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_server_error() {
            return Err(AuthError::Upstream { status: status.as_u16() });
        }
        if !status.is_success() {
            return Err(AuthError::TokenRejected);
        }

        let claims: Value = response.json().await?;
        // Introspection only vouches for client-credential tokens here; a
        // response without a client_id is not a usable identity.
        if claims.get("client_id").and_then(Value::as_str).is_none() {
            return Err(AuthError::MissingClaim("client_id".to_string()));
        }
        Ok(claims)
    }

    fn user_from_claims(&self, claims: &Value) -> Result<AuthenticatedUser, AuthError> {
        let username = match claims.get(&self.config.username_claim).and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => match claims.get("client_id").and_then(Value::as_str) {
                Some(client_id) => format!("client@{}", client_id),
                None => return Err(AuthError::MissingClaim(self.config.username_claim.clone())),
            },
        };

        let groups = claims
            .get(&self.config.groups_claim)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(AuthenticatedUser { username, groups })
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache_ttl_secs)
    }
}
