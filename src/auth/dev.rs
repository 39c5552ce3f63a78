use axum::http::HeaderMap;

use super::{bearer_token, AuthError, AuthenticatedUser, RequestUser};

/// Development bypass: any syntactically valid bearer token authenticates as
/// a fixed local user. Refused outside debug mode by `AuthBackend::from_config`.
pub struct DevAuthBackend;

impl DevAuthBackend {
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<RequestUser, AuthError> {
        match bearer_token(headers)? {
            None => Ok(RequestUser::Anonymous),
            Some(_) => Ok(RequestUser::Authenticated(AuthenticatedUser {
                username: "dev".to_string(),
                groups: vec!["dev-group".to_string(), "secondary-group".to_string()],
            })),
        }
    }
}
