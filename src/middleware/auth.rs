use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::AuthBackend;
use crate::error::ApiError;

/// Authentication middleware that resolves the bearer token and injects the
/// resulting identity into the request.
///
/// Requests without an Authorization header pass through as anonymous;
/// handlers decide whether anonymous access is acceptable. A malformed header
/// or a rejected token fails the request here.
pub async fn oidc_auth_middleware(
    State(backend): State<Arc<AuthBackend>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = backend.authenticate(&headers).await?;

    if let Some(username) = user.username() {
        tracing::debug!(username, "request authenticated");
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
