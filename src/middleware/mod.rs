pub mod auth;

pub use auth::oidc_auth_middleware;
