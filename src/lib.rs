pub mod auth;
pub mod config;
pub mod error;
pub mod filter;
pub mod middleware;
pub mod models;
pub mod schema;
pub mod validate;
