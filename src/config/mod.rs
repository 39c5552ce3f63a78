use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub debug: bool,
    pub api: ApiConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Locale used to pick a variant out of per-language field values
    pub default_locale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthBackendKind {
    Oidc,
    Dev,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub backend: AuthBackendKind,
    pub userinfo_endpoint: String,
    pub introspection_endpoint: String,
    /// Claim holding the username in userinfo responses
    pub username_claim: String,
    /// Claim holding the caller's assigned groups
    pub groups_claim: String,
    /// Client credentials for the introspection endpoint, if the provider requires them
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// How long resolved claims stay cached, keyed by token hash
    pub cache_ttl_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("DEBUG") {
            self.debug = v.parse().unwrap_or(self.debug);
        }
        if let Ok(v) = env::var("API_DEFAULT_LOCALE") {
            self.api.default_locale = v;
        }

        // Auth overrides
        if let Ok(v) = env::var("AUTH_BACKEND") {
            self.auth.backend = match v.as_str() {
                "dev" => AuthBackendKind::Dev,
                _ => AuthBackendKind::Oidc,
            };
        }
        if let Ok(v) = env::var("OIDC_USERINFO_ENDPOINT") {
            self.auth.userinfo_endpoint = v;
        }
        if let Ok(v) = env::var("OIDC_INTROSPECTION_ENDPOINT") {
            self.auth.introspection_endpoint = v;
        }
        if let Ok(v) = env::var("OIDC_USERNAME_CLAIM") {
            self.auth.username_claim = v;
        }
        if let Ok(v) = env::var("OIDC_GROUPS_CLAIM") {
            self.auth.groups_claim = v;
        }
        if let Ok(v) = env::var("OIDC_CLIENT_ID") {
            self.auth.client_id = Some(v);
        }
        if let Ok(v) = env::var("OIDC_CLIENT_SECRET") {
            self.auth.client_secret = Some(v);
        }
        if let Ok(v) = env::var("AUTH_CACHE_TTL_SECS") {
            self.auth.cache_ttl_secs = v.parse().unwrap_or(self.auth.cache_ttl_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            debug: true,
            api: ApiConfig {
                default_locale: "en".to_string(),
            },
            auth: AuthConfig {
                backend: AuthBackendKind::Oidc,
                userinfo_endpoint: "http://localhost:8080/realms/archiva/protocol/openid-connect/userinfo".to_string(),
                introspection_endpoint: "http://localhost:8080/realms/archiva/protocol/openid-connect/token/introspect".to_string(),
                username_claim: "sub".to_string(),
                groups_claim: "groups".to_string(),
                client_id: None,
                client_secret: None,
                cache_ttl_secs: 60,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            debug: false,
            api: ApiConfig {
                default_locale: "en".to_string(),
            },
            auth: AuthConfig {
                backend: AuthBackendKind::Oidc,
                userinfo_endpoint: "https://sso.staging.example.com/userinfo".to_string(),
                introspection_endpoint: "https://sso.staging.example.com/token/introspect".to_string(),
                username_claim: "sub".to_string(),
                groups_claim: "groups".to_string(),
                client_id: None,
                client_secret: None,
                cache_ttl_secs: 300,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            debug: false,
            api: ApiConfig {
                default_locale: "en".to_string(),
            },
            auth: AuthConfig {
                backend: AuthBackendKind::Oidc,
                userinfo_endpoint: "https://sso.example.com/userinfo".to_string(),
                introspection_endpoint: "https://sso.example.com/token/introspect".to_string(),
                username_claim: "sub".to_string(),
                groups_claim: "groups".to_string(),
                client_id: None,
                client_secret: None,
                cache_ttl_secs: 600,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
