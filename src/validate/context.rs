use serde_json::{Map, Value};

use crate::auth::RequestUser;
use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

/// Per-request context a validation pass runs under
pub struct WriteContext<'a> {
    pub user: &'a RequestUser,
    pub operation: Operation,
    /// Stored record when updating; None on create
    pub existing: Option<&'a Map<String, Value>>,
    /// Active locale for per-language field values
    pub locale: &'a str,
}

impl<'a> WriteContext<'a> {
    pub fn create(user: &'a RequestUser) -> Self {
        Self {
            user,
            operation: Operation::Create,
            existing: None,
            locale: &config::config().api.default_locale,
        }
    }

    pub fn update(user: &'a RequestUser, existing: &'a Map<String, Value>) -> Self {
        Self {
            user,
            operation: Operation::Update,
            existing: Some(existing),
            locale: &config::config().api.default_locale,
        }
    }

    pub fn with_locale(mut self, locale: &'a str) -> Self {
        self.locale = locale;
        self
    }

    /// The caller's default group; anonymous callers have none
    pub fn default_group(&self) -> Option<&str> {
        self.user.group()
    }
}
