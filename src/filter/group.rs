use super::error::FilterError;
use crate::auth::RequestUser;

/// Validates that the group a request claims to act as is one of the caller's
/// assigned groups. Validation only: row scoping by group happens in the
/// default queryset, not here.
pub struct ActiveGroupFilter;

impl ActiveGroupFilter {
    pub fn apply(&self, user: &RequestUser, raw: &str) -> Result<(), FilterError> {
        if raw.trim().is_empty() {
            return Ok(());
        }
        if !user.groups().iter().any(|g| g == raw) {
            return Err(FilterError::GroupNotAssigned(raw.to_string()));
        }
        Ok(())
    }
}
