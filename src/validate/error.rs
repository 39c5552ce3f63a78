use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("Given {field} '{group}' is not part of user's assigned groups")]
    GroupNotAssigned { field: &'static str, group: String },

    #[error("\"original\" must be set for type \"{0}\"")]
    OriginalRequired(String),

    #[error("\"original\" must not be set for type \"{0}\"")]
    OriginalForbidden(String),

    /// Generic rejection from a registered validator
    #[error("{0}")]
    Invalid(String),

    /// Authorization failure, surfaced as 403 rather than 400
    #[error("{0}")]
    PermissionDenied(String),
}
