use thiserror::Error;

use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("filter value needs to be JSON encoded")]
    NotJsonEncoded,

    #[error("filter value needs to have a \"key\" and \"value\" and an optional \"lookup\" key")]
    MissingKeyValue,

    #[error("Lookup expression \"{lookup}\" not allowed for field \"{field}\". Valid expressions: {valid}")]
    InvalidLookup {
        lookup: String,
        field: String,
        valid: String,
    },

    #[error("Active group '{0}' is not part of user's assigned groups")]
    GroupNotAssigned(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
