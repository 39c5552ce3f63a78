//! Static registry of cross-field validators.
//!
//! Each entity type maps to an ordered list of validator functions. A
//! validator receives the candidate payload and either returns it (possibly
//! transformed) or rejects, aborting the whole write.

use serde_json::{Map, Value};

use super::context::WriteContext;
use super::error::ValidateError;
use crate::models::FileVariant;
use crate::schema::Entity;

pub type ValidatorFn =
    fn(&WriteContext, Map<String, Value>) -> Result<Map<String, Value>, ValidateError>;

pub fn validators_for(entity: Entity) -> &'static [ValidatorFn] {
    match entity {
        Entity::File => &[file_original_rule],
        Entity::Category | Entity::Document | Entity::Tag => &[],
    }
}

/// A file of the original variant must not reference another file as its
/// `original`; every derived rendering must.
fn file_original_rule(
    _ctx: &WriteContext,
    data: Map<String, Value>,
) -> Result<Map<String, Value>, ValidateError> {
    let variant = data
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let has_original = matches!(data.get("original"), Some(v) if !v.is_null());
    let is_original = variant == FileVariant::Original.as_str();

    if !is_original && !has_original {
        return Err(ValidateError::OriginalRequired(variant));
    }
    if is_original && has_original {
        return Err(ValidateError::OriginalForbidden(variant));
    }
    Ok(data)
}
