use std::sync::Arc;

use serde_json::{Map, Value};
use unicode_normalization::UnicodeNormalization;

use super::base::{PermissionGate, RecordValidator};
use super::context::{Operation, WriteContext};
use super::error::ValidateError;
use crate::schema::Entity;

/// Ensures on creation that the record will receive a slug.
///
/// If no slug is supplied, one is derived from the `name` field. Entities
/// whose display name lives elsewhere can point `source_field` at it. A
/// per-language mapping value resolves through the active locale before
/// derivation. An explicit slug bypasses derivation entirely.
pub struct SlugRecordValidator {
    base: RecordValidator,
    source_field: &'static str,
}

impl SlugRecordValidator {
    pub fn new(entity: Entity) -> Self {
        Self { base: RecordValidator::new(entity), source_field: "name" }
    }

    pub fn with_source_field(mut self, field: &'static str) -> Self {
        self.source_field = field;
        self
    }

    pub fn with_gate(mut self, gate: Arc<dyn PermissionGate>) -> Self {
        self.base = self.base.with_gate(gate);
        self
    }

    pub fn validate(
        &self,
        ctx: &WriteContext,
        payload: Map<String, Value>,
    ) -> Result<Map<String, Value>, ValidateError> {
        let mut data = self.base.validate(ctx, payload)?;

        if ctx.operation == Operation::Create && !data.contains_key("slug") {
            let source = match data.get(self.source_field) {
                Some(Value::Object(by_locale)) => by_locale
                    .get(ctx.locale)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                Some(Value::String(s)) => s.clone(),
                _ => String::new(),
            };
            data.insert("slug".to_string(), Value::String(slugify(&source)));
        }

        Ok(data)
    }
}

/// Normalize a display name into a URL-safe token: NFKD decomposition maps
/// accented letters to their ASCII base, separator runs collapse to a single
/// dash, anything left over is dropped.
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_separator = false;
    for c in value.nfkd() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_separator = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, RequestUser};
    use serde_json::json;

    fn user() -> RequestUser {
        RequestUser::Authenticated(AuthenticatedUser {
            username: "alice".to_string(),
            groups: vec!["g1".to_string()],
        })
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn slugify_normalizes_display_names() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Annual  Report_2024 "), "annual-report-2024");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn slugify_transliterates_accented_letters() {
        assert_eq!(slugify("Über Älles"), "uber-alles");
        assert_eq!(slugify("Ünïcode"), "unicode");
        assert_eq!(slugify("Café Résumé"), "cafe-resume");
        // Characters with no ASCII decomposition are dropped
        assert_eq!(slugify("中文 docs"), "docs");
    }

    #[test]
    fn slug_derived_from_name_on_create() {
        let user = user();
        let ctx = WriteContext::create(&user);
        let data = SlugRecordValidator::new(Entity::Category)
            .validate(&ctx, map(json!({"name": "Hello World"})))
            .unwrap();
        assert_eq!(data["slug"], "hello-world");
    }

    #[test]
    fn explicit_slug_bypasses_derivation() {
        let user = user();
        let ctx = WriteContext::create(&user);
        let data = SlugRecordValidator::new(Entity::Category)
            .validate(&ctx, map(json!({"name": "Hello World", "slug": "custom"})))
            .unwrap();
        assert_eq!(data["slug"], "custom");
    }

    #[test]
    fn no_derivation_on_update() {
        let user = user();
        let existing = map(json!({"name": "Old", "created_by_group": "g1", "slug": "old"}));
        let ctx = WriteContext::update(&user, &existing);
        let data = SlugRecordValidator::new(Entity::Category)
            .validate(&ctx, map(json!({"name": "New Name"})))
            .unwrap();
        assert!(data.get("slug").is_none());
    }

    #[test]
    fn per_locale_name_resolves_through_active_locale() {
        let user = user();
        let ctx = WriteContext::create(&user).with_locale("de");
        let data = SlugRecordValidator::new(Entity::Tag)
            .validate(
                &ctx,
                map(json!({"name": {"en": "Hello World", "de": "Hallo Welt"}})),
            )
            .unwrap();
        assert_eq!(data["slug"], "hallo-welt");
    }

    #[test]
    fn missing_locale_variant_yields_empty_slug() {
        let user = user();
        let ctx = WriteContext::create(&user).with_locale("fr");
        let data = SlugRecordValidator::new(Entity::Tag)
            .validate(&ctx, map(json!({"name": {"en": "Hello"}})))
            .unwrap();
        assert_eq!(data["slug"], "");
    }

    #[test]
    fn custom_source_field() {
        let user = user();
        let ctx = WriteContext::create(&user);
        let data = SlugRecordValidator::new(Entity::Category)
            .with_source_field("title")
            .validate(&ctx, map(json!({"title": "Quarterly Review"})))
            .unwrap();
        assert_eq!(data["slug"], "quarterly-review");
    }
}
