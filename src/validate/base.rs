use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};

use super::context::{Operation, WriteContext};
use super::error::ValidateError;
use super::registry;
use crate::auth::RequestUser;
use crate::schema::Entity;

/// Model- and object-level permission checks, supplied by the embedding
/// application. Runs only after validation succeeds; a denial is an
/// authorization failure, not a validation failure.
pub trait PermissionGate: Send + Sync {
    fn check_model(&self, user: &RequestUser, entity: Entity) -> Result<(), ValidateError> {
        let _ = (user, entity);
        Ok(())
    }

    fn check_object(
        &self,
        user: &RequestUser,
        entity: Entity,
        existing: &Map<String, Value>,
    ) -> Result<(), ValidateError> {
        let _ = (user, entity, existing);
        Ok(())
    }
}

pub struct AllowAll;

impl PermissionGate for AllowAll {}

/// Cross-cutting validation applied to every writable entity: group
/// ownership, registered cross-field validators, audit stamping and
/// permission checks, in that order.
pub struct RecordValidator {
    entity: Entity,
    gate: Arc<dyn PermissionGate>,
}

impl RecordValidator {
    pub fn new(entity: Entity) -> Self {
        Self { entity, gate: Arc::new(AllowAll) }
    }

    pub fn with_gate(mut self, gate: Arc<dyn PermissionGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn validate(
        &self,
        ctx: &WriteContext,
        payload: Map<String, Value>,
    ) -> Result<Map<String, Value>, ValidateError> {
        let mut data = payload;

        // Prime group fields so the per-field validators always run with a
        // concrete value, defaulting to the caller's group.
        let default_group = ctx
            .default_group()
            .map(|g| Value::String(g.to_string()))
            .unwrap_or(Value::Null);
        data.entry("created_by_group".to_string())
            .or_insert_with(|| default_group.clone());
        data.entry("modified_by_group".to_string())
            .or_insert_with(|| default_group.clone());

        let created_by_group = self.validate_created_by_group(
            ctx,
            data.get("created_by_group").cloned().unwrap_or(Value::Null),
        )?;
        data.insert("created_by_group".to_string(), created_by_group);

        let modified_by_group = self.validate_modified_by_group(
            ctx,
            data.get("modified_by_group").cloned().unwrap_or(Value::Null),
        )?;
        data.insert("modified_by_group".to_string(), modified_by_group);

        // Registered validators run in registration order; each may transform
        // the payload or reject the whole write.
        for validator in registry::validators_for(self.entity) {
            data = validator(ctx, data)?;
        }

        // Stamped from the authenticated caller, never client-controlled
        let username = ctx
            .user
            .username()
            .map(|u| Value::String(u.to_string()))
            .unwrap_or(Value::Null);
        data.insert("created_by_user".to_string(), username.clone());
        data.insert("modified_by_user".to_string(), username);

        self.gate.check_model(ctx.user, self.entity)?;
        if let Some(existing) = ctx.existing {
            self.gate.check_object(ctx.user, self.entity, existing)?;
        }

        let now = Value::String(Utc::now().to_rfc3339());
        if ctx.operation == Operation::Create {
            data.insert("created_at".to_string(), now.clone());
        }
        data.insert("modified_at".to_string(), now);

        Ok(data)
    }

    /// `created_by_group` can be set on creation, then must remain constant
    fn validate_created_by_group(
        &self,
        ctx: &WriteContext,
        value: Value,
    ) -> Result<Value, ValidateError> {
        if ctx.operation == Operation::Update {
            // The stored value wins; client-supplied overrides are ignored
            return Ok(ctx
                .existing
                .and_then(|e| e.get("created_by_group"))
                .cloned()
                .unwrap_or(Value::Null));
        }
        ensure_assigned_group(ctx, "created_by_group", &value)?;
        Ok(value)
    }

    /// `modified_by_group` is validated against the caller's group set, with
    /// a fallback to the default group if no value is given
    fn validate_modified_by_group(
        &self,
        ctx: &WriteContext,
        value: Value,
    ) -> Result<Value, ValidateError> {
        let value = match &value {
            Value::Null => ctx
                .default_group()
                .map(|g| Value::String(g.to_string()))
                .unwrap_or(Value::Null),
            Value::String(s) if s.is_empty() => ctx
                .default_group()
                .map(|g| Value::String(g.to_string()))
                .unwrap_or(Value::Null),
            _ => value,
        };
        ensure_assigned_group(ctx, "modified_by_group", &value)?;
        Ok(value)
    }
}

fn ensure_assigned_group(
    ctx: &WriteContext,
    field: &'static str,
    value: &Value,
) -> Result<(), ValidateError> {
    if let Some(group) = value.as_str() {
        if !group.is_empty() && !ctx.user.groups().iter().any(|g| g == group) {
            return Err(ValidateError::GroupNotAssigned { field, group: group.to_string() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use serde_json::json;

    fn user(groups: &[&str]) -> RequestUser {
        RequestUser::Authenticated(AuthenticatedUser {
            username: "alice".to_string(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
        })
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn priming_fills_group_fields_with_default() {
        let user = user(&["g1", "g2"]);
        let ctx = WriteContext::create(&user);
        let data = RecordValidator::new(Entity::Category)
            .validate(&ctx, map(json!({"name": "Reports"})))
            .unwrap();
        assert_eq!(data["created_by_group"], "g1");
        assert_eq!(data["modified_by_group"], "g1");
    }

    #[test]
    fn anonymous_caller_has_no_default_group() {
        let user = RequestUser::Anonymous;
        let ctx = WriteContext::create(&user);
        let data = RecordValidator::new(Entity::Category)
            .validate(&ctx, map(json!({"name": "Reports"})))
            .unwrap();
        assert_eq!(data["created_by_group"], Value::Null);
        assert_eq!(data["modified_by_group"], Value::Null);
        assert_eq!(data["created_by_user"], Value::Null);
    }

    #[test]
    fn foreign_created_by_group_is_rejected_on_create() {
        let user = user(&["g2", "g3"]);
        let ctx = WriteContext::create(&user);
        let err = RecordValidator::new(Entity::Category)
            .validate(&ctx, map(json!({"name": "x", "created_by_group": "g1"})))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Given created_by_group 'g1' is not part of user's assigned groups"
        );
    }

    #[test]
    fn created_by_group_is_immutable_on_update() {
        let user = user(&["g1", "g2"]);
        let existing = map(json!({"name": "x", "created_by_group": "g1"}));
        let ctx = WriteContext::update(&user, &existing);
        // Supplying a different group is not an error; the stored value wins
        let data = RecordValidator::new(Entity::Category)
            .validate(&ctx, map(json!({"name": "y", "created_by_group": "g2"})))
            .unwrap();
        assert_eq!(data["created_by_group"], "g1");
    }

    #[test]
    fn modified_by_group_falls_back_to_default_when_null() {
        let user = user(&["g1"]);
        let ctx = WriteContext::create(&user);
        let data = RecordValidator::new(Entity::Category)
            .validate(&ctx, map(json!({"name": "x", "modified_by_group": null})))
            .unwrap();
        assert_eq!(data["modified_by_group"], "g1");
    }

    #[test]
    fn audit_users_are_always_stamped() {
        let user = user(&["g1"]);
        let ctx = WriteContext::create(&user);
        let data = RecordValidator::new(Entity::Category)
            .validate(
                &ctx,
                map(json!({"name": "x", "created_by_user": "mallory", "modified_by_user": "mallory"})),
            )
            .unwrap();
        assert_eq!(data["created_by_user"], "alice");
        assert_eq!(data["modified_by_user"], "alice");
    }

    #[test]
    fn timestamps_stamped_on_create_and_refreshed_on_update() {
        let user = user(&["g1"]);
        let ctx = WriteContext::create(&user);
        let data = RecordValidator::new(Entity::Category)
            .validate(&ctx, map(json!({"name": "x"})))
            .unwrap();
        assert!(data["created_at"].is_string());
        assert!(data["modified_at"].is_string());

        let existing = map(json!({"name": "x", "created_by_group": "g1"}));
        let ctx = WriteContext::update(&user, &existing);
        let data = RecordValidator::new(Entity::Category)
            .validate(&ctx, map(json!({"name": "y"})))
            .unwrap();
        assert!(data.get("created_at").is_none());
        assert!(data["modified_at"].is_string());
    }

    #[test]
    fn registered_validators_run_before_permission_checks() {
        struct DenyAll;
        impl PermissionGate for DenyAll {
            fn check_model(&self, _: &RequestUser, _: Entity) -> Result<(), ValidateError> {
                Err(ValidateError::PermissionDenied("nope".to_string()))
            }
        }

        let user = user(&["g1"]);
        let ctx = WriteContext::create(&user);
        let validator = RecordValidator::new(Entity::File).with_gate(Arc::new(DenyAll));

        // Business-rule failure fires first, before the gate
        let err = validator
            .validate(&ctx, map(json!({"type": "thumbnail"})))
            .unwrap_err();
        assert!(matches!(err, ValidateError::OriginalRequired(_)));

        // With a valid payload the gate denial surfaces as authorization failure
        let err = validator
            .validate(&ctx, map(json!({"type": "original"})))
            .unwrap_err();
        assert!(matches!(err, ValidateError::PermissionDenied(_)));
    }

    #[test]
    fn object_gate_runs_only_on_update() {
        struct DenyObject;
        impl PermissionGate for DenyObject {
            fn check_object(
                &self,
                _: &RequestUser,
                _: Entity,
                _: &Map<String, Value>,
            ) -> Result<(), ValidateError> {
                Err(ValidateError::PermissionDenied("object locked".to_string()))
            }
        }

        let user = user(&["g1"]);
        let validator = RecordValidator::new(Entity::Category).with_gate(Arc::new(DenyObject));

        let ctx = WriteContext::create(&user);
        assert!(validator.validate(&ctx, map(json!({"name": "x"}))).is_ok());

        let existing = map(json!({"name": "x", "created_by_group": "g1"}));
        let ctx = WriteContext::update(&user, &existing);
        let err = validator.validate(&ctx, map(json!({"name": "y"}))).unwrap_err();
        assert!(matches!(err, ValidateError::PermissionDenied(_)));
    }
}
