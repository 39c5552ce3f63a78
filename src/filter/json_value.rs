use serde_json::Value;

use super::error::FilterError;
use super::query::{exists_chain, text_condition, Query, Staged};
use crate::schema::{self, Lookup};

/// Filter over an entity's JSON attribute bag.
///
/// The raw query-string value must be JSON: either a single
/// `{"key": .., "value": .., "lookup": ..}` object or an array of them.
/// Elements AND-combine, each narrowing the query. The field name may
/// traverse relations with `__` (e.g. `document__meta`), in which case the
/// predicate is wrapped in correlated EXISTS subqueries.
pub struct JsonValueFilter {
    field_name: &'static str,
    default_lookup: Lookup,
}

impl JsonValueFilter {
    pub fn new(field_name: &'static str) -> Self {
        Self { field_name, default_lookup: Lookup::Exact }
    }

    pub fn apply(&self, query: &mut Query, raw: &str) -> Result<(), FilterError> {
        if raw.trim().is_empty() {
            return Ok(());
        }

        let parsed: Value = serde_json::from_str(raw).map_err(|_| FilterError::NotJsonEncoded)?;

        // be a bit more tolerant: a bare object is treated as a one-element list
        let elements = match parsed {
            Value::Object(_) => vec![parsed],
            Value::Array(items) => items,
            _ => return Err(FilterError::MissingKeyValue),
        };

        let (hops, field) = schema::resolve_path(query.entity(), self.field_name)?;
        let valid = field.kind.valid_lookups();

        // Stage everything; the query stays untouched if any element fails
        let mut staged = query.stage();

        for element in &elements {
            let obj = match element {
                Value::Object(map) if map.is_empty() => continue,
                Value::Object(map) => map,
                _ => return Err(FilterError::MissingKeyValue),
            };

            let key = obj
                .get("key")
                .and_then(Value::as_str)
                .ok_or(FilterError::MissingKeyValue)?;
            let value = obj.get("value").ok_or(FilterError::MissingKeyValue)?;

            let lookup_name = match obj.get("lookup") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => self.default_lookup.as_str().to_string(),
            };
            let lookup = Lookup::parse(&lookup_name)
                .filter(|l| valid.contains(l))
                .ok_or_else(|| FilterError::InvalidLookup {
                    lookup: lookup_name,
                    field: self.field_name.to_string(),
                    valid: valid.iter().map(|l| l.as_str()).collect::<Vec<_>>().join(", "),
                })?;

            let condition = exists_chain(query.table_ref(), &hops, 1, &mut |owner| {
                element_condition(owner, field.column, key, lookup, value, &mut staged)
            });
            staged.conditions.push(condition);
        }

        query.commit(staged);
        Ok(())
    }
}

/// Predicate for one filter element. String values compare through text
/// extraction (`->>`), since jsonb equality semantics for contains-style
/// lookups differ from text semantics. Non-string values keep jsonb-typed
/// comparison through `->`.
fn element_condition(
    owner: &str,
    column: &str,
    key: &str,
    lookup: Lookup,
    value: &Value,
    staged: &mut Staged,
) -> String {
    let key_param = staged.param(Value::String(key.to_string()));

    if let Value::String(s) = value {
        let expr = format!("(\"{}\".\"{}\" ->> {})", owner, column, key_param);
        return text_condition(&expr, lookup, s, staged);
    }

    match lookup {
        Lookup::Exact | Lookup::Contains | Lookup::Lt | Lookup::Lte | Lookup::Gt | Lookup::Gte => {
            let expr = format!("(\"{}\".\"{}\" -> {})", owner, column, key_param);
            let op = match lookup {
                Lookup::Exact => "=",
                Lookup::Contains => "@>",
                Lookup::Lt => "<",
                Lookup::Lte => "<=",
                Lookup::Gt => ">",
                Lookup::Gte => ">=",
                _ => unreachable!(),
            };
            let value_param = staged.param(Value::String(value.to_string()));
            format!("{} {} {}::jsonb", expr, op, value_param)
        }
        // Pattern lookups on a non-string value fall back to the text rendering
        other => {
            let expr = format!("(\"{}\".\"{}\" ->> {})", owner, column, key_param);
            text_condition(&expr, other, &value.to_string(), staged)
        }
    }
}
