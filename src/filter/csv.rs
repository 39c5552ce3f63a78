use serde_json::Value;

use super::error::FilterError;
use super::query::{column_expr, exists_chain, text_condition, Query};
use crate::schema::{self, FieldKind, Lookup};

/// Straightforward single-value filter against a (possibly related) field
pub struct CharFilter {
    field_name: &'static str,
    lookup: Lookup,
}

impl CharFilter {
    pub fn new(field_name: &'static str) -> Self {
        Self { field_name, lookup: Lookup::Exact }
    }

    pub fn with_lookup(mut self, lookup: Lookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn apply(&self, query: &mut Query, raw: &str) -> Result<(), FilterError> {
        if raw.trim().is_empty() {
            return Ok(());
        }

        let (hops, field) = schema::resolve_path(query.entity(), self.field_name)?;
        let mut staged = query.stage();

        let condition = exists_chain(query.table_ref(), &hops, 1, &mut |owner| {
            let expr = column_expr(owner, field);
            if field.kind == FieldKind::Uuid && self.lookup == Lookup::Exact {
                format!("{} = {}::uuid", expr, staged.param(Value::String(raw.to_string())))
            } else {
                text_condition(&expr, self.lookup, raw, &mut staged)
            }
        });
        staged.conditions.push(condition);

        query.commit(staged);
        Ok(())
    }
}

/// Comma-separated tag ids with AND semantics: a matching document carries
/// every listed tag, enforced by one narrowing EXISTS per tag.
pub struct TagsFilter;

impl TagsFilter {
    pub fn apply(&self, query: &mut Query, raw: &str) -> Result<(), FilterError> {
        let inner = CharFilter::new("tags__slug");
        for tag in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            inner.apply(query, tag)?;
        }
        Ok(())
    }
}

/// Comma-separated primary keys with any-of semantics (`IN`)
pub struct PkInFilter;

impl PkInFilter {
    pub fn apply(&self, query: &mut Query, raw: &str) -> Result<(), FilterError> {
        let values: Vec<&str> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
        if values.is_empty() {
            return Ok(());
        }

        let def = query.def();
        let pk_kind = def
            .fields
            .iter()
            .find(|f| f.column == def.pk)
            .map(|f| f.kind)
            .unwrap_or(FieldKind::Text);

        let mut staged = query.stage();
        let params: Vec<String> = values
            .iter()
            .map(|v| {
                let p = staged.param(Value::String(v.to_string()));
                if pk_kind == FieldKind::Uuid {
                    format!("{}::uuid", p)
                } else {
                    p
                }
            })
            .collect();
        staged
            .conditions
            .push(format!("\"{}\".\"{}\" IN ({})", def.table, def.pk, params.join(", ")));

        query.commit(staged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Entity;

    #[test]
    fn char_filter_simple_equality() {
        let mut query = Query::new(Entity::Document);
        CharFilter::new("category").apply(&mut query, "invoices").unwrap();
        assert_eq!(query.conditions()[0], "\"documents\".\"category_slug\" = $1");
        assert_eq!(query.params()[0], Value::String("invoices".into()));
    }

    #[test]
    fn char_filter_prefix_match_is_case_insensitive() {
        let mut query = Query::new(Entity::Tag);
        CharFilter::new("name")
            .with_lookup(Lookup::Istartswith)
            .apply(&mut query, "Inv")
            .unwrap();
        assert_eq!(query.conditions()[0], "\"tags\".\"name\" ILIKE $1");
        assert_eq!(query.params()[0], Value::String("Inv%".into()));
    }

    #[test]
    fn char_filter_uuid_field_casts_param() {
        let mut query = Query::new(Entity::File);
        CharFilter::new("original")
            .apply(&mut query, "6a0f4b79-3a2e-4e8d-9d1c-2f6b62c2a9f3")
            .unwrap();
        assert_eq!(query.conditions()[0], "\"files\".\"original_id\" = $1::uuid");
    }

    #[test]
    fn char_filter_reverse_relation_membership() {
        let mut query = Query::new(Entity::File);
        CharFilter::new("renderings__id")
            .apply(&mut query, "6a0f4b79-3a2e-4e8d-9d1c-2f6b62c2a9f3")
            .unwrap();
        assert_eq!(
            query.conditions()[0],
            "EXISTS (SELECT 1 FROM \"files\" \"t1\" WHERE \"t1\".\"original_id\" = \"files\".\"id\" AND \"t1\".\"id\" = $1::uuid)"
        );
    }

    #[test]
    fn char_filter_related_slug_path() {
        let mut query = Query::new(Entity::Tag);
        CharFilter::new("documents__category__slug")
            .apply(&mut query, "invoices")
            .unwrap();
        assert!(query.conditions()[0].contains("\"document_tags\" \"j1\""));
        assert!(query.conditions()[0].contains("\"t2\".\"slug\" = $1"));
    }

    #[test]
    fn tags_filter_requires_every_tag() {
        let mut query = Query::new(Entity::Document);
        TagsFilter.apply(&mut query, "t1,t2").unwrap();
        assert_eq!(query.conditions().len(), 2);
        for condition in query.conditions() {
            assert!(condition.starts_with("EXISTS (SELECT 1 FROM \"document_tags\""));
        }
        assert_eq!(query.params().len(), 2);
        let sql = query.to_sql();
        assert!(sql.query.contains(") AND EXISTS ("));
    }

    #[test]
    fn tags_filter_empty_list_is_a_noop() {
        let mut query = Query::new(Entity::Document);
        TagsFilter.apply(&mut query, "").unwrap();
        TagsFilter.apply(&mut query, " , ").unwrap();
        assert!(query.conditions().is_empty());
    }

    #[test]
    fn pk_in_filter_any_of() {
        let mut query = Query::new(Entity::File);
        PkInFilter.apply(&mut query, "a1,b2,c3").unwrap();
        assert_eq!(
            query.conditions()[0],
            "\"files\".\"id\" IN ($1::uuid, $2::uuid, $3::uuid)"
        );
        assert_eq!(query.params().len(), 3);
    }
}
