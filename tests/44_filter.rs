//! Filter-set tests driven through the public crate surface: query-string
//! style parameters in, SQL text and positional parameters out.

use std::collections::HashMap;

use anyhow::Result;
use serde_json::Value;

use archiva::auth::{AuthenticatedUser, RequestUser};
use archiva::filter::{
    CategoryFilterSet, DocumentFilterSet, FileFilterSet, FilterError, TagFilterSet,
};

fn user(groups: &[&str]) -> RequestUser {
    RequestUser::Authenticated(AuthenticatedUser {
        username: "alice".to_string(),
        groups: groups.iter().map(|g| g.to_string()).collect(),
    })
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn unfiltered_listing_selects_everything() -> Result<()> {
    let query = DocumentFilterSet::new().filter(&user(&["g1"]), &HashMap::new())?;
    let sql = query.to_sql();
    assert_eq!(sql.query, "SELECT * FROM \"documents\"");
    assert!(sql.params.is_empty());
    Ok(())
}

#[test]
fn meta_and_category_filters_combine_with_and() -> Result<()> {
    let query = DocumentFilterSet::new().filter(
        &user(&["g1"]),
        &params(&[
            ("meta", r#"[{"key": "status", "value": "pending"}]"#),
            ("category", "invoices"),
        ]),
    )?;
    let sql = query.to_sql();
    assert!(sql.query.starts_with("SELECT * FROM \"documents\" WHERE "));
    assert!(sql.query.contains(" AND "));
    assert!(sql.query.contains("\"documents\".\"category_slug\" = $3"));
    assert_eq!(
        sql.params,
        vec![
            Value::String("status".into()),
            Value::String("pending".into()),
            Value::String("invoices".into()),
        ]
    );
    Ok(())
}

#[test]
fn tag_filter_narrows_once_per_tag() -> Result<()> {
    let query = DocumentFilterSet::new()
        .filter(&user(&["g1"]), &params(&[("tags", "urgent,reviewed")]))?;
    // One EXISTS over the join table per tag gives AND semantics
    assert_eq!(query.conditions().len(), 2);
    assert_eq!(query.params().len(), 2);
    let sql = query.to_count_sql();
    assert!(sql.query.starts_with("SELECT COUNT(*) as count FROM \"documents\""));
    Ok(())
}

#[test]
fn file_listing_reaches_document_meta_through_the_relation() -> Result<()> {
    let query = FileFilterSet::new().filter(
        &user(&["g1"]),
        &params(&[("document_meta", r#"[{"key": "year", "value": "2024"}]"#)]),
    )?;
    assert_eq!(query.conditions().len(), 1);
    assert!(query.conditions()[0].starts_with("EXISTS (SELECT 1 FROM \"documents\""));
    Ok(())
}

#[test]
fn tag_name_prefix_search_is_case_insensitive() -> Result<()> {
    let query = TagFilterSet::new().filter(&user(&["g1"]), &params(&[("name", "Inv")]))?;
    assert_eq!(query.conditions()[0], "\"tags\".\"name\" ILIKE $1");
    assert_eq!(query.params()[0], Value::String("Inv%".into()));
    Ok(())
}

#[test]
fn unknown_parameters_are_ignored() -> Result<()> {
    let query = CategoryFilterSet::new()
        .filter(&user(&["g1"]), &params(&[("page_size", "50"), ("ordering", "-name")]))?;
    assert!(query.conditions().is_empty());
    Ok(())
}

#[test]
fn invalid_meta_filter_rejects_the_whole_listing() {
    let err = DocumentFilterSet::new()
        .filter(&user(&["g1"]), &params(&[("meta", "not json")]))
        .unwrap_err();
    assert_eq!(err.to_string(), "filter value needs to be JSON encoded");
}

#[test]
fn disallowed_lookup_names_the_valid_set() {
    let err = DocumentFilterSet::new()
        .filter(
            &user(&["g1"]),
            &params(&[("meta", r#"[{"key": "k", "value": "v", "lookup": "regex"}]"#)]),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Lookup expression \"regex\" not allowed for field \"meta\". Valid expressions: \
         exact, iexact, contains, icontains, startswith, istartswith, lt, lte, gt, gte"
    );
}

#[test]
fn active_group_must_be_assigned_to_the_caller() {
    let result = DocumentFilterSet::new()
        .filter(&user(&["g1", "g2"]), &params(&[("active_group", "g2")]));
    assert!(result.is_ok());

    let err = DocumentFilterSet::new()
        .filter(&user(&["g1"]), &params(&[("active_group", "g9")]))
        .unwrap_err();
    assert!(matches!(err, FilterError::GroupNotAssigned(_)));
    assert_eq!(
        err.to_string(),
        "Active group 'g9' is not part of user's assigned groups"
    );
}

#[test]
fn anonymous_caller_cannot_claim_an_active_group() {
    let err = DocumentFilterSet::new()
        .filter(&RequestUser::Anonymous, &params(&[("active_group", "g1")]))
        .unwrap_err();
    assert!(matches!(err, FilterError::GroupNotAssigned(_)));
}
