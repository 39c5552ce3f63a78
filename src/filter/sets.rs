use std::collections::HashMap;

use super::csv::{CharFilter, PkInFilter, TagsFilter};
use super::error::FilterError;
use super::group::ActiveGroupFilter;
use super::json_value::JsonValueFilter;
use super::query::Query;
use crate::auth::RequestUser;
use crate::schema::{Entity, Lookup};

/// Declarative composition of the filters each entity listing accepts.
/// Unknown query parameters are ignored; recognized ones narrow the query in
/// a fixed order.

pub struct CategoryFilterSet {
    meta: JsonValueFilter,
    active_group: ActiveGroupFilter,
}

impl CategoryFilterSet {
    pub fn new() -> Self {
        Self {
            meta: JsonValueFilter::new("meta"),
            active_group: ActiveGroupFilter,
        }
    }

    pub fn filter(
        &self,
        user: &RequestUser,
        params: &HashMap<String, String>,
    ) -> Result<Query, FilterError> {
        let mut query = Query::new(Entity::Category);
        if let Some(v) = params.get("active_group") {
            self.active_group.apply(user, v)?;
        }
        if let Some(v) = params.get("meta") {
            self.meta.apply(&mut query, v)?;
        }
        Ok(query)
    }
}

impl Default for CategoryFilterSet {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DocumentFilterSet {
    meta: JsonValueFilter,
    active_group: ActiveGroupFilter,
    category: CharFilter,
    tags: TagsFilter,
}

impl DocumentFilterSet {
    pub fn new() -> Self {
        Self {
            meta: JsonValueFilter::new("meta"),
            active_group: ActiveGroupFilter,
            category: CharFilter::new("category"),
            tags: TagsFilter,
        }
    }

    pub fn filter(
        &self,
        user: &RequestUser,
        params: &HashMap<String, String>,
    ) -> Result<Query, FilterError> {
        let mut query = Query::new(Entity::Document);
        if let Some(v) = params.get("active_group") {
            self.active_group.apply(user, v)?;
        }
        if let Some(v) = params.get("meta") {
            self.meta.apply(&mut query, v)?;
        }
        if let Some(v) = params.get("category") {
            self.category.apply(&mut query, v)?;
        }
        if let Some(v) = params.get("tags") {
            self.tags.apply(&mut query, v)?;
        }
        Ok(query)
    }
}

impl Default for DocumentFilterSet {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FileFilterSet {
    meta: JsonValueFilter,
    document_meta: JsonValueFilter,
    active_group: ActiveGroupFilter,
    original: CharFilter,
    renderings: CharFilter,
    variant: CharFilter,
    files: PkInFilter,
}

impl FileFilterSet {
    pub fn new() -> Self {
        Self {
            meta: JsonValueFilter::new("meta"),
            document_meta: JsonValueFilter::new("document__meta"),
            active_group: ActiveGroupFilter,
            original: CharFilter::new("original"),
            renderings: CharFilter::new("renderings__id"),
            variant: CharFilter::new("type"),
            files: PkInFilter,
        }
    }

    pub fn filter(
        &self,
        user: &RequestUser,
        params: &HashMap<String, String>,
    ) -> Result<Query, FilterError> {
        let mut query = Query::new(Entity::File);
        if let Some(v) = params.get("active_group") {
            self.active_group.apply(user, v)?;
        }
        if let Some(v) = params.get("meta") {
            self.meta.apply(&mut query, v)?;
        }
        if let Some(v) = params.get("document_meta") {
            self.document_meta.apply(&mut query, v)?;
        }
        if let Some(v) = params.get("original") {
            self.original.apply(&mut query, v)?;
        }
        if let Some(v) = params.get("renderings") {
            self.renderings.apply(&mut query, v)?;
        }
        if let Some(v) = params.get("type") {
            self.variant.apply(&mut query, v)?;
        }
        if let Some(v) = params.get("files") {
            self.files.apply(&mut query, v)?;
        }
        Ok(query)
    }
}

impl Default for FileFilterSet {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TagFilterSet {
    meta: JsonValueFilter,
    active_group: ActiveGroupFilter,
    with_documents_in_category: CharFilter,
    with_documents_meta: JsonValueFilter,
    name: CharFilter,
}

impl TagFilterSet {
    pub fn new() -> Self {
        Self {
            meta: JsonValueFilter::new("meta"),
            active_group: ActiveGroupFilter,
            with_documents_in_category: CharFilter::new("documents__category__slug"),
            with_documents_meta: JsonValueFilter::new("documents__meta"),
            name: CharFilter::new("name").with_lookup(Lookup::Istartswith),
        }
    }

    pub fn filter(
        &self,
        user: &RequestUser,
        params: &HashMap<String, String>,
    ) -> Result<Query, FilterError> {
        let mut query = Query::new(Entity::Tag);
        if let Some(v) = params.get("active_group") {
            self.active_group.apply(user, v)?;
        }
        if let Some(v) = params.get("meta") {
            self.meta.apply(&mut query, v)?;
        }
        if let Some(v) = params.get("with_documents_in_category") {
            self.with_documents_in_category.apply(&mut query, v)?;
        }
        if let Some(v) = params.get("with_documents_meta") {
            self.with_documents_meta.apply(&mut query, v)?;
        }
        if let Some(v) = params.get("name") {
            self.name.apply(&mut query, v)?;
        }
        Ok(query)
    }
}

impl Default for TagFilterSet {
    fn default() -> Self {
        Self::new()
    }
}
