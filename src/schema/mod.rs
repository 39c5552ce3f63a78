//! Static schema registry for the document management entities.
//!
//! Filters validate lookup expressions and walk relation paths against this
//! table instead of reflecting over a live model graph. Each entity lists its
//! queryable fields (with the SQL column backing them) and its relations,
//! including how the relation is joined.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Category,
    Document,
    File,
    Tag,
}

impl Entity {
    pub fn name(&self) -> &'static str {
        match self {
            Entity::Category => "category",
            Entity::Document => "document",
            Entity::File => "file",
            Entity::Tag => "tag",
        }
    }
}

/// Named comparison operator applied during filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Exact,
    Iexact,
    Contains,
    Icontains,
    Startswith,
    Istartswith,
    In,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Lookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::Iexact => "iexact",
            Lookup::Contains => "contains",
            Lookup::Icontains => "icontains",
            Lookup::Startswith => "startswith",
            Lookup::Istartswith => "istartswith",
            Lookup::In => "in",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "exact" => Lookup::Exact,
            "iexact" => Lookup::Iexact,
            "contains" => Lookup::Contains,
            "icontains" => Lookup::Icontains,
            "startswith" => Lookup::Startswith,
            "istartswith" => Lookup::Istartswith,
            "in" => Lookup::In,
            "lt" => Lookup::Lt,
            "lte" => Lookup::Lte,
            "gt" => Lookup::Gt,
            "gte" => Lookup::Gte,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Slug,
    Uuid,
    Variant,
    Json,
}

impl FieldKind {
    /// Lookups allowed against a field of this kind
    pub fn valid_lookups(&self) -> &'static [Lookup] {
        use Lookup::*;
        match self {
            FieldKind::Text | FieldKind::Slug => &[
                Exact,
                Iexact,
                Contains,
                Icontains,
                Startswith,
                Istartswith,
                In,
            ],
            FieldKind::Uuid | FieldKind::Variant => &[Exact, In],
            FieldKind::Json => &[
                Exact,
                Iexact,
                Contains,
                Icontains,
                Startswith,
                Istartswith,
                Lt,
                Lte,
                Gt,
                Gte,
            ],
        }
    }
}

#[derive(Debug)]
pub struct FieldDef {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug)]
pub enum RelationKind {
    /// Local column points at the target's key column
    ForeignKey {
        column: &'static str,
        target_pk: &'static str,
    },
    /// Target rows point back at our key column
    Reverse {
        target_fk: &'static str,
        local_pk: &'static str,
    },
    /// Join table between our key and the target's key
    ManyToMany {
        join_table: &'static str,
        left_col: &'static str,
        right_col: &'static str,
        local_pk: &'static str,
        target_pk: &'static str,
    },
}

#[derive(Debug)]
pub struct RelationDef {
    pub name: &'static str,
    pub target: Entity,
    pub kind: RelationKind,
}

#[derive(Debug)]
pub struct EntityDef {
    pub entity: Entity,
    pub table: &'static str,
    pub pk: &'static str,
    pub fields: &'static [FieldDef],
    pub relations: &'static [RelationDef],
}

impl EntityDef {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        def(self.entity).fields.iter().find(|f| f.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&'static RelationDef> {
        def(self.entity).relations.iter().find(|r| r.name == name)
    }
}

static CATEGORY: EntityDef = EntityDef {
    entity: Entity::Category,
    table: "categories",
    pk: "slug",
    fields: &[
        FieldDef { name: "slug", column: "slug", kind: FieldKind::Slug },
        FieldDef { name: "name", column: "name", kind: FieldKind::Text },
        FieldDef { name: "description", column: "description", kind: FieldKind::Text },
        FieldDef { name: "color", column: "color", kind: FieldKind::Text },
        FieldDef { name: "meta", column: "meta", kind: FieldKind::Json },
    ],
    relations: &[RelationDef {
        name: "documents",
        target: Entity::Document,
        kind: RelationKind::Reverse { target_fk: "category_slug", local_pk: "slug" },
    }],
};

static DOCUMENT: EntityDef = EntityDef {
    entity: Entity::Document,
    table: "documents",
    pk: "id",
    fields: &[
        FieldDef { name: "id", column: "id", kind: FieldKind::Uuid },
        FieldDef { name: "title", column: "title", kind: FieldKind::Text },
        FieldDef { name: "description", column: "description", kind: FieldKind::Text },
        FieldDef { name: "category", column: "category_slug", kind: FieldKind::Slug },
        FieldDef { name: "meta", column: "meta", kind: FieldKind::Json },
    ],
    relations: &[
        RelationDef {
            name: "category",
            target: Entity::Category,
            kind: RelationKind::ForeignKey { column: "category_slug", target_pk: "slug" },
        },
        RelationDef {
            name: "tags",
            target: Entity::Tag,
            kind: RelationKind::ManyToMany {
                join_table: "document_tags",
                left_col: "document_id",
                right_col: "tag_slug",
                local_pk: "id",
                target_pk: "slug",
            },
        },
        RelationDef {
            name: "files",
            target: Entity::File,
            kind: RelationKind::Reverse { target_fk: "document_id", local_pk: "id" },
        },
    ],
};

static FILE: EntityDef = EntityDef {
    entity: Entity::File,
    table: "files",
    pk: "id",
    fields: &[
        FieldDef { name: "id", column: "id", kind: FieldKind::Uuid },
        FieldDef { name: "name", column: "name", kind: FieldKind::Text },
        FieldDef { name: "type", column: "variant", kind: FieldKind::Variant },
        FieldDef { name: "original", column: "original_id", kind: FieldKind::Uuid },
        FieldDef { name: "meta", column: "meta", kind: FieldKind::Json },
    ],
    relations: &[
        RelationDef {
            name: "document",
            target: Entity::Document,
            kind: RelationKind::ForeignKey { column: "document_id", target_pk: "id" },
        },
        RelationDef {
            name: "original",
            target: Entity::File,
            kind: RelationKind::ForeignKey { column: "original_id", target_pk: "id" },
        },
        RelationDef {
            name: "renderings",
            target: Entity::File,
            kind: RelationKind::Reverse { target_fk: "original_id", local_pk: "id" },
        },
    ],
};

static TAG: EntityDef = EntityDef {
    entity: Entity::Tag,
    table: "tags",
    pk: "slug",
    fields: &[
        FieldDef { name: "slug", column: "slug", kind: FieldKind::Slug },
        FieldDef { name: "name", column: "name", kind: FieldKind::Text },
        FieldDef { name: "description", column: "description", kind: FieldKind::Text },
        FieldDef { name: "meta", column: "meta", kind: FieldKind::Json },
    ],
    relations: &[RelationDef {
        name: "documents",
        target: Entity::Document,
        kind: RelationKind::ManyToMany {
            join_table: "document_tags",
            left_col: "tag_slug",
            right_col: "document_id",
            local_pk: "slug",
            target_pk: "id",
        },
    }],
};

pub fn def(entity: Entity) -> &'static EntityDef {
    match entity {
        Entity::Category => &CATEGORY,
        Entity::Document => &DOCUMENT,
        Entity::File => &FILE,
        Entity::Tag => &TAG,
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("unknown field \"{field}\" on {entity}")]
    UnknownField { entity: &'static str, field: String },

    #[error("unknown relation \"{relation}\" on {entity}")]
    UnknownRelation { entity: &'static str, relation: String },
}

/// Resolve a `__`-separated field path, walking relations until the terminal
/// field. Returns the relation hops in order plus the terminal field.
pub fn resolve_path(
    entity: Entity,
    path: &str,
) -> Result<(Vec<&'static RelationDef>, &'static FieldDef), SchemaError> {
    let segments: Vec<&str> = path.split("__").collect();
    let mut current = def(entity);
    let mut hops = Vec::new();

    for segment in &segments[..segments.len() - 1] {
        let relation = current.relation(segment).ok_or_else(|| SchemaError::UnknownRelation {
            entity: current.entity.name(),
            relation: segment.to_string(),
        })?;
        hops.push(relation);
        current = def(relation.target);
    }

    let last = segments[segments.len() - 1];
    let field = current.field(last).ok_or_else(|| SchemaError::UnknownField {
        entity: current.entity.name(),
        field: last.to_string(),
    })?;

    Ok((hops, field))
}
