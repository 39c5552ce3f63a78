use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::schema::Entity;

/// Arbitrary key -> JSON value attribute bag stored per entity
pub type Meta = Map<String, Value>;

/// Audit fields shared by every writable entity. The group fields are
/// validated against the caller's group set; the user fields are stamped,
/// never client-supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFields {
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub created_by_user: Option<String>,
    pub modified_by_user: Option<String>,
    pub created_by_group: Option<String>,
    pub modified_by_group: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileVariant {
    Original,
    Thumbnail,
}

impl FileVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileVariant::Original => "original",
            FileVariant::Thumbnail => "thumbnail",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub meta: Meta,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Category {
    pub const ENTITY: Entity = Entity::Category;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub meta: Meta,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Tag {
    pub const ENTITY: Entity = Entity::Tag;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub meta: Meta,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl Document {
    pub const ENTITY: Entity = Entity::Document;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub variant: FileVariant,
    /// The file this one was rendered from; unset iff variant is original
    #[serde(default)]
    pub original: Option<Uuid>,
    pub document: Uuid,
    #[serde(default)]
    pub meta: Meta,
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl File {
    pub const ENTITY: Entity = Entity::File;
}
