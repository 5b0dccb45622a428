use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Character,
    Location,
    Object,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Character => "character",
            EntityType::Location => "location",
            EntityType::Object => "object",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "character" => Ok(EntityType::Character),
            "location" => Ok(EntityType::Location),
            "object" => Ok(EntityType::Object),
            other => Err(TypesError::UnknownVariant {
                kind: "entity type",
                value: other.to_string(),
            }),
        }
    }
}

/// Entity in its denormalized wire form: `[type, name, description, image_path]`
///
/// The backend stores and returns entity lists as JSON arrays of four slots,
/// so this is a tuple struct rather than a named record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTuple(pub EntityType, pub String, pub String, pub Option<String>);

impl EntityTuple {
    pub fn entity_type(&self) -> EntityType {
        self.0
    }

    pub fn name(&self) -> &str {
        &self.1
    }

    pub fn description(&self) -> &str {
        &self.2
    }

    pub fn image_path(&self) -> Option<&str> {
        self.3.as_deref()
    }
}

/// Named form of [`EntityTuple`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl From<EntityTuple> for Entity {
    fn from(tuple: EntityTuple) -> Self {
        let EntityTuple(entity_type, name, description, image_path) = tuple;
        Self {
            entity_type,
            name,
            description,
            image_path,
        }
    }
}

impl From<Entity> for EntityTuple {
    fn from(entity: Entity) -> Self {
        EntityTuple(
            entity.entity_type,
            entity.name,
            entity.description,
            entity.image_path,
        )
    }
}
