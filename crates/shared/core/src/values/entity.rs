use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

const WILDCARD: &str = "all";

/// Business unit a trade is booked against.
///
/// Variant order matches the lexical order of the wire names, so sorting by
/// `Entity` and sorting by its string form agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    NewYork,
    Zurich,
}

impl Entity {
    /// Every concrete entity, in sort order
    pub const ALL: [Entity; 2] = [Entity::NewYork, Entity::Zurich];

    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::NewYork => "new_york",
            Entity::Zurich => "zurich",
        }
    }

    /// Dense index into per-entity tables
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Entity {
    type Err = ValidationError;

    /// Case-insensitive, whitespace-trimmed. Rejects the `all` wildcard.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match EntityScope::from_str(s)? {
            EntityScope::Entity(entity) => Ok(entity),
            EntityScope::All => Err(ValidationError::WildcardEntity),
        }
    }
}

/// Entity filter used by queries: either every entity or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityScope {
    #[default]
    All,
    Entity(Entity),
}

impl EntityScope {
    /// Parse a query parameter. Empty input and `all` mean no filter.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "" | WILDCARD => Ok(EntityScope::All),
            "zurich" => Ok(EntityScope::Entity(Entity::Zurich)),
            "new_york" => Ok(EntityScope::Entity(Entity::NewYork)),
            _ => Err(ValidationError::UnknownEntity(raw.trim().to_string())),
        }
    }

    /// The concrete entity, or `None` for the wildcard
    pub fn entity(&self) -> Option<Entity> {
        match self {
            EntityScope::All => None,
            EntityScope::Entity(entity) => Some(*entity),
        }
    }

    /// Whether data booked against `entity` is visible through this scope
    pub fn covers(&self, entity: Entity) -> bool {
        match self {
            EntityScope::All => true,
            EntityScope::Entity(own) => *own == entity,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityScope::All => WILDCARD,
            EntityScope::Entity(entity) => entity.as_str(),
        }
    }
}

impl From<Entity> for EntityScope {
    fn from(entity: Entity) -> Self {
        EntityScope::Entity(entity)
    }
}

impl From<Option<Entity>> for EntityScope {
    fn from(entity: Option<Entity>) -> Self {
        entity.map_or(EntityScope::All, EntityScope::Entity)
    }
}

impl FromStr for EntityScope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityScope::parse(s)
    }
}

impl fmt::Display for EntityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_parse_is_case_insensitive_and_trimmed() {
        assert_eq!(" Zurich ".parse::<Entity>(), Ok(Entity::Zurich));
        assert_eq!("NEW_YORK".parse::<Entity>(), Ok(Entity::NewYork));
    }

    #[test]
    fn test_entity_rejects_wildcard() {
        assert_eq!("all".parse::<Entity>(), Err(ValidationError::WildcardEntity));
        assert_eq!("".parse::<Entity>(), Err(ValidationError::WildcardEntity));
    }

    #[test]
    fn test_entity_rejects_unknown() {
        assert_eq!(
            "london".parse::<Entity>(),
            Err(ValidationError::UnknownEntity("london".to_string()))
        );
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!(EntityScope::parse(""), Ok(EntityScope::All));
        assert_eq!(EntityScope::parse("  ALL "), Ok(EntityScope::All));
        assert_eq!(
            EntityScope::parse("zurich"),
            Ok(EntityScope::Entity(Entity::Zurich))
        );
        assert!(EntityScope::parse("london").is_err());
    }

    #[test]
    fn test_scope_covers() {
        assert!(EntityScope::All.covers(Entity::Zurich));
        assert!(EntityScope::Entity(Entity::Zurich).covers(Entity::Zurich));
        assert!(!EntityScope::Entity(Entity::Zurich).covers(Entity::NewYork));
    }

    #[test]
    fn test_entity_order_matches_wire_names() {
        let mut names: Vec<&str> = Entity::ALL.iter().map(Entity::as_str).collect();
        names.sort();
        let ordered: Vec<&str> = Entity::ALL.iter().map(Entity::as_str).collect();
        assert_eq!(names, ordered);
    }

    #[test]
    fn test_entity_serde_uses_wire_names() {
        let json = serde_json::to_string(&Entity::NewYork).unwrap();
        assert_eq!(json, "\"new_york\"");
    }
}
