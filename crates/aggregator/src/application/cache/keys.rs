use std::hash::Hash;

use holdings_core::{Entity, EntityScope, TradeLimit};

/// Key shapes whose validity depends on an entity scope
pub trait ScopedKey: Clone + Eq + Hash + Send + Sync + 'static {
    fn scope(&self) -> EntityScope;

    /// Whether a trade for `entity` could change the result behind this key
    fn affected_by(&self, entity: Entity) -> bool {
        self.scope().covers(entity)
    }
}

/// Holdings query: everything, or one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HoldingsKey {
    pub scope: EntityScope,
}

impl HoldingsKey {
    pub fn new(scope: EntityScope) -> Self {
        Self { scope }
    }

    pub fn all() -> Self {
        Self::new(EntityScope::All)
    }

    pub fn entity(entity: Entity) -> Self {
        Self::new(EntityScope::Entity(entity))
    }
}

impl ScopedKey for HoldingsKey {
    fn scope(&self) -> EntityScope {
        self.scope
    }
}

/// Trade history page. Distinct limits are distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TradesKey {
    pub scope: EntityScope,
    pub limit: TradeLimit,
}

impl TradesKey {
    pub fn new(scope: EntityScope, limit: TradeLimit) -> Self {
        Self { scope, limit }
    }
}

impl ScopedKey for TradesKey {
    fn scope(&self) -> EntityScope {
        self.scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_key_affected_only_by_its_entity() {
        let key = HoldingsKey::entity(Entity::Zurich);
        assert!(key.affected_by(Entity::Zurich));
        assert!(!key.affected_by(Entity::NewYork));
    }

    #[test]
    fn test_all_key_affected_by_every_entity() {
        let key = TradesKey::new(EntityScope::All, TradeLimit::default());
        for entity in Entity::ALL {
            assert!(key.affected_by(entity));
        }
    }

    #[test]
    fn test_limits_are_distinct_keys() {
        let a = TradesKey::new(EntityScope::All, TradeLimit::new(10));
        let b = TradesKey::new(EntityScope::All, TradeLimit::new(20));
        assert_ne!(a, b);
    }
}
