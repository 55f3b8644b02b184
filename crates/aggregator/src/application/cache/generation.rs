use std::sync::atomic::{AtomicU64, Ordering};

use holdings_core::{Entity, EntityScope};

/// Per-entity write generations.
///
/// A scope's stamp changes whenever a trade for any entity it covers is
/// applied. The `All` stamp is the sum of every entity's counter, so it
/// moves with each of them.
#[derive(Debug)]
pub struct Generations {
    counters: [AtomicU64; Entity::ALL.len()],
}

impl Generations {
    pub fn new() -> Self {
        Self {
            counters: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    pub fn stamp(&self, scope: EntityScope) -> u64 {
        match scope {
            EntityScope::Entity(entity) => self.counters[entity.index()].load(Ordering::Acquire),
            EntityScope::All => self
                .counters
                .iter()
                .fold(0u64, |acc, c| acc.wrapping_add(c.load(Ordering::Acquire))),
        }
    }

    pub fn bump(&self, entity: Entity) {
        self.counters[entity.index()].fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for Generations {
    fn default() -> Self {
        Self::new()
    }
}
