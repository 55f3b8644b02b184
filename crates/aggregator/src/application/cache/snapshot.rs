use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use holdings_core::Entity;

use super::keys::ScopedKey;

struct Snapshot<T> {
    stamp: u64,
    rows: Arc<[T]>,
}

/// Stamped result sets for one key shape
pub(super) struct SnapshotMap<K, T> {
    entries: DashMap<K, Snapshot<T>>,
}

impl<K: ScopedKey, T> SnapshotMap<K, T> {
    pub(super) fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Rows cached under `key` if they were filled at generation `stamp`.
    /// A stale entry is evicted.
    pub(super) fn get(&self, key: &K, stamp: u64) -> Option<Arc<[T]>> {
        let stale = match self.entries.get(key) {
            Some(snapshot) if snapshot.stamp == stamp => return Some(Arc::clone(&snapshot.rows)),
            Some(_) => true,
            None => false,
        };
        if stale {
            self.entries.remove_if(key, |_, snapshot| snapshot.stamp != stamp);
        }
        None
    }

    /// Store `rows` filled at generation `stamp`, never replacing a newer fill
    pub(super) fn put(&self, key: K, stamp: u64, rows: Arc<[T]>) {
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().stamp <= stamp {
                    occupied.insert(Snapshot { stamp, rows });
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Snapshot { stamp, rows });
            }
        }
    }

    /// Drop every entry a trade for `entity` could affect
    pub(super) fn evict(&self, entity: Entity) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.affected_by(entity));
        before.saturating_sub(self.entries.len())
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(super) fn clear(&self) {
        self.entries.clear();
    }
}
