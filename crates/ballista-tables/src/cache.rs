//! Memoized per-world firing tables.
//!
//! Each world id owns a `OnceCell` slot. Concurrent lookups for a world that
//! is not loaded yet wait on the same in-flight load. A load that fails
//! leaves the slot empty so the next lookup tries again; a world with no
//! table is remembered as such.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::DVec2;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use ballista_core::error::BallisticsError;
use ballista_core::table::FiringTable;

use crate::source::{DirTableSource, TableSource};

type Slot = Arc<OnceCell<Option<Arc<FiringTable>>>>;

/// Shared, lazily loaded firing tables.
pub struct TableCache {
    source: Arc<dyn TableSource>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl TableCache {
    pub fn new(source: Arc<dyn TableSource>) -> Self {
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Cache over `<world_id>.json` files in `dir`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(DirTableSource::new(dir)))
    }

    /// The world's table, loading it on first use.
    pub async fn table(&self, world_id: &str) -> Result<Option<Arc<FiringTable>>, BallisticsError> {
        let slot = self.slot(world_id);
        slot.get_or_try_init(|| async move {
            let table = self.source.load(world_id).await?;
            match &table {
                Some(table) => info!(world = world_id, cells = table.len(), "firing table loaded"),
                None => info!(world = world_id, "no firing table for world"),
            }
            Ok::<_, BallisticsError>(table.map(Arc::new))
        })
        .await
        .cloned()
    }

    /// Angles (radians) that reach `target` in `world_id`. Empty when the
    /// world has no table, the cell has no entry, or loading failed.
    pub async fn lookup(&self, world_id: &str, target: DVec2) -> Vec<f64> {
        match self.table(world_id).await {
            Ok(Some(table)) => table.lookup(target.x, target.y),
            Ok(None) => Vec::new(),
            Err(error) => {
                warn!(world = world_id, %error, "firing table unavailable, lookup empty");
                Vec::new()
            }
        }
    }

    /// Like [`lookup`](Self::lookup) but never waits. `None` while the table
    /// is not loaded or its load is still in flight.
    pub fn lookup_ready(&self, world_id: &str, target: DVec2) -> Option<Vec<f64>> {
        let slot = self.slots().get(world_id)?.clone();
        let loaded = slot.get()?;
        Some(
            loaded
                .as_ref()
                .map(|table| table.lookup(target.x, target.y))
                .unwrap_or_default(),
        )
    }

    /// Load a world's table ahead of use. Returns whether the world has one.
    pub async fn preload(&self, world_id: &str) -> Result<bool, BallisticsError> {
        Ok(self.table(world_id).await?.is_some())
    }

    /// Whether a load for `world_id` has completed, with or without a table.
    pub fn is_loaded(&self, world_id: &str) -> bool {
        self.slots()
            .get(world_id)
            .is_some_and(|slot| slot.initialized())
    }

    /// Forget a world's table so the next lookup reads it again.
    pub fn invalidate(&self, world_id: &str) {
        self.slots().remove(world_id);
    }

    fn slot(&self, world_id: &str) -> Slot {
        self.slots()
            .entry(world_id.to_string())
            .or_default()
            .clone()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
