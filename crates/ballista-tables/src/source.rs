//! Where firing tables come from.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use ballista_core::error::BallisticsError;
use ballista_core::table::FiringTable;

use crate::format;

// Port for loading a world's firing table.
#[async_trait]
pub trait TableSource: Send + Sync {
    /// `Ok(None)` when the world has no table at all.
    async fn load(&self, world_id: &str) -> Result<Option<FiringTable>, BallisticsError>;
}

/// Reads `<world_id>.json` files from one directory.
#[derive(Debug, Clone)]
pub struct DirTableSource {
    dir: PathBuf,
}

impl DirTableSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl TableSource for DirTableSource {
    async fn load(&self, world_id: &str) -> Result<Option<FiringTable>, BallisticsError> {
        let path = format::table_path(&self.dir, world_id)?;
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BallisticsError::TableLoad {
                    world: world_id.to_string(),
                    reason: format!("{}: {e}", path.display()),
                })
            }
        };
        format::parse(&json)
            .map(Some)
            .map_err(|e| BallisticsError::TableLoad {
                world: world_id.to_string(),
                reason: format!("{}: {e}", path.display()),
            })
    }
}

/// Tables held in memory, keyed by world id.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableSource {
    tables: HashMap<String, FiringTable>,
}

impl MemoryTableSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, world_id: impl Into<String>, table: FiringTable) -> Self {
        self.insert(world_id, table);
        self
    }

    pub fn insert(&mut self, world_id: impl Into<String>, table: FiringTable) {
        self.tables.insert(world_id.into(), table);
    }
}

#[async_trait]
impl TableSource for MemoryTableSource {
    async fn load(&self, world_id: &str) -> Result<Option<FiringTable>, BallisticsError> {
        Ok(self.tables.get(world_id).cloned())
    }
}
