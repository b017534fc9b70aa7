//! Runtime firing-table access.
//!
//! Tables are JSON files, one per world, produced offline by the builder.
//! At runtime a [`TableCache`] loads each world's table at most once and
//! answers snapped grid lookups; an [`AngleProvider`] chooses between table
//! lookup and live solving.

pub mod cache;
pub mod format;
pub mod provider;
pub mod source;

pub use ballista_core as core;
pub use cache::TableCache;
pub use provider::AngleProvider;
pub use source::{DirTableSource, MemoryTableSource, TableSource};

#[cfg(test)]
mod tests;
