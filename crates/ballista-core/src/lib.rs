//! Core types and definitions for the Ballista targeting system.
//!
//! This crate defines the vocabulary shared across all other crates:
//! world profiles, trajectory samples, launch solutions, the lookup grid,
//! firing tables, errors and tuning constants. It has no dependency on a
//! physics engine or async runtime.

pub mod constants;
pub mod error;
pub mod grid;
pub mod profile;
pub mod table;
pub mod types;

pub use error::BallisticsError;
pub use grid::GridCell;
pub use profile::WorldProfile;
pub use table::FiringTable;
