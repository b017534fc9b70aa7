//! ECS systems that operate on the arena world each step.
//!
//! Systems are plain functions over `&mut World`. They do not own state;
//! all state lives in components.

pub mod drag;
pub mod ground;
pub mod gravity;
pub mod movement;
