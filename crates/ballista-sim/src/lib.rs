//! Trajectory simulation, live angle solving and firing-table building.
//!
//! The simulator and solver are pure functions over plain data. The table
//! builder drives a [`physics::PhysicsEngine`] one transition per frame;
//! [`physics::ArenaPhysics`] is a headless hecs-backed engine that applies
//! the same integration as the simulator.

pub mod builder;
pub mod physics;
pub mod probe;
pub mod solver;
pub mod systems;
pub mod trajectory;

pub use ballista_core as core;
pub use builder::{BuildPhase, BuildReport, BuilderConfig, TableBuilder};
pub use physics::{ArenaConfig, ArenaPhysics, PhysicsEngine};
pub use solver::{AngleSolver, SolverConfig};
pub use trajectory::{simulate, LaunchParams, Trajectory, TrajectoryEnd};
