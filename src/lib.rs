//! Resource Allocation Graph
//!
//! This crate models single-instance resources held and requested by
//! processes, and detects deadlocks as cycles that mix holds and waits.

pub mod builder;
pub mod deadlock;
pub mod engine;
pub mod graph;
mod manager;
pub mod metrics;
pub mod state_machine;

pub use builder::EngineBuilder;
pub use deadlock::{DeadlockCycle, DeadlockReport, DeadlockStatus, DetectionError};
pub use engine::{
    AllocationEngine, AllocationOutcome, Cleared, EngineConfig, GraphView, NodeRole, ReleaseError,
    Released,
};
pub use graph::{Edge, EdgeKind, Node};
pub use manager::AllocationManager;
pub use state_machine::{Command, CommandOutput, StateMachine};
