//! State Machine Abstraction
//!
//! Command-driven interface over the allocation engine. A presentation layer
//! (forms, buttons, a script) builds validated [`Command`]s and feeds them to
//! [`StateMachine::apply`]; the structured [`CommandOutput`] carries both the
//! result and its status text.

use crate::deadlock::DeadlockStatus;
use crate::engine::{
    AllocationEngine, AllocationOutcome, Cleared, EngineState, ReleaseError, Released,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;

/// Abstract state machine driven by serializable commands.
///
/// # Type Parameters
///
/// - `Command`: The command type that modifies state
/// - `Output`: The result of applying a command
/// - `SnapshotData`: The serialized snapshot format
pub trait StateMachine: Send + Sync {
    /// The command type that modifies the state machine.
    type Command: Clone + Send + Sync + Serialize + DeserializeOwned + Debug;

    /// The output produced when applying a command.
    type Output: Clone + Send + Sync + Serialize + DeserializeOwned + Debug;

    /// The snapshot data format.
    type SnapshotData: Clone + Send + Sync + Serialize + DeserializeOwned;

    /// Applies a command to the state machine, returning the result.
    ///
    /// This method must be deterministic - the same command applied to the
    /// same state must always produce the same result.
    fn apply(&mut self, command: Self::Command) -> Self::Output;

    /// Creates a snapshot of the current state.
    fn snapshot(&self) -> Self::SnapshotData;

    /// Replaces the current state with a snapshot.
    fn restore(&mut self, snapshot: Self::SnapshotData);

    /// Returns the name of this state machine (for logging/metrics).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Rejected caller input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("{0} identifier must not be empty")]
    EmptyIdentifier(&'static str),
}

/// Commands accepted by the allocation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Allocate { process: String, resource: String },
    Release { process: String, resource: String },
    DetectDeadlock,
    ClearAll,
}

impl Command {
    /// Builds an allocate command from raw input, trimming both identifiers.
    pub fn allocate(process: &str, resource: &str) -> Result<Self, CommandError> {
        let (process, resource) = validate_pair(process, resource)?;
        Ok(Command::Allocate { process, resource })
    }

    /// Builds a release command from raw input, trimming both identifiers.
    pub fn release(process: &str, resource: &str) -> Result<Self, CommandError> {
        let (process, resource) = validate_pair(process, resource)?;
        Ok(Command::Release { process, resource })
    }
}

fn validate_pair(process: &str, resource: &str) -> Result<(String, String), CommandError> {
    let process = process.trim();
    let resource = resource.trim();
    if process.is_empty() {
        return Err(CommandError::EmptyIdentifier("process"));
    }
    if resource.is_empty() {
        return Err(CommandError::EmptyIdentifier("resource"));
    }
    Ok((process.to_string(), resource.to_string()))
}

/// Output for allocation-engine commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "result", rename_all = "snake_case")]
pub enum CommandOutput {
    Allocate(AllocationOutcome),
    Release(Result<Released, ReleaseError>),
    DetectDeadlock(DeadlockStatus),
    ClearAll(Cleared),
}

impl CommandOutput {
    /// Human-readable status line for this output.
    pub fn message(&self) -> String {
        match self {
            CommandOutput::Allocate(outcome) => outcome.to_string(),
            CommandOutput::Release(Ok(released)) => released.to_string(),
            CommandOutput::Release(Err(err)) => err.to_string(),
            CommandOutput::DetectDeadlock(status) => status.to_string(),
            CommandOutput::ClearAll(cleared) => cleared.to_string(),
        }
    }
}

impl StateMachine for AllocationEngine {
    type Command = Command;
    type Output = CommandOutput;
    type SnapshotData = EngineState;

    fn apply(&mut self, command: Self::Command) -> Self::Output {
        match command {
            Command::Allocate { process, resource } => {
                CommandOutput::Allocate(self.allocate(&process, &resource))
            }
            Command::Release { process, resource } => {
                CommandOutput::Release(self.release(&process, &resource))
            }
            Command::DetectDeadlock => CommandOutput::DetectDeadlock(self.detect_deadlock()),
            Command::ClearAll => CommandOutput::ClearAll(self.clear_all()),
        }
    }

    fn snapshot(&self) -> Self::SnapshotData {
        self.export_state()
    }

    fn restore(&mut self, snapshot: Self::SnapshotData) {
        self.import_state(snapshot);

        tracing::info!(sm = self.name(), edges = self.graph().edge_count(), "Restored from snapshot");
    }

    fn name(&self) -> &str {
        "AllocationEngine"
    }
}

// ============================================================================
// TESTS
// ============================================================================
