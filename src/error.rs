//! Construction-time error taxonomy for the core.
//!
//! Execution never fails: arithmetic overflow is reported through flags, and an
//! unrecognized opcode halts the CPU rather than raising (see `cpu::decode`).

use thiserror::Error;

/// Errors that can occur while assembling a [`crate::core::Core`] via
/// [`crate::core::CoreBuilder`].
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("core requires a memory collaborator")]
    MissingMemory,
    #[error("core requires a port collaborator")]
    MissingPorts,
}
