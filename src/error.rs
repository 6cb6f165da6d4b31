//! # Error Types
//!
//! Error taxonomy for the voxel world engine.
//!
//! * [`StoreError`] - persistence failures. The chunk manager recovers from these locally
//!   by treating the chunk as absent, they never abort chunk admission.
//! * [`GenerationError`] - a generation task that failed or was cancelled. Delivered to the
//!   callers waiting on that task only.
//! * [`ConfigError`] - invalid or unreadable engine configuration.
//! * [`EngineError`] - anything that can stop the engine from starting.
//!
//! Bounds violations on voxel coordinates are not errors: reads return air and writes
//! report `false`.

use thiserror::Error;

/// Failure reported by a [`ChunkStore`](crate::engine_state::voxels::store::ChunkStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying storage could not be read or written.
    #[error("store i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// A stored chunk did not have the expected voxel count.
    #[error("stored chunk has {actual} bytes, expected {expected}")]
    CorruptChunk {
        /// Number of bytes a chunk must contain
        expected: usize,
        /// Number of bytes that were actually read
        actual: usize,
    },

    /// World metadata could not be encoded or decoded.
    #[error("world metadata is malformed: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Failure delivered through a [`GenerationTicket`](crate::engine_state::task_management::GenerationTicket).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The worker pool was torn down before the task finished.
    #[error("chunk generation was cancelled")]
    Cancelled,

    /// The worker running the task stopped responding.
    #[error("generation worker disconnected")]
    WorkerDisconnected,

    /// The destination buffer handed to the generator has the wrong size.
    #[error("destination buffer has {actual} voxels, expected {expected}")]
    InvalidBuffer {
        /// Voxel count of a chunk
        expected: usize,
        /// Length of the supplied buffer
        actual: usize,
    },

    /// The task panicked while generating.
    #[error("chunk generation failed: {0}")]
    Failed(String),
}

/// Failure while loading or validating an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for the expected shape.
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that prevent the engine from starting.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration problem
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The persistence collaborator could not be opened
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A generation worker thread could not be spawned
    #[error("failed to spawn generation worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}
