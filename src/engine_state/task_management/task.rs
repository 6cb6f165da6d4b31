//! # Task Module
//!
//! Units of work executed on the generation worker pool.

use crate::{
    engine_state::voxels::chunk::{ChunkBuffer, ChunkPosition},
    error::GenerationError,
};

/// A unit of work sent to a worker thread.
///
/// Tasks own everything they touch. A task is consumed by `process` and hands its
/// output back to the coordinating thread through the worker's result channel.
pub trait Task: Send {
    /// Chunk this task produces.
    fn position(&self) -> ChunkPosition;

    /// Runs the task on the worker thread.
    fn process(self: Box<Self>) -> TaskOutput;
}

/// What a worker sends back once a task finishes.
#[derive(Debug)]
pub struct TaskOutput {
    /// Chunk the task was producing
    pub position: ChunkPosition,
    /// The filled destination buffer, or why it could not be filled
    pub result: Result<ChunkBuffer, GenerationError>,
}
