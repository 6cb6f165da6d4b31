//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which fills a chunk buffer with
//! procedurally generated terrain on a worker thread.

use std::sync::Arc;

use crate::engine_state::{
    task_management::task::{Task, TaskOutput},
    voxels::{
        chunk::{ChunkBuffer, ChunkPosition},
        generation::TerrainGenerator,
    },
};

/// A task that generates one chunk into a caller-supplied buffer.
///
/// The buffer moves into the task, is filled in place on the worker and moves back
/// with the [`TaskOutput`], so the voxel data is never copied.
pub struct ChunkGenerationTask {
    /// Shared, immutable generator
    generator: Arc<TerrainGenerator>,
    /// The position of the chunk to generate (in chunk coordinates)
    position: ChunkPosition,
    /// Buffer receiving the voxels
    destination: ChunkBuffer,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `generator` - Generator shared by all workers
    /// * `position` - The chunk coordinates to generate
    /// * `destination` - Buffer that will hold the result
    pub fn new(
        generator: Arc<TerrainGenerator>,
        position: ChunkPosition,
        destination: ChunkBuffer,
    ) -> Self {
        ChunkGenerationTask {
            generator,
            position,
            destination,
        }
    }
}

impl Task for ChunkGenerationTask {
    fn position(&self) -> ChunkPosition {
        self.position
    }

    fn process(self: Box<Self>) -> TaskOutput {
        let ChunkGenerationTask {
            generator,
            position,
            mut destination,
        } = *self;
        let result = generator
            .generate_into(position, &mut destination)
            .map(|_| destination);
        TaskOutput { position, result }
    }
}
