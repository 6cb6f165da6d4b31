//! Rendering side of the voxel engine.
//!
//! This module turns chunk data into face lists, tracks the fade-in of freshly shown
//! chunks and defines the [`ChunkRenderer`] seam through which meshes leave the
//! engine. Drawing itself is up to the renderer implementation.

pub mod fade;
pub mod meshing;
mod vertex;

// Re-export commonly used types
pub use vertex::Vertex;

use std::collections::HashMap;

use log::{debug, info};

use meshing::ChunkMesh;

use super::voxels::chunk::ChunkPosition;

/// Receives chunk meshes from the engine.
///
/// Calls arrive on the coordinating thread, in the order the engine produces them.
pub trait ChunkRenderer {
    /// A chunk has a new mesh, replacing any previous one.
    fn upload_chunk(&mut self, position: ChunkPosition, mesh: &ChunkMesh);

    /// A chunk left view and its mesh should be dropped.
    fn remove_chunk(&mut self, position: ChunkPosition);

    /// A chunk's fade-in opacity changed.
    fn set_opacity(&mut self, position: ChunkPosition, opacity: f32);
}

/// Renderer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl ChunkRenderer for NullRenderer {
    fn upload_chunk(&mut self, _position: ChunkPosition, _mesh: &ChunkMesh) {}

    fn remove_chunk(&mut self, _position: ChunkPosition) {}

    fn set_opacity(&mut self, _position: ChunkPosition, _opacity: f32) {}
}

/// Renderer that logs what it is asked to draw and keeps running totals.
#[derive(Debug, Default, Clone)]
pub struct LoggingRenderer {
    /// Meshes uploaded since creation
    pub uploads: u64,
    /// Chunks removed since creation
    pub removals: u64,
    /// Faces currently uploaded, summed over every shown chunk
    pub faces: usize,
    shown: HashMap<ChunkPosition, usize>,
}

impl LoggingRenderer {
    /// Creates a renderer with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks with an uploaded mesh.
    pub fn shown_chunks(&self) -> usize {
        self.shown.len()
    }

    /// Logs a one-line summary of the renderer's state.
    pub fn log_summary(&self) {
        info!(
            "Renderer: {} chunks shown, {} faces, {} uploads, {} removals",
            self.shown.len(),
            self.faces,
            self.uploads,
            self.removals
        );
    }
}

impl ChunkRenderer for LoggingRenderer {
    fn upload_chunk(&mut self, position: ChunkPosition, mesh: &ChunkMesh) {
        let faces = mesh.face_count();
        let previous = self.shown.insert(position, faces).unwrap_or(0);
        self.faces = self.faces - previous + faces;
        self.uploads += 1;
        debug!(
            "Upload chunk ({}, {}): {} opaque, {} translucent faces",
            position.x,
            position.z,
            mesh.opaque.len(),
            mesh.translucent.len()
        );
    }

    fn remove_chunk(&mut self, position: ChunkPosition) {
        if let Some(faces) = self.shown.remove(&position) {
            self.faces -= faces;
            self.removals += 1;
            debug!("Remove chunk ({}, {})", position.x, position.z);
        }
    }

    fn set_opacity(&mut self, position: ChunkPosition, opacity: f32) {
        if opacity >= 1.0 {
            debug!("Chunk ({}, {}) fully faded in", position.x, position.z);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_side::BlockSide;
    use cgmath::Point3;
    use meshing::Face;

    #[test]
    fn logging_renderer_tracks_face_totals() {
        let mut mesh = ChunkMesh::default();
        mesh.opaque.push(Face::new(Point3::new(0, 0, 0), 1, BlockSide::Top, 0));
        mesh.translucent.push(Face::new(Point3::new(0, 1, 0), 5, BlockSide::Top, 6));

        let mut renderer = LoggingRenderer::new();
        let position = ChunkPosition::new(0, 0);
        renderer.upload_chunk(position, &mesh);
        renderer.upload_chunk(position, &mesh);
        assert_eq!(renderer.faces, 2);
        assert_eq!(renderer.uploads, 2);
        assert_eq!(renderer.shown_chunks(), 1);

        renderer.remove_chunk(position);
        renderer.remove_chunk(position);
        assert_eq!(renderer.faces, 0);
        assert_eq!(renderer.removals, 1);
    }
}
