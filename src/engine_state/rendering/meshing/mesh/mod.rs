//! Mesh output of the chunk mesher.
//!
//! # Architecture
//! - [`ChunkMesh`]: The opaque and translucent face lists of one chunk
//! - [`FaceList`]: Faces of one draw category with their vertex and index buffers
//! - [`Face`]: A single quad on one side of a voxel

mod face;
mod mesh;

pub use face::Face;
pub use mesh::*;
