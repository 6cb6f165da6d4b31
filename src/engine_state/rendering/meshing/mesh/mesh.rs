//! Mesh data structures for voxel rendering.
//!
//! This module holds the GPU-friendly output of the mesher: faces with their vertex
//! and index buffers, split by how the renderer has to draw them.

use cgmath::Point3;

use super::face::Face;
use crate::engine_state::{rendering::Vertex, voxels::block::block_side::BlockSide};

/// Faces of one draw category together with their vertex and index buffers.
///
/// Every face contributes four vertices and two triangles.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FaceList {
    /// Faces in emission order
    pub faces: Vec<Face>,
    /// Four vertices per face, in the order of `faces`
    pub vertices: Vec<Vertex>,
    /// Six indices per face
    pub indices: Vec<u32>,
}

impl FaceList {
    /// Appends a face along with its vertices and indices.
    pub fn push(&mut self, face: Face) {
        let num_faces_generated = self.faces.len() as u32;
        self.vertices.extend(generate_face_vertices(&face));
        self.indices
            .extend(generate_face_indices(num_faces_generated));
        self.faces.push(face);
    }

    /// Number of faces.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Returns `true` if no face was emitted.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Returns `true` if the voxel at world coordinates `voxel` emitted its `side` face.
    pub fn contains(&self, voxel: Point3<i32>, side: BlockSide) -> bool {
        self.faces
            .iter()
            .any(|face| face.block_side == side && face.voxel() == voxel)
    }
}

/// Mesh of one chunk.
///
/// Opaque and translucent faces need different draw and blend treatment, so they are
/// kept in separate lists.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChunkMesh {
    /// Faces of every non-water block
    pub opaque: FaceList,
    /// Faces of water blocks
    pub translucent: FaceList,
}

impl ChunkMesh {
    /// Total number of faces in both lists.
    pub fn face_count(&self) -> usize {
        self.opaque.len() + self.translucent.len()
    }

    /// Returns `true` if neither list holds a face.
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.translucent.is_empty()
    }
}

/// Generates the four corner vertices of a face.
///
/// The vertices are ordered so that, combined with the indices from
/// [`generate_face_indices`], they form two triangles.
fn generate_face_vertices(face: &Face) -> [Vertex; 4] {
    [
        Vertex::new(face.ll, face.texture_index, 0.0, 1.0),
        Vertex::new(face.lr, face.texture_index, 1.0, 1.0),
        Vertex::new(face.ul, face.texture_index, 0.0, 0.0),
        Vertex::new(face.ur, face.texture_index, 1.0, 0.0),
    ]
}

/// Generates index data for a face, adjusted by the number of previously generated faces.
fn generate_face_indices(num_faces_generated: u32) -> [u32; 6] {
    let base = num_faces_generated * 4;
    [base, base + 1, base + 3, base, base + 3, base + 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_previous_faces() {
        let mut list = FaceList::default();
        list.push(Face::new(Point3::new(0, 0, 0), 1, BlockSide::Top, 3));
        list.push(Face::new(Point3::new(1, 0, 0), 1, BlockSide::Top, 3));
        assert_eq!(list.len(), 2);
        assert_eq!(list.vertices.len(), 8);
        assert_eq!(&list.indices[6..], &[4, 5, 7, 4, 7, 6]);
        assert!(list.indices.iter().all(|&i| (i as usize) < list.vertices.len()));
        assert!(list.contains(Point3::new(1, 0, 0), BlockSide::Top));
        assert!(!list.contains(Point3::new(1, 0, 0), BlockSide::Bottom));
    }
}
