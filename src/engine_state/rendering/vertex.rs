//! Vertex data handed to the renderer.
//!
//! Vertices are plain `#[repr(C)]` values so a renderer can upload a face list with
//! `bytemuck::cast_slice` and no further conversion.

use cgmath::Point3;

/// A vertex of a block face.
///
/// # Memory Layout
/// - Position: 3x i32 (12 bytes)
/// - Texture Index: u32 (4 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
///
/// Total size: 24 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// X coordinate in world space
    pub x: i32,
    /// Y coordinate in world space
    pub y: i32,
    /// Z coordinate in world space
    pub z: i32,
    /// Index of the texture in the texture array
    pub texture_index: u32,
    /// UV texture coordinates (normalized 0.0-1.0)
    pub tex_coords: [f32; 2],
}

impl Vertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `pos` - The position of the vertex in world space
    /// * `texture_index` - Index of the texture in the texture array
    /// * `u` - U texture coordinate
    /// * `v` - V texture coordinate
    pub fn new(pos: Point3<i32>, texture_index: u32, u: f32, v: f32) -> Self {
        Vertex {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            texture_index,
            tex_coords: [u, v],
        }
    }

    /// World-space position of the vertex.
    pub fn position(&self) -> Point3<i32> {
        Point3::new(self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_cast_to_bytes() {
        let vertices = [
            Vertex::new(Point3::new(1, 2, 3), 4, 0.0, 1.0),
            Vertex::new(Point3::new(-1, 0, 5), 7, 1.0, 0.0),
        ];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 2 * std::mem::size_of::<Vertex>());
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        let back: &[Vertex] = bytemuck::cast_slice(bytes);
        assert_eq!(back[1].position(), Point3::new(-1, 0, 5));
    }
}
