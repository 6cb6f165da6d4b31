use cgmath::Point3;

use crate::engine_state::voxels::block::{block_side::BlockSide, BlockTypeSize};

/// Represents a single quad face of a voxel in the mesh.
///
/// A face is defined by four corner points (lower-left, lower-right, upper-right,
/// upper-left) in world block coordinates, wound so the quad faces away from the
/// block it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Lower-left corner of the face
    pub ll: Point3<i32>,
    /// Lower-right corner of the face
    pub lr: Point3<i32>,
    /// Upper-left corner of the face
    pub ul: Point3<i32>,
    /// Upper-right corner of the face
    pub ur: Point3<i32>,
    /// The block the face belongs to
    pub block: BlockTypeSize,
    /// Which side of the block this face represents
    pub block_side: BlockSide,
    /// Texture the face is drawn with
    pub texture_index: u32,
}

impl Face {
    /// Creates the face of the voxel whose minimum corner is `origin`.
    ///
    /// # Arguments
    /// * `origin` - World coordinates of the voxel
    /// * `block` - Code of the block the face belongs to
    /// * `block_side` - Which side of the block this face represents
    /// * `texture_index` - Texture the face is drawn with
    pub fn new(
        origin: Point3<i32>,
        block: BlockTypeSize,
        block_side: BlockSide,
        texture_index: u32,
    ) -> Self {
        let (i, j, k) = (origin.x, origin.y, origin.z);
        let [ll, lr, ul, ur] = match block_side {
            BlockSide::Front => [
                Point3::new(i, j, k),
                Point3::new(i, j, k + 1),
                Point3::new(i, j + 1, k),
                Point3::new(i, j + 1, k + 1),
            ],
            BlockSide::Back => [
                Point3::new(i + 1, j, k + 1),
                Point3::new(i + 1, j, k),
                Point3::new(i + 1, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k),
            ],
            BlockSide::Bottom => [
                Point3::new(i, j, k + 1),
                Point3::new(i, j, k),
                Point3::new(i + 1, j, k + 1),
                Point3::new(i + 1, j, k),
            ],
            BlockSide::Top => [
                Point3::new(i, j + 1, k),
                Point3::new(i, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k),
                Point3::new(i + 1, j + 1, k + 1),
            ],
            BlockSide::Left => [
                Point3::new(i + 1, j, k),
                Point3::new(i, j, k),
                Point3::new(i + 1, j + 1, k),
                Point3::new(i, j + 1, k),
            ],
            BlockSide::Right => [
                Point3::new(i, j, k + 1),
                Point3::new(i + 1, j, k + 1),
                Point3::new(i, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k + 1),
            ],
        };
        Face {
            ll,
            lr,
            ul,
            ur,
            block,
            block_side,
            texture_index,
        }
    }

    /// World coordinates of the voxel this face belongs to.
    pub fn voxel(&self) -> Point3<i32> {
        let corners = [self.ll, self.lr, self.ul, self.ur];
        let min = |axis: fn(&Point3<i32>) -> i32| corners.iter().map(axis).min().unwrap_or(0);
        let base = Point3::new(min(|p| p.x), min(|p| p.y), min(|p| p.z));
        match self.block_side {
            BlockSide::Back => Point3::new(base.x - 1, base.y, base.z),
            BlockSide::Top => Point3::new(base.x, base.y - 1, base.z),
            BlockSide::Right => Point3::new(base.x, base.y, base.z - 1),
            _ => base,
        }
    }
}
