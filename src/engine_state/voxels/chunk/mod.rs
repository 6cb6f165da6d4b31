//! # Chunk Module
//!
//! This module provides the `Chunk` struct and the coordinate types used to address
//! chunks and the voxels inside them.
//!
//! ## Layout
//!
//! A chunk is a column of `CHUNK_SIZE_X × CHUNK_HEIGHT × CHUNK_SIZE_Z` voxels stored as a
//! flat byte buffer, one block code per voxel. The index of local position `(x, y, z)` is
//! `x + z * CHUNK_SIZE_X + y * CHUNK_SIZE_X * CHUNK_SIZE_Z`, so each horizontal layer is
//! contiguous. The same layout is used on disk.

use serde::{Deserialize, Serialize};

use super::block::{BlockTypeSize, AIR};

/// Width of a chunk along X, in blocks.
pub const CHUNK_SIZE_X: usize = 16;
/// Height of every chunk column, in blocks.
pub const CHUNK_HEIGHT: usize = 256;
/// Depth of a chunk along Z, in blocks.
pub const CHUNK_SIZE_Z: usize = 16;
/// Number of voxels in one horizontal layer.
pub const CHUNK_LAYER_SIZE: usize = CHUNK_SIZE_X * CHUNK_SIZE_Z;
/// Number of voxels in a chunk.
pub const CHUNK_VOLUME: usize = CHUNK_LAYER_SIZE * CHUNK_HEIGHT;

/// Owned voxel storage of one chunk.
pub type ChunkBuffer = Box<[BlockTypeSize]>;

/// Allocates an all-air chunk buffer.
pub fn new_chunk_buffer() -> ChunkBuffer {
    vec![AIR; CHUNK_VOLUME].into_boxed_slice()
}

/// Flat index of a local voxel position. Coordinates must be in range.
#[inline]
pub fn voxel_index(x: usize, y: usize, z: usize) -> usize {
    x + z * CHUNK_SIZE_X + y * CHUNK_LAYER_SIZE
}

/// Flat index of a local voxel position, or `None` outside the chunk.
#[inline]
pub fn checked_voxel_index(x: i32, y: i32, z: i32) -> Option<usize> {
    let in_range = (0..CHUNK_SIZE_X as i32).contains(&x)
        && (0..CHUNK_HEIGHT as i32).contains(&y)
        && (0..CHUNK_SIZE_Z as i32).contains(&z);
    in_range.then(|| voxel_index(x as usize, y as usize, z as usize))
}

/// Horizontal position of a chunk, in chunk units.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPosition {
    /// Chunk column along X
    pub x: i32,
    /// Chunk column along Z
    pub z: i32,
}

impl ChunkPosition {
    /// Creates a chunk position from chunk coordinates.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk containing a world block column.
    pub fn containing_block(world_x: i32, world_z: i32) -> Self {
        Self {
            x: world_x.div_euclid(CHUNK_SIZE_X as i32),
            z: world_z.div_euclid(CHUNK_SIZE_Z as i32),
        }
    }

    /// The chunk containing a continuous world position.
    pub fn containing_point(world_x: f32, world_z: f32) -> Self {
        Self::containing_block(world_x.floor() as i32, world_z.floor() as i32)
    }

    /// World coordinates of this chunk's block `(0, _, 0)`.
    pub fn world_origin(self) -> (i32, i32) {
        (
            self.x * CHUNK_SIZE_X as i32,
            self.z * CHUNK_SIZE_Z as i32,
        )
    }

    /// World-space centre of the chunk on the horizontal plane.
    pub fn center(self) -> (f32, f32) {
        let (x, z) = self.world_origin();
        (
            x as f32 + CHUNK_SIZE_X as f32 * 0.5,
            z as f32 + CHUNK_SIZE_Z as f32 * 0.5,
        )
    }

    /// Euclidean distance to another chunk, in chunk units.
    pub fn distance_to(self, other: ChunkPosition) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dz = (self.z - other.z) as f32;
        (dx * dx + dz * dz).sqrt()
    }

    /// The position offset by a number of chunks.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// The four chunks sharing an edge with this one.
    pub fn neighbors(self) -> [ChunkPosition; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }
}

/// Splits a world block coordinate into its chunk and local parts.
///
/// # Returns
/// The chunk position and the local `(x, z)` inside it
pub fn split_world_column(world_x: i32, world_z: i32) -> (ChunkPosition, usize, usize) {
    (
        ChunkPosition::containing_block(world_x, world_z),
        world_x.rem_euclid(CHUNK_SIZE_X as i32) as usize,
        world_z.rem_euclid(CHUNK_SIZE_Z as i32) as usize,
    )
}

/// A column of voxel data at a fixed chunk position.
///
/// Chunks track a `needs_update` flag. It is raised whenever the chunk's blocks, or
/// the blocks of a neighbour it borders, change and cleared once a fresh mesh has
/// been built.
#[derive(Debug, Clone)]
pub struct Chunk {
    position: ChunkPosition,
    blocks: ChunkBuffer,
    needs_update: bool,
}

impl Chunk {
    /// Creates a new, completely empty chunk (all blocks are air).
    pub fn empty(position: ChunkPosition) -> Self {
        Self {
            position,
            blocks: new_chunk_buffer(),
            needs_update: true,
        }
    }

    /// Wraps an existing voxel buffer.
    ///
    /// # Arguments
    /// * `position` - Where the chunk sits in the world
    /// * `blocks` - One block code per voxel in chunk layout
    ///
    /// # Returns
    /// `None` if `blocks` does not hold exactly `CHUNK_VOLUME` voxels
    pub fn from_blocks(position: ChunkPosition, blocks: impl Into<ChunkBuffer>) -> Option<Self> {
        let blocks = blocks.into();
        (blocks.len() == CHUNK_VOLUME).then_some(Self {
            position,
            blocks,
            needs_update: true,
        })
    }

    /// The chunk's position in chunk coordinates.
    pub fn position(&self) -> ChunkPosition {
        self.position
    }

    /// Block code at a local position. Positions outside the chunk read as air.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockTypeSize {
        checked_voxel_index(x, y, z)
            .map(|index| self.blocks[index])
            .unwrap_or(AIR)
    }

    /// Writes a block at a local position and flags the chunk for remeshing.
    ///
    /// # Returns
    /// `false` if the position is outside the chunk, in which case nothing changes
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockTypeSize) -> bool {
        match checked_voxel_index(x, y, z) {
            Some(index) => {
                self.blocks[index] = block;
                self.needs_update = true;
                true
            }
            None => false,
        }
    }

    /// Raw voxel data in chunk layout.
    pub fn as_bytes(&self) -> &[BlockTypeSize] {
        &self.blocks
    }

    /// Whether the mesh of this chunk is stale.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Flags the mesh of this chunk as stale.
    pub fn mark_dirty(&mut self) {
        self.needs_update = true;
    }

    /// Clears the stale flag, returning its previous value.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.needs_update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;

    #[test]
    fn world_columns_split_with_floor_semantics() {
        assert_eq!(split_world_column(0, 0), (ChunkPosition::new(0, 0), 0, 0));
        assert_eq!(split_world_column(15, 16), (ChunkPosition::new(0, 1), 15, 0));
        assert_eq!(split_world_column(-1, -16), (ChunkPosition::new(-1, -1), 15, 0));
        assert_eq!(split_world_column(-17, -33), (ChunkPosition::new(-2, -3), 15, 15));
        assert_eq!(ChunkPosition::containing_point(-0.5, 31.9), ChunkPosition::new(-1, 1));
    }

    #[test]
    fn out_of_range_access_is_harmless() {
        let mut chunk = Chunk::empty(ChunkPosition::new(0, 0));
        assert_eq!(chunk.get_block(0, -1, 0), AIR);
        assert_eq!(chunk.get_block(0, CHUNK_HEIGHT as i32, 0), AIR);
        assert!(!chunk.set_block(16, 0, 0, BlockType::Stone.code()));
        assert!(!chunk.set_block(0, 256, 0, BlockType::Stone.code()));
        assert!(chunk.as_bytes().iter().all(|&block| block == AIR));
    }

    #[test]
    fn set_block_marks_chunk_dirty() {
        let mut chunk = Chunk::empty(ChunkPosition::new(3, -2));
        assert!(chunk.take_dirty());
        assert!(!chunk.needs_update());
        assert!(chunk.set_block(4, 100, 7, BlockType::Dirt.code()));
        assert!(chunk.needs_update());
        assert_eq!(chunk.get_block(4, 100, 7), BlockType::Dirt.code());
        assert_eq!(chunk.as_bytes()[voxel_index(4, 100, 7)], BlockType::Dirt.code());
    }

    #[test]
    fn from_blocks_rejects_wrong_length() {
        let position = ChunkPosition::new(0, 0);
        assert!(Chunk::from_blocks(position, vec![0u8; CHUNK_VOLUME - 1]).is_none());
        assert!(Chunk::from_blocks(position, vec![0u8; CHUNK_VOLUME]).is_some());
    }

    #[test]
    fn neighbors_share_an_edge() {
        let position = ChunkPosition::new(2, 5);
        for neighbor in position.neighbors() {
            assert_eq!(position.distance_to(neighbor), 1.0);
        }
    }
}
