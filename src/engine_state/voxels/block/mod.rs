//! # Block Module
//!
//! This module provides block type definitions, block faces and the material table
//! that tells the mesher and the generator how each block type behaves.

use block_side::BlockSide;
use block_type::BlockType;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to store block types in chunk buffers.
pub type BlockTypeSize = u8;

/// Code of the air block, the value every fresh chunk buffer is filled with.
pub const AIR: BlockTypeSize = BlockType::Air.code();

/// Rendering properties of a block type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Material {
    /// Hides the faces of any block next to it
    pub opaque: bool,
    /// Meshed into the translucent list and merged with adjacent water
    pub water: bool,
    /// Texture indices in the order [top, bottom, side]
    pub textures: [u32; 3],
}

impl Material {
    /// Texture index used for one face of the block.
    pub fn texture_for(&self, side: BlockSide) -> u32 {
        match side {
            BlockSide::Top => self.textures[0],
            BlockSide::Bottom => self.textures[1],
            _ => self.textures[2],
        }
    }
}

const fn solid(textures: [u32; 3]) -> Material {
    Material {
        opaque: true,
        water: false,
        textures,
    }
}

/// Material of every block type, indexed by storage code.
pub static BLOCK_MATERIALS: [Material; BlockType::COUNT] = [
    // Air
    Material {
        opaque: false,
        water: false,
        textures: [0, 0, 0],
    },
    solid([1, 1, 1]),  // Stone
    solid([2, 2, 2]),  // Dirt
    solid([3, 2, 4]),  // Grass
    solid([5, 5, 5]),  // Sand
    // Water
    Material {
        opaque: false,
        water: true,
        textures: [6, 6, 6],
    },
    solid([7, 2, 8]),    // Snow
    solid([9, 9, 10]),   // Wood
    // Leaves
    Material {
        opaque: false,
        water: false,
        textures: [11, 11, 11],
    },
    solid([12, 12, 12]), // Gravel
    solid([13, 13, 13]), // Bedrock
    solid([14, 15, 16]), // Sandstone
];

/// Used for codes that no block type claims, e.g. data written by a newer build.
static UNKNOWN_MATERIAL: Material = solid([0, 0, 0]);

/// Looks up the material of a stored block code.
pub fn material_of(code: BlockTypeSize) -> &'static Material {
    BLOCK_MATERIALS
        .get(code as usize)
        .unwrap_or(&UNKNOWN_MATERIAL)
}

/// Returns `true` if the block hides the faces of its neighbours.
#[inline]
pub fn is_opaque(code: BlockTypeSize) -> bool {
    material_of(code).opaque
}

/// Returns `true` if the block is water.
#[inline]
pub fn is_water(code: BlockTypeSize) -> bool {
    material_of(code).water
}
