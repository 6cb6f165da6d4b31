//! # Block Type Module
//!
//! This module defines the block types that make up the voxel world.
//! Each type is stored in chunk buffers as its one-byte numeric code.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::BlockTypeSize;

/// Enumerates all block types in the voxel world.
///
/// The discriminant of each variant is its storage code. Codes are written to disk,
/// so existing variants must never be renumbered.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// Empty space. Never meshed.
    Air = 0,
    /// Bulk terrain material.
    Stone = 1,
    /// Soil found under grass and in lowland subsurfaces.
    Dirt = 2,
    /// Grass-topped dirt. Top, bottom and sides use different textures.
    Grass = 3,
    /// Beach and desert surface.
    Sand = 4,
    /// Liquid filling every open cell up to sea level.
    Water = 5,
    /// Cold-biome and high-altitude surface.
    Snow = 6,
    /// Tree trunks.
    Wood = 7,
    /// Tree canopies. Not opaque, so the faces behind them are kept.
    Leaves = 8,
    /// Deep ocean floor.
    Gravel = 9,
    /// Unbreakable floor at y = 0.
    Bedrock = 10,
    /// Desert subsurface.
    Sandstone = 11,
}

impl BlockType {
    /// Number of defined block types.
    pub const COUNT: usize = 12;

    /// Converts a stored code back into a `BlockType`.
    ///
    /// # Arguments
    /// * `code` - A code read from a chunk buffer
    ///
    /// # Returns
    /// The matching type, or `None` for codes no variant uses
    pub fn from_code(code: BlockTypeSize) -> Option<Self> {
        FromPrimitive::from_u8(code)
    }

    /// The storage code of this type.
    pub const fn code(self) -> BlockTypeSize {
        self as BlockTypeSize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..BlockType::COUNT as u8 {
            let block = BlockType::from_code(code).unwrap();
            assert_eq!(block.code(), code);
        }
        assert_eq!(BlockType::from_code(BlockType::COUNT as u8), None);
        assert_eq!(BlockType::Air.code(), 0);
    }
}
