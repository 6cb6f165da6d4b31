//! # Block Side Module
//!
//! This module defines the six faces of a voxel block and the neighbour each face
//! looks at.

/// Represents the six faces of a voxel block.
///
/// The order is: [Front, Back, Bottom, Top, Left, Right]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The face pointing towards negative X
    Front = 0,
    /// The face pointing towards positive X
    Back = 1,
    /// The face pointing towards negative Y
    Bottom = 2,
    /// The face pointing towards positive Y
    Top = 3,
    /// The face pointing towards negative Z
    Left = 4,
    /// The face pointing towards positive Z
    Right = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in a consistent order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::Front,
            BlockSide::Back,
            BlockSide::Bottom,
            BlockSide::Top,
            BlockSide::Left,
            BlockSide::Right,
        ]
    }

    /// Offset from a block to the neighbour that can hide this face.
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            BlockSide::Front => (-1, 0, 0),
            BlockSide::Back => (1, 0, 0),
            BlockSide::Bottom => (0, -1, 0),
            BlockSide::Top => (0, 1, 0),
            BlockSide::Left => (0, 0, -1),
            BlockSide::Right => (0, 0, 1),
        }
    }

    /// The face on the neighbouring block that touches this one.
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::Front => BlockSide::Back,
            BlockSide::Back => BlockSide::Front,
            BlockSide::Bottom => BlockSide::Top,
            BlockSide::Top => BlockSide::Bottom,
            BlockSide::Left => BlockSide::Right,
            BlockSide::Right => BlockSide::Left,
        }
    }
}
