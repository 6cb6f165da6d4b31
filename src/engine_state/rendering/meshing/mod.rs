//! Mesh generation for voxel rendering.
//!
//! This module converts chunk voxel data into the face lists the renderer draws.
//! Every voxel emits one quad per side unless the neighbour on that side hides it.
//!
//! # Architecture
//! - `MeshBuilder`: Rebuilds the mesh of a loaded chunk
//! - `mesh/`: The face and face list types produced by the builder
//!
//! # Occlusion
//! - An opaque neighbour hides any face
//! - A water neighbour additionally hides the faces of water
//! - Everything else leaves the face visible, so water still shows its surface
//!   against air and leaves show every face
//!
//! Neighbours across a chunk edge are read from the adjacent loaded chunk. Unloaded
//! chunks and the space above the column read as air, the space below the column reads
//! as bedrock.

mod mesh;

pub use mesh::*;

use cgmath::Point3;
use log::trace;

use crate::engine_state::voxels::{
    block::{
        block_side::BlockSide, block_type::BlockType, is_opaque, is_water, material_of,
        BlockTypeSize, AIR,
    },
    chunk::{Chunk, ChunkPosition, CHUNK_HEIGHT, CHUNK_SIZE_X, CHUNK_SIZE_Z},
    world::World,
};

/// Returns `true` if a face of `block` bordering `neighbor` is hidden.
#[inline]
pub fn is_face_occluded(block: BlockTypeSize, neighbor: BlockTypeSize) -> bool {
    is_opaque(neighbor) || (is_water(block) && is_water(neighbor))
}

/// A chunk together with the four chunks bordering it.
struct Neighborhood<'a> {
    center: &'a Chunk,
    /// -X, +X, -Z, +Z, matching `ChunkPosition::neighbors`
    sides: [Option<&'a Chunk>; 4],
}

impl<'a> Neighborhood<'a> {
    fn new(world: &'a World, position: ChunkPosition) -> Option<Self> {
        let center = world.chunk(position)?;
        let [west, east, north, south] = position.neighbors();
        Some(Self {
            center,
            sides: [
                world.chunk(west),
                world.chunk(east),
                world.chunk(north),
                world.chunk(south),
            ],
        })
    }

    /// Block at a position local to the centre chunk, reaching one block into the
    /// neighbours.
    fn block(&self, x: i32, y: i32, z: i32) -> BlockTypeSize {
        if y < 0 {
            return BlockType::Bedrock.code();
        }
        if y >= CHUNK_HEIGHT as i32 {
            return AIR;
        }
        let size_x = CHUNK_SIZE_X as i32;
        let size_z = CHUNK_SIZE_Z as i32;
        let (chunk, x, z) = if x < 0 {
            (self.sides[0], x + size_x, z)
        } else if x >= size_x {
            (self.sides[1], x - size_x, z)
        } else if z < 0 {
            (self.sides[2], x, z + size_z)
        } else if z >= size_z {
            (self.sides[3], x, z - size_z)
        } else {
            (Some(self.center), x, z)
        };
        chunk.map(|chunk| chunk.get_block(x, y, z)).unwrap_or(AIR)
    }
}

/// Builds chunk meshes from world data.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    meshes_built: u64,
}

impl MeshBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of meshes built so far.
    pub fn meshes_built(&self) -> u64 {
        self.meshes_built
    }

    /// Builds the mesh of a loaded chunk.
    ///
    /// The chunk's stale flag is left alone, callers consume it with
    /// [`World::take_dirty`] once the mesh is in use.
    ///
    /// # Arguments
    /// * `world` - World holding the chunk and its neighbours
    /// * `position` - Chunk to mesh
    ///
    /// # Returns
    /// `None` if the chunk is not loaded
    pub fn rebuild(&mut self, world: &World, position: ChunkPosition) -> Option<ChunkMesh> {
        let neighborhood = Neighborhood::new(world, position)?;
        let (origin_x, origin_z) = position.world_origin();
        let mut mesh = ChunkMesh::default();

        for y in 0..CHUNK_HEIGHT as i32 {
            for z in 0..CHUNK_SIZE_Z as i32 {
                for x in 0..CHUNK_SIZE_X as i32 {
                    let block = neighborhood.center.get_block(x, y, z);
                    if block == AIR {
                        continue;
                    }
                    let material = material_of(block);
                    let list = if material.water {
                        &mut mesh.translucent
                    } else {
                        &mut mesh.opaque
                    };
                    for side in BlockSide::all() {
                        let (dx, dy, dz) = side.offset();
                        let neighbor = neighborhood.block(x + dx, y + dy, z + dz);
                        if is_face_occluded(block, neighbor) {
                            continue;
                        }
                        list.push(Face::new(
                            Point3::new(origin_x + x, y, origin_z + z),
                            block,
                            side,
                            material.texture_for(side),
                        ));
                    }
                }
            }
        }

        self.meshes_built += 1;
        trace!(
            "Meshed chunk ({}, {}): {} opaque, {} translucent faces",
            position.x,
            position.z,
            mesh.opaque.len(),
            mesh.translucent.len()
        );
        Some(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::{
        generation::{noise::WorldSeed, TerrainGenerator},
        store::MemoryStore,
        world::WorldSettings,
    };
    use std::sync::Arc;

    fn empty_world() -> World {
        let mut world = World::new(
            Arc::new(TerrainGenerator::new(WorldSeed(1))),
            Box::new(MemoryStore::new()),
            None,
            WorldSettings::default(),
        );
        for position in [ChunkPosition::new(0, 0), ChunkPosition::new(1, 0)] {
            clear(&mut world, position);
        }
        world
    }

    fn clear(world: &mut World, position: ChunkPosition) {
        let chunk = world.ensure_chunk(position);
        for y in 0..CHUNK_HEIGHT as i32 {
            for z in 0..CHUNK_SIZE_Z as i32 {
                for x in 0..CHUNK_SIZE_X as i32 {
                    chunk.set_block(x, y, z, AIR);
                }
            }
        }
    }

    #[test]
    fn lone_block_emits_six_faces() {
        let mut world = empty_world();
        world.set_block(5, 100, 5, BlockType::Stone);
        let mesh = MeshBuilder::new()
            .rebuild(&world, ChunkPosition::new(0, 0))
            .unwrap();
        assert_eq!(mesh.opaque.len(), 6);
        assert!(mesh.translucent.is_empty());
        assert_eq!(mesh.opaque.vertices.len(), 24);
        assert_eq!(mesh.opaque.indices.len(), 36);
    }

    #[test]
    fn floor_of_the_column_is_hidden() {
        let mut world = empty_world();
        world.set_block(5, 0, 5, BlockType::Stone);
        let mesh = MeshBuilder::new()
            .rebuild(&world, ChunkPosition::new(0, 0))
            .unwrap();
        assert_eq!(mesh.opaque.len(), 5);
        assert!(!mesh.opaque.contains(Point3::new(5, 0, 5), BlockSide::Bottom));
    }

    #[test]
    fn faces_across_chunk_edges_are_culled() {
        let mut world = empty_world();
        world.set_block(15, 100, 3, BlockType::Stone);
        world.set_block(16, 100, 3, BlockType::Dirt);
        let mut builder = MeshBuilder::new();
        let left = builder.rebuild(&world, ChunkPosition::new(0, 0)).unwrap();
        let right = builder.rebuild(&world, ChunkPosition::new(1, 0)).unwrap();
        assert_eq!(left.opaque.len(), 5);
        assert_eq!(right.opaque.len(), 5);
        assert!(!left.opaque.contains(Point3::new(15, 100, 3), BlockSide::Back));
        assert!(!right.opaque.contains(Point3::new(16, 100, 3), BlockSide::Front));
        assert_eq!(builder.meshes_built(), 2);
    }

    #[test]
    fn unloaded_neighbours_read_as_air() {
        let mut world = empty_world();
        world.set_block(0, 100, 0, BlockType::Stone);
        let mesh = MeshBuilder::new()
            .rebuild(&world, ChunkPosition::new(0, 0))
            .unwrap();
        assert!(mesh.opaque.contains(Point3::new(0, 100, 0), BlockSide::Left));
        assert!(mesh.opaque.contains(Point3::new(0, 100, 0), BlockSide::Front));
    }

    #[test]
    fn water_surface_shows_against_air_only() {
        let mut world = empty_world();
        world.set_block(4, 60, 4, BlockType::Water);
        world.set_block(5, 60, 4, BlockType::Water);
        world.set_block(4, 59, 4, BlockType::Sand);
        let mesh = MeshBuilder::new()
            .rebuild(&world, ChunkPosition::new(0, 0))
            .unwrap();
        let water = Point3::new(4, 60, 4);
        assert!(mesh.translucent.contains(water, BlockSide::Top));
        assert!(!mesh.translucent.contains(water, BlockSide::Back));
        assert!(!mesh.translucent.contains(water, BlockSide::Bottom));
        assert!(mesh.opaque.contains(Point3::new(4, 59, 4), BlockSide::Top));
        assert_eq!(mesh.translucent.len(), 2 * 6 - 2 - 1);
    }

    #[test]
    fn leaves_do_not_hide_neighbours() {
        assert!(!is_face_occluded(BlockType::Stone.code(), BlockType::Leaves.code()));
        assert!(!is_face_occluded(BlockType::Leaves.code(), BlockType::Leaves.code()));
        assert!(is_face_occluded(BlockType::Leaves.code(), BlockType::Stone.code()));
        assert!(!is_face_occluded(BlockType::Water.code(), AIR));
        assert!(is_face_occluded(BlockType::Water.code(), BlockType::Water.code()));
        assert!(!is_face_occluded(BlockType::Stone.code(), BlockType::Water.code()));
    }

    #[test]
    fn missing_chunk_has_no_mesh() {
        let world = empty_world();
        assert!(MeshBuilder::new()
            .rebuild(&world, ChunkPosition::new(9, 9))
            .is_none());
    }
}
