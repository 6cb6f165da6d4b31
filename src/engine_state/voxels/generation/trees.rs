//! # Trees
//!
//! Places trees on a freshly layered chunk. Each column rolls a deterministic random
//! number against a probability taken from a low-frequency vegetation field and the
//! column's biome. Trees stay inside their own chunk, so generating a chunk never
//! touches its neighbours.

use super::{
    biome::BiomeDefinition,
    noise::{NoiseField, NoiseSettings, WorldSeed},
    terrain::SEA_LEVEL,
};
use crate::engine_state::voxels::{
    block::{block_type::BlockType, BlockTypeSize, AIR},
    chunk::{voxel_index, ChunkPosition, CHUNK_HEIGHT, CHUNK_SIZE_X, CHUNK_SIZE_Z},
};

/// Minimum horizontal distance between two trees of one chunk.
pub const MIN_TREE_SPACING: f64 = 4.0;
/// Columns this close to a chunk edge never grow a tree.
pub const TREE_EDGE_MARGIN: usize = 2;
/// Layers of leaves, starting one block below the top of the trunk.
pub const CANOPY_HEIGHT: usize = 4;

const MIN_TRUNK_HEIGHT: usize = 4;
const MAX_TRUNK_HEIGHT: usize = 6;
const VEGETATION_SALT: u32 = 0x9000;

/// Surface blocks a tree may grow on.
const ALLOWED_SURFACES: [BlockType; 2] = [BlockType::Grass, BlockType::Dirt];

/// A tree placed by [`TreePlanter::plant`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TreePlacement {
    /// Local x of the trunk
    pub x: usize,
    /// Local z of the trunk
    pub z: usize,
    /// Height of the surface block the trunk stands on
    pub base_y: usize,
    /// Number of trunk blocks
    pub trunk_height: usize,
}

impl TreePlacement {
    /// Horizontal distance between two trunks.
    pub fn distance_to(&self, other: &TreePlacement) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dz = self.z as f64 - other.z as f64;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Surface information the planter needs about one column.
#[derive(Copy, Clone, Debug)]
pub struct ColumnSurface {
    /// Height of the top solid block, if the column has one
    pub surface_y: Option<usize>,
    /// Biome of the column
    pub biome: &'static BiomeDefinition,
}

/// Seeded tree placement.
pub struct TreePlanter {
    vegetation: NoiseField,
    seed: u64,
}

impl TreePlanter {
    /// Creates the planter for a world seed.
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            vegetation: NoiseField::new(
                seed.derive(VEGETATION_SALT),
                NoiseSettings::new(0.008, 2),
            ),
            seed: seed.0,
        }
    }

    /// Seed of the random generator of one world column.
    fn column_seed(&self, world_x: i32, world_z: i32) -> u64 {
        let x = (world_x as i64 as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        let z = (world_z as i64 as u64).wrapping_mul(0xc2b2_ae3d_27d4_eb4f);
        self.seed ^ x ^ z.rotate_left(31)
    }

    /// Probability that a column of the given biome grows a tree.
    pub fn tree_probability(&self, world_x: i32, world_z: i32, biome: &BiomeDefinition) -> f64 {
        let noise = self.vegetation.sample_2d(world_x as f64, world_z as f64);
        ((noise + 1.0) * 0.5).clamp(0.0, 1.0) * biome.vegetation_density
    }

    /// Plants trees into a layered chunk.
    ///
    /// # Arguments
    /// * `position` - Chunk being generated
    /// * `blocks` - Voxel buffer of the chunk, already layered and flooded
    /// * `surfaces` - One entry per column, indexed `x + z * CHUNK_SIZE_X`
    ///
    /// # Returns
    /// The trees that were placed, in placement order
    pub fn plant(
        &self,
        position: ChunkPosition,
        blocks: &mut [BlockTypeSize],
        surfaces: &[ColumnSurface],
    ) -> Vec<TreePlacement> {
        let (origin_x, origin_z) = position.world_origin();
        let mut placed: Vec<TreePlacement> = Vec::new();

        for z in TREE_EDGE_MARGIN..CHUNK_SIZE_Z - TREE_EDGE_MARGIN {
            for x in TREE_EDGE_MARGIN..CHUNK_SIZE_X - TREE_EDGE_MARGIN {
                let column = surfaces[x + z * CHUNK_SIZE_X];
                if column.biome.vegetation_density <= 0.0 {
                    continue;
                }
                let Some(base_y) = column.surface_y else {
                    continue;
                };
                if (base_y as i32) <= SEA_LEVEL {
                    continue;
                }
                let surface = blocks[voxel_index(x, base_y, z)];
                if !ALLOWED_SURFACES.iter().any(|allowed| allowed.code() == surface) {
                    continue;
                }

                let (world_x, world_z) = (origin_x + x as i32, origin_z + z as i32);
                let mut rng = fastrand::Rng::with_seed(self.column_seed(world_x, world_z));
                if rng.f64() >= self.tree_probability(world_x, world_z, column.biome) {
                    continue;
                }

                let candidate = TreePlacement {
                    x,
                    z,
                    base_y,
                    trunk_height: rng.usize(MIN_TRUNK_HEIGHT..=MAX_TRUNK_HEIGHT),
                };
                if placed
                    .iter()
                    .any(|tree| tree.distance_to(&candidate) < MIN_TREE_SPACING)
                {
                    continue;
                }
                if !column_is_clear(blocks, &candidate) {
                    continue;
                }

                grow(blocks, &candidate);
                placed.push(candidate);
            }
        }

        placed
    }
}

/// Checks that every cell the tree could occupy above its base is air or water.
fn column_is_clear(blocks: &[BlockTypeSize], tree: &TreePlacement) -> bool {
    let top = tree.base_y + tree.trunk_height + CANOPY_HEIGHT;
    if top >= CHUNK_HEIGHT {
        return false;
    }
    let water = BlockType::Water.code();
    (tree.base_y + 1..=top).all(|y| {
        let block = blocks[voxel_index(tree.x, y, tree.z)];
        block == AIR || block == water
    })
}

fn grow(blocks: &mut [BlockTypeSize], tree: &TreePlacement) {
    let wood = BlockType::Wood.code();
    let leaves = BlockType::Leaves.code();
    let water = BlockType::Water.code();

    let trunk_top = tree.base_y + tree.trunk_height;
    for y in tree.base_y + 1..=trunk_top {
        let cell = &mut blocks[voxel_index(tree.x, y, tree.z)];
        if *cell == AIR || *cell == water {
            *cell = wood;
        }
    }

    for layer in 0..CANOPY_HEIGHT {
        let y = trunk_top - 1 + layer;
        let radius: i32 = if layer < 2 { 2 } else { 1 };
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                // round off the corners of the wide layers
                if radius == 2 && dx.abs() == 2 && dz.abs() == 2 {
                    continue;
                }
                let x = tree.x as i32 + dx;
                let z = tree.z as i32 + dz;
                if !(0..CHUNK_SIZE_X as i32).contains(&x) || !(0..CHUNK_SIZE_Z as i32).contains(&z)
                {
                    continue;
                }
                let cell = &mut blocks[voxel_index(x as usize, y, z as usize)];
                if *cell == AIR {
                    *cell = leaves;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::{
        chunk::{new_chunk_buffer, CHUNK_LAYER_SIZE},
        generation::biome::{biome, BiomeId},
    };

    fn grassland(blocks: &mut [BlockTypeSize], surface_y: usize) -> Vec<ColumnSurface> {
        for z in 0..CHUNK_SIZE_Z {
            for x in 0..CHUNK_SIZE_X {
                for y in 0..surface_y {
                    blocks[voxel_index(x, y, z)] = BlockType::Dirt.code();
                }
                blocks[voxel_index(x, surface_y, z)] = BlockType::Grass.code();
            }
        }
        vec![
            ColumnSurface {
                surface_y: Some(surface_y),
                biome: biome(BiomeId::Forest),
            };
            CHUNK_LAYER_SIZE
        ]
    }

    #[test]
    fn trees_respect_spacing_and_margins() {
        let planter = TreePlanter::new(WorldSeed(11));
        let mut total = 0;
        for cx in 0..8 {
            let mut blocks = new_chunk_buffer();
            let surfaces = grassland(&mut blocks, 80);
            let trees = planter.plant(ChunkPosition::new(cx, 3), &mut blocks, &surfaces);
            for (i, a) in trees.iter().enumerate() {
                assert!(a.x >= TREE_EDGE_MARGIN && a.x < CHUNK_SIZE_X - TREE_EDGE_MARGIN);
                assert!(a.z >= TREE_EDGE_MARGIN && a.z < CHUNK_SIZE_Z - TREE_EDGE_MARGIN);
                for b in &trees[i + 1..] {
                    assert!(a.distance_to(b) >= MIN_TREE_SPACING);
                }
                assert_eq!(
                    blocks[voxel_index(a.x, a.base_y + 1, a.z)],
                    BlockType::Wood.code()
                );
                assert_eq!(
                    blocks[voxel_index(a.x, a.base_y, a.z)],
                    BlockType::Grass.code()
                );
            }
            total += trees.len();
        }
        assert!(total > 0, "forest grassland should grow at least one tree");
    }

    #[test]
    fn no_trees_below_sea_level_or_on_sand() {
        let planter = TreePlanter::new(WorldSeed(11));
        let mut blocks = new_chunk_buffer();
        let surfaces = grassland(&mut blocks, SEA_LEVEL as usize);
        assert!(planter
            .plant(ChunkPosition::new(0, 0), &mut blocks, &surfaces)
            .is_empty());

        let mut blocks = new_chunk_buffer();
        let surfaces = grassland(&mut blocks, 90);
        for z in 0..CHUNK_SIZE_Z {
            for x in 0..CHUNK_SIZE_X {
                blocks[voxel_index(x, 90, z)] = BlockType::Sand.code();
            }
        }
        assert!(planter
            .plant(ChunkPosition::new(0, 0), &mut blocks, &surfaces)
            .is_empty());
    }

    #[test]
    fn planting_is_deterministic() {
        let planter = TreePlanter::new(WorldSeed(77));
        let mut first = new_chunk_buffer();
        let mut second = new_chunk_buffer();
        let surfaces = grassland(&mut first, 100);
        grassland(&mut second, 100);
        let position = ChunkPosition::new(-4, 9);
        assert_eq!(
            planter.plant(position, &mut first, &surfaces),
            planter.plant(position, &mut second, &surfaces)
        );
        assert_eq!(first, second);
    }

    #[test]
    fn canopy_does_not_replace_solid_blocks() {
        let mut blocks = new_chunk_buffer();
        let tree = TreePlacement {
            x: 8,
            z: 8,
            base_y: 70,
            trunk_height: 5,
        };
        let stone_at = voxel_index(9, 74, 8);
        blocks[stone_at] = BlockType::Stone.code();
        grow(&mut blocks, &tree);
        assert_eq!(blocks[stone_at], BlockType::Stone.code());
        assert_eq!(blocks[voxel_index(8, 75, 8)], BlockType::Wood.code());
        assert_eq!(blocks[voxel_index(7, 74, 8)], BlockType::Leaves.code());
        assert_eq!(blocks[voxel_index(8, 77, 8)], BlockType::Leaves.code());
    }
}
