//! # Procedural Generation
//!
//! Deterministic chunk generation from a world seed. The same seed and chunk
//! position always produce byte-identical voxel data, which is what allows chunks
//! that were never edited to be discarded and regenerated later.
//!
//! ## Pipeline
//!
//! For every column of a chunk:
//! 1. [`terrain`] samples the climate fields and derives a target height.
//! 2. [`biome`] picks a catalog entry for the column.
//! 3. The density function fills solid voxels, [`caves`] carves some back to air
//!    and `y = 0` is always bedrock.
//! 4. Layering swaps the top solid voxels for the biome's surface blocks and open
//!    cells up to sea level fill with water.
//!
//! Once all columns are done, [`trees`] plants vegetation on the result.

pub mod biome;
pub mod caves;
pub mod noise;
pub mod spline;
pub mod terrain;
pub mod trees;

use biome::{select_biome, BiomeDefinition};
use caves::CaveCarver;
use self::noise::WorldSeed;
use terrain::{TerrainParameters, TerrainShaper, SEA_LEVEL};
use trees::{ColumnSurface, TreePlacement, TreePlanter};

use super::{
    block::{block_type::BlockType, BlockTypeSize, AIR},
    chunk::{
        new_chunk_buffer, voxel_index, Chunk, ChunkPosition, CHUNK_HEIGHT, CHUNK_LAYER_SIZE,
        CHUNK_SIZE_X, CHUNK_SIZE_Z, CHUNK_VOLUME,
    },
};
use crate::error::GenerationError;

/// Summary of what one call to [`TerrainGenerator::generate_into`] produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Trees planted in the chunk
    pub trees: Vec<TreePlacement>,
}

/// Immutable chunk generator shared by every worker.
pub struct TerrainGenerator {
    seed: WorldSeed,
    shaper: TerrainShaper,
    caves: CaveCarver,
    trees: TreePlanter,
}

impl TerrainGenerator {
    /// Creates a generator for a world seed.
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            seed,
            shaper: TerrainShaper::new(seed),
            caves: CaveCarver::new(seed),
            trees: TreePlanter::new(seed),
        }
    }

    /// The seed this generator was built from.
    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Terrain parameters of a world column.
    pub fn sample_column(&self, world_x: i32, world_z: i32) -> TerrainParameters {
        self.shaper.sample_column(world_x, world_z)
    }

    /// Biome of a world column.
    pub fn biome_at(&self, world_x: i32, world_z: i32) -> &'static BiomeDefinition {
        select_biome(&self.sample_column(world_x, world_z))
    }

    /// Generates a chunk into a freshly allocated buffer.
    pub fn generate(&self, position: ChunkPosition) -> Result<Chunk, GenerationError> {
        let mut blocks = new_chunk_buffer();
        self.generate_into(position, &mut blocks)?;
        let actual = blocks.len();
        Chunk::from_blocks(position, blocks).ok_or(GenerationError::InvalidBuffer {
            expected: CHUNK_VOLUME,
            actual,
        })
    }

    /// Generates a chunk into a caller-supplied buffer.
    ///
    /// Every voxel of `blocks` is overwritten, so the buffer may be reused.
    ///
    /// # Arguments
    /// * `position` - Chunk to generate
    /// * `blocks` - Destination of exactly `CHUNK_VOLUME` voxels
    ///
    /// # Returns
    /// A report of placed features, or `InvalidBuffer` if `blocks` has the wrong length
    pub fn generate_into(
        &self,
        position: ChunkPosition,
        blocks: &mut [BlockTypeSize],
    ) -> Result<GenerationReport, GenerationError> {
        if blocks.len() != CHUNK_VOLUME {
            return Err(GenerationError::InvalidBuffer {
                expected: CHUNK_VOLUME,
                actual: blocks.len(),
            });
        }
        blocks.fill(AIR);

        let (origin_x, origin_z) = position.world_origin();
        let mut surfaces = Vec::with_capacity(CHUNK_LAYER_SIZE);
        for z in 0..CHUNK_SIZE_Z {
            for x in 0..CHUNK_SIZE_X {
                let (world_x, world_z) = (origin_x + x as i32, origin_z + z as i32);
                let column = self.shaper.sample_column(world_x, world_z);
                let biome = select_biome(&column);
                self.fill_column(blocks, x, z, world_x, world_z, &column);
                let surface_y = layer_column(blocks, x, z, biome);
                surfaces.push(ColumnSurface { surface_y, biome });
            }
        }

        let trees = self.trees.plant(position, blocks, &surfaces);
        log::trace!(
            "Generated chunk ({}, {}) with {} trees",
            position.x,
            position.z,
            trees.len()
        );
        Ok(GenerationReport { trees })
    }

    /// Writes bedrock and stone for one column, with caves already carved.
    fn fill_column(
        &self,
        blocks: &mut [BlockTypeSize],
        x: usize,
        z: usize,
        world_x: i32,
        world_z: i32,
        column: &TerrainParameters,
    ) {
        blocks[voxel_index(x, 0, z)] = BlockType::Bedrock.code();
        let stone = BlockType::Stone.code();
        for y in 1..CHUNK_HEIGHT {
            let world_y = y as i32;
            if self.shaper.is_solid(column, world_x, world_y, world_z)
                && !self.caves.should_carve(world_x, world_y, world_z)
            {
                blocks[voxel_index(x, y, z)] = stone;
            }
        }
    }
}

/// Applies biome surface blocks and sea water to one filled column.
///
/// Layering stops at the first open cell under the surface, so cave floors keep
/// their stone.
///
/// # Returns
/// Height of the top solid voxel
fn layer_column(
    blocks: &mut [BlockTypeSize],
    x: usize,
    z: usize,
    biome: &BiomeDefinition,
) -> Option<usize> {
    let top = (0..CHUNK_HEIGHT)
        .rev()
        .find(|&y| blocks[voxel_index(x, y, z)] != AIR)?;

    let mut surface = biome.surface;
    if biome.snow_elevation.is_some_and(|snow| top as i32 >= snow) {
        surface = BlockType::Snow;
    } else if surface == BlockType::Grass && (top as i32) < SEA_LEVEL {
        surface = BlockType::Dirt;
    }

    let bedrock = BlockType::Bedrock.code();
    let mut depth = 0;
    for y in (0..=top).rev() {
        let cell = &mut blocks[voxel_index(x, y, z)];
        if *cell == AIR || *cell == bedrock || depth > biome.stone_depth {
            break;
        }
        *cell = if depth == 0 {
            surface.code()
        } else {
            biome.subsurface.code()
        };
        depth += 1;
    }

    let water = BlockType::Water.code();
    for y in top + 1..=SEA_LEVEL as usize {
        blocks[voxel_index(x, y, z)] = water;
    }

    Some(top)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_buffer_length_is_rejected() {
        let generator = TerrainGenerator::new(WorldSeed(1));
        let mut short = vec![0u8; CHUNK_VOLUME - 1];
        assert_eq!(
            generator.generate_into(ChunkPosition::new(0, 0), &mut short),
            Err(GenerationError::InvalidBuffer {
                expected: CHUNK_VOLUME,
                actual: CHUNK_VOLUME - 1
            })
        );
    }

    #[test]
    fn bottom_layer_is_bedrock() {
        let generator = TerrainGenerator::new(WorldSeed(1));
        let chunk = generator.generate(ChunkPosition::new(2, -1)).unwrap();
        for z in 0..CHUNK_SIZE_Z as i32 {
            for x in 0..CHUNK_SIZE_X as i32 {
                assert_eq!(chunk.get_block(x, 0, z), BlockType::Bedrock.code());
            }
        }
    }

    #[test]
    fn open_cells_below_sea_level_hold_water() {
        let generator = TerrainGenerator::new(WorldSeed(8));
        let chunk = generator.generate(ChunkPosition::new(-3, 4)).unwrap();
        for z in 0..CHUNK_SIZE_Z as i32 {
            for x in 0..CHUNK_SIZE_X as i32 {
                let top = (0..CHUNK_HEIGHT as i32)
                    .rev()
                    .find(|&y| {
                        let block = chunk.get_block(x, y, z);
                        block != AIR
                            && block != BlockType::Water.code()
                            && block != BlockType::Wood.code()
                            && block != BlockType::Leaves.code()
                    })
                    .unwrap();
                for y in top + 1..=SEA_LEVEL {
                    let block = chunk.get_block(x, y, z);
                    assert!(
                        block == BlockType::Water.code() || block == BlockType::Wood.code(),
                        "column ({x}, {z}) y {y} holds {block}"
                    );
                }
            }
        }
    }

    #[test]
    fn layering_stops_at_a_cave_under_the_surface() {
        let mut blocks = new_chunk_buffer();
        let (x, z) = (3, 5);
        blocks[voxel_index(x, 0, z)] = BlockType::Bedrock.code();
        for y in 1..=100 {
            blocks[voxel_index(x, y, z)] = BlockType::Stone.code();
        }
        blocks[voxel_index(x, 98, z)] = AIR;

        let top = layer_column(&mut blocks, x, z, biome::biome(biome::BiomeId::Plains));

        assert_eq!(top, Some(100));
        assert_eq!(blocks[voxel_index(x, 100, z)], BlockType::Grass.code());
        assert_eq!(blocks[voxel_index(x, 99, z)], BlockType::Dirt.code());
        assert_eq!(blocks[voxel_index(x, 98, z)], AIR);
        assert_eq!(blocks[voxel_index(x, 97, z)], BlockType::Stone.code());
        assert_eq!(blocks[voxel_index(x, 96, z)], BlockType::Stone.code());
    }

    #[test]
    fn reused_buffers_are_fully_overwritten() {
        let generator = TerrainGenerator::new(WorldSeed(21));
        let position = ChunkPosition::new(1, 1);
        let mut reused = vec![BlockType::Gravel.code(); CHUNK_VOLUME];
        generator.generate_into(position, &mut reused).unwrap();
        let fresh = generator.generate(position).unwrap();
        assert_eq!(reused.as_slice(), fresh.as_bytes());
    }
}
