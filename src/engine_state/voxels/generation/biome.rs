//! # Biomes
//!
//! Static biome catalog and the selection rule that maps a column's terrain
//! parameters to one catalog entry.
//!
//! Selection happens in two steps. The target height picks a coarse band (ocean,
//! beach, lowland ...) and temperature/humidity thresholds override it for deserts
//! and frozen land. Inside a band the candidate whose climate centre is nearest to
//! the column's climate vector wins. The catalog is single-digit sized, so the
//! nearest-centre search is a linear scan.

use super::terrain::{TerrainParameters, SEA_LEVEL};
use crate::engine_state::voxels::block::block_type::BlockType;

/// Per-axis weights of the climate distance, in climate vector order.
pub const CLIMATE_WEIGHTS: [f64; 5] = [2.0, 1.5, 1.0, 0.75, 0.75];

/// Temperature above which dry lowland becomes desert.
pub const HOT_TEMPERATURE: f64 = 0.35;
/// Humidity below which hot lowland becomes desert.
pub const DRY_HUMIDITY: f64 = -0.1;
/// Temperature below which land freezes into tundra.
pub const COLD_TEMPERATURE: f64 = -0.4;

/// Identifier of a catalog entry. The discriminant is the catalog index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BiomeId {
    /// Open sea well below sea level
    DeepOcean = 0,
    /// Shallow sea
    Ocean = 1,
    /// Sandy strip around sea level
    Beach = 2,
    /// Flat grassland
    Plains = 3,
    /// Dense trees on grass
    Forest = 4,
    /// Hot, dry sand
    Desert = 5,
    /// Rolling highland
    Hills = 6,
    /// Bare stone peaks
    Mountains = 7,
    /// Frozen flats
    SnowyTundra = 8,
}

/// One immutable catalog entry.
#[derive(Debug, PartialEq)]
pub struct BiomeDefinition {
    /// Catalog identifier
    pub id: BiomeId,
    /// Display name
    pub name: &'static str,
    /// Climate centre `[continentalness, erosion, peaks_valleys, temperature, humidity]`
    pub center: [f64; 5],
    /// Block placed on the top solid cell of a column
    pub surface: BlockType,
    /// Block placed under the surface
    pub subsurface: BlockType,
    /// Number of subsurface cells below the surface
    pub stone_depth: usize,
    /// Tree probability multiplier, `0` disables trees
    pub vegetation_density: f64,
    /// Surfaces at or above this height are snow
    pub snow_elevation: Option<i32>,
}

impl BiomeDefinition {
    /// Weighted Euclidean distance between this biome's centre and a climate vector.
    pub fn climate_distance(&self, climate: &[f64; 5]) -> f64 {
        self.center
            .iter()
            .zip(climate)
            .zip(CLIMATE_WEIGHTS)
            .map(|((center, value), weight)| weight * (center - value) * (center - value))
            .sum::<f64>()
            .sqrt()
    }
}

/// Every biome, indexed by [`BiomeId`].
pub static BIOME_CATALOG: [BiomeDefinition; 9] = [
    BiomeDefinition {
        id: BiomeId::DeepOcean,
        name: "deep_ocean",
        center: [-0.8, 0.0, 0.0, 0.0, 0.0],
        surface: BlockType::Gravel,
        subsurface: BlockType::Gravel,
        stone_depth: 3,
        vegetation_density: 0.0,
        snow_elevation: None,
    },
    BiomeDefinition {
        id: BiomeId::Ocean,
        name: "ocean",
        center: [-0.45, 0.0, 0.0, 0.0, 0.0],
        surface: BlockType::Sand,
        subsurface: BlockType::Sand,
        stone_depth: 3,
        vegetation_density: 0.0,
        snow_elevation: None,
    },
    BiomeDefinition {
        id: BiomeId::Beach,
        name: "beach",
        center: [-0.15, 0.2, 0.0, 0.3, 0.0],
        surface: BlockType::Sand,
        subsurface: BlockType::Sand,
        stone_depth: 4,
        vegetation_density: 0.0,
        snow_elevation: None,
    },
    BiomeDefinition {
        id: BiomeId::Plains,
        name: "plains",
        center: [0.1, 0.3, 0.0, 0.2, 0.0],
        surface: BlockType::Grass,
        subsurface: BlockType::Dirt,
        stone_depth: 3,
        vegetation_density: 0.02,
        snow_elevation: None,
    },
    BiomeDefinition {
        id: BiomeId::Forest,
        name: "forest",
        center: [0.25, 0.0, 0.1, 0.1, 0.5],
        surface: BlockType::Grass,
        subsurface: BlockType::Dirt,
        stone_depth: 4,
        vegetation_density: 0.12,
        snow_elevation: None,
    },
    BiomeDefinition {
        id: BiomeId::Desert,
        name: "desert",
        center: [0.3, 0.2, 0.0, 0.8, -0.6],
        surface: BlockType::Sand,
        subsurface: BlockType::Sandstone,
        stone_depth: 5,
        vegetation_density: 0.0,
        snow_elevation: None,
    },
    BiomeDefinition {
        id: BiomeId::Hills,
        name: "hills",
        center: [0.5, -0.4, 0.4, 0.0, 0.0],
        surface: BlockType::Grass,
        subsurface: BlockType::Dirt,
        stone_depth: 3,
        vegetation_density: 0.04,
        snow_elevation: Some(150),
    },
    BiomeDefinition {
        id: BiomeId::Mountains,
        name: "mountains",
        center: [0.7, -0.7, 0.8, -0.2, 0.0],
        surface: BlockType::Stone,
        subsurface: BlockType::Stone,
        stone_depth: 1,
        vegetation_density: 0.0,
        snow_elevation: Some(120),
    },
    BiomeDefinition {
        id: BiomeId::SnowyTundra,
        name: "snowy_tundra",
        center: [0.3, 0.2, 0.0, -0.8, 0.0],
        surface: BlockType::Snow,
        subsurface: BlockType::Dirt,
        stone_depth: 3,
        vegetation_density: 0.0,
        snow_elevation: Some(0),
    },
];

/// Looks up a catalog entry.
pub fn biome(id: BiomeId) -> &'static BiomeDefinition {
    &BIOME_CATALOG[id as usize]
}

/// Coarse classification of a column by target height.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeightBand {
    /// More than five blocks under sea level
    DeepOcean,
    /// Under sea level
    Ocean,
    /// Up to three blocks above sea level
    Beach,
    /// Up to forty blocks above sea level
    Lowland,
    /// Up to ninety blocks above sea level
    Highland,
    /// Everything higher
    Peak,
}

impl HeightBand {
    /// Classifies a target height.
    pub fn classify(target_height: f64) -> Self {
        let sea = SEA_LEVEL as f64;
        if target_height < sea - 5.0 {
            HeightBand::DeepOcean
        } else if target_height < sea {
            HeightBand::Ocean
        } else if target_height < sea + 3.0 {
            HeightBand::Beach
        } else if target_height < sea + 40.0 {
            HeightBand::Lowland
        } else if target_height < sea + 90.0 {
            HeightBand::Highland
        } else {
            HeightBand::Peak
        }
    }
}

/// Returns the candidate nearest to `climate`. The earliest candidate wins ties.
fn nearest<'a>(candidates: &[&'a BiomeDefinition], climate: &[f64; 5]) -> &'a BiomeDefinition {
    let mut best = candidates[0];
    let mut best_distance = best.climate_distance(climate);
    for &candidate in &candidates[1..] {
        let distance = candidate.climate_distance(climate);
        if distance < best_distance {
            best = candidate;
            best_distance = distance;
        }
    }
    best
}

/// Picks the biome of a column.
pub fn select_biome(column: &TerrainParameters) -> &'static BiomeDefinition {
    let climate = column.climate_vector();
    let cold = column.temperature < COLD_TEMPERATURE;
    let hot_and_dry = column.temperature > HOT_TEMPERATURE && column.humidity < DRY_HUMIDITY;

    match HeightBand::classify(column.target_height) {
        HeightBand::DeepOcean => biome(BiomeId::DeepOcean),
        HeightBand::Ocean => biome(BiomeId::Ocean),
        HeightBand::Beach if cold => biome(BiomeId::SnowyTundra),
        HeightBand::Beach => biome(BiomeId::Beach),
        HeightBand::Lowland if hot_and_dry => biome(BiomeId::Desert),
        HeightBand::Lowland if cold => biome(BiomeId::SnowyTundra),
        HeightBand::Lowland => nearest(
            &[biome(BiomeId::Plains), biome(BiomeId::Forest)],
            &climate,
        ),
        HeightBand::Highland => nearest(
            &[
                biome(BiomeId::Plains),
                biome(BiomeId::Forest),
                biome(BiomeId::Hills),
            ],
            &climate,
        ),
        HeightBand::Peak => biome(BiomeId::Mountains),
    }
}
