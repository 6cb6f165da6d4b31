//! # Terrain Shaping
//!
//! Turns the climate noise fields into a per-column target height and a density
//! function that decides, voxel by voxel, whether terrain is solid.
//!
//! ```text
//! target_height = SEA_LEVEL + continental(c) + peaks(pv) * erosion(e)
//! density(y)    = (target_height - y) * squash(e) + detail(x, y, z) * DETAIL_AMPLITUDE
//! ```
//!
//! Low erosion gives a small squash factor, so the transition band around the
//! target height widens and the 3-D detail noise can carve overhangs. High erosion
//! flattens the terrain into plains.

use super::{
    caves::CAVE_FLOOR,
    noise::{NoiseField, NoiseSettings, WorldSeed},
    spline::Spline,
};
use crate::engine_state::voxels::chunk::CHUNK_HEIGHT;

/// Water fills every open cell up to and including this height.
pub const SEA_LEVEL: i32 = 64;

/// Weight of the 3-D detail noise in the density function.
pub const DETAIL_AMPLITUDE: f64 = 0.25;

const CONTINENTALNESS_SALT: u32 = 0x1000;
const EROSION_SALT: u32 = 0x2000;
const PEAKS_VALLEYS_SALT: u32 = 0x3000;
const TEMPERATURE_SALT: u32 = 0x4000;
const HUMIDITY_SALT: u32 = 0x5000;
const DETAIL_SALT: u32 = 0x6000;

const MIN_TARGET_HEIGHT: f64 = (CAVE_FLOOR + 2) as f64;
const MAX_TARGET_HEIGHT: f64 = (CHUNK_HEIGHT - 24) as f64;

/// Climate and shape values of one world column.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TerrainParameters {
    /// Distance from the ocean, `-1` deep sea to `1` far inland
    pub continentalness: f64,
    /// How weathered the land is, high values flatten terrain
    pub erosion: f64,
    /// Local ridges and valleys on top of the continental shape
    pub peaks_valleys: f64,
    /// Cold to hot
    pub temperature: f64,
    /// Dry to wet
    pub humidity: f64,
    /// Height the density function crosses zero at, before detail noise
    pub target_height: f64,
    /// Density gained per block below the target height
    pub squash: f64,
}

impl TerrainParameters {
    /// The 5-component climate vector used for biome matching.
    pub fn climate_vector(&self) -> [f64; 5] {
        [
            self.continentalness,
            self.erosion,
            self.peaks_valleys,
            self.temperature,
            self.humidity,
        ]
    }
}

/// Samples the terrain noise fields and evaluates the density function.
pub struct TerrainShaper {
    continentalness: NoiseField,
    erosion: NoiseField,
    peaks_valleys: NoiseField,
    temperature: NoiseField,
    humidity: NoiseField,
    detail: NoiseField,
    continental_offset: Spline,
    erosion_scale: Spline,
    peaks_offset: Spline,
    squash: Spline,
}

impl TerrainShaper {
    /// Creates the shaper for a world seed.
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            continentalness: NoiseField::new(
                seed.derive(CONTINENTALNESS_SALT),
                NoiseSettings::new(0.0016, 5),
            ),
            erosion: NoiseField::new(seed.derive(EROSION_SALT), NoiseSettings::new(0.0024, 4)),
            peaks_valleys: NoiseField::new(
                seed.derive(PEAKS_VALLEYS_SALT),
                NoiseSettings::new(0.006, 4).with_persistence(0.45),
            ),
            temperature: NoiseField::new(
                seed.derive(TEMPERATURE_SALT),
                NoiseSettings::new(0.0011, 2),
            ),
            humidity: NoiseField::new(seed.derive(HUMIDITY_SALT), NoiseSettings::new(0.0013, 2)),
            detail: NoiseField::new(seed.derive(DETAIL_SALT), NoiseSettings::new(0.04, 2)),
            continental_offset: Spline::smooth(&[
                (-1.0, -48.0),
                (-0.6, -36.0),
                (-0.35, -14.0),
                (-0.2, -4.0),
                (-0.05, 2.0),
                (0.15, 8.0),
                (0.35, 18.0),
                (0.6, 34.0),
                (1.0, 56.0),
            ]),
            erosion_scale: Spline::linear(&[
                (-1.0, 1.6),
                (-0.5, 1.2),
                (-0.1, 0.8),
                (0.3, 0.45),
                (0.7, 0.2),
                (1.0, 0.1),
            ]),
            peaks_offset: Spline::smooth(&[
                (-1.0, -16.0),
                (-0.5, -6.0),
                (0.0, 0.0),
                (0.4, 12.0),
                (0.75, 40.0),
                (1.0, 64.0),
            ]),
            squash: Spline::linear(&[(-1.0, 0.03), (-0.3, 0.06), (0.3, 0.12), (1.0, 0.2)]),
        }
    }

    /// Samples every climate field and derives the shape of one world column.
    pub fn sample_column(&self, world_x: i32, world_z: i32) -> TerrainParameters {
        let (x, z) = (world_x as f64, world_z as f64);
        let continentalness = self.continentalness.sample_2d(x, z);
        let erosion = self.erosion.sample_2d(x, z);
        let peaks_valleys = self.peaks_valleys.sample_2d(x, z);

        let target_height = SEA_LEVEL as f64
            + self.continental_offset.sample(continentalness)
            + self.peaks_offset.sample(peaks_valleys) * self.erosion_scale.sample(erosion);

        TerrainParameters {
            continentalness,
            erosion,
            peaks_valleys,
            temperature: self.temperature.sample_2d(x, z),
            humidity: self.humidity.sample_2d(x, z),
            target_height: target_height.clamp(MIN_TARGET_HEIGHT, MAX_TARGET_HEIGHT),
            squash: self.squash.sample(erosion),
        }
    }

    /// Evaluates the density function at one voxel of a sampled column.
    ///
    /// The detail field is only sampled when the height term lies within
    /// `DETAIL_AMPLITUDE` of zero, since outside that band it cannot flip the sign.
    pub fn is_solid(&self, column: &TerrainParameters, world_x: i32, y: i32, world_z: i32) -> bool {
        let base = (column.target_height - y as f64) * column.squash;
        if base >= DETAIL_AMPLITUDE {
            return true;
        }
        if base <= -DETAIL_AMPLITUDE {
            return false;
        }
        let detail = self
            .detail
            .sample_3d(world_x as f64, y as f64, world_z as f64);
        base + detail * DETAIL_AMPLITUDE > 0.0
    }
}
