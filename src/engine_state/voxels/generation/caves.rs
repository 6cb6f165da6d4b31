//! # Caves
//!
//! Two cave shapes are carved out of solid terrain:
//!
//! * Cheese caves, large chambers where a low-frequency 3-D field dips below a
//!   threshold.
//! * Spaghetti caves, thin tunnels that follow the zero surface of a second field.
//!
//! Both are scaled by an attenuation curve over height so caves are common deep
//! underground, rare near mountain tops and absent at the top of the column.

use super::{
    noise::{NoiseField, NoiseSettings, WorldSeed},
    spline::Spline,
};

/// Voxels at or below this height are never carved.
pub const CAVE_FLOOR: i32 = 4;

/// Cheese noise threshold at full attenuation.
pub const CHEESE_THRESHOLD: f64 = -0.42;

/// Half-width of a spaghetti tunnel, in noise units, at full attenuation.
pub const SPAGHETTI_RADIUS: f64 = 0.055;

const CHEESE_SALT: u32 = 0x7000;
const SPAGHETTI_SALT: u32 = 0x8000;

// Stretching y flattens chambers and keeps tunnels mostly horizontal.
const CHEESE_Y_STRETCH: f64 = 1.6;
const SPAGHETTI_Y_STRETCH: f64 = 2.0;

/// Decides which solid voxels become cave air.
pub struct CaveCarver {
    cheese: NoiseField,
    spaghetti: NoiseField,
    attenuation: Spline,
}

impl CaveCarver {
    /// Creates the carver for a world seed.
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            cheese: NoiseField::new(seed.derive(CHEESE_SALT), NoiseSettings::new(0.018, 3)),
            spaghetti: NoiseField::new(
                seed.derive(SPAGHETTI_SALT),
                NoiseSettings::new(0.03, 2).with_persistence(0.4),
            ),
            attenuation: Spline::linear(&[
                (0.0, 1.0),
                (60.0, 1.0),
                (120.0, 0.45),
                (200.0, 0.05),
                (255.0, 0.0),
            ]),
        }
    }

    /// Cave strength at a height, `1` deep down and `0` at the top of the column.
    pub fn attenuation(&self, y: i32) -> f64 {
        self.attenuation.sample(y as f64)
    }

    /// Returns `true` if the voxel is inside a cheese chamber.
    pub fn is_cheese(&self, world_x: i32, y: i32, world_z: i32, attenuation: f64) -> bool {
        let threshold = -1.0 + (CHEESE_THRESHOLD + 1.0) * attenuation;
        let value = self.cheese.sample_3d(
            world_x as f64,
            y as f64 * CHEESE_Y_STRETCH,
            world_z as f64,
        );
        value < threshold
    }

    /// Returns `true` if the voxel is inside a spaghetti tunnel.
    pub fn is_spaghetti(&self, world_x: i32, y: i32, world_z: i32, attenuation: f64) -> bool {
        let value = self.spaghetti.sample_3d(
            world_x as f64,
            y as f64 * SPAGHETTI_Y_STRETCH,
            world_z as f64,
        );
        value.abs() < SPAGHETTI_RADIUS * attenuation
    }

    /// Returns `true` if a solid voxel should be carved to air.
    pub fn should_carve(&self, world_x: i32, y: i32, world_z: i32) -> bool {
        if y <= CAVE_FLOOR {
            return false;
        }
        let attenuation = self.attenuation(y);
        if attenuation <= 0.0 {
            return false;
        }
        self.is_cheese(world_x, y, world_z, attenuation)
            || self.is_spaghetti(world_x, y, world_z, attenuation)
    }
}
