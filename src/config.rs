//! # Engine Configuration
//!
//! Runtime settings for the engine, loaded from a JSON file with `serde_json`.
//! Every field has a default, so a partial file (or none at all) is valid.
//!
//! The shape of the world itself (chunk dimensions, column height, sea level) is not
//! configurable at runtime. Those values live as constants next to the code that
//! depends on them, see [`chunk`](crate::engine_state::voxels::chunk) and
//! [`terrain`](crate::engine_state::voxels::generation::terrain).
//!
//! ## Example
//!
//! ```json
//! {
//!     "seed": "abc",
//!     "render_distance": 6,
//!     "retention_distance": 9,
//!     "worker_count": 4
//! }
//! ```

use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// All tunable engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// World seed phrase. Numeric phrases are used verbatim, anything else is hashed.
    pub seed: String,
    /// Radius, in chunks, inside which chunks are meshed and shown
    pub render_distance: u32,
    /// Radius, in chunks, inside which chunk data is kept after leaving view
    pub retention_distance: u32,
    /// Number of generation worker threads
    pub worker_count: usize,
    /// Generate on the worker pool (`true`) or inline on the coordinating thread
    pub async_generation: bool,
    /// Quiet period after the last block edit before pending chunks are written
    pub save_debounce_ms: u64,
    /// Opacity added to a fading chunk on every tick
    pub fade_step: f32,
    /// How strongly chunks in front of the observer are preferred by the scheduler
    pub facing_bias: f32,
    /// Observer movement (in blocks) that triggers a full re-score of the generation queue
    pub rescore_distance: f32,
    /// Cosine of the observer turn angle that triggers a full re-score
    pub rescore_angle_cos: f32,
    /// Directory used by the file-backed chunk store
    pub save_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: "voxel".to_string(),
            render_distance: 4,
            retention_distance: 6,
            worker_count: 4,
            async_generation: true,
            save_debounce_ms: 1500,
            fade_step: 0.05,
            facing_bias: 24.0,
            rescore_distance: 8.0,
            rescore_angle_cos: 0.95,
            save_dir: PathBuf::from("world"),
        }
    }
}

impl EngineConfig {
    /// Reads and validates a configuration file.
    ///
    /// # Arguments
    /// * `path` - Location of a JSON configuration file
    ///
    /// # Returns
    /// The parsed configuration, or the reason it was rejected
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Checks that every value is inside its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retention_distance < self.render_distance {
            return Err(ConfigError::Invalid(format!(
                "retention_distance ({}) must not be smaller than render_distance ({})",
                self.retention_distance, self.render_distance
            )));
        }
        if self.worker_count == 0 {
            return Err(ConfigError::Invalid(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if !(self.fade_step > 0.0 && self.fade_step <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "fade_step must be in (0, 1], got {}",
                self.fade_step
            )));
        }
        if !self.facing_bias.is_finite() || self.facing_bias < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "facing_bias must be a non-negative number, got {}",
                self.facing_bias
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "seed": "abc", "render_distance": 2 }"#).unwrap();
        assert_eq!(config.seed, "abc");
        assert_eq!(config.render_distance, 2);
        assert_eq!(config.worker_count, EngineConfig::default().worker_count);
    }

    #[test]
    fn retention_must_cover_render_distance() {
        let config = EngineConfig {
            render_distance: 5,
            retention_distance: 3,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_workers_rejected() {
        let config = EngineConfig {
            worker_count: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
