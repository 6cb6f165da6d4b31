//! # Noise Fields
//!
//! Seeded fractal noise used by every generation stage, plus the world seed that
//! derives an independent noise seed for each field.

use ::noise::{Fbm, MultiFractal, NoiseFn, Perlin};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Numeric world seed derived from a user-supplied phrase.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(pub u64);

impl WorldSeed {
    /// Turns a seed phrase into a world seed.
    ///
    /// Phrases that parse as an integer are used verbatim, so `"42"` and `42` name the
    /// same world. Anything else is hashed with 64-bit FNV-1a.
    pub fn from_phrase(phrase: &str) -> Self {
        let trimmed = phrase.trim();
        if let Ok(value) = trimmed.parse::<u64>() {
            return Self(value);
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return Self(value as u64);
        }
        let hash = phrase.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
        });
        Self(hash)
    }

    /// A 32-bit seed for one noise field.
    ///
    /// Each field passes a distinct `salt` so that no two fields share a permutation table.
    pub fn derive(self, salt: u32) -> u32 {
        ((self.0 ^ (self.0 >> 32)) as u32).wrapping_add(salt)
    }
}

/// Shape of a fractal noise field.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NoiseSettings {
    /// Frequency of the first octave, in cycles per block
    pub frequency: f64,
    /// Number of octaves summed
    pub octaves: usize,
    /// Amplitude multiplier between octaves
    pub persistence: f64,
    /// Frequency multiplier between octaves
    pub lacunarity: f64,
}

impl NoiseSettings {
    /// Settings with the usual persistence of 0.5 and lacunarity of 2.
    pub const fn new(frequency: f64, octaves: usize) -> Self {
        Self {
            frequency,
            octaves,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }

    /// Overrides the persistence.
    pub const fn with_persistence(mut self, persistence: f64) -> Self {
        self.persistence = persistence;
        self
    }
}

/// A seeded fBm Perlin field, sampled in two or three dimensions.
///
/// Samples are clamped to `[-1, 1]`.
pub struct NoiseField {
    fbm: Fbm<Perlin>,
}

impl NoiseField {
    /// Creates a field from a seed and its shape.
    pub fn new(seed: u32, settings: NoiseSettings) -> Self {
        let fbm = Fbm::<Perlin>::new(seed)
            .set_octaves(settings.octaves)
            .set_frequency(settings.frequency)
            .set_persistence(settings.persistence)
            .set_lacunarity(settings.lacunarity);
        Self { fbm }
    }

    /// Samples the field on the horizontal plane.
    pub fn sample_2d(&self, x: f64, z: f64) -> f64 {
        self.fbm.get([x, z]).clamp(-1.0, 1.0)
    }

    /// Samples the field in three dimensions.
    pub fn sample_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        self.fbm.get([x, y, z]).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_phrases_are_used_verbatim() {
        assert_eq!(WorldSeed::from_phrase("12345"), WorldSeed(12345));
        assert_eq!(WorldSeed::from_phrase("-1"), WorldSeed(u64::MAX));
    }

    #[test]
    fn text_phrases_are_hashed_stably() {
        let abc = WorldSeed::from_phrase("abc");
        assert_eq!(abc, WorldSeed::from_phrase("abc"));
        assert_eq!(abc, WorldSeed(0xe71f_a219_0541_574b));
        assert_ne!(abc, WorldSeed::from_phrase("abd"));
        assert_eq!(WorldSeed::from_phrase(""), WorldSeed(FNV_OFFSET_BASIS));
    }

    #[test]
    fn fields_are_deterministic_and_bounded() {
        let settings = NoiseSettings::new(0.013, 4);
        let a = NoiseField::new(7, settings);
        let b = NoiseField::new(7, settings);
        for i in 0..64 {
            let (x, z) = (i as f64 * 3.7, i as f64 * -1.3);
            let value = a.sample_2d(x, z);
            assert_eq!(value, b.sample_2d(x, z));
            assert!((-1.0..=1.0).contains(&value));
            assert!((-1.0..=1.0).contains(&a.sample_3d(x, i as f64, z)));
        }
    }
}
