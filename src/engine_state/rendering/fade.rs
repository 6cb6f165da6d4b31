//! # Fade Tracker
//!
//! Drives the opacity ramp of freshly meshed chunks. A chunk that starts fading goes
//! `Start → Fading → Completed`; the ramp is independent of how often the chunk is
//! remeshed while it runs.

use std::collections::HashMap;

use crate::engine_state::voxels::chunk::ChunkPosition;

/// Stage of a chunk's fade-in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FadeState {
    /// Tracked, not advanced yet
    Start,
    /// Opacity is ramping up
    Fading,
    /// Fully opaque
    Completed,
}

#[derive(Copy, Clone, Debug)]
struct Fade {
    state: FadeState,
    opacity: f32,
}

/// Per-chunk fade-in state.
#[derive(Debug)]
pub struct FadeTracker {
    step: f32,
    fades: HashMap<ChunkPosition, Fade>,
}

impl FadeTracker {
    /// Creates a tracker adding `step` to the opacity of every fading chunk per update.
    pub fn new(step: f32) -> Self {
        Self {
            step: step.clamp(f32::EPSILON, 1.0),
            fades: HashMap::new(),
        }
    }

    /// Starts a fade for a chunk that has just been meshed.
    ///
    /// Chunks that are already fading or completed keep their state.
    ///
    /// # Returns
    /// `true` if a new fade started
    pub fn on_remeshed(&mut self, position: ChunkPosition) -> bool {
        if self.fades.contains_key(&position) {
            return false;
        }
        self.fades.insert(
            position,
            Fade {
                state: FadeState::Start,
                opacity: 0.0,
            },
        );
        true
    }

    /// Advances every unfinished fade by one step.
    ///
    /// # Returns
    /// The chunks whose opacity changed and their new opacity, sorted by position
    pub fn update(&mut self) -> Vec<(ChunkPosition, f32)> {
        let step = self.step;
        let mut changed: Vec<(ChunkPosition, f32)> = self
            .fades
            .iter_mut()
            .filter(|(_, fade)| fade.state != FadeState::Completed)
            .map(|(position, fade)| {
                fade.opacity = (fade.opacity + step).min(1.0);
                fade.state = if fade.opacity >= 1.0 {
                    FadeState::Completed
                } else {
                    FadeState::Fading
                };
                (*position, fade.opacity)
            })
            .collect();
        changed.sort_by_key(|(position, _)| *position);
        changed
    }

    /// Stops tracking a chunk.
    ///
    /// # Returns
    /// `true` if the chunk was tracked
    pub fn remove(&mut self, position: ChunkPosition) -> bool {
        self.fades.remove(&position).is_some()
    }

    /// Current opacity of a tracked chunk.
    pub fn opacity(&self, position: ChunkPosition) -> Option<f32> {
        self.fades.get(&position).map(|fade| fade.opacity)
    }

    /// Current stage of a tracked chunk.
    pub fn state(&self, position: ChunkPosition) -> Option<FadeState> {
        self.fades.get(&position).map(|fade| fade.state)
    }

    /// Number of tracked chunks.
    pub fn len(&self) -> usize {
        self.fades.len()
    }

    /// Returns `true` if no chunk is tracked.
    pub fn is_empty(&self) -> bool {
        self.fades.is_empty()
    }
}
