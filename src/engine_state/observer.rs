//! # Observer
//!
//! The point of view that drives streaming: its position decides which chunks are
//! visible and its facing biases which chunks generate first.

use cgmath::{InnerSpace, Point3, Rad, Vector3};
use serde::{Deserialize, Serialize};

use super::voxels::chunk::ChunkPosition;

/// Observer position and look direction in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Observer {
    /// World-space position, in blocks
    pub position: Point3<f32>,
    /// Look direction. Does not need to be normalised.
    pub facing: Vector3<f32>,
}

impl Default for Observer {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 100.0, 0.0),
            facing: Vector3::unit_x(),
        }
    }
}

impl Observer {
    /// Creates an observer from a position and a look direction.
    pub fn new(position: Point3<f32>, facing: Vector3<f32>) -> Self {
        Self { position, facing }
    }

    /// Creates an observer from camera angles.
    ///
    /// # Arguments
    /// * `position` - World-space position
    /// * `yaw` - Rotation around the vertical axis, zero looks along +X
    /// * `pitch` - Rotation above the horizon
    pub fn from_angles<Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: Point3<f32>,
        yaw: Y,
        pitch: P,
    ) -> Self {
        let (yaw_sin, yaw_cos) = yaw.into().0.sin_cos();
        let (pitch_sin, pitch_cos) = pitch.into().0.sin_cos();
        Self {
            position,
            facing: Vector3::new(pitch_cos * yaw_cos, pitch_sin, pitch_cos * yaw_sin).normalize(),
        }
    }

    /// Chunk the observer stands in.
    pub fn chunk_position(&self) -> ChunkPosition {
        ChunkPosition::containing_point(self.position.x, self.position.z)
    }

    /// Moves the observer along its horizontal facing.
    pub fn walk(&mut self, distance: f32) {
        let flat = Vector3::new(self.facing.x, 0.0, self.facing.z);
        if flat.magnitude2() > f32::EPSILON {
            self.position += flat.normalize() * distance;
        }
    }
}

/// Serialisable observer, stored in world metadata between sessions.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObserverState {
    /// World-space position `[x, y, z]`
    pub position: [f32; 3],
    /// Look direction `[x, y, z]`
    pub facing: [f32; 3],
}

impl From<Observer> for ObserverState {
    fn from(observer: Observer) -> Self {
        Self {
            position: observer.position.into(),
            facing: observer.facing.into(),
        }
    }
}

impl From<ObserverState> for Observer {
    fn from(state: ObserverState) -> Self {
        Self {
            position: state.position.into(),
            facing: state.facing.into(),
        }
    }
}
