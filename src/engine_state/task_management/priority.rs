//! # Generation Priority
//!
//! Cost model and queue ordering for pending chunk generation.
//!
//! A chunk's cost is its distance from the observer minus a bonus for lying in the
//! direction the observer faces:
//!
//! ```text
//! cost = |to_chunk| - dot(to_chunk / |to_chunk|, facing) * facing_bias
//! ```
//!
//! Everything is measured on the horizontal plane, in blocks. Lower cost runs first;
//! equal costs run in request order.

use std::{cmp::Ordering, collections::BinaryHeap};

use cgmath::{InnerSpace, Point3, Vector2, Vector3};

use crate::engine_state::voxels::chunk::ChunkPosition;

/// Observer position and facing projected onto the horizontal plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ObserverView {
    position: Vector2<f32>,
    facing: Vector2<f32>,
}

impl ObserverView {
    /// Projects a 3-D observer onto the XZ plane.
    ///
    /// A facing with no horizontal component (looking straight up or down) gives
    /// no directional preference.
    pub fn new(position: Point3<f32>, facing: Vector3<f32>) -> Self {
        let flat = Vector2::new(facing.x, facing.z);
        let facing = if flat.magnitude2() > f32::EPSILON {
            flat.normalize()
        } else {
            Vector2::new(0.0, 0.0)
        };
        Self {
            position: Vector2::new(position.x, position.z),
            facing,
        }
    }

    /// Scheduling cost of a chunk seen from this view.
    pub fn cost(&self, chunk: ChunkPosition, facing_bias: f32) -> f32 {
        let (x, z) = chunk.center();
        let to_chunk = Vector2::new(x, z) - self.position;
        let distance = to_chunk.magnitude();
        if distance <= f32::EPSILON {
            return 0.0;
        }
        distance - to_chunk.dot(self.facing) / distance * facing_bias
    }

    /// Returns `true` if the observer moved or turned enough to re-score the queue.
    pub fn differs_materially(
        &self,
        other: &ObserverView,
        rescore_distance: f32,
        rescore_angle_cos: f32,
    ) -> bool {
        if (self.position - other.position).magnitude() > rescore_distance {
            return true;
        }
        let zero = Vector2::new(0.0, 0.0);
        if self.facing == zero || other.facing == zero {
            return self.facing != other.facing;
        }
        self.facing.dot(other.facing) < rescore_angle_cos
    }
}

#[derive(Debug)]
struct QueuedChunk {
    cost: f32,
    sequence: u64,
    position: ChunkPosition,
}

// BinaryHeap is a max-heap, so "greater" means cheaper, then older.
impl Ord for QueuedChunk {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueuedChunk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedChunk {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedChunk {}

/// Min-cost queue of chunk positions.
#[derive(Debug, Default)]
pub struct PriorityQueue {
    heap: BinaryHeap<QueuedChunk>,
    next_sequence: u64,
}

impl PriorityQueue {
    /// Adds a position with its cost.
    pub fn push(&mut self, position: ChunkPosition, cost: f32) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(QueuedChunk {
            cost,
            sequence,
            position,
        });
    }

    /// Removes and returns the cheapest position.
    pub fn pop(&mut self) -> Option<ChunkPosition> {
        self.heap.pop().map(|queued| queued.position)
    }

    /// Drops a position from the queue, returning `true` if it was queued.
    pub fn remove(&mut self, position: ChunkPosition) -> bool {
        let before = self.heap.len();
        self.heap.retain(|queued| queued.position != position);
        self.heap.len() != before
    }

    /// Recomputes every cost. Request order is kept for ties.
    pub fn rescore(&mut self, mut cost: impl FnMut(ChunkPosition) -> f32) {
        let entries = std::mem::take(&mut self.heap).into_vec();
        self.heap = entries
            .into_iter()
            .map(|queued| QueuedChunk {
                cost: cost(queued.position),
                ..queued
            })
            .collect();
    }

    /// Number of queued positions.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Empties the queue.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(x: f32, z: f32, facing_x: f32, facing_z: f32) -> ObserverView {
        ObserverView::new(
            Point3::new(x, 80.0, z),
            Vector3::new(facing_x, 0.0, facing_z),
        )
    }

    #[test]
    fn chunks_ahead_are_cheaper() {
        let observer = view(8.0, 8.0, 1.0, 0.0);
        let ahead = observer.cost(ChunkPosition::new(3, 0), 24.0);
        let behind = observer.cost(ChunkPosition::new(-3, 0), 24.0);
        assert!(ahead < behind);
        assert_eq!(observer.cost(ChunkPosition::new(0, 0), 24.0), 0.0);
    }

    #[test]
    fn queue_pops_cheapest_then_oldest() {
        let mut queue = PriorityQueue::default();
        queue.push(ChunkPosition::new(0, 0), 5.0);
        queue.push(ChunkPosition::new(1, 0), 1.0);
        queue.push(ChunkPosition::new(2, 0), 5.0);
        queue.push(ChunkPosition::new(3, 0), -2.0);
        assert_eq!(queue.pop(), Some(ChunkPosition::new(3, 0)));
        assert_eq!(queue.pop(), Some(ChunkPosition::new(1, 0)));
        assert_eq!(queue.pop(), Some(ChunkPosition::new(0, 0)));
        assert_eq!(queue.pop(), Some(ChunkPosition::new(2, 0)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn rescore_reorders_and_remove_drops() {
        let mut queue = PriorityQueue::default();
        for x in 0..4 {
            queue.push(ChunkPosition::new(x, 0), x as f32);
        }
        assert!(queue.remove(ChunkPosition::new(1, 0)));
        assert!(!queue.remove(ChunkPosition::new(1, 0)));
        queue.rescore(|position| -(position.x as f32));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(ChunkPosition::new(3, 0)));
        assert_eq!(queue.pop(), Some(ChunkPosition::new(2, 0)));
        assert_eq!(queue.pop(), Some(ChunkPosition::new(0, 0)));
        assert!(queue.is_empty());
    }

    #[test]
    fn material_change_thresholds() {
        let base = view(0.0, 0.0, 1.0, 0.0);
        assert!(!base.differs_materially(&view(3.0, 0.0, 1.0, 0.05), 8.0, 0.95));
        assert!(base.differs_materially(&view(9.0, 0.0, 1.0, 0.0), 8.0, 0.95));
        assert!(base.differs_materially(&view(0.0, 0.0, 0.0, 1.0), 8.0, 0.95));
        let up = view(0.0, 0.0, 0.0, 0.0);
        assert!(!up.differs_materially(&view(0.0, 0.0, 0.0, 0.0), 8.0, 0.95));
        assert!(up.differs_materially(&base, 8.0, 0.95));
    }
}
