//! # World Module
//!
//! This module provides the `World` struct, the chunk manager that owns every
//! loaded chunk and decides which chunks are loaded, visible, saved or dropped.
//!
//! ## Partitions
//!
//! Each loaded chunk is either
//! - **visible**: within the render distance of the observer's chunk, meshed and shown
//! - **cached**: within the retention distance, data kept but mesh dropped
//!
//! Chunks beyond the retention distance are unloaded. Distances are Euclidean and
//! measured in chunks.
//!
//! ## Admission
//!
//! A chunk entering view is taken from memory if loaded, otherwise from the store,
//! otherwise generated: on the scheduler's workers when one is attached, inline when
//! not. [`World::ensure_chunk`] always produces chunks inline.
//!
//! ## Persistence
//!
//! Only edited chunks are ever written. Edits add the chunk to a pending-save set and
//! restart a debounce timer; [`World::flush_if_quiet`] writes the set once the timer
//! has run out. Chunks leaving the retention distance are flushed before they are
//! dropped. A failed write keeps the chunk pending and the timer armed, so the next
//! flush retries it, and a chunk whose flush fails on eviction stays cached until a
//! later write succeeds. Failed reads are logged and the chunk is treated as absent.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use cgmath::{Point3, Vector3};
use log::{debug, warn};
use web_time::{Duration, Instant};

use super::{
    block::{block_type::BlockType, BlockTypeSize, AIR},
    chunk::{
        new_chunk_buffer, split_world_column, Chunk, ChunkPosition, CHUNK_HEIGHT, CHUNK_SIZE_X,
        CHUNK_SIZE_Z, CHUNK_VOLUME,
    },
    generation::TerrainGenerator,
    store::ChunkStore,
};
use crate::{
    config::EngineConfig,
    engine_state::{
        observer::ObserverState,
        task_management::{GenerationTicket, TaskManager, TaskStats, TicketStatus},
    },
    error::StoreError,
};

/// Metadata key the last observer is stored under.
pub const OBSERVER_METADATA_KEY: &str = "observer";

/// Streaming distances and save timing of a [`World`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WorldSettings {
    /// Radius, in chunks, of the visible partition
    pub render_distance: f32,
    /// Radius, in chunks, beyond which chunks are unloaded
    pub retention_distance: f32,
    /// Quiet period after the last edit before pending chunks are saved
    pub save_debounce: Duration,
}

impl From<&EngineConfig> for WorldSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            render_distance: config.render_distance as f32,
            retention_distance: config.retention_distance as f32,
            save_debounce: Duration::from_millis(config.save_debounce_ms),
        }
    }
}

impl Default for WorldSettings {
    fn default() -> Self {
        WorldSettings::from(&EngineConfig::default())
    }
}

/// Partition changes produced by [`World::update_visible_chunks`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityChanges {
    /// Chunks that became visible
    pub entered: Vec<ChunkPosition>,
    /// Chunks that went from visible to cached
    pub demoted: Vec<ChunkPosition>,
    /// Chunks that were dropped from memory
    pub unloaded: Vec<ChunkPosition>,
}

impl VisibilityChanges {
    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.demoted.is_empty() && self.unloaded.is_empty()
    }
}

/// Counters describing the world's memory and persistence state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Chunks in memory
    pub loaded: usize,
    /// Loaded chunks within render distance
    pub visible: usize,
    /// Loaded chunks outside render distance
    pub cached: usize,
    /// Chunks waiting on the scheduler
    pub generating: usize,
    /// Edited chunks not yet saved
    pub pending_saves: usize,
    /// Chunks produced by the generator since start
    pub generated: u64,
    /// Chunks read back from the store since start
    pub loaded_from_store: u64,
    /// Chunk writes to the store since start
    pub saved: u64,
}

/// Chunk manager of the voxel world.
pub struct World {
    chunks: HashMap<ChunkPosition, Chunk>,
    visible: HashSet<ChunkPosition>,
    generating: HashMap<ChunkPosition, GenerationTicket>,
    pending_saves: HashSet<ChunkPosition>,
    last_edit: Option<Instant>,
    center: Option<ChunkPosition>,
    generator: Arc<TerrainGenerator>,
    scheduler: Option<TaskManager>,
    store: Box<dyn ChunkStore>,
    settings: WorldSettings,
    stats: WorldStats,
}

impl World {
    /// Creates an empty world.
    ///
    /// # Arguments
    /// * `generator` - Generator for chunks missing from the store
    /// * `store` - Persistence collaborator
    /// * `scheduler` - Worker pool for asynchronous generation, `None` to generate inline
    /// * `settings` - Streaming distances and save timing
    pub fn new(
        generator: Arc<TerrainGenerator>,
        store: Box<dyn ChunkStore>,
        scheduler: Option<TaskManager>,
        settings: WorldSettings,
    ) -> Self {
        World {
            chunks: HashMap::new(),
            visible: HashSet::new(),
            generating: HashMap::new(),
            pending_saves: HashSet::new(),
            last_edit: None,
            center: None,
            generator,
            scheduler,
            store,
            settings,
            stats: WorldStats::default(),
        }
    }

    /// The generator chunks are produced with.
    pub fn generator(&self) -> &Arc<TerrainGenerator> {
        &self.generator
    }

    /// Returns the chunk at `position` if it is loaded.
    pub fn chunk(&self, position: ChunkPosition) -> Option<&Chunk> {
        self.chunks.get(&position)
    }

    /// Returns `true` if the chunk at `position` is loaded.
    pub fn is_loaded(&self, position: ChunkPosition) -> bool {
        self.chunks.contains_key(&position)
    }

    /// Returns `true` if the chunk at `position` is in the visible partition.
    pub fn is_visible(&self, position: ChunkPosition) -> bool {
        self.visible.contains(&position)
    }

    /// Positions of every loaded chunk.
    pub fn loaded_chunks(&self) -> impl Iterator<Item = ChunkPosition> + '_ {
        self.chunks.keys().copied()
    }

    /// Positions of every visible chunk.
    pub fn visible_chunks(&self) -> impl Iterator<Item = ChunkPosition> + '_ {
        self.visible.iter().copied()
    }

    /// Visible chunks whose mesh is stale, sorted by position.
    pub fn dirty_visible_chunks(&self) -> Vec<ChunkPosition> {
        let mut dirty: Vec<ChunkPosition> = self
            .visible
            .iter()
            .copied()
            .filter(|position| {
                self.chunks
                    .get(position)
                    .is_some_and(Chunk::needs_update)
            })
            .collect();
        dirty.sort();
        dirty
    }

    /// Clears the stale-mesh flag of a chunk, returning its previous value.
    pub fn take_dirty(&mut self, position: ChunkPosition) -> bool {
        self.chunks
            .get_mut(&position)
            .is_some_and(Chunk::take_dirty)
    }

    /// Returns the chunk at `position`, producing it inline if it is not loaded.
    ///
    /// An asynchronous request for the same chunk that is still outstanding is
    /// abandoned: its result is discarded when it arrives.
    pub fn ensure_chunk(&mut self, position: ChunkPosition) -> &mut Chunk {
        if !self.chunks.contains_key(&position) {
            let chunk = self
                .load_from_store(position)
                .unwrap_or_else(|| self.generate_inline(position));
            self.admit(chunk);
        }
        self.chunks
            .entry(position)
            .or_insert_with(|| Chunk::empty(position))
    }

    /// Reads a block at world coordinates.
    ///
    /// Unloaded chunks and heights outside the column read as air.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockTypeSize {
        if !(0..CHUNK_HEIGHT as i32).contains(&y) {
            return AIR;
        }
        let (position, local_x, local_z) = split_world_column(x, z);
        self.chunks
            .get(&position)
            .map(|chunk| chunk.get_block(local_x as i32, y, local_z as i32))
            .unwrap_or(AIR)
    }

    /// Writes a block at world coordinates, loading the chunk if needed.
    ///
    /// Edits on a chunk's outer ring also flag the loaded neighbour across that edge,
    /// whose boundary faces depend on this voxel.
    ///
    /// # Returns
    /// `false` if `y` is outside the column, in which case nothing changes
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockType) -> bool {
        if !(0..CHUNK_HEIGHT as i32).contains(&y) {
            return false;
        }
        let (position, local_x, local_z) = split_world_column(x, z);
        if !self
            .ensure_chunk(position)
            .set_block(local_x as i32, y, local_z as i32, block.code())
        {
            return false;
        }

        if local_x == 0 {
            self.mark_dirty(position.offset(-1, 0));
        }
        if local_x == CHUNK_SIZE_X - 1 {
            self.mark_dirty(position.offset(1, 0));
        }
        if local_z == 0 {
            self.mark_dirty(position.offset(0, -1));
        }
        if local_z == CHUNK_SIZE_Z - 1 {
            self.mark_dirty(position.offset(0, 1));
        }

        self.pending_saves.insert(position);
        self.last_edit = Some(Instant::now());
        true
    }

    fn mark_dirty(&mut self, position: ChunkPosition) {
        if let Some(chunk) = self.chunks.get_mut(&position) {
            chunk.mark_dirty();
        }
    }

    /// Forwards the observer to the scheduler's priority model.
    pub fn update_observer(&mut self, position: Point3<f32>, facing: Vector3<f32>) {
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.update_observer(position, facing);
        }
    }

    /// Recomputes the partitions around the observer.
    ///
    /// # Arguments
    /// * `observer_x` - Observer world x, in blocks
    /// * `observer_z` - Observer world z, in blocks
    ///
    /// # Returns
    /// The chunks that entered view, left view, or were unloaded. Each list is sorted.
    pub fn update_visible_chunks(&mut self, observer_x: f32, observer_z: f32) -> VisibilityChanges {
        let center = ChunkPosition::containing_point(observer_x, observer_z);
        let render = self.settings.render_distance;
        let retention = self.settings.retention_distance;
        let mut changes = VisibilityChanges::default();

        let loaded: Vec<ChunkPosition> = self.chunks.keys().copied().collect();
        for position in loaded {
            let distance = position.distance_to(center);
            if distance <= render {
                if self.visible.insert(position) {
                    self.mark_dirty(position);
                    changes.entered.push(position);
                }
            } else if distance <= retention {
                if self.visible.remove(&position) {
                    changes.demoted.push(position);
                }
            } else if self.unload(position) {
                changes.unloaded.push(position);
            } else if self.visible.remove(&position) {
                changes.demoted.push(position);
            }
        }

        let abandoned: Vec<ChunkPosition> = self
            .generating
            .keys()
            .copied()
            .filter(|position| position.distance_to(center) > retention)
            .collect();
        for position in abandoned {
            self.generating.remove(&position);
            if let Some(scheduler) = self.scheduler.as_mut() {
                scheduler.cancel(position);
            }
        }

        let radius = render.floor() as i32;
        let mut missing = Vec::new();
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let position = center.offset(dx, dz);
                if position.distance_to(center) <= render
                    && !self.chunks.contains_key(&position)
                    && !self.generating.contains_key(&position)
                {
                    missing.push(position);
                }
            }
        }
        missing.sort_by(|a, b| {
            a.distance_to(center)
                .total_cmp(&b.distance_to(center))
                .then_with(|| a.cmp(b))
        });

        for position in missing {
            let chunk = match self.load_from_store(position) {
                Some(chunk) => chunk,
                None => match self.scheduler.as_mut() {
                    Some(scheduler) => {
                        let ticket = scheduler.request_chunk(position, new_chunk_buffer());
                        self.generating.insert(position, ticket);
                        continue;
                    }
                    None => self.generate_inline(position),
                },
            };
            self.admit(chunk);
            self.visible.insert(position);
            changes.entered.push(position);
        }

        self.center = Some(center);
        changes.entered.sort();
        changes.demoted.sort();
        changes.unloaded.sort();
        changes
    }

    /// Applies finished asynchronous generation.
    ///
    /// Results for chunks that were loaded in the meantime or are no longer wanted
    /// are discarded. Failed requests are forgotten, so the chunk is requested again by
    /// the next visibility update that still wants it.
    ///
    /// # Returns
    /// Chunks admitted by this call that are now visible, in completion order
    pub fn process_generation(&mut self) -> Vec<ChunkPosition> {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return Vec::new();
        };
        let completed = scheduler.process();

        let mut admitted = Vec::new();
        for position in completed {
            let Some(ticket) = self.generating.remove(&position) else {
                continue;
            };
            if self.chunks.contains_key(&position) {
                continue;
            }
            let buffer = match ticket.status() {
                TicketStatus::Ready(buffer) => buffer,
                TicketStatus::Failed(error) => {
                    warn!(
                        "Dropping generation result for chunk ({}, {}): {}",
                        position.x, position.z, error
                    );
                    continue;
                }
                TicketStatus::Pending => continue,
            };
            drop(ticket);
            let blocks = Arc::try_unwrap(buffer).unwrap_or_else(|shared| (*shared).clone());
            let Some(chunk) = Chunk::from_blocks(position, blocks) else {
                continue;
            };

            self.stats.generated += 1;
            self.admit(chunk);
            let in_view = self
                .center
                .is_some_and(|center| position.distance_to(center) <= self.settings.render_distance);
            if in_view {
                self.visible.insert(position);
                admitted.push(position);
            }
        }
        admitted
    }

    /// Saves every pending chunk once no edit happened for the debounce period.
    ///
    /// # Returns
    /// Number of chunks written
    pub fn flush_if_quiet(&mut self, now: Instant) -> usize {
        let Some(last_edit) = self.last_edit else {
            return 0;
        };
        if now.saturating_duration_since(last_edit) < self.settings.save_debounce {
            return 0;
        }
        self.save_all()
    }

    /// Saves every pending chunk immediately.
    ///
    /// Chunks whose write fails stay pending and keep the debounce timer armed.
    ///
    /// # Returns
    /// Number of chunks written
    pub fn save_all(&mut self) -> usize {
        let mut pending: Vec<ChunkPosition> = self.pending_saves.drain().collect();
        pending.sort();
        let mut written = 0;
        for position in pending {
            if self.save_chunk(position) {
                written += 1;
            } else if self.chunks.contains_key(&position) {
                self.pending_saves.insert(position);
            }
        }
        if self.pending_saves.is_empty() {
            self.last_edit = None;
        }
        if written > 0 {
            debug!("Saved {written} edited chunks");
        }
        written
    }

    /// Saves pending edits and stops the scheduler, cancelling outstanding work.
    pub fn dispose(&mut self) {
        self.save_all();
        self.generating.clear();
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.shutdown();
        }
    }

    /// Persists the observer in world metadata.
    pub fn save_observer(&mut self, observer: &ObserverState) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(observer)?;
        self.store.set_metadata(OBSERVER_METADATA_KEY, &encoded)
    }

    /// Restores the observer saved by [`World::save_observer`].
    ///
    /// Missing or unreadable metadata yields `None`.
    pub fn load_observer(&mut self) -> Option<ObserverState> {
        let encoded = match self.store.get_metadata(OBSERVER_METADATA_KEY) {
            Ok(encoded) => encoded?,
            Err(error) => {
                warn!("Cannot read observer metadata: {error}");
                return None;
            }
        };
        serde_json::from_str(&encoded)
            .map_err(|error| warn!("Ignoring malformed observer metadata: {error}"))
            .ok()
    }

    /// Snapshot of the world's counters.
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            loaded: self.chunks.len(),
            visible: self.visible.len(),
            cached: self.chunks.len() - self.visible.len(),
            generating: self.generating.len(),
            pending_saves: self.pending_saves.len(),
            ..self.stats
        }
    }

    /// Counters of the attached scheduler, if any.
    pub fn scheduler_stats(&self) -> Option<TaskStats> {
        self.scheduler.as_ref().map(TaskManager::stats)
    }

    /// Inserts a freshly produced chunk and flags its loaded neighbours, whose
    /// boundary faces were culled against air until now.
    fn admit(&mut self, chunk: Chunk) {
        let position = chunk.position();
        self.generating.remove(&position);
        for neighbor in position.neighbors() {
            self.mark_dirty(neighbor);
        }
        debug!("Admitted chunk ({}, {})", position.x, position.z);
        self.chunks.insert(position, chunk);
    }

    /// Drops a chunk, flushing it first if it has unsaved edits.
    ///
    /// # Returns
    /// `false` if the flush failed and the chunk was kept
    fn unload(&mut self, position: ChunkPosition) -> bool {
        if self.pending_saves.contains(&position) {
            if !self.save_chunk(position) {
                warn!(
                    "Keeping chunk ({}, {}) in memory until its edits are saved",
                    position.x, position.z
                );
                return false;
            }
            self.pending_saves.remove(&position);
        }
        self.visible.remove(&position);
        self.chunks.remove(&position);
        debug!("Unloaded chunk ({}, {})", position.x, position.z);
        true
    }

    fn save_chunk(&mut self, position: ChunkPosition) -> bool {
        let Some(chunk) = self.chunks.get(&position) else {
            return false;
        };
        match self.store.save_chunk(position, chunk.as_bytes()) {
            Ok(()) => {
                self.stats.saved += 1;
                true
            }
            Err(error) => {
                warn!(
                    "Failed to save chunk ({}, {}): {}",
                    position.x, position.z, error
                );
                false
            }
        }
    }

    fn load_from_store(&mut self, position: ChunkPosition) -> Option<Chunk> {
        let result = self.store.load_chunk(position).and_then(|blocks| match blocks {
            None => Ok(None),
            Some(blocks) if blocks.len() != CHUNK_VOLUME => Err(StoreError::CorruptChunk {
                expected: CHUNK_VOLUME,
                actual: blocks.len(),
            }),
            Some(blocks) => Ok(Chunk::from_blocks(position, blocks)),
        });
        match result {
            Ok(Some(chunk)) => {
                self.stats.loaded_from_store += 1;
                Some(chunk)
            }
            Ok(None) => None,
            Err(error) => {
                warn!(
                    "Ignoring stored chunk ({}, {}): {}",
                    position.x, position.z, error
                );
                None
            }
        }
    }

    fn generate_inline(&mut self, position: ChunkPosition) -> Chunk {
        self.stats.generated += 1;
        self.generator.generate(position).unwrap_or_else(|error| {
            warn!(
                "Inline generation of chunk ({}, {}) failed: {}",
                position.x, position.z, error
            );
            Chunk::empty(position)
        })
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.dispose();
    }
}
