//! # Engine State Module
//!
//! The core engine module that ties the voxel world, the generation scheduler and the
//! mesher together.
//!
//! ## Key Components
//!
//! * `EngineState` - The coordinator driven once per tick by the host
//! * `observer` - The point of view streaming is centred on
//! * `rendering` - Meshing, fade-in and the renderer seam
//! * `task_management` - The generation worker pool
//! * `voxels` - Voxel data, chunks, generation and persistence
//!
//! ## Architecture
//!
//! `EngineState` lives on a single coordinating thread. Each tick it streams chunks
//! around the observer, applies finished generation, remeshes stale visible chunks,
//! advances fade-ins and flushes edits once they have settled. Meshes leave the engine
//! through a [`ChunkRenderer`](rendering::ChunkRenderer) passed to [`EngineState::tick`].

use std::{collections::HashMap, sync::Arc};

use log::{debug, info};
use web_time::Instant;

use crate::{
    config::EngineConfig,
    error::{EngineError, StoreError},
};
use observer::{Observer, ObserverState};
use rendering::{
    fade::FadeTracker,
    meshing::{ChunkMesh, MeshBuilder},
    ChunkRenderer,
};
use task_management::{SchedulerSettings, TaskManager};
use voxels::{
    block::{block_type::BlockType, BlockTypeSize},
    chunk::ChunkPosition,
    generation::{noise::WorldSeed, TerrainGenerator},
    store::ChunkStore,
    world::{World, WorldSettings, WorldStats},
};

pub mod observer;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// What happened during one [`EngineState::tick`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Chunks that became visible
    pub entered: Vec<ChunkPosition>,
    /// Chunks whose meshes were dropped, because they were demoted or unloaded
    pub removed: Vec<ChunkPosition>,
    /// Chunks admitted from asynchronous generation
    pub generated: Vec<ChunkPosition>,
    /// Chunks whose mesh was rebuilt and uploaded
    pub remeshed: Vec<ChunkPosition>,
    /// Chunks written to the store
    pub saved: usize,
}

/// The main state container of the engine.
///
/// # Examples
///
/// ```no_run
/// # use voxel_world::config::EngineConfig;
/// # use voxel_world::engine_state::{observer::Observer, rendering::NullRenderer, EngineState};
/// # use voxel_world::engine_state::voxels::store::MemoryStore;
/// let mut engine = EngineState::new(&EngineConfig::default(), Box::new(MemoryStore::new())).unwrap();
/// let observer = Observer::default();
///
/// // Main loop
/// loop {
///     engine.tick(&observer, web_time::Instant::now(), &mut NullRenderer);
/// }
/// ```
pub struct EngineState {
    /// The voxel world containing all chunk data
    world: World,
    /// Meshes of the visible chunks
    meshes: HashMap<ChunkPosition, ChunkMesh>,
    fades: FadeTracker,
    mesh_builder: MeshBuilder,
}

impl EngineState {
    /// Creates the engine and, if enabled, starts the generation workers.
    ///
    /// # Arguments
    /// * `config` - Engine settings, validated before use
    /// * `store` - Persistence collaborator for edited chunks and metadata
    ///
    /// # Returns
    /// The engine, or why it could not start
    pub fn new(config: &EngineConfig, store: Box<dyn ChunkStore>) -> Result<Self, EngineError> {
        config.validate()?;

        let seed = WorldSeed::from_phrase(&config.seed);
        info!("World seed {:?} -> {:#018x}", config.seed, seed.0);
        let generator = Arc::new(TerrainGenerator::new(seed));

        let scheduler = if config.async_generation {
            Some(TaskManager::new(
                config.worker_count,
                generator.clone(),
                SchedulerSettings::from(config),
            )?)
        } else {
            None
        };

        Ok(Self {
            world: World::new(generator, store, scheduler, WorldSettings::from(config)),
            meshes: HashMap::new(),
            fades: FadeTracker::new(config.fade_step),
            mesh_builder: MeshBuilder::new(),
        })
    }

    /// The voxel world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The voxel world, mutably.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Advances the engine by one tick.
    ///
    /// # Arguments
    /// * `observer` - Where the world is seen from this tick
    /// * `now` - Current time, used for the save debounce
    /// * `renderer` - Receives mesh uploads, removals and opacity changes
    pub fn tick<R: ChunkRenderer + ?Sized>(
        &mut self,
        observer: &Observer,
        now: Instant,
        renderer: &mut R,
    ) -> TickReport {
        let mut report = TickReport::default();

        self.world
            .update_observer(observer.position, observer.facing);
        let changes = self
            .world
            .update_visible_chunks(observer.position.x, observer.position.z);

        for position in changes.demoted.iter().chain(&changes.unloaded) {
            self.fades.remove(*position);
            if self.meshes.remove(position).is_some() {
                renderer.remove_chunk(*position);
                report.removed.push(*position);
            }
        }
        report.entered = changes.entered;
        report.generated = self.world.process_generation();

        for position in self.world.dirty_visible_chunks() {
            let Some(mesh) = self.mesh_builder.rebuild(&self.world, position) else {
                continue;
            };
            self.world.take_dirty(position);
            renderer.upload_chunk(position, &mesh);
            self.fades.on_remeshed(position);
            self.meshes.insert(position, mesh);
            report.remeshed.push(position);
        }

        for (position, opacity) in self.fades.update() {
            renderer.set_opacity(position, opacity);
        }

        report.saved = self.world.flush_if_quiet(now);
        if !report.entered.is_empty() || !report.removed.is_empty() {
            debug!(
                "Tick: {} entered, {} removed, {} generated, {} remeshed",
                report.entered.len(),
                report.removed.len(),
                report.generated.len(),
                report.remeshed.len()
            );
        }
        report
    }

    /// Writes a block at world coordinates. The mesh updates on the next tick.
    ///
    /// # Returns
    /// `false` if `y` is outside the column
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockType) -> bool {
        self.world.set_block(x, y, z, block)
    }

    /// Reads a block at world coordinates.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockTypeSize {
        self.world.get_block(x, y, z)
    }

    /// Current mesh of a visible chunk.
    pub fn mesh(&self, position: ChunkPosition) -> Option<&ChunkMesh> {
        self.meshes.get(&position)
    }

    /// Fade-in opacity of a chunk, `None` if it is not tracked.
    pub fn opacity(&self, position: ChunkPosition) -> Option<f32> {
        self.fades.opacity(position)
    }

    /// Counters of the world.
    pub fn stats(&self) -> WorldStats {
        self.world.stats()
    }

    /// Saves every pending edit immediately.
    ///
    /// # Returns
    /// Number of chunks written
    pub fn save_all(&mut self) -> usize {
        self.world.save_all()
    }

    /// Persists the observer in world metadata.
    pub fn save_observer(&mut self, observer: &Observer) -> Result<(), StoreError> {
        self.world.save_observer(&ObserverState::from(*observer))
    }

    /// Restores the observer stored by [`EngineState::save_observer`].
    pub fn load_observer(&mut self) -> Option<Observer> {
        self.world.load_observer().map(Observer::from)
    }

    /// Saves pending edits, stops the workers and drops every mesh.
    pub fn shutdown(&mut self) {
        self.world.dispose();
        self.meshes.clear();
        info!(
            "Engine stopped after building {} meshes",
            self.mesh_builder.meshes_built()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::{
        rendering::{LoggingRenderer, NullRenderer},
        voxels::store::MemoryStore,
    };
    use cgmath::{Point3, Vector3};

    fn sync_config() -> EngineConfig {
        EngineConfig {
            seed: "7".to_string(),
            render_distance: 1,
            retention_distance: 2,
            async_generation: false,
            fade_step: 0.5,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            worker_count: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            EngineState::new(&config, Box::new(MemoryStore::new())),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn tick_meshes_visible_chunks_and_fades_them_in() {
        let mut engine = EngineState::new(&sync_config(), Box::new(MemoryStore::new())).unwrap();
        let observer = Observer::new(Point3::new(8.0, 120.0, 8.0), Vector3::unit_x());
        let mut renderer = LoggingRenderer::new();

        let report = engine.tick(&observer, Instant::now(), &mut renderer);
        assert_eq!(report.entered.len(), 5);
        assert_eq!(report.remeshed.len(), 5);
        assert_eq!(renderer.shown_chunks(), 5);
        assert_eq!(engine.opacity(ChunkPosition::new(0, 0)), Some(0.5));
        assert!(engine.mesh(ChunkPosition::new(0, 0)).is_some());

        let report = engine.tick(&observer, Instant::now(), &mut renderer);
        assert!(report.entered.is_empty());
        assert!(report.remeshed.is_empty());
        assert_eq!(engine.opacity(ChunkPosition::new(0, 0)), Some(1.0));
    }

    #[test]
    fn moving_away_drops_meshes() {
        let mut engine = EngineState::new(&sync_config(), Box::new(MemoryStore::new())).unwrap();
        let mut renderer = LoggingRenderer::new();
        let start = Observer::new(Point3::new(8.0, 120.0, 8.0), Vector3::unit_x());
        engine.tick(&start, Instant::now(), &mut renderer);

        let far = Observer::new(Point3::new(8.0 + 16.0 * 10.0, 120.0, 8.0), Vector3::unit_x());
        let report = engine.tick(&far, Instant::now(), &mut renderer);
        assert_eq!(report.removed.len(), 5);
        assert!(engine.mesh(ChunkPosition::new(0, 0)).is_none());
        assert_eq!(engine.opacity(ChunkPosition::new(0, 0)), None);
        assert!(!engine.world().is_loaded(ChunkPosition::new(0, 0)));
        assert_eq!(renderer.shown_chunks(), 5);
    }

    #[test]
    fn edits_trigger_remesh() {
        let mut engine = EngineState::new(&sync_config(), Box::new(MemoryStore::new())).unwrap();
        let observer = Observer::new(Point3::new(8.0, 120.0, 8.0), Vector3::unit_x());
        engine.tick(&observer, Instant::now(), &mut NullRenderer);

        assert!(engine.set_block(3, 250, 3, BlockType::Stone));
        let report = engine.tick(&observer, Instant::now(), &mut NullRenderer);
        assert_eq!(report.remeshed, vec![ChunkPosition::new(0, 0)]);
        assert_eq!(engine.get_block(3, 250, 3), BlockType::Stone.code());
        assert_eq!(engine.save_all(), 1);
    }
}
