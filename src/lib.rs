#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! A streaming voxel world: procedurally generated terrain organised in chunk columns,
//! loaded and unloaded around a moving observer, generated on a pool of worker threads
//! and turned into face lists for an external renderer.
//!
//! ## Key Modules
//!
//! * `config` - Runtime settings loaded from JSON
//! * `core` - Shared-state helpers used across threads
//! * `engine_state` - The engine: world, generation, scheduling and meshing
//! * `error` - Error types of every subsystem
//!
//! ## Usage
//!
//! ```rust,no_run
//! fn main() {
//!     if let Err(error) = voxel_world::run() {
//!         log::error!("{error}");
//!     }
//! }
//! ```
//!
//! ## Performance Considerations
//!
//! * Chunk generation runs off the coordinating thread, nearest and facing chunks first
//! * Faces hidden by opaque neighbours are never emitted
//! * Only edited chunks are persisted, untouched terrain is regenerated from the seed

use std::{path::PathBuf, thread};

use log::info;
use web_time::{Duration, Instant};

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

use config::EngineConfig;
use engine_state::{
    observer::Observer, rendering::LoggingRenderer, voxels::store::FileStore, EngineState,
};
use error::EngineError;

/// Number of ticks the headless demo runs for.
pub const DEMO_TICKS: usize = 240;
/// Distance the demo observer walks per tick, in blocks.
pub const DEMO_WALK_SPEED: f32 = 0.75;
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Sets up `env_logger` writing to stdout, filtered by `RUST_LOG`.
///
/// Calling it again is harmless.
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    let initialised = log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init()
        .is_ok();
    if initialised {
        info!("Logger initialized");
    }
}

/// Runs the headless engine.
///
/// Loads the configuration named by the first command line argument (defaults
/// otherwise), restores the last observer from the world directory and walks it
/// forward for [`DEMO_TICKS`] ticks. The observer and every edit are saved on exit.
pub fn run() -> Result<(), EngineError> {
    init_logging();

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let store = FileStore::open(&config.save_dir)?;
    let mut engine = EngineState::new(&config, Box::new(store))?;
    let mut observer = engine.load_observer().unwrap_or_default();
    info!(
        "Observer at ({:.1}, {:.1}, {:.1})",
        observer.position.x, observer.position.y, observer.position.z
    );

    let mut renderer = LoggingRenderer::new();
    let started = Instant::now();
    for _ in 0..DEMO_TICKS {
        engine.tick(&observer, Instant::now(), &mut renderer);
        observer.walk(DEMO_WALK_SPEED);
        thread::sleep(TICK_INTERVAL);
    }

    let stats = engine.stats();
    info!(
        "Ran {} ticks in {:.2?}: {} chunks loaded, {} visible, {} generated",
        DEMO_TICKS,
        started.elapsed(),
        stats.loaded,
        stats.visible,
        stats.generated
    );
    renderer.log_summary();

    save_observer(&mut engine, &observer);
    engine.save_all();
    engine.shutdown();
    Ok(())
}

fn save_observer(engine: &mut EngineState, observer: &Observer) {
    if let Err(error) = engine.save_observer(observer) {
        log::warn!("Could not save observer: {error}");
    }
}
