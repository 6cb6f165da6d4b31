//! # Voxel World
//!
//! This module contains the voxel data of the engine: what a block is, how blocks are
//! grouped into chunks, how chunks are generated, where they are persisted and which
//! of them are kept in memory.
//!
//! ## Architecture
//!
//! * **Block**: Block codes and their rendering materials
//! * **Chunk**: Fixed-size columns of blocks addressed by `ChunkPosition`
//! * **Generation**: Deterministic terrain, biomes, caves and trees from a world seed
//! * **Store**: Persistence of edited chunks and world metadata
//! * **Tasks**: The generation task run on the scheduler's workers
//! * **World**: Loads, streams, edits and saves chunks around the observer
//!
//! ## Data Flow
//!
//! 1. The world works out which chunks should be visible around the observer
//! 2. Missing chunks are read from the store or generated, inline or on workers
//! 3. Edits flag chunks (and bordering neighbours) for remeshing and saving
//! 4. Chunks beyond the retention distance are saved if edited, then dropped

pub mod block;
pub mod chunk;
pub mod generation;
pub mod store;
pub mod tasks;
pub mod world;
