//! # Chunk Store
//!
//! Persistence collaborator of the [`World`](super::world::World). A store keeps raw
//! chunk buffers, keyed by chunk position, and small string metadata values keyed by
//! name.
//!
//! Two implementations are provided:
//! - [`MemoryStore`]: `HashMap` backed, for tests and throwaway worlds
//! - [`FileStore`]: one raw file per chunk plus one JSON file per metadata key,
//!   fronted by an LRU read cache
//!
//! Stores do not validate chunk contents. The world rejects buffers of the wrong
//! length when it loads them.

use std::{
    collections::HashMap,
    fs, io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use lru::LruCache;

use super::chunk::ChunkPosition;
use crate::error::StoreError;

/// Default number of chunk buffers kept in the [`FileStore`] read cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Persistent storage for chunk buffers and world metadata.
pub trait ChunkStore {
    /// Writes the full voxel buffer of a chunk, replacing any previous version.
    fn save_chunk(&mut self, position: ChunkPosition, blocks: &[u8]) -> Result<(), StoreError>;

    /// Reads a chunk buffer, `Ok(None)` if the chunk was never saved.
    fn load_chunk(&mut self, position: ChunkPosition) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores a metadata value under `key`.
    fn set_metadata(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Reads a metadata value, `Ok(None)` if the key was never written.
    fn get_metadata(&mut self, key: &str) -> Result<Option<String>, StoreError>;
}

/// In-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    chunks: HashMap<ChunkPosition, Vec<u8>>,
    metadata: HashMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks held.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` if a chunk has been saved at `position`.
    pub fn contains_chunk(&self, position: ChunkPosition) -> bool {
        self.chunks.contains_key(&position)
    }
}

impl ChunkStore for MemoryStore {
    fn save_chunk(&mut self, position: ChunkPosition, blocks: &[u8]) -> Result<(), StoreError> {
        self.chunks.insert(position, blocks.to_vec());
        Ok(())
    }

    fn load_chunk(&mut self, position: ChunkPosition) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.chunks.get(&position).cloned())
    }

    fn set_metadata(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.metadata.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_metadata(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.metadata.get(key).cloned())
    }
}

/// Directory-backed store.
///
/// ```text
/// <root>/chunks/chunk_<x>_<z>.bin   raw voxel buffer
/// <root>/metadata/<key>.json        JSON string
/// ```
pub struct FileStore {
    root: PathBuf,
    cache: LruCache<ChunkPosition, Vec<u8>>,
}

impl FileStore {
    /// Opens (and creates, if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::with_cache_capacity(root, DEFAULT_CACHE_CAPACITY)
    }

    /// Opens a store with a custom read cache size.
    pub fn with_cache_capacity(
        root: impl AsRef<Path>,
        capacity: usize,
    ) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("chunks"))?;
        fs::create_dir_all(root.join("metadata"))?;
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        log::info!("Opened chunk store at {}", root.display());
        Ok(Self {
            root,
            cache: LruCache::new(capacity),
        })
    }

    /// Directory the store writes to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn chunk_path(&self, position: ChunkPosition) -> PathBuf {
        self.root
            .join("chunks")
            .join(format!("chunk_{}_{}.bin", position.x, position.z))
    }

    fn metadata_path(&self, key: &str) -> PathBuf {
        self.root
            .join("metadata")
            .join(format!("{}.json", escape_key(key)))
    }
}

/// Maps a metadata key to a unique file stem. ASCII letters, digits and `-` are kept,
/// every other byte becomes `_` followed by two hex digits.
fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("_{byte:02x}"));
        }
    }
    escaped
}

/// Writes through a sibling temporary file so readers never see a partial file.
fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let temporary = path.with_extension("tmp");
    fs::write(&temporary, contents)?;
    fs::rename(&temporary, path)
}

fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}

impl ChunkStore for FileStore {
    fn save_chunk(&mut self, position: ChunkPosition, blocks: &[u8]) -> Result<(), StoreError> {
        write_atomically(&self.chunk_path(position), blocks)?;
        self.cache.put(position, blocks.to_vec());
        Ok(())
    }

    fn load_chunk(&mut self, position: ChunkPosition) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(blocks) = self.cache.get(&position) {
            return Ok(Some(blocks.clone()));
        }
        let blocks = read_optional(&self.chunk_path(position))?;
        if let Some(blocks) = &blocks {
            self.cache.put(position, blocks.clone());
        }
        Ok(blocks)
    }

    fn set_metadata(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec(value)?;
        write_atomically(&self.metadata_path(key), &encoded)?;
        Ok(())
    }

    fn get_metadata(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        match read_optional(&self.metadata_path(key))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}
