use std::{
    fs,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use cgmath::Point3;
use voxel_world::engine_state::{
    observer::ObserverState,
    rendering::meshing::MeshBuilder,
    voxels::{
        block::{block_side::BlockSide, block_type::BlockType},
        chunk::ChunkPosition,
        generation::{noise::WorldSeed, TerrainGenerator},
        store::{FileStore, MemoryStore},
        world::{World, WorldSettings},
    },
};
use web_time::Duration;

fn settings(render: f32, retention: f32) -> WorldSettings {
    WorldSettings {
        render_distance: render,
        retention_distance: retention,
        save_debounce: Duration::from_millis(200),
    }
}

fn sync_world(render: f32, retention: f32) -> World {
    World::new(
        Arc::new(TerrainGenerator::new(WorldSeed::from_phrase("world tests"))),
        Box::new(MemoryStore::new()),
        None,
        settings(render, retention),
    )
}

fn temp_root(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
    let root = std::env::temp_dir().join(format!(
        "voxel-world-it-{name}-{}-{unique}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&root);
    root
}

/// Chunk centre in world blocks.
fn center_of(position: ChunkPosition) -> (f32, f32) {
    position.center()
}

#[test]
fn partitions_follow_the_observer() {
    let render = 2.0;
    let retention = 3.5;
    let mut world = sync_world(render, retention);
    let path = [
        ChunkPosition::new(0, 0),
        ChunkPosition::new(1, 0),
        ChunkPosition::new(3, 1),
        ChunkPosition::new(3, 4),
        ChunkPosition::new(-6, 4),
    ];

    for center in path {
        let (x, z) = center_of(center);
        let changes = world.update_visible_chunks(x, z);
        assert!(changes.entered.windows(2).all(|pair| pair[0] < pair[1]));

        for position in world.loaded_chunks() {
            let distance = position.distance_to(center);
            assert!(distance <= retention, "{position:?} kept at {distance}");
            assert_eq!(world.is_visible(position), distance <= render);
        }
        for position in world.visible_chunks() {
            assert!(world.is_loaded(position));
        }
        for dz in -3..=3 {
            for dx in -3..=3 {
                let position = center.offset(dx, dz);
                if position.distance_to(center) <= render {
                    assert!(world.is_visible(position), "{position:?} missing");
                }
            }
        }
        for position in &changes.unloaded {
            assert!(!world.is_loaded(*position));
        }

        let stats = world.stats();
        assert_eq!(stats.visible + stats.cached, stats.loaded);
    }
}

#[test]
fn edits_on_a_chunk_edge_flag_the_neighbour() {
    let mut world = sync_world(1.0, 2.0);
    let left = ChunkPosition::new(0, 0);
    let right = ChunkPosition::new(1, 0);
    world.ensure_chunk(left);
    world.ensure_chunk(right);
    world.take_dirty(left);
    world.take_dirty(right);
    let before = world.chunk(left).unwrap().as_bytes().to_vec();

    assert!(world.set_block(16, 100, 5, BlockType::Stone));

    assert!(world.take_dirty(right));
    assert!(world.take_dirty(left));
    assert_eq!(world.chunk(left).unwrap().as_bytes(), &before[..]);

    assert!(world.set_block(20, 100, 5, BlockType::Stone));
    assert!(world.take_dirty(right));
    assert!(!world.take_dirty(left));
}

#[test]
fn evicted_edits_are_reloaded_from_the_store() {
    let mut world = sync_world(1.0, 2.0);
    let home = ChunkPosition::new(0, 0);
    let (x, z) = center_of(home);
    world.update_visible_chunks(x, z);
    assert!(world.set_block(4, 250, 4, BlockType::Wood));

    let (far_x, far_z) = center_of(ChunkPosition::new(12, 0));
    let changes = world.update_visible_chunks(far_x, far_z);
    assert!(changes.unloaded.contains(&home));
    assert!(!world.is_loaded(home));
    assert_eq!(world.stats().saved, 1);
    assert_eq!(world.stats().pending_saves, 0);

    let generated_before = world.stats().generated;
    let changes = world.update_visible_chunks(x, z);
    assert!(changes.entered.contains(&home));
    assert_eq!(world.stats().loaded_from_store, 1);
    assert_eq!(world.stats().generated, generated_before + 4);
    assert_eq!(world.get_block(4, 250, 4), BlockType::Wood.code());
}

#[test]
fn file_store_keeps_edits_and_observer_between_sessions() {
    let root = temp_root("session");
    let observer = ObserverState {
        position: [40.0, 90.0, -12.5],
        facing: [0.0, 0.0, 1.0],
    };
    let generator = Arc::new(TerrainGenerator::new(WorldSeed(5)));

    {
        let store = FileStore::open(&root).unwrap();
        let mut world = World::new(generator.clone(), Box::new(store), None, settings(1.0, 2.0));
        world.set_block(-3, 240, 7, BlockType::Snow);
        world.save_observer(&observer).unwrap();
        assert_eq!(world.save_all(), 1);
    }

    let store = FileStore::open(&root).unwrap();
    let mut world = World::new(generator, Box::new(store), None, settings(1.0, 2.0));
    assert_eq!(world.load_observer(), Some(observer));
    world.ensure_chunk(ChunkPosition::new(-1, 0));
    assert_eq!(world.stats().loaded_from_store, 1);
    assert_eq!(world.get_block(-3, 240, 7), BlockType::Snow.code());
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn opaque_neighbours_hide_each_other() {
    let mut world = sync_world(1.0, 2.0);
    let base = Point3::new(6, 230, 6);

    for side in BlockSide::all() {
        let (dx, dy, dz) = side.offset();
        let other = Point3::new(base.x + dx, base.y + dy, base.z + dz);
        clear_around(&mut world, base);
        world.set_block(base.x, base.y, base.z, BlockType::Stone);
        world.set_block(other.x, other.y, other.z, BlockType::Sand);

        let mesh = MeshBuilder::new()
            .rebuild(&world, ChunkPosition::new(0, 0))
            .unwrap();
        assert!(!mesh.opaque.contains(base, side), "{side:?}");
        assert!(!mesh.opaque.contains(other, side.opposite()), "{side:?}");
        assert!(mesh.opaque.contains(base, side.opposite()), "{side:?}");
    }
}

#[test]
fn water_faces_hide_only_against_water() {
    let mut world = sync_world(1.0, 2.0);
    let base = Point3::new(6, 230, 6);
    clear_around(&mut world, base);
    world.set_block(base.x, base.y, base.z, BlockType::Water);
    world.set_block(base.x + 1, base.y, base.z, BlockType::Water);
    world.set_block(base.x, base.y, base.z + 1, BlockType::Stone);

    let mesh = MeshBuilder::new()
        .rebuild(&world, ChunkPosition::new(0, 0))
        .unwrap();
    assert!(mesh.translucent.contains(base, BlockSide::Top));
    assert!(mesh.translucent.contains(base, BlockSide::Front));
    assert!(!mesh.translucent.contains(base, BlockSide::Back));
    assert!(!mesh.translucent.contains(base, BlockSide::Right));
    let stone = Point3::new(base.x, base.y, base.z + 1);
    assert!(mesh.opaque.contains(stone, BlockSide::Left));
    assert!(mesh
        .translucent
        .faces
        .iter()
        .all(|face| face.block == BlockType::Water.code()));
}

fn clear_around(world: &mut World, center: Point3<i32>) {
    for y in center.y - 2..=center.y + 2 {
        for z in center.z - 2..=center.z + 2 {
            for x in center.x - 2..=center.x + 2 {
                world.set_block(x, y, z, BlockType::Air);
            }
        }
    }
}
