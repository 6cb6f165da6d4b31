use std::{sync::Arc, thread};

use cgmath::{Point3, Vector3};
use voxel_world::{
    engine_state::{
        task_management::{SchedulerSettings, TaskManager, TicketStatus},
        voxels::{
            chunk::{new_chunk_buffer, ChunkPosition},
            generation::{noise::WorldSeed, TerrainGenerator},
            store::MemoryStore,
            world::{World, WorldSettings},
        },
    },
    error::GenerationError,
};
use web_time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(60);

fn generator() -> Arc<TerrainGenerator> {
    Arc::new(TerrainGenerator::new(WorldSeed::from_phrase("scheduler")))
}

#[test]
fn merged_requests_resolve_to_the_same_buffer() {
    let generator = generator();
    let mut tasks = TaskManager::new(3, generator.clone(), SchedulerSettings::default()).unwrap();
    let position = ChunkPosition::new(-2, 9);

    let tickets: Vec<_> = (0..4)
        .map(|_| tasks.request_chunk(position, new_chunk_buffer()))
        .collect();
    assert!(tasks.wait_for(&tickets[0], TIMEOUT));
    assert_eq!(tasks.stats().spawned, 1);

    let expected = generator.generate(position).unwrap();
    for ticket in &tickets {
        assert!(ticket.same_request(&tickets[0]));
        match ticket.status() {
            TicketStatus::Ready(buffer) => assert_eq!(&buffer[..], expected.as_bytes()),
            other => panic!("unexpected status {other:?}"),
        }
    }

    let again = tasks.request_chunk(position, new_chunk_buffer());
    assert!(!again.same_request(&tickets[0]));
    tasks.shutdown();
    assert!(matches!(
        again.status(),
        TicketStatus::Failed(GenerationError::Cancelled) | TicketStatus::Ready(_)
    ));
}

#[test]
fn async_world_matches_inline_generation() {
    let generator = generator();
    let tasks = TaskManager::new(2, generator.clone(), SchedulerSettings::default()).unwrap();
    let settings = WorldSettings {
        render_distance: 2.0,
        retention_distance: 3.0,
        save_debounce: Duration::from_millis(100),
    };
    let mut world = World::new(
        generator.clone(),
        Box::new(MemoryStore::new()),
        Some(tasks),
        settings,
    );

    world.update_observer(Point3::new(8.0, 100.0, 8.0), Vector3::new(0.0, 0.0, 1.0));
    let changes = world.update_visible_chunks(8.0, 8.0);
    assert!(changes.entered.is_empty());
    assert_eq!(world.stats().generating, 13);

    let mut admitted = Vec::new();
    let deadline = Instant::now() + TIMEOUT;
    while admitted.len() < 13 && Instant::now() < deadline {
        admitted.extend(world.process_generation());
        thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(admitted.len(), 13);
    assert_eq!(world.stats().generating, 0);
    assert_eq!(world.stats().visible, 13);

    for position in admitted {
        let expected = generator.generate(position).unwrap();
        assert_eq!(world.chunk(position).unwrap().as_bytes(), expected.as_bytes());
    }
    let stats = world.scheduler_stats().unwrap();
    assert_eq!(stats.completed, 13);
    assert_eq!(stats.spawned, 13);
}

#[test]
fn leaving_before_generation_finishes_discards_the_request() {
    let tasks = TaskManager::new(1, generator(), SchedulerSettings::default()).unwrap();
    let settings = WorldSettings {
        render_distance: 3.0,
        retention_distance: 3.0,
        save_debounce: Duration::from_millis(100),
    };
    let mut world = World::new(generator(), Box::new(MemoryStore::new()), Some(tasks), settings);

    world.update_visible_chunks(8.0, 8.0);
    assert!(world.stats().generating > 0);
    let (far_x, far_z) = ChunkPosition::new(100, 100).center();
    world.update_visible_chunks(far_x, far_z);

    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        world.process_generation();
        if world.stats().generating == 0 {
            break;
        }
        thread::sleep(Duration::from_millis(2));
    }
    assert!(world
        .loaded_chunks()
        .all(|position| position.distance_to(ChunkPosition::new(100, 100)) <= 3.0));

    world.dispose();
    assert!(world.scheduler_stats().is_none());
}
