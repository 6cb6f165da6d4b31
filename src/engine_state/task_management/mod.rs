//! # Task Management System
//!
//! This module runs chunk generation on a fixed pool of worker threads and hands the
//! results back to the coordinating thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: Owns the workers, the priority queue and the pending requests
//! - `Task`: A unit of work that runs on a worker
//! - `GenerationTicket`: Shared completion handle for one requested chunk
//! - `TaskChannel`: Sending side of one worker, plus its in-flight bookkeeping
//!
//! ## Task Lifecycle
//! 1. `request_chunk()` queues a task, or returns the existing ticket if the chunk is
//!    already queued or running
//! 2. `process()` collects finished outputs in completion order and resolves their
//!    tickets
//! 3. `process()` then hands the cheapest queued tasks to idle workers, one task per
//!    worker at a time
//! 4. `shutdown()` (or dropping the manager) cancels every outstanding ticket and joins
//!    the workers
//!
//! ## Example Usage
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use voxel_world::engine_state::task_management::{SchedulerSettings, TaskManager};
//! # use voxel_world::engine_state::voxels::chunk::{new_chunk_buffer, ChunkPosition};
//! # use voxel_world::engine_state::voxels::generation::{noise::WorldSeed, TerrainGenerator};
//! let generator = Arc::new(TerrainGenerator::new(WorldSeed(7)));
//! let mut tasks = TaskManager::new(4, generator, SchedulerSettings::default()).unwrap();
//! let ticket = tasks.request_chunk(ChunkPosition::new(0, 0), new_chunk_buffer());
//!
//! // In the main loop:
//! for position in tasks.process() {
//!     println!("chunk {position:?} finished");
//! }
//! # drop(ticket);
//! ```

pub mod priority;
pub mod task;
pub mod ticket;

use std::{
    any::Any,
    collections::HashMap,
    io,
    panic::{self, AssertUnwindSafe},
    sync::{
        mpsc::{channel, Receiver, Sender, TryRecvError},
        Arc,
    },
    thread::{self, JoinHandle},
};

use cgmath::{Point3, Vector3};
use log::{debug, info, warn};
use web_time::{Duration, Instant};

use crate::{
    config::EngineConfig,
    engine_state::voxels::{
        chunk::{ChunkBuffer, ChunkPosition},
        generation::TerrainGenerator,
        tasks::chunk_generation_task::ChunkGenerationTask,
    },
    error::GenerationError,
};
use priority::{ObserverView, PriorityQueue};
use task::{Task, TaskOutput};
pub use ticket::{GenerationTicket, TicketStatus};

/// Maximum number of tasks that can be in flight per worker channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

/// Scheduling knobs taken from the engine configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SchedulerSettings {
    /// Cost bonus, in blocks, for chunks straight ahead of the observer
    pub facing_bias: f32,
    /// Observer movement that triggers a re-score of the queue
    pub rescore_distance: f32,
    /// Cosine of the turn angle that triggers a re-score of the queue
    pub rescore_angle_cos: f32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        SchedulerSettings::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for SchedulerSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            facing_bias: config.facing_bias,
            rescore_distance: config.rescore_distance,
            rescore_angle_cos: config.rescore_angle_cos,
        }
    }
}

/// Counters describing the scheduler's workload.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskStats {
    /// Requests waiting for a worker
    pub queued: usize,
    /// Tasks currently running
    pub in_flight: usize,
    /// Tasks handed to workers since start
    pub spawned: u64,
    /// Tasks that finished successfully
    pub completed: u64,
    /// Tasks that finished with an error
    pub failed: u64,
    /// Requests cancelled before finishing
    pub cancelled: u64,
}

/// The sending side of one worker thread.
///
/// `task_sender` is `None` once the worker is known to be gone.
#[derive(Debug)]
struct TaskChannel {
    task_sender: Option<Sender<Box<dyn Task>>>,
    num_tasks_in_flight: usize,
    worker: Option<JoinHandle<()>>,
}

impl TaskChannel {
    fn is_alive(&self) -> bool {
        self.task_sender.is_some()
    }

    fn accepts_work(&self) -> bool {
        self.is_alive() && self.num_tasks_in_flight < MAX_TASKS_IN_FLIGHT
    }

    /// Sends a task, giving it back if the worker hung up.
    fn try_send(&mut self, task: Box<dyn Task>) -> Result<(), Box<dyn Task>> {
        let Some(sender) = &self.task_sender else {
            return Err(task);
        };
        match sender.send(task) {
            Ok(()) => {
                self.num_tasks_in_flight += 1;
                Ok(())
            }
            Err(returned) => {
                self.task_sender = None;
                Err(returned.0)
            }
        }
    }
}

enum PendingState {
    Queued(Box<dyn Task>),
    InFlight { channel: usize },
}

struct PendingRequest {
    ticket: GenerationTicket,
    state: PendingState,
}

/// Manages the generation worker pool and the queue feeding it.
///
/// At most one request exists per chunk position. Results are applied on the thread
/// that calls [`TaskManager::process`].
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    result_receiver: Receiver<TaskOutput>,
    queue: PriorityQueue,
    pending: HashMap<ChunkPosition, PendingRequest>,
    current_channel: usize,
    generator: Arc<TerrainGenerator>,
    settings: SchedulerSettings,
    latest_view: Option<ObserverView>,
    scored_view: Option<ObserverView>,
    stats: TaskStats,
    shut_down: bool,
}

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create
    /// * `generator` - Generator shared by every worker
    /// * `settings` - Priority and re-scoring knobs
    ///
    /// # Returns
    /// The manager, or the error of the first worker thread that failed to spawn
    pub fn new(
        num_workers: usize,
        generator: Arc<TerrainGenerator>,
        settings: SchedulerSettings,
    ) -> io::Result<Self> {
        let (result_tx, result_rx) = channel::<TaskOutput>();
        let mut channels = Vec::with_capacity(num_workers);
        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task>>();
            let results = result_tx.clone();
            let worker = thread::Builder::new()
                .name(format!("chunk-worker-{index}"))
                .spawn(move || run_worker(task_rx, results))?;
            channels.push(TaskChannel {
                task_sender: Some(task_tx),
                num_tasks_in_flight: 0,
                worker: Some(worker),
            });
        }
        info!(
            "Started {} generation workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism().map(|n| n.get()).ok()
        );

        Ok(TaskManager {
            channels,
            result_receiver: result_rx,
            queue: PriorityQueue::default(),
            pending: HashMap::new(),
            current_channel: 0,
            generator,
            settings,
            latest_view: None,
            scored_view: None,
            stats: TaskStats::default(),
            shut_down: false,
        })
    }

    /// Requests generation of a chunk into `destination`.
    ///
    /// If the chunk is already queued or running, the existing ticket is returned and
    /// `destination` is dropped.
    pub fn request_chunk(
        &mut self,
        position: ChunkPosition,
        destination: ChunkBuffer,
    ) -> GenerationTicket {
        if let Some(request) = self.pending.get(&position) {
            return request.ticket.clone();
        }
        let task = ChunkGenerationTask::new(self.generator.clone(), position, destination);
        self.submit(Box::new(task))
    }

    /// Queues an arbitrary task under its chunk position.
    ///
    /// Merges with an existing request for the same position like
    /// [`request_chunk`](Self::request_chunk).
    pub fn submit(&mut self, task: Box<dyn Task>) -> GenerationTicket {
        let position = task.position();
        if let Some(request) = self.pending.get(&position) {
            return request.ticket.clone();
        }

        let ticket = GenerationTicket::new(position);
        if self.shut_down {
            ticket.resolve(Err(GenerationError::Cancelled));
            return ticket;
        }

        let cost = self.cost_of(position);
        self.queue.push(position, cost);
        self.pending.insert(
            position,
            PendingRequest {
                ticket: ticket.clone(),
                state: PendingState::Queued(task),
            },
        );
        ticket
    }

    /// Drops a queued request and resolves its ticket as cancelled.
    ///
    /// # Returns
    /// `false` if the request is already running or does not exist
    pub fn cancel(&mut self, position: ChunkPosition) -> bool {
        let queued = matches!(
            self.pending.get(&position),
            Some(PendingRequest {
                state: PendingState::Queued(_),
                ..
            })
        );
        if !queued {
            return false;
        }
        if let Some(request) = self.pending.remove(&position) {
            request.ticket.resolve(Err(GenerationError::Cancelled));
        }
        self.queue.remove(position);
        self.stats.cancelled += 1;
        true
    }

    /// Returns `true` if the position is queued or running.
    pub fn is_pending(&self, position: ChunkPosition) -> bool {
        self.pending.contains_key(&position)
    }

    /// Feeds the observer into the priority model.
    ///
    /// The whole queue is re-scored only when the observer moved or turned past the
    /// configured thresholds since the last re-score.
    ///
    /// # Returns
    /// `true` if the queue was re-scored
    pub fn update_observer(&mut self, position: Point3<f32>, facing: Vector3<f32>) -> bool {
        let view = ObserverView::new(position, facing);
        self.latest_view = Some(view);

        let rescore = match &self.scored_view {
            None => true,
            Some(scored) => scored.differs_materially(
                &view,
                self.settings.rescore_distance,
                self.settings.rescore_angle_cos,
            ),
        };
        if !rescore {
            return false;
        }

        self.scored_view = Some(view);
        let bias = self.settings.facing_bias;
        self.queue.rescore(|position| view.cost(position, bias));
        true
    }

    fn cost_of(&self, position: ChunkPosition) -> f32 {
        self.latest_view
            .map(|view| view.cost(position, self.settings.facing_bias))
            .unwrap_or(0.0)
    }

    /// Collects finished tasks and starts queued ones.
    ///
    /// # Returns
    /// Positions whose tickets were resolved by this call, in completion order
    pub fn process(&mut self) -> Vec<ChunkPosition> {
        let mut resolved = self.process_completed_tasks();
        resolved.extend(self.reap_dead_workers());
        self.process_queued_tasks();
        resolved
    }

    fn process_completed_tasks(&mut self) -> Vec<ChunkPosition> {
        let mut resolved = Vec::new();
        loop {
            let output = match self.result_receiver.try_recv() {
                Ok(output) => output,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };
            let Some(request) = self.pending.remove(&output.position) else {
                continue;
            };
            if let PendingState::InFlight { channel } = request.state {
                if let Some(channel) = self.channels.get_mut(channel) {
                    channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
                }
            }
            match &output.result {
                Ok(_) => self.stats.completed += 1,
                Err(error) => {
                    warn!(
                        "Generation of chunk ({}, {}) failed: {}",
                        output.position.x, output.position.z, error
                    );
                    self.stats.failed += 1;
                }
            }
            request.ticket.resolve(output.result);
            resolved.push(output.position);
        }
        resolved
    }

    /// Fails the in-flight work of workers that exited unexpectedly.
    fn reap_dead_workers(&mut self) -> Vec<ChunkPosition> {
        let mut dead = Vec::new();
        for (index, channel) in self.channels.iter_mut().enumerate() {
            let finished = channel
                .worker
                .as_ref()
                .is_some_and(|worker| worker.is_finished());
            if finished && channel.is_alive() {
                warn!("Generation worker {index} exited unexpectedly");
                channel.task_sender = None;
                channel.num_tasks_in_flight = 0;
                dead.push(index);
            }
        }
        if dead.is_empty() {
            return Vec::new();
        }

        let lost: Vec<ChunkPosition> = self
            .pending
            .iter()
            .filter(|(_, request)| {
                matches!(request.state, PendingState::InFlight { channel } if dead.contains(&channel))
            })
            .map(|(position, _)| *position)
            .collect();
        for position in &lost {
            if let Some(request) = self.pending.remove(position) {
                request
                    .ticket
                    .resolve(Err(GenerationError::WorkerDisconnected));
                self.stats.failed += 1;
            }
        }
        lost
    }

    /// Hands queued tasks to idle workers, cheapest first.
    fn process_queued_tasks(&mut self) {
        if !self.queue.is_empty() && !self.channels.iter().any(TaskChannel::is_alive) {
            self.fail_queued(GenerationError::WorkerDisconnected);
            return;
        }

        while let Some(index) = self.find_available_channel() {
            let Some(position) = self.queue.pop() else {
                break;
            };
            let Some(request) = self.pending.get_mut(&position) else {
                continue;
            };
            let state = std::mem::replace(
                &mut request.state,
                PendingState::InFlight { channel: index },
            );
            let task = match state {
                PendingState::Queued(task) => task,
                running => {
                    request.state = running;
                    continue;
                }
            };

            match self.channels[index].try_send(task) {
                Ok(()) => {
                    self.stats.spawned += 1;
                    self.current_channel = (index + 1) % self.channels.len();
                }
                Err(task) => {
                    warn!("Generation worker {index} hung up, requeueing chunk");
                    request.state = PendingState::Queued(task);
                    let cost = self.cost_of(position);
                    self.queue.push(position, cost);
                }
            }
        }
    }

    fn fail_queued(&mut self, error: GenerationError) {
        while let Some(position) = self.queue.pop() {
            if let Some(request) = self.pending.remove(&position) {
                request.ticket.resolve(Err(error.clone()));
                self.stats.failed += 1;
            }
        }
    }

    /// Finds the next worker able to take a task, round-robin from the last one used.
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|offset| (self.current_channel + offset) % count)
            .find(|&index| self.channels[index].accepts_work())
    }

    /// Blocks until `ticket` resolves, pumping the scheduler meanwhile.
    ///
    /// # Returns
    /// `true` if the ticket resolved before `timeout`
    pub fn wait_for(&mut self, ticket: &GenerationTicket, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.process();
            if ticket.is_resolved() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Snapshot of the scheduler's counters.
    pub fn stats(&self) -> TaskStats {
        TaskStats {
            queued: self.queue.len(),
            in_flight: self
                .channels
                .iter()
                .map(|channel| channel.num_tasks_in_flight)
                .sum(),
            ..self.stats
        }
    }

    /// Cancels every outstanding request and joins the workers.
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        let outstanding = self.pending.len();
        for (_, request) in self.pending.drain() {
            request.ticket.resolve(Err(GenerationError::Cancelled));
            self.stats.cancelled += 1;
        }
        self.queue.clear();

        for channel in &mut self.channels {
            channel.task_sender = None;
        }
        for (index, channel) in self.channels.iter_mut().enumerate() {
            if let Some(worker) = channel.worker.take() {
                if worker.join().is_err() {
                    warn!("Generation worker {index} panicked during shutdown");
                }
            }
            channel.num_tasks_in_flight = 0;
        }
        debug!("Cancelled {outstanding} outstanding generation requests");
        info!("Stopped {} generation workers", self.channels.len());
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(tasks: Receiver<Box<dyn Task>>, results: Sender<TaskOutput>) {
    while let Ok(task) = tasks.recv() {
        let position = task.position();
        let output = panic::catch_unwind(AssertUnwindSafe(move || task.process()))
            .unwrap_or_else(|payload| TaskOutput {
                position,
                result: Err(GenerationError::Failed(panic_message(payload.as_ref()))),
            });
        if results.send(output).is_err() {
            break;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
