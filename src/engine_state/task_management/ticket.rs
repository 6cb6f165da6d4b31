//! # Generation Tickets
//!
//! Completion handles returned by [`TaskManager::request_chunk`](super::TaskManager::request_chunk).

use std::sync::Arc;

use crate::{
    core::MtResource,
    engine_state::voxels::chunk::{ChunkBuffer, ChunkPosition},
    error::GenerationError,
};

/// State of a generation request.
#[derive(Clone, Debug)]
pub enum TicketStatus {
    /// Queued or running
    Pending,
    /// Finished. Every holder of the ticket sees the same buffer.
    Ready(Arc<ChunkBuffer>),
    /// Failed or cancelled
    Failed(GenerationError),
}

/// Shared handle to the outcome of one chunk generation request.
///
/// Requests for a chunk that is already queued or running return a clone of the
/// existing ticket, so [`GenerationTicket::same_request`] identifies merged requests.
#[derive(Clone, Debug)]
pub struct GenerationTicket {
    position: ChunkPosition,
    status: MtResource<TicketStatus>,
}

impl GenerationTicket {
    pub(crate) fn new(position: ChunkPosition) -> Self {
        Self {
            position,
            status: MtResource::new(TicketStatus::Pending),
        }
    }

    /// Chunk this ticket is for.
    pub fn position(&self) -> ChunkPosition {
        self.position
    }

    /// Snapshot of the current state.
    pub fn status(&self) -> TicketStatus {
        self.status.get().clone()
    }

    /// Returns `true` once the request succeeded or failed.
    pub fn is_resolved(&self) -> bool {
        !matches!(*self.status.get(), TicketStatus::Pending)
    }

    /// Returns `true` if both tickets track the same request.
    pub fn same_request(&self, other: &GenerationTicket) -> bool {
        self.status.ptr_eq(&other.status)
    }

    /// Settles the ticket. Only the first resolution takes effect.
    pub(crate) fn resolve(&self, outcome: Result<ChunkBuffer, GenerationError>) {
        let mut status = self.status.get_mut();
        if matches!(*status, TicketStatus::Pending) {
            *status = match outcome {
                Ok(buffer) => TicketStatus::Ready(Arc::new(buffer)),
                Err(error) => TicketStatus::Failed(error),
            };
        }
    }
}
