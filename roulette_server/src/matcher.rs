//! Pairs the two oldest queued handles.
//!
//! Handles can go stale between enqueue and pop, so each pop re-checks
//! liveness against the registry. Pop and check happen in one call; callers
//! only ever observe the resulting [`MatchOutcome`].

use crate::error::SignalingError;
use crate::queue::WaitingQueue;
use crate::registry::{ConnectionState, Registry};
use roulette_protocol::Handle;
use tracing::{debug, info, warn};

/// Result of one pop-and-verify step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Both handles were live and are now partners
    Paired(Handle, Handle),
    /// Only this handle was live; it went back to the end of the queue
    Requeued(Handle),
    /// Neither handle was live
    Dropped,
}

/// Pop the two oldest handles and resolve them.
///
/// Fails with [`SignalingError::EmptyQueue`] when fewer than two are queued.
pub fn match_step(
    queue: &mut WaitingQueue,
    registry: &mut Registry,
) -> Result<MatchOutcome, SignalingError> {
    if queue.size() < 2 {
        return Err(SignalingError::EmptyQueue);
    }
    let a = queue.dequeue_oldest()?;
    let b = queue.dequeue_oldest()?;

    match (registry.is_active(a), registry.is_active(b)) {
        (true, true) => {
            if let Err(e) = registry.set_paired(a, b) {
                // A failed pairing means one side is not Queued, so at most one goes back.
                for handle in [a, b] {
                    if registry.state_of(handle) == Some(ConnectionState::Queued) {
                        queue.enqueue(handle, registry)?;
                    }
                }
                return Err(e);
            }
            info!(%a, %b, "Paired");
            Ok(MatchOutcome::Paired(a, b))
        }
        (true, false) | (false, true) => {
            let survivor = if registry.is_active(a) { a } else { b };
            // The survivor loses its seniority and waits behind everyone else.
            queue.enqueue(survivor, registry)?;
            debug!(%survivor, "Partner went stale before pairing, requeued");
            Ok(MatchOutcome::Requeued(survivor))
        }
        (false, false) => {
            debug!(%a, %b, "Dropped two stale queue entries");
            Ok(MatchOutcome::Dropped)
        }
    }
}

/// Run [`match_step`] until fewer than two handles remain queued.
///
/// Each step pops two and pushes back at most one, so the loop terminates.
pub fn run(queue: &mut WaitingQueue, registry: &mut Registry) -> Vec<MatchOutcome> {
    let mut outcomes = Vec::new();
    loop {
        match match_step(queue, registry) {
            Ok(outcome) => outcomes.push(outcome),
            Err(SignalingError::EmptyQueue) => break,
            Err(e) => warn!("Matcher step failed: {}", e),
        }
    }
    outcomes
}
