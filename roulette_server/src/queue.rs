//! Waiting queue
//!
//! Strict FIFO over handles seeking a partner, with no duplicates.

use crate::error::SignalingError;
use crate::registry::{ConnectionState, Registry};
use indexmap::IndexSet;
use roulette_protocol::Handle;

#[derive(Debug, Default)]
pub struct WaitingQueue {
    handles: IndexSet<Handle>,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handle` at the back.
    ///
    /// Rejects handles already queued, paired, or unknown to `registry`.
    pub fn enqueue(&mut self, handle: Handle, registry: &Registry) -> Result<(), SignalingError> {
        match registry.state_of(handle) {
            None => return Err(SignalingError::NotFound(handle)),
            Some(ConnectionState::Paired(_)) => return Err(SignalingError::DuplicateJoin(handle)),
            Some(_) => {}
        }
        if !self.handles.insert(handle) {
            return Err(SignalingError::DuplicateJoin(handle));
        }
        Ok(())
    }

    /// Pop the handle with the earliest enqueue time
    pub fn dequeue_oldest(&mut self) -> Result<Handle, SignalingError> {
        self.handles
            .shift_remove_index(0)
            .ok_or(SignalingError::EmptyQueue)
    }

    /// Withdraw `handle`; returns whether it was queued
    pub fn remove(&mut self, handle: Handle) -> bool {
        self.handles.shift_remove(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.handles.contains(&handle)
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Queued handles, oldest first
    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        self.handles.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(n: usize) -> (WaitingQueue, Registry, Vec<Handle>) {
        let mut registry = Registry::new();
        let handles: Vec<Handle> = (0..n).map(|_| Handle::new_random()).collect();
        for handle in &handles {
            registry.register(*handle).unwrap();
        }
        (WaitingQueue::new(), registry, handles)
    }

    #[test]
    fn dequeues_in_insertion_order() {
        let (mut queue, registry, h) = setup(3);
        for handle in &h {
            queue.enqueue(*handle, &registry).unwrap();
        }
        assert_eq!(queue.dequeue_oldest(), Ok(h[0]));
        assert_eq!(queue.dequeue_oldest(), Ok(h[1]));
        assert_eq!(queue.dequeue_oldest(), Ok(h[2]));
        assert_eq!(queue.dequeue_oldest(), Err(SignalingError::EmptyQueue));
    }

    #[test]
    fn enqueue_is_idempotent() {
        let (mut queue, registry, h) = setup(1);
        queue.enqueue(h[0], &registry).unwrap();
        assert_eq!(
            queue.enqueue(h[0], &registry),
            Err(SignalingError::DuplicateJoin(h[0]))
        );
        assert_eq!(queue.size(), 1);
    }

    #[test]
    fn paired_and_unknown_handles_are_not_queued() {
        let (mut queue, mut registry, h) = setup(2);
        registry.set_paired(h[0], h[1]).unwrap();
        assert_eq!(
            queue.enqueue(h[0], &registry),
            Err(SignalingError::DuplicateJoin(h[0]))
        );
        let ghost = Handle::new_random();
        assert_eq!(
            queue.enqueue(ghost, &registry),
            Err(SignalingError::NotFound(ghost))
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let (mut queue, registry, h) = setup(3);
        for handle in &h {
            queue.enqueue(*handle, &registry).unwrap();
        }
        assert!(queue.remove(h[1]));
        assert!(!queue.remove(h[1]));
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![h[0], h[2]]);
    }
}
