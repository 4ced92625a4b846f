//! Connection registry
//!
//! Tracks every live handle and its pairing state. The partner handle lives
//! inside [`ConnectionState::Paired`], so a handle has a partner exactly when
//! it is paired, and every mutation here writes both sides of a pairing.

use crate::error::SignalingError;
use roulette_protocol::Handle;
use std::collections::HashMap;

/// Pairing state of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Queued,
    Paired(Handle),
}

#[derive(Debug, Default)]
pub struct Registry {
    connections: HashMap<Handle, ConnectionState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an idle entry for `handle`
    pub fn register(&mut self, handle: Handle) -> Result<(), SignalingError> {
        if self.connections.contains_key(&handle) {
            return Err(SignalingError::AlreadyRegistered(handle));
        }
        self.connections.insert(handle, ConnectionState::Idle);
        Ok(())
    }

    /// Remove all trace of `handle`, returning its last state.
    ///
    /// A former partner is reset to idle.
    pub fn unregister(&mut self, handle: Handle) -> Option<ConnectionState> {
        let state = self.connections.remove(&handle)?;
        if let ConnectionState::Paired(partner) = state {
            if let Some(other) = self.connections.get_mut(&partner) {
                *other = ConnectionState::Idle;
            }
        }
        Some(state)
    }

    pub fn is_active(&self, handle: Handle) -> bool {
        self.connections.contains_key(&handle)
    }

    pub fn state_of(&self, handle: Handle) -> Option<ConnectionState> {
        self.connections.get(&handle).copied()
    }

    pub fn partner_of(&self, handle: Handle) -> Option<Handle> {
        match self.connections.get(&handle) {
            Some(ConnectionState::Paired(partner)) => Some(*partner),
            _ => None,
        }
    }

    /// Move an idle handle to the queued state
    pub fn mark_queued(&mut self, handle: Handle) -> Result<(), SignalingError> {
        let state = self
            .connections
            .get_mut(&handle)
            .ok_or(SignalingError::NotFound(handle))?;
        match *state {
            ConnectionState::Idle => {
                *state = ConnectionState::Queued;
                Ok(())
            }
            ConnectionState::Queued | ConnectionState::Paired(_) => {
                Err(SignalingError::DuplicateJoin(handle))
            }
        }
    }

    /// Return a queued handle to idle
    pub fn mark_idle(&mut self, handle: Handle) -> Result<(), SignalingError> {
        let state = self
            .connections
            .get_mut(&handle)
            .ok_or(SignalingError::NotFound(handle))?;
        match *state {
            ConnectionState::Queued => {
                *state = ConnectionState::Idle;
                Ok(())
            }
            ConnectionState::Idle => Ok(()),
            ConnectionState::Paired(_) => Err(SignalingError::DuplicateJoin(handle)),
        }
    }

    /// Pair `a` with `b`. Neither may already be paired.
    pub fn set_paired(&mut self, a: Handle, b: Handle) -> Result<(), SignalingError> {
        if a == b {
            return Err(SignalingError::DuplicateJoin(a));
        }
        for handle in [a, b] {
            match self.connections.get(&handle) {
                None => return Err(SignalingError::NotFound(handle)),
                Some(ConnectionState::Paired(_)) => {
                    return Err(SignalingError::DuplicateJoin(handle));
                }
                Some(_) => {}
            }
        }
        self.connections.insert(a, ConnectionState::Paired(b));
        self.connections.insert(b, ConnectionState::Paired(a));
        Ok(())
    }

    /// Break the pairing `handle` is part of, leaving both sides idle.
    ///
    /// Returns the former partner.
    pub fn clear_pairing(&mut self, handle: Handle) -> Result<Handle, SignalingError> {
        let partner = match self.connections.get(&handle) {
            None => return Err(SignalingError::NotFound(handle)),
            Some(ConnectionState::Paired(partner)) => *partner,
            Some(_) => return Err(SignalingError::NotPaired(handle)),
        };
        self.connections.insert(handle, ConnectionState::Idle);
        if let Some(state) = self.connections.get_mut(&partner) {
            *state = ConnectionState::Idle;
        }
        Ok(partner)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Number of handles currently in a pairing
    pub fn paired_count(&self) -> usize {
        self.connections
            .values()
            .filter(|state| matches!(state, ConnectionState::Paired(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(n: usize) -> (Registry, Vec<Handle>) {
        let mut registry = Registry::new();
        let handles: Vec<Handle> = (0..n).map(|_| Handle::new_random()).collect();
        for handle in &handles {
            registry.register(*handle).unwrap();
        }
        (registry, handles)
    }

    #[test]
    fn register_twice_is_rejected() {
        let (mut registry, handles) = registered(1);
        assert_eq!(
            registry.register(handles[0]),
            Err(SignalingError::AlreadyRegistered(handles[0]))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn pairing_is_symmetric() {
        let (mut registry, h) = registered(2);
        registry.set_paired(h[0], h[1]).unwrap();
        assert_eq!(registry.partner_of(h[0]), Some(h[1]));
        assert_eq!(registry.partner_of(h[1]), Some(h[0]));
        assert_eq!(registry.paired_count(), 2);

        assert_eq!(registry.clear_pairing(h[1]), Ok(h[0]));
        assert_eq!(registry.state_of(h[0]), Some(ConnectionState::Idle));
        assert_eq!(registry.state_of(h[1]), Some(ConnectionState::Idle));
    }

    #[test]
    fn cannot_pair_an_already_paired_handle() {
        let (mut registry, h) = registered(3);
        registry.set_paired(h[0], h[1]).unwrap();
        assert_eq!(
            registry.set_paired(h[2], h[1]),
            Err(SignalingError::DuplicateJoin(h[1]))
        );
        assert_eq!(registry.partner_of(h[1]), Some(h[0]));
        assert_eq!(registry.partner_of(h[2]), None);
    }

    #[test]
    fn cannot_pair_with_unknown_handle() {
        let (mut registry, h) = registered(1);
        let ghost = Handle::new_random();
        assert_eq!(
            registry.set_paired(h[0], ghost),
            Err(SignalingError::NotFound(ghost))
        );
        assert_eq!(registry.state_of(h[0]), Some(ConnectionState::Idle));
    }

    #[test]
    fn unregister_resets_partner() {
        let (mut registry, h) = registered(2);
        registry.set_paired(h[0], h[1]).unwrap();
        assert_eq!(registry.unregister(h[0]), Some(ConnectionState::Paired(h[1])));
        assert!(!registry.is_active(h[0]));
        assert_eq!(registry.state_of(h[1]), Some(ConnectionState::Idle));
        assert_eq!(registry.unregister(h[0]), None);
    }

    #[test]
    fn queued_state_transitions() {
        let (mut registry, h) = registered(1);
        registry.mark_queued(h[0]).unwrap();
        assert_eq!(
            registry.mark_queued(h[0]),
            Err(SignalingError::DuplicateJoin(h[0]))
        );
        registry.mark_idle(h[0]).unwrap();
        assert_eq!(registry.state_of(h[0]), Some(ConnectionState::Idle));
    }

    #[test]
    fn clear_pairing_requires_a_pairing() {
        let (mut registry, h) = registered(1);
        assert_eq!(
            registry.clear_pairing(h[0]),
            Err(SignalingError::NotPaired(h[0]))
        );
    }
}
