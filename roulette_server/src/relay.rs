//! Signaling relay
//!
//! Forwards handshake and chat payloads between paired handles without
//! looking inside them. Delivery is at-most-once: nothing is buffered or
//! retried, and a rejected relay is simply not delivered.

use crate::error::SignalingError;
use crate::lifecycle::Notification;
use crate::registry::Registry;
use roulette_protocol::{Handle, RelayPayload};

/// Address `payload` from `sender` to its live partner.
///
/// `declared` is the recipient the sender named; it must equal the partner
/// recorded in the registry.
pub fn relay(
    registry: &Registry,
    sender: Handle,
    declared: Handle,
    payload: RelayPayload,
) -> Result<Notification, SignalingError> {
    if !registry.is_active(sender) {
        return Err(SignalingError::NotFound(sender));
    }
    let partner = registry
        .partner_of(sender)
        .ok_or(SignalingError::NotPaired(sender))?;
    if partner != declared {
        return Err(SignalingError::InvalidRelayTarget { sender, declared });
    }
    if !registry.is_active(partner) {
        return Err(SignalingError::NotFound(partner));
    }
    Ok(Notification {
        to: partner,
        message: payload.into_server_message(sender),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use roulette_protocol::ServerMessage;
    use serde_json::json;

    fn paired() -> (Registry, Handle, Handle) {
        let mut registry = Registry::new();
        let (a, b) = (Handle::new_random(), Handle::new_random());
        registry.register(a).unwrap();
        registry.register(b).unwrap();
        registry.set_paired(a, b).unwrap();
        (registry, a, b)
    }

    #[test]
    fn forwards_payload_unchanged_to_partner() {
        let (registry, a, b) = paired();
        let payload = json!({"type": "offer", "sdp": "v=0\r\no=- 1 2 IN IP4 0.0.0.0\r\n"});
        let note = relay(&registry, a, b, RelayPayload::Offer(payload.clone())).unwrap();
        assert_eq!(note.to, b);
        assert_eq!(
            note.message,
            ServerMessage::SessionOffer { payload, from: a }
        );
    }

    #[test]
    fn chat_travels_both_ways() {
        let (registry, a, b) = paired();
        let note = relay(&registry, b, a, RelayPayload::Chat("hi".into())).unwrap();
        assert_eq!(note.to, a);
        assert_eq!(
            note.message,
            ServerMessage::Chat {
                text: "hi".into(),
                from: b
            }
        );
    }

    #[test]
    fn mismatched_recipient_is_rejected() {
        let (mut registry, a, _b) = paired();
        let stranger = Handle::new_random();
        registry.register(stranger).unwrap();
        assert_eq!(
            relay(&registry, a, stranger, RelayPayload::Candidate(json!({}))),
            Err(SignalingError::InvalidRelayTarget {
                sender: a,
                declared: stranger
            })
        );
    }

    #[test]
    fn unpaired_sender_is_rejected() {
        let mut registry = Registry::new();
        let (a, b) = (Handle::new_random(), Handle::new_random());
        registry.register(a).unwrap();
        registry.register(b).unwrap();
        assert_eq!(
            relay(&registry, a, b, RelayPayload::Answer(json!(null))),
            Err(SignalingError::NotPaired(a))
        );
    }

    #[test]
    fn unknown_sender_is_rejected() {
        let (registry, _a, b) = paired();
        let ghost = Handle::new_random();
        assert_eq!(
            relay(&registry, ghost, b, RelayPayload::Chat(String::new())),
            Err(SignalingError::NotFound(ghost))
        );
    }
}
