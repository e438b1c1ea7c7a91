use crate::error::SignalingError;
use crate::registry::ConnectionRegistry;
use crate::room::RoomTable;
use duet_core::{ParticipantId, ServerEvent, SignalingMessage};
use std::sync::Arc;
use tracing::{debug, warn};

/// Forwards signaling messages between the two members of a room.
///
/// The payload is never inspected. Nothing is buffered: a message for a
/// participant that is gone is dropped and the sender gets `PeerUnreachable`.
#[derive(Clone)]
pub struct Relay {
    registry: ConnectionRegistry,
    rooms: Arc<RoomTable>,
}

impl Relay {
    pub fn new(registry: ConnectionRegistry, rooms: Arc<RoomTable>) -> Self {
        Self { registry, rooms }
    }

    pub fn send(
        &self,
        from: ParticipantId,
        to: ParticipantId,
        message: SignalingMessage,
    ) -> Result<(), SignalingError> {
        if self.rooms.peer_of(&from) != Some(to) {
            warn!(
                "Refusing to relay {} from {} to {}: not paired",
                message.name(),
                from,
                to
            );
            return Err(SignalingError::PeerUnreachable(to));
        }

        debug!("Relaying {} {} -> {}", message.name(), from, to);
        self.registry
            .deliver(&to, ServerEvent::RelayIn { from, message })
    }

    /// Send to whoever shares the sender's room.
    pub fn send_to_peer(
        &self,
        from: ParticipantId,
        message: SignalingMessage,
    ) -> Result<ParticipantId, SignalingError> {
        let Some(peer) = self.rooms.peer_of(&from) else {
            return Err(SignalingError::NotPaired(from));
        };
        self.send(from, peer, message)?;
        Ok(peer)
    }
}
