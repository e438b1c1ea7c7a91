use crate::error::SignalingError;
use crate::registry::{ConnectionHandle, ConnectionRegistry};
use crate::room::RoomTable;
use crate::signaling::Relay;
use duet_core::{ClientRequest, ErrorCode, ParticipantId, ServerEvent};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a socket task needs: the registry, the room table and the relay
/// built on top of them. Cheap to clone.
#[derive(Clone)]
pub struct SignalingService {
    registry: ConnectionRegistry,
    rooms: Arc<RoomTable>,
    relay: Relay,
}

impl SignalingService {
    pub fn new() -> Self {
        let registry = ConnectionRegistry::new();
        let rooms = Arc::new(RoomTable::new(registry.clone()));
        let relay = Relay::new(registry.clone(), rooms.clone());

        Self {
            registry,
            rooms,
            relay,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn rooms(&self) -> &RoomTable {
        &self.rooms
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    /// Assign a fresh identity to a new socket and register it.
    pub fn connect(&self, handle: ConnectionHandle) -> Result<ParticipantId, SignalingError> {
        let participant_id = ParticipantId::new();
        self.registry.register(participant_id, handle)?;
        info!("Participant {} connected", participant_id);
        Ok(participant_id)
    }

    /// Terminal cleanup for a socket. Must run once per connection, whether
    /// the client closed cleanly or timed out. Calling it again is harmless.
    pub fn disconnect(&self, participant_id: &ParticipantId) {
        let was_registered = self.registry.unregister(participant_id);
        self.rooms.leave(participant_id);

        if was_registered {
            info!("Participant {} disconnected", participant_id);
        }
    }

    pub fn handle_request(&self, from: ParticipantId, request: ClientRequest) {
        let result = match request {
            ClientRequest::Join { room } => self.rooms.join(room, from).map(|_| ()),
            ClientRequest::Leave => {
                self.rooms.leave(&from);
                Ok(())
            }
            ClientRequest::Relay { to, message } => self.relay.send(from, to, message),
        };

        if let Err(e) = result {
            warn!("Request from {} refused: {}", from, e);
            self.reply_error(&from, e.code(), e.to_string());
        }
    }

    /// Tell a client its last frame could not be parsed.
    pub fn reject_malformed(&self, from: &ParticipantId, reason: String) {
        self.reply_error(from, ErrorCode::Malformed, reason);
    }

    fn reply_error(&self, to: &ParticipantId, code: ErrorCode, message: String) {
        if let Err(e) = self
            .registry
            .deliver(to, ServerEvent::Error { code, message })
        {
            warn!("Could not report error to {}: {}", to, e);
        }
    }
}

impl Default for SignalingService {
    fn default() -> Self {
        Self::new()
    }
}
