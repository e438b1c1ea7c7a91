use crate::error::SignalingError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use duet_core::{ParticipantId, ServerEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Outbound half of one participant's signaling socket.
pub type ConnectionHandle = mpsc::UnboundedSender<ServerEvent>;

/// Process-wide map from participant identity to its live connection.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<ParticipantId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        participant_id: ParticipantId,
        handle: ConnectionHandle,
    ) -> Result<(), SignalingError> {
        match self.connections.entry(participant_id) {
            Entry::Occupied(_) => Err(SignalingError::DuplicateId(participant_id)),
            Entry::Vacant(slot) => {
                slot.insert(handle);
                debug!("Registered connection for {}", participant_id);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, participant_id: &ParticipantId) -> Option<ConnectionHandle> {
        self.connections
            .get(participant_id)
            .map(|entry| entry.value().clone())
    }

    /// Returns whether a connection was actually removed.
    pub fn unregister(&self, participant_id: &ParticipantId) -> bool {
        self.connections.remove(participant_id).is_some()
    }

    pub fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.connections.contains_key(participant_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Push an event onto a participant's socket.
    ///
    /// A participant whose socket task already exited counts as unreachable
    /// even if its disconnect has not been processed yet.
    pub fn deliver(
        &self,
        participant_id: &ParticipantId,
        event: ServerEvent,
    ) -> Result<(), SignalingError> {
        let Some(handle) = self.lookup(participant_id) else {
            return Err(SignalingError::PeerUnreachable(*participant_id));
        };

        handle.send(event).map_err(|e| {
            error!("Failed to queue event for {}: {}", participant_id, e);
            SignalingError::PeerUnreachable(*participant_id)
        })
    }
}
