use duet_core::{ParticipantId, RoomId};

/// Pairing session: at most two participants, kept in join order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    id: RoomId,
    members: Vec<ParticipantId>,
}

impl Room {
    pub const MAX_MEMBERS: usize = 2;

    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            members: Vec::with_capacity(Self::MAX_MEMBERS),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn members(&self) -> &[ParticipantId] {
        &self.members
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= Self::MAX_MEMBERS
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.members.contains(participant_id)
    }

    /// Returns false when the room is full or the participant is already in.
    pub(crate) fn add(&mut self, participant_id: ParticipantId) -> bool {
        if self.is_full() || self.contains(&participant_id) {
            return false;
        }
        self.members.push(participant_id);
        true
    }

    pub(crate) fn remove(&mut self, participant_id: &ParticipantId) -> bool {
        let before = self.members.len();
        self.members.retain(|id| id != participant_id);
        self.members.len() != before
    }

    pub fn peer_of(&self, participant_id: &ParticipantId) -> Option<ParticipantId> {
        if !self.contains(participant_id) {
            return None;
        }
        self.members.iter().find(|id| *id != participant_id).copied()
    }
}
