use crate::error::SignalingError;
use crate::registry::ConnectionRegistry;
use crate::room::Room;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use duet_core::{ParticipantId, RoomId, ServerEvent};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub room: RoomId,
    /// The joining participant first, then the member already present.
    pub members: Vec<ParticipantId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Left {
    pub room: RoomId,
    pub remaining: Option<ParticipantId>,
}

/// Rooms keyed by id, plus the reverse index participant → room.
///
/// Every mutation of a room happens inside a single `rooms` entry guard, so
/// joins and leaves on one room id are serialized. Lock order is always
/// `rooms` then `membership`; nothing takes a `rooms` guard while holding a
/// `membership` guard.
pub struct RoomTable {
    rooms: DashMap<RoomId, Room>,
    membership: DashMap<ParticipantId, RoomId>,
    registry: ConnectionRegistry,
}

impl RoomTable {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self {
            rooms: DashMap::new(),
            membership: DashMap::new(),
            registry,
        }
    }

    /// Put a participant into a room and notify both sides.
    ///
    /// Notifications go out while the room entry is still held, so they are
    /// ordered with every other membership change on that room. The joiner
    /// receives `joined` before the existing member receives `peer-present`,
    /// so an offer triggered by `peer-present` can never overtake it.
    pub fn join(
        &self,
        room_id: RoomId,
        participant_id: ParticipantId,
    ) -> Result<Joined, SignalingError> {
        if !room_id.is_valid() {
            return Err(SignalingError::InvalidRoom);
        }

        let mut room = match self.rooms.entry(room_id.clone()) {
            Entry::Occupied(occupied) => {
                if occupied.get().is_full() {
                    return Err(SignalingError::RoomFull(room_id));
                }
                self.claim_membership(&room_id, participant_id)?;
                occupied.into_ref()
            }
            Entry::Vacant(vacant) => {
                self.claim_membership(&room_id, participant_id)?;
                info!("Created room '{}'", room_id);
                vacant.insert(Room::new(room_id.clone()))
            }
        };

        let existing = room.members().first().copied();
        room.add(participant_id);

        let members = std::iter::once(participant_id).chain(existing).collect::<Vec<_>>();
        info!(
            "Participant {} joined room '{}' ({} member(s))",
            participant_id,
            room_id,
            members.len()
        );

        self.notify(
            &participant_id,
            ServerEvent::Joined {
                room: room_id.clone(),
                self_id: participant_id,
                members: members.clone(),
            },
        );
        if let Some(existing) = existing {
            self.notify(
                &existing,
                ServerEvent::PeerPresent {
                    peer_id: participant_id,
                },
            );
        }
        drop(room);

        Ok(Joined {
            room: room_id,
            members,
        })
    }

    /// Remove a participant from whatever room holds it. No-op when it is in
    /// no room.
    pub fn leave(&self, participant_id: &ParticipantId) -> Option<Left> {
        let (_, room_id) = self.membership.remove(participant_id)?;

        let remaining = match self.rooms.entry(room_id.clone()) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().remove(participant_id);
                info!("Participant {} left room '{}'", participant_id, room_id);

                if occupied.get().is_empty() {
                    occupied.remove();
                    info!("Destroyed empty room '{}'", room_id);
                    None
                } else {
                    let remaining = occupied.get().members().first().copied();
                    if let Some(remaining) = remaining {
                        self.notify(
                            &remaining,
                            ServerEvent::PeerLeft {
                                peer_id: *participant_id,
                            },
                        );
                    }
                    remaining
                }
            }
            Entry::Vacant(_) => None,
        };

        Some(Left {
            room: room_id,
            remaining,
        })
    }

    pub fn peer_of(&self, participant_id: &ParticipantId) -> Option<ParticipantId> {
        let room_id = self.room_of(participant_id)?;
        self.rooms.get(&room_id)?.peer_of(participant_id)
    }

    pub fn room_of(&self, participant_id: &ParticipantId) -> Option<RoomId> {
        self.membership
            .get(participant_id)
            .map(|entry| entry.value().clone())
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<ParticipantId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members().to_vec())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn claim_membership(
        &self,
        room_id: &RoomId,
        participant_id: ParticipantId,
    ) -> Result<(), SignalingError> {
        match self.membership.entry(participant_id) {
            Entry::Occupied(current) => Err(SignalingError::AlreadyInRoom {
                participant: participant_id,
                room: current.get().clone(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(room_id.clone());
                Ok(())
            }
        }
    }

    fn notify(&self, participant_id: &ParticipantId, event: ServerEvent) {
        if let Err(e) = self.registry.deliver(participant_id, event) {
            debug!("Room notification dropped: {}", e);
        }
    }
}
