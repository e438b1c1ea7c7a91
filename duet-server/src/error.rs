use duet_core::{ErrorCode, ParticipantId, RoomId};
use thiserror::Error;

/// Failures of the registry, room table and relay. All of them are
/// recoverable: the offending request is refused and reported to its sender.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalingError {
    #[error("participant {0} is already registered")]
    DuplicateId(ParticipantId),

    #[error("room '{0}' is full")]
    RoomFull(RoomId),

    #[error("participant {0} is unreachable")]
    PeerUnreachable(ParticipantId),

    #[error("participant {participant} is already in room '{room}'")]
    AlreadyInRoom {
        participant: ParticipantId,
        room: RoomId,
    },

    #[error("participant {0} has no peer in its room")]
    NotPaired(ParticipantId),

    #[error("room id must not be blank")]
    InvalidRoom,
}

impl SignalingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::DuplicateId(_) => ErrorCode::DuplicateId,
            Self::RoomFull(_) => ErrorCode::RoomFull,
            Self::PeerUnreachable(_) | Self::NotPaired(_) => ErrorCode::PeerUnreachable,
            Self::AlreadyInRoom { .. } => ErrorCode::AlreadyInRoom,
            Self::InvalidRoom => ErrorCode::InvalidRoom,
        }
    }
}
