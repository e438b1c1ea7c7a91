use crate::model::participant::ParticipantId;
use crate::model::room::RoomId;
use crate::model::signaling::SignalingMessage;
use serde::{Deserialize, Serialize};

/// Requests a client sends over its signaling socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientRequest {
    Join {
        room: RoomId,
    },
    Leave,
    Relay {
        to: ParticipantId,
        message: SignalingMessage,
    },
}

/// Events the server pushes to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ServerEvent {
    Joined {
        room: RoomId,
        self_id: ParticipantId,
        members: Vec<ParticipantId>,
    },
    PeerPresent {
        peer_id: ParticipantId,
    },
    PeerLeft {
        peer_id: ParticipantId,
    },
    RelayIn {
        from: ParticipantId,
        message: SignalingMessage,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    DuplicateId,
    RoomFull,
    PeerUnreachable,
    AlreadyInRoom,
    InvalidRoom,
    Malformed,
}
