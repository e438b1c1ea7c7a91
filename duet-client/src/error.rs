use crate::coordinator::NegotiationState;
use duet_core::ParticipantId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("permission to capture media was denied")]
    PermissionDenied,

    #[error("no capture device available: {0}")]
    DeviceUnavailable(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,

    #[error("invalid description: {0}")]
    InvalidDescription(String),

    #[error("media engine error: {0}")]
    Engine(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("peer {0} is unreachable")]
    PeerUnreachable(ParticipantId),

    #[error("signaling channel is closed")]
    ChannelClosed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("unexpected {kind} while {state:?}")]
    UnexpectedOffer {
        kind: &'static str,
        state: NegotiationState,
    },

    #[error("stale {kind}: no matching offer is outstanding")]
    StaleAnswer { kind: &'static str },

    #[error("message from {0}, who is not this call's peer")]
    UnknownSender(ParticipantId),

    #[error("a call is already in progress ({0:?})")]
    CallInProgress(NegotiationState),

    #[error("no call is in progress")]
    NoCall,

    #[error("peer {0} has left")]
    PeerGone(ParticipantId),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("coordinator has shut down")]
    Closed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to connect to signaling server: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("not in a room")]
    NotJoined,

    #[error("no peer to call")]
    NoPeer,

    #[error("session is closed")]
    Closed,

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
}
