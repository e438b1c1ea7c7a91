mod participant;
mod protocol;
mod room;
mod signaling;

pub use participant::ParticipantId;
pub use protocol::{ClientRequest, ErrorCode, ServerEvent};
pub use room::RoomId;
pub use signaling::{IceCandidate, SdpType, SessionDescription, SignalingMessage};
