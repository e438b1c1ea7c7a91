use crate::error::RelayError;
use async_trait::async_trait;
use duet_core::{ClientRequest, ParticipantId, SignalingMessage};
use tokio::sync::mpsc;
use tracing::debug;

/// The coordinator's way out to its peer.
///
/// Implementations either forward through an in-process relay, which reports
/// unreachable peers synchronously, or over a signaling socket, where the
/// server reports them later as an `error{peer-unreachable}` event.
#[async_trait]
pub trait SignalingLink: Send + Sync + 'static {
    async fn relay(&self, to: ParticipantId, message: SignalingMessage) -> Result<(), RelayError>;
}

/// Relays over the session's signaling socket. Unreachable peers come back
/// later as server errors, not from `relay`.
#[derive(Clone)]
pub struct WsSignalingLink {
    requests: mpsc::UnboundedSender<ClientRequest>,
}

impl WsSignalingLink {
    pub fn new(requests: mpsc::UnboundedSender<ClientRequest>) -> Self {
        Self { requests }
    }
}

#[async_trait]
impl SignalingLink for WsSignalingLink {
    async fn relay(&self, to: ParticipantId, message: SignalingMessage) -> Result<(), RelayError> {
        debug!("Relaying {} to {}", message.name(), to);
        self.requests
            .send(ClientRequest::Relay { to, message })
            .map_err(|_| RelayError::ChannelClosed)
    }
}
