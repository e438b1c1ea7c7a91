#[cfg(feature = "webrtc")]
mod webrtc_transport;

#[cfg(feature = "webrtc")]
pub use webrtc_transport::*;

use crate::error::TransportError;
use crate::media::MediaTrack;
use async_trait::async_trait;
use duet_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

/// Media arriving from the peer once the connection is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStream {
    pub id: String,
    pub tracks: Vec<MediaTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Local tracks changed and a new offer/answer round is required.
    NegotiationNeeded,
    LocalCandidate(IceCandidate),
    RemoteTrack(RemoteStream),
}

/// The peer-connection engine doing ICE, DTLS and SRTP.
///
/// A coordinator owns exactly one transport and is its only caller.
#[async_trait]
pub trait MediaTransport: Send + Sync + 'static {
    /// Install the sink for transport events. Called once, right after the
    /// owning coordinator is built; events stop when the sink is dropped.
    fn subscribe(&self, events: mpsc::UnboundedSender<TransportEvent>);

    /// Create an offer, or an answer if a remote offer is applied, and install
    /// it as the local description.
    async fn create_local_description(&self) -> Result<SessionDescription, TransportError>;

    async fn apply_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), TransportError>;

    async fn add_local_track(&self, track: MediaTrack) -> Result<(), TransportError>;

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError>;

    /// Discard a local offer that has not been answered.
    async fn rollback(&self) -> Result<(), TransportError>;

    async fn close(&self);
}
