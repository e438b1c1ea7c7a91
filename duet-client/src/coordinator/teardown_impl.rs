use crate::coordinator::{Coordinator, CoordinatorEvent, NegotiationState};
use tracing::info;

impl Coordinator {
    /// The peer left or can no longer be reached. The coordinator stays up so
    /// late messages are dropped, but it will not start another call.
    pub(super) async fn end_relationship(&mut self) {
        if self.peer_gone {
            return;
        }

        self.peer_gone = true;
        self.reset().await;
        self.transport.close().await;
        info!("Relationship with {} ended", self.peer_id);
        self.emit(CoordinatorEvent::PeerUnavailable(self.peer_id));
    }

    /// Final cleanup before the task exits.
    pub(super) async fn teardown(&mut self) {
        self.reset().await;
        if !self.peer_gone {
            self.transport.close().await;
        }
    }

    async fn reset(&mut self) {
        self.outstanding = None;
        self.renegotiation_pending = false;
        self.remote_description_set = false;
        self.pending_candidates.clear();
        self.release_media().await;
        self.set_state(NegotiationState::Idle);
    }
}
