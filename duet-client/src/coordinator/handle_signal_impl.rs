use crate::coordinator::{Coordinator, NegotiationState, OfferKind};
use crate::error::NegotiationError;
use duet_core::{IceCandidate, ParticipantId, SessionDescription, SignalingMessage};
use tracing::{debug, info, warn};

impl Coordinator {
    pub(super) async fn handle_signal(
        &mut self,
        from: ParticipantId,
        message: SignalingMessage,
    ) -> Result<(), NegotiationError> {
        if from != self.peer_id {
            return Err(NegotiationError::UnknownSender(from));
        }
        if self.peer_gone {
            return Err(NegotiationError::PeerGone(self.peer_id));
        }

        debug!("{} from {} while {:?}", message.name(), from, self.state);

        match message {
            SignalingMessage::CallOffer { description } => {
                if self.state != NegotiationState::Idle {
                    return Err(NegotiationError::UnexpectedOffer {
                        kind: "call-offer",
                        state: self.state,
                    });
                }
                self.accept_call(description).await
            }

            SignalingMessage::NegotiationOffer { description } => {
                self.accept_renegotiation(description).await
            }

            SignalingMessage::CallAnswer { description } => {
                self.apply_answer(OfferKind::Call, "call-answer", description)
                    .await
            }

            SignalingMessage::NegotiationAnswer { description } => {
                self.apply_answer(OfferKind::Renegotiation, "negotiation-answer", description)
                    .await
            }

            SignalingMessage::Candidate { candidate } => {
                self.add_remote_candidate(candidate).await
            }
        }
    }

    /// Apply a remote offer and produce the local answer for it.
    pub(super) async fn apply_offer(
        &mut self,
        description: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        self.transport.apply_remote_description(description).await?;
        self.remote_description_set = true;
        self.flush_candidates().await;

        let answer = self.transport.create_local_description().await?;
        Ok(answer)
    }

    async fn apply_answer(
        &mut self,
        expected: OfferKind,
        kind: &'static str,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        if self.outstanding != Some(expected) {
            return Err(NegotiationError::StaleAnswer { kind });
        }

        self.transport.apply_remote_description(description).await?;
        self.remote_description_set = true;
        self.flush_candidates().await;

        self.outstanding = None;
        info!("{} from {} applied", kind, self.peer_id);
        self.reach_stable().await
    }

    async fn add_remote_candidate(&mut self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        if !self.remote_description_set {
            debug!("Buffering remote candidate until a description is applied");
            self.pending_candidates.push(candidate);
            return Ok(());
        }

        self.transport.add_remote_candidate(candidate).await?;
        Ok(())
    }

    async fn flush_candidates(&mut self) {
        for candidate in std::mem::take(&mut self.pending_candidates) {
            if let Err(e) = self.transport.add_remote_candidate(candidate).await {
                warn!("Buffered candidate rejected: {}", e);
            }
        }
    }
}
