use crate::coordinator::{Coordinator, NegotiationState, OfferKind};
use crate::transport::TransportEvent;
use crate::error::NegotiationError;
use duet_core::{SessionDescription, SignalingMessage};
use tracing::{debug, info, warn};

impl Coordinator {
    pub(super) async fn on_negotiation_needed(&mut self) -> Result<(), NegotiationError> {
        match self.state {
            // The call offer already carries every local track.
            NegotiationState::Idle => {
                debug!("Negotiation needed while idle, ignoring");
                Ok(())
            }
            NegotiationState::OfferSent | NegotiationState::OfferReceived => {
                debug!("Negotiation needed while {:?}, deferring", self.state);
                self.renegotiation_pending = true;
                self.publish();
                Ok(())
            }
            NegotiationState::Stable => self.send_renegotiation().await,
        }
    }

    /// Drop negotiation-needed raised by attaching call media. The offer or
    /// answer created next already carries those tracks.
    pub(super) async fn discard_negotiation_needed(&mut self) {
        let mut others = Vec::new();
        while let Ok(event) = self.transport_rx.try_recv() {
            match event {
                TransportEvent::NegotiationNeeded => {
                    debug!("Negotiation needed from attached media, ignoring");
                }
                other => others.push(other),
            }
        }
        for event in others {
            self.handle_transport_event(event).await;
        }
    }

    /// Enter `Stable`, then replay a deferred renegotiation if one is queued.
    pub(super) async fn reach_stable(&mut self) -> Result<(), NegotiationError> {
        let replay = std::mem::take(&mut self.renegotiation_pending);
        self.state = NegotiationState::Stable;

        if !replay {
            self.publish();
            return Ok(());
        }

        info!("Replaying deferred renegotiation with {}", self.peer_id);
        self.send_renegotiation().await
    }

    async fn send_renegotiation(&mut self) -> Result<(), NegotiationError> {
        let description = match self.transport.create_local_description().await {
            Ok(description) => description,
            Err(e) => {
                self.set_state(NegotiationState::Stable);
                return Err(e.into());
            }
        };

        self.outstanding = Some(OfferKind::Renegotiation);
        self.set_state(NegotiationState::OfferSent);

        if let Err(e) = self
            .relay(SignalingMessage::NegotiationOffer { description })
            .await
        {
            self.outstanding = None;
            self.set_state(NegotiationState::Stable);
            return Err(e);
        }
        Ok(())
    }

    /// Answer a renegotiation offer, resolving a collision with our own.
    pub(super) async fn accept_renegotiation(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        match (self.state, self.outstanding) {
            (NegotiationState::Stable, _) => {}
            (NegotiationState::OfferSent, Some(OfferKind::Renegotiation)) => {
                if !self.is_polite() {
                    warn!(
                        "Offer collision with {}: keeping ours, dropping theirs",
                        self.peer_id
                    );
                    return Ok(());
                }

                info!("Offer collision with {}: rolling back ours", self.peer_id);
                self.transport.rollback().await?;
                self.outstanding = None;
                self.renegotiation_pending = true;
            }
            (state, _) => {
                return Err(NegotiationError::UnexpectedOffer {
                    kind: "negotiation-offer",
                    state,
                });
            }
        }

        self.set_state(NegotiationState::OfferReceived);

        let answer = match self.apply_offer(description).await {
            Ok(answer) => answer,
            Err(e) => {
                self.abort_remote_offer().await;
                return Err(e);
            }
        };

        if let Err(e) = self
            .relay(SignalingMessage::NegotiationAnswer {
                description: answer,
            })
            .await
        {
            self.abort_remote_offer().await;
            return Err(e);
        }

        self.reach_stable().await
    }

    /// The remote offer went unanswered. Back to `Stable`, resending our own
    /// offer if it was rolled back for this one.
    async fn abort_remote_offer(&mut self) {
        if let Err(e) = self.reach_stable().await {
            warn!("Could not replay renegotiation to {}: {}", self.peer_id, e);
        }
    }
}
