use crate::coordinator::{Coordinator, CoordinatorEvent, NegotiationState, OfferKind};
use crate::error::NegotiationError;
use crate::media::MediaTrack;
use duet_core::{SessionDescription, SignalingMessage};
use tracing::{info, warn};

impl Coordinator {
    pub(super) async fn initiate_call(&mut self) -> Result<(), NegotiationError> {
        if self.peer_gone {
            return Err(NegotiationError::PeerGone(self.peer_id));
        }
        if self.state != NegotiationState::Idle {
            return Err(NegotiationError::CallInProgress(self.state));
        }

        self.attach_media().await?;

        let description = match self.transport.create_local_description().await {
            Ok(description) => description,
            Err(e) => {
                self.release_media().await;
                return Err(e.into());
            }
        };

        self.outstanding = Some(OfferKind::Call);
        self.set_state(NegotiationState::OfferSent);
        info!("Calling {}", self.peer_id);

        if let Err(e) = self.relay(SignalingMessage::CallOffer { description }).await {
            self.abandon_call().await;
            return Err(e);
        }
        Ok(())
    }

    /// Answer an incoming call. Only valid from `Idle`.
    pub(super) async fn accept_call(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.attach_media().await?;
        self.set_state(NegotiationState::OfferReceived);

        let answer = match self.apply_offer(description).await {
            Ok(answer) => answer,
            Err(e) => {
                self.abandon_call().await;
                return Err(e);
            }
        };

        info!("Answering call from {}", self.peer_id);
        if let Err(e) = self
            .relay(SignalingMessage::CallAnswer {
                description: answer,
            })
            .await
        {
            self.abandon_call().await;
            return Err(e);
        }

        self.reach_stable().await
    }

    pub(super) async fn add_track(&mut self, track: MediaTrack) -> Result<(), NegotiationError> {
        if self.peer_gone {
            return Err(NegotiationError::PeerGone(self.peer_id));
        }
        if self.state == NegotiationState::Idle {
            return Err(NegotiationError::NoCall);
        }

        self.transport.add_local_track(track.clone()).await?;
        info!("Added local {} track {}", track.kind, track.id);

        let media = self.local_media.get_or_insert_with(Default::default);
        media.tracks.push(track);
        Ok(())
    }

    /// Acquire local media and hand its tracks to the transport. On failure
    /// nothing has changed and the owner is told why.
    async fn attach_media(&mut self) -> Result<(), NegotiationError> {
        let media = match self.media.acquire().await {
            Ok(media) => media,
            Err(e) => {
                warn!("Media unavailable: {}", e);
                self.emit(CoordinatorEvent::MediaUnavailable(e.clone()));
                return Err(e.into());
            }
        };

        for track in &media.tracks {
            if let Err(e) = self.transport.add_local_track(track.clone()).await {
                self.media.release(media).await;
                return Err(e.into());
            }
        }

        self.emit(CoordinatorEvent::LocalMedia(media.clone()));
        self.local_media = Some(media);
        self.discard_negotiation_needed().await;
        Ok(())
    }

    /// Back to `Idle` after a call failed to get off the ground.
    async fn abandon_call(&mut self) {
        self.outstanding = None;
        self.release_media().await;
        self.set_state(NegotiationState::Idle);
    }

    pub(super) async fn release_media(&mut self) {
        if let Some(media) = self.local_media.take() {
            self.media.release(media).await;
        }
    }
}
