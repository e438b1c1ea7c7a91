use crate::error::TransportError;
use crate::media::{MediaTrack, TrackKind};
use crate::transport::{MediaTransport, RemoteStream, TransportEvent};
use async_trait::async_trait;
use duet_core::{IceCandidate, SdpType, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone)]
pub struct WebRtcConfig {
    pub ice_servers: Vec<String>,
}

impl Default for WebRtcConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec!["stun:stun.l.google.com:19302".to_string()],
        }
    }
}

/// `MediaTransport` backed by a webrtc-rs peer connection.
pub struct WebRtcTransport {
    peer_connection: Arc<RTCPeerConnection>,
    stream_id: String,
}

impl WebRtcTransport {
    pub async fn new(config: WebRtcConfig) -> Result<Self, TransportError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs().map_err(engine)?;
        let registry =
            register_default_interceptors(Registry::new(), &mut media_engine).map_err(engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: config.ice_servers,
                ..Default::default()
            }],
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await.map_err(engine)?);

        Ok(Self {
            peer_connection,
            stream_id: "duet-local".to_string(),
        })
    }
}

#[async_trait]
impl MediaTransport for WebRtcTransport {
    fn subscribe(&self, events: mpsc::UnboundedSender<TransportEvent>) {
        let negotiation_tx = events.clone();
        let peer_connection = Arc::downgrade(&self.peer_connection);
        self.peer_connection
            .on_negotiation_needed(Box::new(move || {
                let tx = negotiation_tx.clone();
                let peer_connection = peer_connection.clone();
                Box::pin(async move {
                    let Some(pc) = peer_connection.upgrade() else {
                        return;
                    };
                    // Tracks attached before the first offer or answer ride on it.
                    if pc.local_description().await.is_none() {
                        debug!("Negotiation needed before first description, ignoring");
                        return;
                    }
                    debug!("Peer connection needs negotiation");
                    let _ = tx.send(TransportEvent::NegotiationNeeded);
                })
            }));

        let candidate_tx = events.clone();
        self.peer_connection
            .on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
                let tx = candidate_tx.clone();
                Box::pin(async move {
                    let Some(candidate) = c else { return };
                    let Ok(init) = candidate.to_json() else {
                        return;
                    };
                    let _ = tx.send(TransportEvent::LocalCandidate(IceCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_m_line_index: init.sdp_mline_index,
                    }));
                })
            }));

        let track_tx = events;
        self.peer_connection
            .on_track(Box::new(move |track, _receiver, _transceiver| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        _ => TrackKind::Video,
                    };
                    info!("Remote {} track {} arrived", kind, track.id());
                    let _ = tx.send(TransportEvent::RemoteTrack(RemoteStream {
                        id: track.stream_id(),
                        tracks: vec![MediaTrack::new(track.id(), kind)],
                    }));
                })
            }));
    }

    async fn create_local_description(&self) -> Result<SessionDescription, TransportError> {
        let answering =
            self.peer_connection.signaling_state() == RTCSignalingState::HaveRemoteOffer;

        let description = if answering {
            self.peer_connection.create_answer(None).await
        } else {
            self.peer_connection.create_offer(None).await
        }
        .map_err(engine)?;

        self.peer_connection
            .set_local_description(description.clone())
            .await
            .map_err(engine)?;

        Ok(if answering {
            SessionDescription::answer(description.sdp)
        } else {
            SessionDescription::offer(description.sdp)
        })
    }

    async fn apply_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), TransportError> {
        let remote = match description.kind {
            SdpType::Offer => RTCSessionDescription::offer(description.sdp),
            SdpType::Answer => RTCSessionDescription::answer(description.sdp),
        }
        .map_err(|e| TransportError::InvalidDescription(e.to_string()))?;

        self.peer_connection
            .set_remote_description(remote)
            .await
            .map_err(|e| TransportError::InvalidDescription(e.to_string()))
    }

    async fn add_local_track(&self, track: MediaTrack) -> Result<(), TransportError> {
        let capability = match track.kind {
            TrackKind::Audio => RTCRtpCodecCapability {
                mime_type: "audio/opus".to_string(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            TrackKind::Video => RTCRtpCodecCapability {
                mime_type: "video/VP8".to_string(),
                clock_rate: 90000,
                ..Default::default()
            },
        };

        let local = Arc::new(TrackLocalStaticSample::new(
            capability,
            track.id.clone(),
            self.stream_id.clone(),
        ));
        self.peer_connection
            .add_track(local as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(engine)?;

        debug!("Added local {} track {}", track.kind, track.id);
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(engine)
    }

    async fn rollback(&self) -> Result<(), TransportError> {
        let rollback: RTCSessionDescription =
            serde_json::from_str(r#"{"type":"rollback","sdp":""}"#)
                .map_err(|e| TransportError::InvalidDescription(e.to_string()))?;
        self.peer_connection
            .set_local_description(rollback)
            .await
            .map_err(engine)
    }

    async fn close(&self) {
        if let Err(e) = self.peer_connection.close().await {
            warn!("Failed to close peer connection: {}", e);
        }
    }
}

fn engine(e: webrtc::Error) -> TransportError {
    TransportError::Engine(e.to_string())
}
