use crate::session::{Session, SessionEvent};
use duet_core::{ErrorCode, ParticipantId, ServerEvent, SignalingMessage};
use tracing::{debug, info, warn};

impl Session {
    pub(super) async fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Joined {
                room,
                self_id,
                members,
            } => {
                info!("Joined room '{}' as {}", room, self_id);
                self.self_id = Some(self_id);
                self.room = Some(room.clone());
                self.peer = members.iter().copied().find(|m| *m != self_id);
                self.emit(SessionEvent::Joined {
                    room,
                    self_id,
                    members,
                });
            }

            ServerEvent::PeerPresent { peer_id } => {
                info!("Peer {} is present", peer_id);
                self.peer = Some(peer_id);
                if self.start_call(peer_id).await.is_ok() {
                    self.emit(SessionEvent::PeerPresent(peer_id));
                }
            }

            ServerEvent::RelayIn { from, message } => self.route_relayed(from, message).await,

            ServerEvent::PeerLeft { peer_id } => {
                info!("Peer {} left", peer_id);
                if self.peer == Some(peer_id) {
                    self.peer = None;
                }
                if let Some(call) = self.call.as_ref().filter(|c| c.peer_id() == peer_id) {
                    let _ = call.peer_left();
                }
                self.emit(SessionEvent::PeerLeft(peer_id));
            }

            ServerEvent::Error { code, message } => {
                warn!("Server error {:?}: {}", code, message);
                if code == ErrorCode::PeerUnreachable {
                    if let Some(call) = self.call.as_ref() {
                        let _ = call.peer_unreachable();
                    }
                }
                self.emit(SessionEvent::ServerError { code, message });
            }
        }
    }

    async fn route_relayed(&mut self, from: ParticipantId, message: SignalingMessage) {
        if let Some(call) = self.call.as_ref().filter(|c| c.peer_id() == from) {
            let _ = call.deliver(from, message);
            return;
        }

        // The callee learns about its coordinator from the first offer.
        if matches!(message, SignalingMessage::CallOffer { .. }) && self.peer == Some(from) {
            if self.start_call(from).await.is_err() {
                return;
            }
            self.emit(SessionEvent::IncomingCall(from));
            if let Some(call) = self.call.as_ref() {
                let _ = call.deliver(from, message);
            }
            return;
        }

        debug!("Dropping {} from {}: no call with them", message.name(), from);
    }
}
