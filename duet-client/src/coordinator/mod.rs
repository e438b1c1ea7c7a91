use crate::error::{MediaError, NegotiationError, RelayError};
use crate::media::{LocalMedia, MediaSource, MediaTrack};
use crate::signaling::SignalingLink;
use crate::transport::{MediaTransport, RemoteStream, TransportEvent};
use duet_core::{IceCandidate, ParticipantId, SignalingMessage};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info, warn};

mod call_impl;
mod handle_signal_impl;
mod renegotiate_impl;
mod teardown_impl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferSent,
    OfferReceived,
    Stable,
}

/// Which offer is in flight; answers must match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferKind {
    Call,
    Renegotiation,
}

/// What an observer can see of a coordinator at any moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiationSnapshot {
    pub state: NegotiationState,
    pub outstanding: Option<OfferKind>,
    pub renegotiation_pending: bool,
    pub peer_gone: bool,
}

impl NegotiationSnapshot {
    /// Stable with no offer in flight and nothing queued.
    pub fn is_settled(&self) -> bool {
        self.state == NegotiationState::Stable
            && self.outstanding.is_none()
            && !self.renegotiation_pending
    }
}

/// Notifications for the coordinator's owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    LocalMedia(LocalMedia),
    RemoteStream(RemoteStream),
    MediaUnavailable(MediaError),
    MessageDropped(NegotiationError),
    PeerUnavailable(ParticipantId),
}

pub(crate) enum CoordinatorCommand {
    InitiateCall {
        reply: oneshot::Sender<Result<(), NegotiationError>>,
    },
    AddTrack {
        track: MediaTrack,
        reply: oneshot::Sender<Result<(), NegotiationError>>,
    },
    Signal {
        from: ParticipantId,
        message: SignalingMessage,
    },
    PeerLeft,
    PeerUnreachable,
    HangUp {
        reply: oneshot::Sender<()>,
    },
}

/// Cheap, cloneable front door to a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    self_id: ParticipantId,
    peer_id: ParticipantId,
    commands: mpsc::UnboundedSender<CoordinatorCommand>,
    snapshot: watch::Receiver<NegotiationSnapshot>,
}

impl CoordinatorHandle {
    pub fn self_id(&self) -> ParticipantId {
        self.self_id
    }

    pub fn peer_id(&self) -> ParticipantId {
        self.peer_id
    }

    pub fn state(&self) -> NegotiationState {
        self.snapshot.borrow().state
    }

    pub fn snapshot(&self) -> NegotiationSnapshot {
        *self.snapshot.borrow()
    }

    /// Acquire media and offer a call to the peer. Resolves once the offer is
    /// sent, not when it is answered.
    pub async fn initiate_call(&self) -> Result<(), NegotiationError> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorCommand::InitiateCall { reply })?;
        rx.await.map_err(|_| NegotiationError::Closed)?
    }

    /// Add a track to the live call. The transport then asks for
    /// renegotiation on its own.
    pub async fn add_track(&self, track: MediaTrack) -> Result<(), NegotiationError> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorCommand::AddTrack { track, reply })?;
        rx.await.map_err(|_| NegotiationError::Closed)?
    }

    pub fn deliver(
        &self,
        from: ParticipantId,
        message: SignalingMessage,
    ) -> Result<(), NegotiationError> {
        self.send(CoordinatorCommand::Signal { from, message })
    }

    pub fn peer_left(&self) -> Result<(), NegotiationError> {
        self.send(CoordinatorCommand::PeerLeft)
    }

    pub fn peer_unreachable(&self) -> Result<(), NegotiationError> {
        self.send(CoordinatorCommand::PeerUnreachable)
    }

    /// Release media, close the transport and stop the coordinator.
    pub async fn hang_up(&self) {
        let (reply, rx) = oneshot::channel();
        if self.send(CoordinatorCommand::HangUp { reply }).is_ok() {
            let _ = rx.await;
        }
    }

    pub async fn wait_for_state(&self, state: NegotiationState) -> Result<(), NegotiationError> {
        self.wait_until(|snapshot| snapshot.state == state).await
    }

    pub async fn wait_until(
        &self,
        mut predicate: impl FnMut(&NegotiationSnapshot) -> bool,
    ) -> Result<(), NegotiationError> {
        let mut snapshot = self.snapshot.clone();
        snapshot
            .wait_for(|s| predicate(s))
            .await
            .map(|_| ())
            .map_err(|_| NegotiationError::Closed)
    }

    fn send(&self, command: CoordinatorCommand) -> Result<(), NegotiationError> {
        self.commands
            .send(command)
            .map_err(|_| NegotiationError::Closed)
    }
}

/// Per-peer negotiation actor.
///
/// Local commands, relayed messages and transport events all arrive over
/// channels into `run`, so handlers never overlap. At most one offer is in
/// flight; `outstanding` is `Some` exactly while the state is `OfferSent`.
pub struct Coordinator {
    self_id: ParticipantId,
    peer_id: ParticipantId,

    state: NegotiationState,
    outstanding: Option<OfferKind>,
    renegotiation_pending: bool,
    remote_description_set: bool,
    pending_candidates: Vec<IceCandidate>,
    local_media: Option<LocalMedia>,
    peer_gone: bool,

    transport: Arc<dyn MediaTransport>,
    media: Arc<dyn MediaSource>,
    signaling: Arc<dyn SignalingLink>,

    command_rx: mpsc::UnboundedReceiver<CoordinatorCommand>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    events_tx: mpsc::UnboundedSender<CoordinatorEvent>,
    snapshot_tx: watch::Sender<NegotiationSnapshot>,
}

impl Coordinator {
    /// Build a coordinator for one peer relationship and start its task.
    pub fn spawn(
        self_id: ParticipantId,
        peer_id: ParticipantId,
        transport: Arc<dyn MediaTransport>,
        media: Arc<dyn MediaSource>,
        signaling: Arc<dyn SignalingLink>,
    ) -> (CoordinatorHandle, mpsc::UnboundedReceiver<CoordinatorEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(NegotiationSnapshot {
            state: NegotiationState::Idle,
            outstanding: None,
            renegotiation_pending: false,
            peer_gone: false,
        });

        transport.subscribe(transport_tx);

        let coordinator = Self {
            self_id,
            peer_id,
            state: NegotiationState::Idle,
            outstanding: None,
            renegotiation_pending: false,
            remote_description_set: false,
            pending_candidates: Vec::new(),
            local_media: None,
            peer_gone: false,
            transport,
            media,
            signaling,
            command_rx,
            transport_rx,
            events_tx,
            snapshot_tx,
        };
        tokio::spawn(coordinator.run());

        let handle = CoordinatorHandle {
            self_id,
            peer_id,
            commands: command_tx,
            snapshot: snapshot_rx,
        };
        (handle, events_rx)
    }

    /// The lower id yields when renegotiation offers cross.
    fn is_polite(&self) -> bool {
        self.self_id < self.peer_id
    }

    async fn run(mut self) {
        info!("Coordinator {} -> {} started", self.self_id, self.peer_id);
        let mut transport_open = true;

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if self.handle_command(c).await.is_break() {
                                break;
                            }
                        }
                        None => {
                            self.teardown().await;
                            break;
                        }
                    }
                }

                evt = self.transport_rx.recv(), if transport_open => {
                    match evt {
                        Some(e) => self.handle_transport_event(e).await,
                        None => transport_open = false,
                    }
                }
            }
        }

        info!("Coordinator {} -> {} finished", self.self_id, self.peer_id);
    }

    async fn handle_command(&mut self, cmd: CoordinatorCommand) -> ControlFlow<()> {
        match cmd {
            CoordinatorCommand::InitiateCall { reply } => {
                let result = self.initiate_call().await;
                let result = self.settle(result).await;
                let _ = reply.send(result);
            }

            CoordinatorCommand::AddTrack { track, reply } => {
                let result = self.add_track(track).await;
                let result = self.settle(result).await;
                let _ = reply.send(result);
            }

            CoordinatorCommand::Signal { from, message } => {
                let result = self.handle_signal(from, message).await;
                if let Err(e) = self.settle(result).await {
                    self.emit(CoordinatorEvent::MessageDropped(e));
                }
            }

            CoordinatorCommand::PeerLeft => {
                info!("Peer {} left", self.peer_id);
                self.end_relationship().await;
            }

            CoordinatorCommand::PeerUnreachable => {
                warn!("Peer {} unreachable", self.peer_id);
                self.end_relationship().await;
            }

            CoordinatorCommand::HangUp { reply } => {
                self.teardown().await;
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.peer_gone {
            return;
        }

        match event {
            TransportEvent::NegotiationNeeded => {
                let result = self.on_negotiation_needed().await;
                let _ = self.settle(result).await;
            }

            TransportEvent::LocalCandidate(candidate) => {
                let result = self
                    .relay(SignalingMessage::Candidate { candidate })
                    .await;
                let _ = self.settle(result).await;
            }

            TransportEvent::RemoteTrack(stream) => {
                info!("Remote stream {} from {}", stream.id, self.peer_id);
                self.emit(CoordinatorEvent::RemoteStream(stream));
            }
        }
    }

    /// Common error path: an unreachable peer ends the relationship, anything
    /// else is logged and handed back.
    async fn settle(
        &mut self,
        result: Result<(), NegotiationError>,
    ) -> Result<(), NegotiationError> {
        let Err(e) = result else {
            return Ok(());
        };

        if let NegotiationError::Relay(RelayError::PeerUnreachable(_)) = e {
            self.end_relationship().await;
        } else {
            warn!("Coordinator {} -> {}: {}", self.self_id, self.peer_id, e);
        }
        Err(e)
    }

    async fn relay(&self, message: SignalingMessage) -> Result<(), NegotiationError> {
        self.signaling.relay(self.peer_id, message).await?;
        Ok(())
    }

    fn set_state(&mut self, state: NegotiationState) {
        self.state = state;
        self.publish();
    }

    fn publish(&self) {
        let snapshot = NegotiationSnapshot {
            state: self.state,
            outstanding: self.outstanding,
            renegotiation_pending: self.renegotiation_pending,
            peer_gone: self.peer_gone,
        };
        self.snapshot_tx.send_replace(snapshot);
    }

    fn emit(&self, event: CoordinatorEvent) {
        let _ = self.events_tx.send(event);
    }
}
