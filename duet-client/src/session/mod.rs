use crate::coordinator::{Coordinator, CoordinatorEvent, CoordinatorHandle};
use crate::error::{NegotiationError, SessionError, TransportError};
use crate::media::{MediaSource, MediaTrack};
use crate::signaling::WsSignalingLink;
use crate::transport::MediaTransport;
use async_trait::async_trait;
use duet_core::{ClientRequest, ErrorCode, ParticipantId, RoomId, ServerEvent};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

mod server_event_impl;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Signaling endpoint, e.g. `ws://127.0.0.1:3000/ws`.
    pub url: String,
    pub room: RoomId,
}

impl SessionConfig {
    pub fn new(url: impl Into<String>, room: impl Into<RoomId>) -> Self {
        Self {
            url: url.into(),
            room: room.into(),
        }
    }
}

/// Builds the per-call pieces a coordinator needs.
#[async_trait]
pub trait PeerFactory: Send + Sync + 'static {
    async fn transport(&self) -> Result<Arc<dyn MediaTransport>, TransportError>;

    fn media(&self) -> Arc<dyn MediaSource>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Joined {
        room: RoomId,
        self_id: ParticipantId,
        members: Vec<ParticipantId>,
    },
    PeerPresent(ParticipantId),
    IncomingCall(ParticipantId),
    PeerLeft(ParticipantId),
    Negotiation(CoordinatorEvent),
    TransportUnavailable(TransportError),
    ServerError {
        code: ErrorCode,
        message: String,
    },
    Closed,
}

enum SessionCommand {
    Join(RoomId),
    Leave,
    EnsureCall {
        reply: oneshot::Sender<Result<CoordinatorHandle, SessionError>>,
    },
    CurrentCall {
        reply: oneshot::Sender<Option<CoordinatorHandle>>,
    },
    Close,
}

#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    pub fn join(&self, room: impl Into<RoomId>) -> Result<(), SessionError> {
        self.send(SessionCommand::Join(room.into()))
    }

    /// Leave the room, ending any call, but keep the socket open.
    pub fn leave(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Leave)
    }

    /// Offer a call to the peer currently in the room.
    pub async fn call(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::EnsureCall { reply })?;
        let call = rx.await.map_err(|_| SessionError::Closed)??;
        call.initiate_call().await?;
        Ok(())
    }

    pub async fn add_track(&self, track: MediaTrack) -> Result<(), SessionError> {
        let call = self.current_call().await.ok_or(SessionError::NoPeer)?;
        call.add_track(track).await?;
        Ok(())
    }

    pub async fn current_call(&self) -> Option<CoordinatorHandle> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::CurrentCall { reply }).ok()?;
        rx.await.ok().flatten()
    }

    pub fn close(&self) {
        let _ = self.commands.send(SessionCommand::Close);
    }

    fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::Closed)
    }
}

/// One participant's signaling connection and its current call.
pub struct Session {
    factory: Arc<dyn PeerFactory>,
    self_id: Option<ParticipantId>,
    room: Option<RoomId>,
    peer: Option<ParticipantId>,
    call: Option<CoordinatorHandle>,
    requests_tx: mpsc::UnboundedSender<ClientRequest>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl Session {
    /// Connect to the signaling server and join the configured room.
    pub async fn connect(
        config: SessionConfig,
        factory: Arc<dyn PeerFactory>,
    ) -> Result<(SessionHandle, mpsc::UnboundedReceiver<SessionEvent>), SessionError> {
        let (ws, _) = connect_async(config.url.as_str()).await?;
        info!("Connected to signaling server at {}", config.url);

        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let session = Self {
            factory,
            self_id: None,
            room: None,
            peer: None,
            call: None,
            requests_tx,
            events_tx,
        };
        session.request(ClientRequest::Join { room: config.room });

        let (sink, stream) = ws.split();
        tokio::spawn(session.run(sink, stream, requests_rx, commands_rx));

        Ok((
            SessionHandle {
                commands: commands_tx,
            },
            events_rx,
        ))
    }

    async fn run(
        mut self,
        mut sink: SplitSink<WsStream, Message>,
        mut stream: SplitStream<WsStream>,
        mut requests_rx: mpsc::UnboundedReceiver<ClientRequest>,
        mut commands_rx: mpsc::UnboundedReceiver<SessionCommand>,
    ) {
        loop {
            tokio::select! {
                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ServerEvent>(text.as_str()) {
                                Ok(event) => self.handle_server_event(event).await,
                                Err(e) => warn!("Unparsable server event: {}", e),
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Signaling server closed the connection");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!("Signaling socket error: {}", e);
                            break;
                        }
                    }
                }

                request = requests_rx.recv() => {
                    let Some(request) = request else { break };
                    let json = match serde_json::to_string(&request) {
                        Ok(json) => json,
                        Err(e) => {
                            error!("Failed to serialize request: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(json.into())).await {
                        warn!("Failed to send request: {}", e);
                        break;
                    }
                }

                cmd = commands_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Close) | None => break,
                        Some(c) => self.handle_command(c).await,
                    }
                }
            }
        }

        self.end_call().await;
        let _ = sink.close().await;
        self.emit(SessionEvent::Closed);
        info!("Session closed");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Join(room) => self.request(ClientRequest::Join { room }),

            SessionCommand::Leave => {
                self.end_call().await;
                self.room = None;
                self.peer = None;
                self.request(ClientRequest::Leave);
            }

            SessionCommand::EnsureCall { reply } => {
                let result = self.ensure_call().await;
                let _ = reply.send(result);
            }

            SessionCommand::CurrentCall { reply } => {
                let _ = reply.send(self.call.clone());
            }

            // Handled by the run loop.
            SessionCommand::Close => {}
        }
    }

    /// The coordinator for the current peer, created on first use.
    async fn ensure_call(&mut self) -> Result<CoordinatorHandle, SessionError> {
        if self.room.is_none() {
            return Err(SessionError::NotJoined);
        }
        let peer = self.peer.ok_or(SessionError::NoPeer)?;

        if let Some(call) = self.call.as_ref().filter(|c| c.peer_id() == peer) {
            return Ok(call.clone());
        }

        self.start_call(peer)
            .await
            .map_err(|e| NegotiationError::from(e).into())
    }

    /// Replace the current coordinator with a fresh one for `peer`.
    async fn start_call(&mut self, peer: ParticipantId) -> Result<CoordinatorHandle, TransportError> {
        let Some(self_id) = self.self_id else {
            return Err(TransportError::Closed);
        };

        self.end_call().await;

        let transport = match self.factory.transport().await {
            Ok(transport) => transport,
            Err(e) => {
                warn!("Could not create transport for {}: {}", peer, e);
                self.emit(SessionEvent::TransportUnavailable(e.clone()));
                return Err(e);
            }
        };
        let link = Arc::new(WsSignalingLink::new(self.requests_tx.clone()));

        let (call, mut events) =
            Coordinator::spawn(self_id, peer, transport, self.factory.media(), link);

        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if events_tx.send(SessionEvent::Negotiation(event)).is_err() {
                    break;
                }
            }
        });

        debug!("Coordinator for {} ready", peer);
        self.call = Some(call.clone());
        Ok(call)
    }

    async fn end_call(&mut self) {
        if let Some(call) = self.call.take() {
            call.hang_up().await;
        }
    }

    fn request(&self, request: ClientRequest) {
        let _ = self.requests_tx.send(request);
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }
}
