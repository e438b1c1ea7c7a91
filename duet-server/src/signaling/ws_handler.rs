use crate::app::AppState;
use crate::signaling::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use bytes::Bytes;
use duet_core::{ClientRequest, ServerEvent};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, error, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let ping_interval = state.config.ping_interval;
    let idle_timeout = state.config.idle_timeout;

    ws.on_upgrade(move |socket| handle_socket(socket, state.service, ping_interval, idle_timeout))
}

async fn handle_socket(
    socket: WebSocket,
    service: SignalingService,
    ping_interval: Duration,
    idle_timeout: Duration,
) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let participant_id = match service.connect(tx) {
        Ok(id) => id,
        Err(e) => {
            error!("Rejecting WebSocket connection: {}", e);
            return;
        }
    };

    let mut send_task = tokio::spawn(async move {
        let mut ping = time::interval_at(time::Instant::now() + ping_interval, ping_interval);
        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            error!("Failed to serialize server event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            loop {
                let msg = match time::timeout(idle_timeout, receiver.next()).await {
                    Ok(Some(Ok(msg))) => msg,
                    Ok(Some(Err(e))) => {
                        warn!("WebSocket error for {}: {}", participant_id, e);
                        break;
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!(
                            "Participant {} idle for {:?}, dropping connection",
                            participant_id, idle_timeout
                        );
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientRequest>(&text) {
                        Ok(request) => {
                            debug!("Request from {}: {:?}", participant_id, request);
                            service.handle_request(participant_id, request);
                        }
                        Err(e) => {
                            warn!("Invalid request from {}: {}", participant_id, e);
                            service.reject_malformed(&participant_id, e.to_string());
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.disconnect(&participant_id);
    info!("WebSocket closed for {}", participant_id);
}
