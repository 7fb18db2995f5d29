use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::interval;

use events::EventEnvelope;

use crate::messages::{ClientMessage, ControlMessage};
use crate::session::{Session, SessionDeps, SessionError};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct WsState {
    pub deps: SessionDeps,
}

impl WsState {
    pub fn new(deps: SessionDeps) -> Self {
        Self { deps }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<WsState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut session = Session::new(state.deps.clone());
    let mut run_rx: Option<mpsc::UnboundedReceiver<EventEnvelope>> = None;

    let mut heartbeat = interval(HEARTBEAT_INTERVAL);
    heartbeat.reset();

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }

            maybe_envelope = next_event(&mut run_rx) => {
                match maybe_envelope {
                    Some(envelope) => {
                        let terminal = envelope.event.is_terminal();
                        let json = match serde_json::to_string(&envelope) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!(error = %e, "failed to serialize event");
                                continue;
                            }
                        };
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                        if terminal {
                            run_rx = None;
                        }
                    }
                    // Stream closed without a terminal frame: the run
                    // was cancelled. Stop polling it.
                    None => {
                        run_rx = None;
                    }
                }
            }

            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Start { api_key, company_name, depth, focus_areas }) => {
                                match session.start(&api_key, company_name, depth, focus_areas) {
                                    Ok(events) => {
                                        run_rx = Some(events);
                                    }
                                    Err(err) => {
                                        let frame = serde_json::to_string(&err.to_control())
                                            .unwrap_or_default();
                                        if sender.send(Message::Text(frame.into())).await.is_err() {
                                            break;
                                        }
                                        // Credential rejection closes the
                                        // session; busy leaves the running
                                        // stream untouched.
                                        if err == SessionError::InvalidCredential {
                                            break;
                                        }
                                    }
                                }
                            }
                            Ok(ClientMessage::Cancel) => {
                                session.cancel();
                            }
                            Err(e) => {
                                let frame = serde_json::to_string(
                                    &ControlMessage::error(format!("invalid message: {e}")),
                                )
                                .unwrap_or_default();
                                if sender.send(Message::Text(frame.into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => {
                        break;
                    }
                }
            }
        }
    }

    // Connection gone, for whatever reason: implicit cancellation.
    session.cancel();
    tracing::debug!("websocket session closed");
}

/// Poll the run's event stream when one exists; park forever otherwise
/// so the select loop is driven by the other arms.
async fn next_event(
    run_rx: &mut Option<mpsc::UnboundedReceiver<EventEnvelope>>,
) -> Option<EventEnvelope> {
    match run_rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
