// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Live change notifications for connected clients.
//!
//! Events are hints, never authoritative. A client that receives one
//! re-fetches the affected resource over HTTP. Nothing is accepted from
//! the client over the socket.

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::AppState;

/// Events buffered per subscriber before the slowest one starts lagging.
const EVENT_BUFFER_SIZE: usize = 100;

/// A change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// Sent once when a client connects.
    Connected {
        /// Server time, RFC 3339.
        timestamp: String,
    },
    /// A vote was created.
    VoteCreated { organization_id: i64, vote_id: i64 },
    /// A vote's fields or candidates changed.
    VoteUpdated { organization_id: i64, vote_id: i64 },
    /// A vote was deleted.
    VoteDeleted { organization_id: i64, vote_id: i64 },
    /// A ballot was accepted.
    BallotCast {
        organization_id: i64,
        vote_id: i64,
        /// Ballots recorded for the vote after this one.
        total_votes: u32,
    },
    /// The department tree of an organization changed.
    DepartmentsChanged { organization_id: i64 },
    /// Members or department assignments of an organization changed.
    MembershipChanged { organization_id: i64 },
}

/// Fans events out to every connected socket.
#[derive(Debug, Clone)]
pub struct LiveEventBroadcaster {
    tx: broadcast::Sender<LiveEvent>,
}

impl LiveEventBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Broadcasts an event. Dropped silently when nobody listens.
    pub fn broadcast(&self, event: LiveEvent) {
        match self.tx.send(event) {
            Ok(receivers) => debug!(receivers, "Broadcast live event"),
            Err(broadcast::error::SendError(event)) => {
                debug!(?event, "No receivers for live event");
            }
        }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.tx.subscribe()
    }
}

impl Default for LiveEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler for GET `/live`.
pub async fn live_events_handler(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<AppState>,
) -> Response {
    let broadcaster: LiveEventBroadcaster = app_state.live.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

fn connected_event() -> LiveEvent {
    LiveEvent::Connected {
        timestamp: orgvote_domain::format_timestamp(time::OffsetDateTime::now_utc())
            .unwrap_or_else(|_| String::from("unknown")),
    }
}

async fn handle_socket(socket: WebSocket, broadcaster: LiveEventBroadcaster) {
    info!("Client connected to live event stream");

    let (mut sender, mut receiver) = socket.split();
    let mut rx: broadcast::Receiver<LiveEvent> = broadcaster.subscribe();

    if let Ok(json) = serde_json::to_string(&connected_event())
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!("Failed to send connection confirmation");
        return;
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            let event: LiveEvent = match rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live event subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!(?e, "Failed to serialize live event"),
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(_) | Message::Binary(_)) => {
                    warn!("Ignoring message sent over live event stream");
                }
                Ok(Message::Close(_)) => break,
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Err(e) => {
                    error!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("Client disconnected from live event stream");
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_broadcast_without_receivers_is_dropped() {
        let broadcaster = LiveEventBroadcaster::new();
        broadcaster.broadcast(LiveEvent::DepartmentsChanged { organization_id: 1 });
        assert_eq!(broadcaster.tx.receiver_count(), 0);
    }

    #[test]
    fn test_every_subscriber_receives_event() {
        let broadcaster = LiveEventBroadcaster::new();
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();

        broadcaster.broadcast(LiveEvent::BallotCast {
            organization_id: 1,
            vote_id: 4,
            total_votes: 2,
        });

        for rx in [&mut first, &mut second] {
            assert_eq!(
                rx.try_recv().unwrap(),
                LiveEvent::BallotCast {
                    organization_id: 1,
                    vote_id: 4,
                    total_votes: 2,
                }
            );
        }
    }

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(LiveEvent::VoteDeleted {
            organization_id: 3,
            vote_id: 9,
        })
        .unwrap();

        assert_eq!(
            json,
            serde_json::json!({"type": "vote_deleted", "organization_id": 3, "vote_id": 9})
        );
    }

    #[test]
    fn test_connected_event_carries_timestamp() {
        let LiveEvent::Connected { timestamp } = connected_event() else {
            panic!("expected a connected event");
        };
        assert!(timestamp.ends_with('Z'));
    }
}
