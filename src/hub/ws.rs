//! WebSocket feed handlers
//!
//! Each connection gets its own bridge task between the publisher's
//! broadcast channels and the socket. A failed or closed socket ends only
//! that task; the broadcast to everyone else is unaffected.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::metrics;
use crate::publish::DataPayload;

use super::server::AppState;

/// Leader feed: bare device id as a text frame on every tick
pub async fn buzz_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| buzz_socket(socket, state))
}

async fn buzz_socket(mut socket: WebSocket, state: AppState) {
    let client = Uuid::new_v4();
    let mut feed = state.publisher.subscribe_leader();
    metrics::set_feed_subscribers("buzz", state.publisher.leader_subscribers());
    tracing::info!(%client, "client connected to /ws/buzz");

    loop {
        tokio::select! {
            update = feed.recv() => match update {
                Ok(leader) => {
                    if socket.send(Message::Text(leader.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::debug!(%client, missed, "buzz feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => {
                // Collars occasionally chat on this channel; drop the frames
                if !matches!(incoming, Some(Ok(_))) {
                    break;
                }
            }
        }
    }

    drop(feed);
    metrics::set_feed_subscribers("buzz", state.publisher.leader_subscribers());
    tracing::info!(%client, "client disconnected from /ws/buzz");
}

/// Data feed: grouped raw records at connect, then on ticks and appends
pub async fn data_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| data_socket(socket, state))
}

async fn data_socket(mut socket: WebSocket, state: AppState) {
    let client = Uuid::new_v4();
    let mut feed = state.publisher.subscribe_data();
    metrics::set_feed_subscribers("data", state.publisher.data_subscribers());
    tracing::info!(%client, "client connected to /ws/data");

    // New subscribers get the current view immediately
    let snapshot = state.publisher.data_snapshot().await;
    if send_data(&mut socket, &snapshot).await.is_err() {
        tracing::debug!(%client, "client gone before first payload");
    } else {
        loop {
            tokio::select! {
                update = feed.recv() => match update {
                    Ok(payload) => {
                        if send_data(&mut socket, &payload).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::debug!(%client, missed, "data feed lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                incoming = socket.recv() => {
                    if !matches!(incoming, Some(Ok(_))) {
                        break;
                    }
                }
            }
        }
    }

    drop(feed);
    metrics::set_feed_subscribers("data", state.publisher.data_subscribers());
    tracing::info!(%client, "client disconnected from /ws/data");
}

/// Chart feed: the full duration breakdown, pushed once at connect
pub async fn chart_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| chart_socket(socket, state))
}

async fn chart_socket(mut socket: WebSocket, state: AppState) {
    let client = Uuid::new_v4();
    metrics::record_broadcast("chart");
    tracing::info!(%client, "client connected to /ws/chart");

    let payload = state.publisher.chart_snapshot().await;
    let sent = match serde_json::to_string(&payload) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(err) => {
            tracing::error!(%client, error = %err, "chart payload serialization failed");
            false
        }
    };

    // Keep the socket open for the client to close; the view is a one-shot
    if sent {
        while let Some(Ok(_)) = socket.recv().await {}
    }

    tracing::info!(%client, "client disconnected from /ws/chart");
}

async fn send_data(socket: &mut WebSocket, payload: &DataPayload) -> Result<(), axum::Error> {
    let json = serde_json::to_string(payload).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}
