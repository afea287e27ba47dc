//! Live bundle updates over WebSocket

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

use super::ServerState;
use crate::bundler::BundleResult;

/// Live message types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LiveMessage {
    /// Connection established
    Connected {
        revision: u64,
    },

    /// The graph changed and was re-bundled
    BundleUpdated {
        revision: u64,
        result: BundleResult,
    },

    /// The graph file could not be reloaded
    Error {
        message: String,
    },
}

/// Handle WebSocket upgrade for live updates
pub async fn live_websocket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_live_socket(socket, state))
}

/// Handle a live update connection
async fn handle_live_socket(socket: WebSocket, state: Arc<ServerState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading the revision so no change is missed
    let mut live_rx = state.subscribe();

    let connected = LiveMessage::Connected {
        revision: state.revision(),
    };
    if let Ok(json) = serde_json::to_string(&connected) {
        let _ = sender.send(Message::Text(json)).await;
    }

    debug!("Live client connected");

    let send_task = tokio::spawn(async move {
        while let Ok(message) = live_rx.recv().await {
            if let Ok(json) = serde_json::to_string(&message) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if let Message::Close(_) = message {
                debug!("Live client disconnected");
                break;
            }
        }
    });

    join_first(send_task, recv_task).await;

    debug!("Live connection closed");
}

/// Wait for either task to finish, then abort the other
async fn join_first(mut a: JoinHandle<()>, mut b: JoinHandle<()>) {
    tokio::select! {
        _ = &mut a => b.abort(),
        _ = &mut b => a.abort(),
    }
}
