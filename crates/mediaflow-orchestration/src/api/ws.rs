//! `/ws/tasks` observer endpoint: sends an initial snapshot, then
//! streams `update`/`delete` frames, while accepting inbound
//! `{action: "cancel", task_id}` commands from the same connection.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::StreamExt;
use tracing::{info, warn};

use mediaflow_shared::messages::ObserverCommand;

use crate::api::state::AppState;
use crate::notifier::ConnectionId;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sink, mut stream) = socket.split();
    let connection_id = ConnectionId::new();
    state.notifier.connect(connection_id, sink);

    let snapshot = state.task_manager.snapshot();
    if state
        .notifier
        .send_snapshot(connection_id, snapshot)
        .await
        .is_err()
    {
        state.notifier.disconnect(connection_id);
        return;
    }

    while let Some(frame) = stream.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(err) => {
                warn!(connection_id = %connection_id, error = %err, "observer socket error");
                break;
            }
        };

        match message {
            Message::Text(text) => {
                if let Err(err) = handle_command(&state, &text).await {
                    warn!(connection_id = %connection_id, error = %err, "malformed observer command");
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.notifier.disconnect(connection_id);
    info!(connection_id = %connection_id, "observer connection closed");
}

async fn handle_command(state: &AppState, text: &str) -> Result<(), serde_json::Error> {
    let command: ObserverCommand = serde_json::from_str(text)?;
    match command {
        ObserverCommand::Cancel { task_id } => {
            let _ = state.task_manager.cancel(&task_id).await;
        }
    }
    Ok(())
}
