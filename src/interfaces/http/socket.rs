//! Websocket bridge to the subscription registry.
//!
//! A connection starts in the `global` room. Clients move between rooms with
//! `{"action":"join","room":"table:3"}` and `{"action":"leave","room":"admin"}`;
//! every event then arrives as an [`EventEnvelope`] text frame.

use super::AppState;
use crate::domain::event::{EventEnvelope, Topic};
use crate::infrastructure::broadcast::{Subscriber, SubscriptionRegistry};
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomAction {
    Join,
    Leave,
}

#[derive(Debug, Deserialize)]
pub struct RoomCommand {
    pub action: RoomAction,
    pub room: String,
}

enum Step {
    Deliver(Option<EventEnvelope>),
    Frame(Option<Result<Message, axum::Error>>),
}

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve(socket, state.registry))
}

async fn serve(socket: WebSocket, registry: std::sync::Arc<SubscriptionRegistry>) {
    let mut subscriber = registry.connect();
    registry.join(&subscriber, Topic::Global);
    tracing::info!(subscriber = subscriber.id, "websocket connected");

    let (mut sink, mut stream) = socket.split();
    loop {
        let step = tokio::select! {
            event = subscriber.inbox.recv() => Step::Deliver(event),
            frame = stream.next() => Step::Frame(frame),
        };
        let reply = match step {
            Step::Deliver(Some(envelope)) => match serde_json::to_string(&envelope) {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping unserializable event");
                    None
                }
            },
            Step::Frame(Some(Ok(Message::Text(text)))) => {
                Some(apply_command(&registry, &subscriber, text.as_str()))
            }
            Step::Frame(Some(Ok(Message::Close(_)))) | Step::Frame(None) => break,
            Step::Frame(Some(Ok(_))) => None,
            Step::Frame(Some(Err(e))) => {
                tracing::debug!(subscriber = subscriber.id, error = %e, "websocket read failed");
                break;
            }
            Step::Deliver(None) => break,
        };
        if let Some(text) = reply
            && sink.send(Message::Text(text.into())).await.is_err()
        {
            break;
        }
    }

    registry.disconnect(subscriber.id);
    tracing::info!(subscriber = subscriber.id, "websocket disconnected");
}

/// Applies one room command and returns the acknowledgement frame.
fn apply_command(registry: &SubscriptionRegistry, subscriber: &Subscriber, raw: &str) -> String {
    let parsed = serde_json::from_str::<RoomCommand>(raw)
        .map_err(|e| e.to_string())
        .and_then(|cmd| {
            cmd.room
                .parse::<Topic>()
                .map(|room| (cmd.action, room))
                .map_err(|e| e.to_string())
        });
    match parsed {
        Ok((RoomAction::Join, room)) => {
            registry.join(subscriber, room);
            json!({ "action": RoomAction::Join, "room": room }).to_string()
        }
        Ok((RoomAction::Leave, room)) => {
            registry.leave(subscriber.id, room);
            json!({ "action": RoomAction::Leave, "room": room }).to_string()
        }
        Err(message) => json!({ "error": "invalid_input", "message": message }).to_string(),
    }
}
