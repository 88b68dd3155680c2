use crate::game::registry::RoomRegistry;
use crate::game::room::Room;
use crate::protocol::{decode_client_message, ClientMessage, ServerMessage};
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Drives one client connection for `room_id`. The player is seated on its
/// `join` frame and removed from the room when the socket goes away.
pub async fn handle_socket(socket: WebSocket, registry: Arc<RoomRegistry>, room_id: String) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let player_id = Uuid::new_v4().to_string();

    let send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    let mut room: Option<Arc<Room>> = None;
    while let Some(result) = receiver.next().await {
        let Ok(message) = result else { break };
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let Some(message) = decode_client_message(&text) else { continue };

        match message {
            ClientMessage::Join => {
                if room.is_some() {
                    continue;
                }
                match registry.join(&room_id, &player_id, tx.clone()).await {
                    Ok(joined) => room = Some(joined),
                    Err(error) => {
                        tracing::warn!(%player_id, %room_id, %error, "join rejected");
                        if let Some(payload) = (ServerMessage::ErrorMessage {
                            text: error.to_string(),
                        })
                        .encode()
                        {
                            let _ = tx.send(payload);
                        }
                    }
                }
            }
            ClientMessage::Ready { ready } => {
                if let Some(room) = &room {
                    room.set_ready(&player_id, ready).await;
                }
            }
            ClientMessage::Input { direction } => {
                if let Some(room) = &room {
                    room.submit_input(&player_id, direction).await;
                }
            }
            ClientMessage::Chat { content } => {
                if let Some(room) = &room {
                    room.send_chat(&player_id, content).await;
                }
            }
        }
    }

    if room.is_some() {
        registry.leave(&room_id, &player_id).await;
    }
    send_task.abort();
}
