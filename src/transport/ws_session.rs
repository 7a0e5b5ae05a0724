use crate::game::room::Room;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

pub async fn handle_socket(socket: WebSocket, room: Arc<Room>) {
    let (mut sender, mut receiver) = socket.split();
    let session = room.add_session().await;
    let session_id = session.session_id;
    let outbound_state = session.outbound_state;
    let mut outbound_rx = session.outbound_rx;

    // Control frames go out in order ahead of the newest state frame.
    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                payload = outbound_rx.recv() => {
                    let Some(payload) = payload else { return };
                    if sender.send(Message::Text(payload)).await.is_err() {
                        return;
                    }
                }
                _ = outbound_state.wait_for_update() => {}
            }

            while let Ok(payload) = outbound_rx.try_recv() {
                if sender.send(Message::Text(payload)).await.is_err() {
                    return;
                }
            }

            if let Some(payload) = outbound_state.take_latest() {
                if sender.send(Message::Text(payload)).await.is_err() {
                    return;
                }
            }
        }
    });

    while let Some(result) = receiver.next().await {
        let Ok(message) = result else { break };
        match message {
            Message::Text(text) => room.handle_text_message(&session_id, &text).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    room.remove_session(&session_id).await;
    send_task.abort();
}
