use axum::{
    debug_handler,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

use super::{ClientEvent, Relay};

#[debug_handler(state = crate::AppState)]
pub async fn relay_ws(State(relay): State<Relay>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |stream| serve_socket(relay, stream))
}

async fn serve_socket(relay: Relay, stream: WebSocket) {
    let (mut conn, mut rx) = relay.connect();
    let (mut sender, mut receiver) = stream.split();

    let mut forward_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    warn!("failed to encode {event:?}: {err}");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        let frame = tokio::select! {
            frame = receiver.next() => frame,
            _ = &mut forward_task => break,
        };

        let event = match frame {
            Some(Ok(WsMessage::Text(text))) => serde_json::from_str::<ClientEvent>(text.as_str()),
            Some(Ok(WsMessage::Binary(data))) => serde_json::from_slice::<ClientEvent>(&data),
            Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
            Some(Ok(_)) => continue,
        };

        match event {
            Ok(event) => conn.handle(event),
            Err(err) => debug!(conn = %conn.id(), "ignoring frame: {err}"),
        }
    }

    conn.disconnect();
    forward_task.abort();
}
