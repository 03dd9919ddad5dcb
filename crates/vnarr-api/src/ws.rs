//! Progress stream over WebSocket.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, info, warn};

use vnarr_cache::ProgressChannel;
use vnarr_models::ProgressEvent;

use crate::metrics;
use crate::state::AppState;

/// `GET /ws/progress/{key}`: forward the run's progress events until `END`.
///
/// Events published before the socket subscribes are not replayed.
pub async fn ws_progress(
    ws: WebSocketUpgrade,
    Path(video_key): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    metrics::record_ws_connection();
    ws.on_upgrade(move |socket| handle_progress_socket(socket, state, video_key))
}

async fn handle_progress_socket(mut socket: WebSocket, state: AppState, video_key: String) {
    let channel = ProgressChannel::channel_name(&video_key);

    let events = match state.services.progress.subscribe(&channel).await {
        Ok(events) => events,
        Err(e) => {
            warn!(channel = %channel, error = %e, "Failed to subscribe to progress");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    info!(channel = %channel, "Progress subscriber connected");

    match forward_progress(events, &mut socket).await {
        Ok(sent) => {
            metrics::record_ws_messages_sent(sent);
            debug!(channel = %channel, sent, "Progress stream finished");
            let _ = socket.send(Message::Close(None)).await;
        }
        Err(e) => debug!(channel = %channel, error = %e, "Progress subscriber went away"),
    }
}

/// Send each event as JSON text, stopping after the `END` sentinel.
///
/// Returns the number of messages sent.
pub async fn forward_progress<S, K>(mut events: S, sink: &mut K) -> Result<usize, K::Error>
where
    S: Stream<Item = ProgressEvent> + Unpin,
    K: Sink<Message> + Unpin,
{
    let mut sent = 0;

    while let Some(event) = events.next().await {
        let done = event.is_end();
        match serde_json::to_string(&event) {
            Ok(json) => {
                sink.send(Message::Text(json)).await?;
                sent += 1;
            }
            Err(e) => warn!(error = %e, "Failed to serialize progress event"),
        }
        if done {
            break;
        }
    }

    Ok(sent)
}
