//! Hot reload notifications

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
use tracing::debug;

use crate::compiler::Rebuild;

use super::AssetState;

/// WebSocket path on the asset server
pub const HMR_PATH: &str = "/__dace_hmr";

/// HMR message types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HmrMessage {
    /// Connection established
    Connected,

    /// A compilation finished; the page should reload to pick it up
    Rebuilt { hash: String },

    /// Only stylesheets changed
    CssUpdate { hash: String },

    /// Compilation failed
    Error { message: String },
}

impl HmrMessage {
    /// Message announcing the outcome of a watch-mode rebuild
    pub fn for_rebuild(rebuild: &Rebuild) -> Self {
        match &rebuild.result {
            Ok(stats) if stats.has_errors() => HmrMessage::Error {
                message: stats.errors.join("\n"),
            },
            Ok(stats) if rebuild.css_only() => HmrMessage::CssUpdate {
                hash: stats.hash.clone(),
            },
            Ok(stats) => HmrMessage::Rebuilt {
                hash: stats.hash.clone(),
            },
            Err(e) => HmrMessage::Error {
                message: format!("{:#}", e),
            },
        }
    }
}

/// Handle WebSocket upgrade for HMR
pub async fn hmr_websocket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AssetState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_hmr_socket(socket, state))
}

/// Handle HMR WebSocket connection
async fn handle_hmr_socket(socket: WebSocket, state: Arc<AssetState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before greeting so no rebuild slips between the two
    let mut hmr_rx = state.hmr_tx.subscribe();

    if let Ok(json) = serde_json::to_string(&HmrMessage::Connected) {
        let _ = sender.send(Message::Text(json)).await;
    }

    debug!("HMR client connected");

    let mut send_task = tokio::spawn(async move {
        while let Ok(message) = hmr_rx.recv().await {
            if let Ok(json) = serde_json::to_string(&message) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if let Message::Close(_) = message {
                debug!("HMR client disconnected");
                break;
            }
        }
    });

    // Whichever side finishes first ends the connection
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    debug!("HMR connection closed");
}

/// Client script connecting a rendered page to the asset server's socket
pub fn client_script(ws_url: &str) -> String {
    format!(
        r#"<script>
(function() {{
  var ws = new WebSocket({url});
  ws.onmessage = function(event) {{
    var message = JSON.parse(event.data);
    switch (message.type) {{
      case 'rebuilt':
        console.log('[dace] rebuilt', message.hash);
        location.reload();
        break;
      case 'css-update':
        console.log('[dace] css update', message.hash);
        location.reload();
        break;
      case 'error':
        console.error('[dace] compilation failed\n' + message.message);
        break;
      case 'connected':
        console.log('[dace] HMR connected');
        break;
    }}
  }};
  ws.onclose = function() {{
    console.log('[dace] HMR disconnected, attempting to reconnect...');
    setTimeout(function() {{ location.reload(); }}, 1000);
  }};
}})();
</script>"#,
        url = serde_json::Value::String(ws_url.to_string())
    )
}
