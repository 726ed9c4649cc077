//! Connection handlers for the Garland server.
//!
//! This module binds WebSocket connections to channels: handshake, welcome
//! snapshot, join, frame pumping, and leave on disconnect.

use crate::config::Config;
use crate::metrics::{self, ConnectionMetricsGuard};
use crate::nickname;
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use garland_core::{
    generate_object_id, Channel, ChannelController, Decoration, DeliveryError, Event, User,
    UserConnection,
};
use garland_protocol::{codec, ClientFrame, ServerFrame};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Deadline for the client's `hello` after the socket opens.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared server state.
pub struct AppState {
    /// The channel registry.
    pub controller: ChannelController,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            controller: ChannelController::new(config.channel.policy()),
            config,
        }
    }
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone()));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    // Build router
    let app = Router::new()
        .route("/channel/:name", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    // Bind and serve
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr).await?;

    info!("Garland server listening on {}", addr);
    info!("Channel endpoint: ws://{}/channel/{{name}}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let max_message_size = state.config.limits.max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_channel_socket(socket, name, state))
}

/// Connection capability backed by the socket's outbound queue.
///
/// The channel's fan-out pushes events here; the socket loop drains the
/// queue into the write half. A dropped receiver surfaces as a closed
/// connection.
struct WsConnection {
    tx: mpsc::UnboundedSender<Event>,
}

#[async_trait::async_trait]
impl UserConnection for WsConnection {
    async fn send(&self, event: Event) -> Result<(), DeliveryError> {
        self.tx.send(event).map_err(|_| DeliveryError::Closed)
    }
}

/// Atomic counter for ensuring unique IDs even within the same nanosecond.
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Mint an opaque identifier such as `user_1a2b3c`.
fn mint_id(prefix: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64;
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{:x}", timestamp.wrapping_add(counter))
}

/// Handle one channel WebSocket from handshake to disconnect.
async fn handle_channel_socket(socket: WebSocket, channel_id: String, state: Arc<AppState>) {
    // Record connection metrics
    let _metrics_guard = ConnectionMetricsGuard::new();

    let (mut sender, mut receiver) = socket.split();

    let Some(nickname) = await_hello(&mut receiver).await else {
        debug!(channel = %channel_id, "Connection ended before handshake");
        return;
    };
    let nickname = nickname.unwrap_or_else(nickname::generate);

    let (tx, mut events) = mpsc::unbounded_channel::<Event>();
    let user = User::new(
        mint_id("user"),
        nickname,
        mint_id("sess"),
        Arc::new(WsConnection { tx }),
    );

    debug!(channel = %channel_id, user = %user.id(), nickname = %user.nickname(), "Connected");

    let channel = state.controller.create_channel(&channel_id);

    // The snapshot precedes the join broadcast, so the client sees every
    // event from its own join onward exactly once.
    let welcome = ServerFrame::welcome(
        user.info.clone(),
        channel.objects().await,
        channel.members().await,
    );
    if send_frame(&mut sender, &welcome).await.is_err() {
        return;
    }

    channel.join(user.clone()).await;
    metrics::set_active_channels(state.controller.channel_count());

    // Frame pumping loop
    loop {
        tokio::select! {
            biased;

            // Events queued by the channel's fan-out
            Some(event) = events.recv() => {
                metrics::record_event(event.kind());
                if send_frame(&mut sender, &event).await.is_err() {
                    break;
                }
            }

            // Receive from WebSocket
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_frame(&text, &channel, &user).await;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!(user = %user.id(), "Ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if sender.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        // Ignore pongs
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!(user = %user.id(), "Received close frame");
                        break;
                    }
                    Some(Err(error)) => {
                        warn!(user = %user.id(), %error, "WebSocket error");
                        metrics::record_error("websocket");
                        break;
                    }
                    None => {
                        debug!(user = %user.id(), "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    // Disconnect: leave the channel; the registry destroys it when the last
    // member departs.
    state.controller.leave(&channel_id, &user).await;
    metrics::set_active_channels(state.controller.channel_count());

    debug!(channel = %channel_id, user = %user.id(), "Disconnected");
}

/// Wait for the client's `hello`.
///
/// Returns `None` when the socket closes, the deadline passes, or the first
/// frame is not a hello; otherwise the nickname the client asked for.
async fn await_hello(receiver: &mut SplitStream<WebSocket>) -> Option<Option<String>> {
    let result = timeout(HANDSHAKE_TIMEOUT, async {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    return match codec::decode::<ClientFrame>(&text) {
                        Ok(ClientFrame::Hello { nickname }) => Some(nickname),
                        Ok(_) => {
                            warn!("First frame was not hello");
                            None
                        }
                        Err(error) => {
                            warn!(%error, "Malformed handshake frame");
                            None
                        }
                    };
                }
                Message::Close(_) => return None,
                _ => {}
            }
        }
        None
    })
    .await;

    match result {
        Ok(hello) => hello,
        Err(_) => {
            debug!("Handshake timed out");
            None
        }
    }
}

/// Handle a decoded client frame after the handshake.
async fn handle_client_frame(text: &str, channel: &Arc<Channel>, user: &User) {
    match codec::decode::<ClientFrame>(text) {
        Ok(ClientFrame::Hello { .. }) => {
            debug!(user = %user.id(), "Ignoring repeated hello");
        }
        Ok(ClientFrame::PushObject {
            url,
            comment,
            position,
        }) => {
            let decoration = Decoration::new(generate_object_id(), url, comment, position);
            channel.push_object(decoration, user).await;
            metrics::record_object_placed();
        }
        Err(error) => {
            warn!(user = %user.id(), %error, "Malformed client frame");
            metrics::record_error("protocol");
        }
    }
}

/// Send a frame to the WebSocket.
async fn send_frame<T: Serialize>(
    sender: &mut SplitSink<WebSocket, Message>,
    frame: &T,
) -> Result<()> {
    let text = codec::encode(frame)?;
    sender.send(Message::Text(text)).await?;
    Ok(())
}
