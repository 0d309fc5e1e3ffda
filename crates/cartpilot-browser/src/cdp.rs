//! WebSocket client for the Chrome DevTools protocol.
//!
//! Speaks JSON-RPC 2.0 over the page target's WebSocket endpoint. Commands
//! are sent with auto-incrementing ids and their responses are correlated
//! back to the caller; unsolicited messages are surfaced as events.
//!
//! The client half ([`CdpClient`]) is cheaply cloneable so several tasks can
//! issue commands concurrently; the event half ([`CdpEventStream`]) is a
//! single-consumer stream handed out once at connect time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::PageError;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Default time to wait for a command response.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// An unsolicited DevTools event (e.g. `Page.loadEventFired`,
/// `Runtime.bindingCalled`).
#[derive(Debug, Clone)]
pub struct CdpEvent {
    /// The event method name.
    pub method: String,
    /// The event parameters, `Value::Null` when absent.
    pub params: Value,
}

/// A command envelope on the wire.
#[derive(Debug, serde::Serialize)]
struct CdpCommand<'a> {
    id: u64,
    method: &'a str,
    params: Value,
}

/// A command response, correlated by id.
#[derive(Debug)]
struct CdpReply {
    result: Option<Value>,
    error: Option<RemoteError>,
}

/// The error object of a failed command response.
#[derive(Debug, serde::Deserialize)]
struct RemoteError {
    code: i64,
    message: String,
}

/// One decoded wire message: either a reply to a pending command or an event.
#[derive(Debug)]
enum Incoming {
    Reply { id: u64, reply: CdpReply },
    Event(CdpEvent),
}

/// Decode a raw DevTools wire message.
///
/// Messages with an `id` are replies; messages with a `method` and no `id`
/// are events. Anything else is noise and yields `None`.
fn decode_message(text: &str) -> Option<Incoming> {
    let json: Value = serde_json::from_str(text).ok()?;

    if let Some(id) = json.get("id").and_then(Value::as_u64) {
        let reply = CdpReply {
            result: json.get("result").cloned(),
            error: json
                .get("error")
                .and_then(|e| serde_json::from_value(e.clone()).ok()),
        };
        return Some(Incoming::Reply { id, reply });
    }

    let method = json.get("method")?.as_str()?.to_string();
    let params = json.get("params").cloned().unwrap_or(Value::Null);
    Some(Incoming::Event(CdpEvent { method, params }))
}

/// Command half of a DevTools connection.
///
/// Clones share the same WebSocket and id counter, so any number of tasks
/// can issue commands; responses are routed back through per-command oneshot
/// channels.
#[derive(Clone)]
pub struct CdpClient {
    next_id: Arc<AtomicU64>,
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<CdpReply>>>>,
    writer: Arc<Mutex<WsSink>>,
}

/// Event half of a DevTools connection. Single consumer.
pub struct CdpEventStream {
    rx: mpsc::UnboundedReceiver<CdpEvent>,
}

impl CdpEventStream {
    /// Receive the next event. Returns `None` once the connection is gone.
    pub async fn next(&mut self) -> Option<CdpEvent> {
        self.rx.recv().await
    }
}

impl CdpClient {
    /// Connect to a page target's WebSocket endpoint.
    ///
    /// The URL has the form `ws://127.0.0.1:9222/devtools/page/<target-id>`
    /// and comes from the DevTools `/json` target list.
    pub async fn connect(ws_url: &str) -> Result<(Self, CdpEventStream), PageError> {
        tracing::info!(url = ws_url, "connecting to DevTools target");

        let (ws_stream, _) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|e| PageError::ConnectionFailed {
                url: ws_url.to_string(),
                reason: e.to_string(),
            })?;

        let (writer, reader) = ws_stream.split();

        let pending: Arc<Mutex<HashMap<u64, oneshot::Sender<CdpReply>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let pending_for_reader = Arc::clone(&pending);
        tokio::spawn(async move {
            read_loop(reader, pending_for_reader, event_tx).await;
        });

        let client = Self {
            next_id: Arc::new(AtomicU64::new(1)),
            pending,
            writer: Arc::new(Mutex::new(writer)),
        };

        Ok((client, CdpEventStream { rx: event_rx }))
    }

    /// Send a command and wait for its response with the default timeout.
    pub async fn command(&self, method: &str, params: Value) -> Result<Value, PageError> {
        self.command_with_timeout(method, params, DEFAULT_COMMAND_TIMEOUT)
            .await
    }

    /// Send a command and wait for its response.
    pub async fn command_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, PageError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let json =
            serde_json::to_string(&CdpCommand { id, method, params }).map_err(|e| {
                PageError::Protocol {
                    detail: format!("failed to serialize command: {e}"),
                }
            })?;

        tracing::debug!(id, method, "sending DevTools command");

        // Register the pending slot before sending so a fast reply cannot race
        // the registration.
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        {
            let mut writer = self.writer.lock().await;
            if let Err(e) = writer.send(Message::Text(json.into())).await {
                self.pending.lock().await.remove(&id);
                return Err(PageError::Protocol {
                    detail: format!("failed to send WebSocket message: {e}"),
                });
            }
        }

        let reply = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => {
                return Err(PageError::Protocol {
                    detail: "response channel closed unexpectedly".to_string(),
                })
            }
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(PageError::CommandTimeout {
                    method: method.to_string(),
                    duration: timeout,
                });
            }
        };

        if let Some(err) = reply.error {
            return Err(PageError::Command {
                method: method.to_string(),
                code: err.code,
                message: err.message,
            });
        }

        Ok(reply.result.unwrap_or(Value::Null))
    }

    /// Enable a DevTools domain (`Page`, `Runtime`, ...). Most domains only
    /// emit events after an explicit enable.
    pub async fn enable_domain(&self, domain: &str) -> Result<(), PageError> {
        self.command(&format!("{domain}.enable"), serde_json::json!({}))
            .await?;
        Ok(())
    }
}

/// Background task: read wire messages, route replies to their pending
/// slots, forward events.
async fn read_loop(
    mut reader: WsSource,
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<CdpReply>>>>,
    event_tx: mpsc::UnboundedSender<CdpEvent>,
) {
    while let Some(msg_result) = reader.next().await {
        let msg = match msg_result {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, "WebSocket read error, stopping reader");
                break;
            }
        };

        let text = match msg {
            Message::Text(t) => t.to_string(),
            Message::Close(_) => {
                tracing::info!("DevTools WebSocket closed by remote");
                break;
            }
            _ => continue,
        };

        match decode_message(&text) {
            Some(Incoming::Reply { id, reply }) => {
                let mut pending_guard = pending.lock().await;
                if let Some(tx) = pending_guard.remove(&id) {
                    let _ = tx.send(reply);
                } else {
                    tracing::debug!(id, "reply for unknown command id");
                }
            }
            Some(Incoming::Event(event)) => {
                // Nobody listening is fine; the event is dropped.
                let _ = event_tx.send(event);
            }
            None => {
                tracing::warn!("unparseable DevTools message, skipping");
            }
        }
    }

    // Connection gone: fail every pending command.
    let mut pending_guard = pending.lock().await;
    for (_, tx) in pending_guard.drain() {
        let _ = tx.send(CdpReply {
            result: None,
            error: Some(RemoteError {
                code: -1,
                message: "WebSocket connection closed".to_string(),
            }),
        });
    }
}
