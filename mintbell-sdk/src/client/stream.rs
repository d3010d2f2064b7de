//! `eth_subscribe("logs")` over a JSON-RPC WebSocket.

use futures_util::{SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

use super::ClientError;
use crate::objects::{LogFilter, RawLog};

const SUBSCRIBE_REQUEST_ID: u64 = 1;

/// A live log subscription.
///
/// A background reader task owns the socket and forwards every pushed log
/// into an unbounded queue, so the caller's processing never stalls the
/// socket read loop. The task is aborted when the stream is dropped.
pub struct LogStream {
    subscription_id: String,
    logs: mpsc::UnboundedReceiver<RawLog>,
    open: watch::Receiver<bool>,
    reader: JoinHandle<()>,
}

#[derive(Debug, Deserialize)]
struct SubscribeReply {
    id: Option<Value>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Notification {
    method: String,
    params: NotificationParams,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    subscription: String,
    result: Value,
}

impl LogStream {
    /// Connect to `ws_url` and register `filter`.
    ///
    /// Returns once the node has acknowledged the subscription with an id.
    /// `confirm_timeout` bounds the handshake and the acknowledgement
    /// separately.
    pub async fn subscribe(
        ws_url: &str,
        filter: &LogFilter,
        confirm_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let (socket, _) = tokio::time::timeout(confirm_timeout, connect_async(ws_url))
            .await
            .map_err(|_| ClientError::Timeout(confirm_timeout))??;
        let (mut write, mut read) = socket.split();

        let request = json!({
            "jsonrpc": "2.0",
            "id": SUBSCRIBE_REQUEST_ID,
            "method": "eth_subscribe",
            "params": ["logs", filter.to_subscription_params()],
        });
        write.send(Message::Text(request.to_string())).await?;

        let subscription_id = tokio::time::timeout(confirm_timeout, await_subscription_id(&mut read))
            .await
            .map_err(|_| ClientError::Timeout(confirm_timeout))??;

        info!(subscription = %subscription_id, "Log subscription registered");

        let (log_tx, logs) = mpsc::unbounded_channel();
        let (open_tx, open) = watch::channel(true);
        let expected = subscription_id.clone();

        let reader = tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => match parse_notification(&text, &expected) {
                        Some(Ok(log)) => {
                            if log_tx.send(log).is_err() {
                                break;
                            }
                        }
                        Some(Err(e)) => warn!(error = %e, "Malformed log notification"),
                        None => debug!("Ignoring non-log frame"),
                    },
                    Ok(Message::Ping(data)) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Ok(Message::Close(frame)) => {
                        info!(?frame, "Log subscription closed by node");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "Log subscription socket error");
                        break;
                    }
                }
            }
            let _ = open_tx.send(false);
        });

        Ok(Self {
            subscription_id,
            logs,
            open,
            reader,
        })
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Next pushed log, or `None` once the connection is gone and the queue
    /// is drained.
    pub async fn next(&mut self) -> Option<RawLog> {
        self.logs.recv().await
    }

    /// Whether the underlying socket is still open.
    pub fn is_open(&self) -> bool {
        *self.open.borrow() && !self.reader.is_finished()
    }
}

impl Drop for LogStream {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Read frames until the reply to the `eth_subscribe` request arrives.
async fn await_subscription_id<S>(read: &mut S) -> Result<String, ClientError>
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(frame) = read.next().await {
        let text = match frame? {
            Message::Text(text) => text,
            Message::Close(_) => return Err(ClientError::Closed),
            _ => continue,
        };
        let Ok(reply) = serde_json::from_str::<SubscribeReply>(&text) else {
            continue;
        };
        if reply.id.as_ref().and_then(Value::as_u64) != Some(SUBSCRIBE_REQUEST_ID) {
            continue;
        }
        if let Some(error) = reply.error {
            return Err(ClientError::Unexpected(format!(
                "eth_subscribe rejected: {error}"
            )));
        }
        return reply
            .result
            .ok_or_else(|| ClientError::Unexpected("eth_subscribe returned no id".to_string()));
    }
    Err(ClientError::Closed)
}

/// Extract the log from an `eth_subscription` frame for `subscription`.
///
/// Returns `None` for frames that are not notifications for this subscription.
fn parse_notification(text: &str, subscription: &str) -> Option<Result<RawLog, serde_json::Error>> {
    let notification: Notification = serde_json::from_str(text).ok()?;
    if notification.method != "eth_subscription" || notification.params.subscription != subscription {
        return None;
    }
    Some(serde_json::from_value(notification.params.result))
}
