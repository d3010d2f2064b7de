//! Discord gateway WebSocket connection.
//!
//! This is a thin framing layer: the heartbeat schedule and reconnect policy
//! belong to the caller.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::ClientError;
use crate::objects::GatewayPayload;

const GATEWAY_QUERY: &str = "?v=10&encoding=json";

pub struct GatewayConnection {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl GatewayConnection {
    /// Open the socket to a URL returned by `GET /gateway/bot`.
    pub async fn connect(gateway_url: &str) -> Result<Self, ClientError> {
        let url = format!("{}/{GATEWAY_QUERY}", gateway_url.trim_end_matches('/'));
        let (socket, _) = connect_async(url.as_str()).await?;
        Ok(Self { socket })
    }

    /// Wait for the Hello frame and return the heartbeat interval.
    pub async fn hello(&mut self) -> Result<Duration, ClientError> {
        let payload = self.recv().await?.ok_or(ClientError::Closed)?;
        payload.heartbeat_interval().ok_or_else(|| {
            ClientError::Unexpected(format!("expected Hello, got opcode {}", payload.op))
        })
    }

    pub async fn identify(&mut self, token: &str) -> Result<(), ClientError> {
        self.send(&GatewayPayload::identify(token)).await
    }

    pub async fn heartbeat(&mut self, last_sequence: Option<u64>) -> Result<(), ClientError> {
        self.send(&GatewayPayload::heartbeat(last_sequence)).await
    }

    /// Next gateway frame, or `None` once the gateway closed the socket.
    pub async fn recv(&mut self) -> Result<Option<GatewayPayload>, ClientError> {
        while let Some(frame) = self.socket.next().await {
            match frame? {
                Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
                Message::Close(_) => return Ok(None),
                _ => continue,
            }
        }
        Ok(None)
    }

    pub async fn send(&mut self, payload: &GatewayPayload) -> Result<(), ClientError> {
        let text = serde_json::to_string(payload)?;
        self.socket.send(Message::Text(text)).await?;
        Ok(())
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.socket.close(None).await?;
        Ok(())
    }
}
