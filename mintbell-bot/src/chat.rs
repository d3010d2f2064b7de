//! Discord gateway connection task.
//!
//! Keeps one gateway session open so the bot shows as online, and reports
//! readiness to the dispatcher the first time the gateway sends READY.
//! Announcements themselves go through the REST API.

use mintbell_core::utils::shutdown::{or_shutdown, sleep_or_shutdown, wait_for_shutdown};
use mintbell_sdk::client::{ClientError, DiscordClient, GatewayConnection};
use mintbell_sdk::objects::discord::opcode;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

/// Upper bound on each step of the gateway handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
enum SessionError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("gateway closed the connection")]
    Closed,

    #[error("gateway requested a reconnect")]
    Reconnect,

    #[error("gateway invalidated the session")]
    InvalidSession,

    #[error("no heartbeat acknowledgement")]
    MissedAck,

    #[error("shutdown requested")]
    Shutdown,
}

pub struct ChatConnection {
    client: DiscordClient,
    reconnect_backoff: Duration,
    ready_tx: watch::Sender<bool>,
}

impl ChatConnection {
    pub fn new(
        client: DiscordClient,
        reconnect_backoff: Duration,
        ready_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            client,
            reconnect_backoff,
            ready_tx,
        }
    }

    /// Run until shutdown is signaled, reconnecting after every lost session.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("Chat connection started");
        loop {
            match self.session(&mut shutdown_rx).await {
                Ok(()) | Err(SessionError::Shutdown) => break,
                Err(e) => warn!(error = %e, "Discord gateway session ended"),
            }
            if sleep_or_shutdown(&mut shutdown_rx, self.reconnect_backoff).await {
                break;
            }
        }
        info!("Chat connection shutdown complete");
    }

    async fn session(&self, shutdown_rx: &mut watch::Receiver<bool>) -> Result<(), SessionError> {
        let user = or_shutdown(shutdown_rx, self.client.current_user())
            .await
            .ok_or(SessionError::Shutdown)??;
        info!(user = %user.username, "Logged in to Discord");

        let gateway_url = or_shutdown(shutdown_rx, self.client.gateway_url())
            .await
            .ok_or(SessionError::Shutdown)??;
        let mut conn = or_shutdown(shutdown_rx, GatewayConnection::connect(&gateway_url))
            .await
            .ok_or(SessionError::Shutdown)??;
        let heartbeat_interval = handshake(shutdown_rx, HANDSHAKE_TIMEOUT, conn.hello()).await?;
        handshake(shutdown_rx, HANDSHAKE_TIMEOUT, conn.identify(self.client.token())).await?;
        debug!(?heartbeat_interval, "Identified with gateway");

        let mut heartbeat = interval_at(Instant::now() + heartbeat_interval, heartbeat_interval);
        let mut last_sequence: Option<u64> = None;
        let mut acked = true;

        loop {
            tokio::select! {
                biased;

                _ = wait_for_shutdown(shutdown_rx) => {
                    if let Err(e) = conn.close().await {
                        debug!(error = %e, "Failed to close gateway cleanly");
                    }
                    return Ok(());
                }

                _ = heartbeat.tick() => {
                    if !acked {
                        return Err(SessionError::MissedAck);
                    }
                    acked = false;
                    conn.heartbeat(last_sequence).await?;
                }

                frame = conn.recv() => {
                    let payload = frame?.ok_or(SessionError::Closed)?;
                    if let Some(seq) = payload.s {
                        last_sequence = Some(seq);
                    }
                    match payload.op {
                        opcode::DISPATCH if payload.is_dispatch("READY") => {
                            info!("Discord gateway ready");
                            self.ready_tx.send_replace(true);
                        }
                        opcode::HEARTBEAT => conn.heartbeat(last_sequence).await?,
                        opcode::HEARTBEAT_ACK => acked = true,
                        opcode::RECONNECT => return Err(SessionError::Reconnect),
                        opcode::INVALID_SESSION => return Err(SessionError::InvalidSession),
                        _ => {}
                    }
                }
            }
        }
    }
}

/// Run one handshake step, bounded by `limit` and abandoned on shutdown.
async fn handshake<T>(
    shutdown_rx: &mut watch::Receiver<bool>,
    limit: Duration,
    step: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, SessionError> {
    match or_shutdown(shutdown_rx, tokio::time::timeout(limit, step)).await {
        None => Err(SessionError::Shutdown),
        Some(Err(_)) => Err(ClientError::Timeout(limit).into()),
        Some(Ok(result)) => Ok(result?),
    }
}
