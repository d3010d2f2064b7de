//! MintListener processor.
//!
//! The MintListener is responsible for:
//! - Owning the log subscription lifecycle (connect, subscribe, watch,
//!   drop, reconnect) with a fixed backoff between attempts
//! - Scanning the look-back window after every (re)connect
//! - Falling back to `eth_getLogs` polling when streaming keeps failing
//! - Decoding logs and forwarding mints to the name-resolution stage, which
//!   publishes `MintEvent`s in arrival order
//!
//! The read path never waits on name resolution: decoded mints are handed to
//! a separate task over an unbounded queue.

use crate::chain::{ChainError, ChainRpc, LogFeed, ObservedMint, decode_mint, transfer_filter};
use crate::config::{ListenerConfig, SubscriptionStrategy};
use crate::events::{MintEvent, MintEventSender};
use crate::naming::{DisplayNames, NameResolver};
use crate::utils::shutdown::{is_shutdown, or_shutdown, sleep_or_shutdown, wait_for_shutdown};
use mintbell_sdk::objects::{LogFilter, RawLog};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Where the listener is in its subscription lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Disconnected,
    Connecting,
    Subscribed,
    /// The feed ended; the session is being torn down.
    Draining,
    PollingFallback,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListenerState::Disconnected => "disconnected",
            ListenerState::Connecting => "connecting",
            ListenerState::Subscribed => "subscribed",
            ListenerState::Draining => "draining",
            ListenerState::PollingFallback => "polling",
        };
        f.write_str(name)
    }
}

/// Position of a log in the chain, ordered by block then index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LogCursor {
    pub block: u64,
    pub log_index: u64,
}

impl LogCursor {
    /// `None` for pending logs, which carry no position.
    pub fn of(log: &RawLog) -> Option<Self> {
        Some(Self {
            block: log.block_number()?,
            log_index: log.log_index()?,
        })
    }
}

/// Errors that end one streaming session or polling round.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// The node closed the subscription
    #[error("log feed closed")]
    FeedClosed,

    /// The liveness check found the connection gone
    #[error("log feed is no longer live")]
    FeedStalled,

    /// Shutdown was requested; not a failure
    #[error("shutdown requested")]
    Shutdown,
}

/// MintListener turns contract logs into `MintEvent`s.
pub struct MintListener<C, R> {
    chain: C,
    resolver: R,
    config: ListenerConfig,
    events: MintEventSender,
    state_tx: watch::Sender<ListenerState>,
}

impl<C, R> MintListener<C, R>
where
    C: ChainRpc,
    R: NameResolver + 'static,
{
    /// Create a new MintListener.
    ///
    /// # Arguments
    ///
    /// * `chain` - Log source
    /// * `resolver` - Reverse-name lookup for recipients
    /// * `config` - Listener configuration
    /// * `events` - Sender half of the notification channel
    pub fn new(chain: C, resolver: R, config: ListenerConfig, events: MintEventSender) -> Self {
        let (state_tx, _) = watch::channel(ListenerState::Disconnected);
        Self {
            chain,
            resolver,
            config,
            events,
            state_tx,
        }
    }

    /// Observe state transitions.
    pub fn state(&self) -> watch::Receiver<ListenerState> {
        self.state_tx.subscribe()
    }

    /// Run until shutdown is signaled.
    pub async fn run(self, shutdown_rx: watch::Receiver<bool>) {
        let Self {
            chain,
            resolver,
            config,
            events,
            state_tx,
        } = self;

        let (stage_tx, stage_handle) =
            spawn_name_stage(DisplayNames::new(resolver), events, shutdown_rx.clone());

        let mut session = Session {
            chain: &chain,
            filter: transfer_filter(config.contract),
            config: &config,
            cursor: None,
            stage_tx,
            state_tx: &state_tx,
            shutdown_rx,
        };
        info!(contract = %config.contract, strategy = ?config.strategy, "MintListener started");
        session.run().await;
        drop(session);

        if let Err(e) = stage_handle.await {
            error!(error = %e, "Name resolution stage panicked");
        }
        info!("MintListener shutdown complete");
    }
}

/// Spawn the task that resolves recipient names and publishes events.
///
/// Mints are handled strictly one at a time, so events leave in the order
/// they were detected.
fn spawn_name_stage<R: NameResolver + 'static>(
    names: DisplayNames<R>,
    events: MintEventSender,
    mut shutdown_rx: watch::Receiver<bool>,
) -> (mpsc::UnboundedSender<ObservedMint>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ObservedMint>();
    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut shutdown_rx) => break,

                mint = rx.recv() => {
                    let Some(mint) = mint else {
                        break;
                    };
                    let Some(recipient) =
                        or_shutdown(&mut shutdown_rx, names.display_name(mint.to)).await
                    else {
                        break;
                    };
                    info!(
                        token_id = %mint.token_id,
                        block = mint.block_number,
                        recipient = %recipient,
                        "Mint detected"
                    );
                    events.publish(MintEvent {
                        recipient,
                        token_id: mint.token_id,
                        block_number: mint.block_number,
                    });
                }
            }
        }
    });
    (tx, handle)
}

/// Mutable state of a running listener.
struct Session<'a, C> {
    chain: &'a C,
    filter: LogFilter,
    config: &'a ListenerConfig,
    /// Last accepted log
    cursor: Option<LogCursor>,
    stage_tx: mpsc::UnboundedSender<ObservedMint>,
    state_tx: &'a watch::Sender<ListenerState>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<C: ChainRpc> Session<'_, C> {
    async fn run(&mut self) {
        if self.config.strategy == SubscriptionStrategy::Polling {
            self.poll_rounds(None).await;
            return;
        }

        let mut failures: u32 = 0;
        while !is_shutdown(&self.shutdown_rx) {
            self.set_state(ListenerState::Connecting);
            let mut subscribed = false;
            let err = match self.stream(&mut subscribed).await {
                Err(ListenerError::Shutdown) => break,
                Err(e) => e,
                Ok(()) => break,
            };
            // A session that got as far as subscribing resets the streak.
            failures = if subscribed { 1 } else { failures + 1 };
            self.set_state(ListenerState::Disconnected);
            warn!(error = %err, failures, "Log subscription lost");

            let threshold = self.config.fallback_after_failures;
            if threshold > 0 && failures >= threshold {
                warn!(
                    failures,
                    rounds = self.config.fallback_poll_cycles,
                    "Streaming keeps failing, switching to polling"
                );
                if self.poll_rounds(Some(self.config.fallback_poll_cycles)).await {
                    break;
                }
                failures = 0;
                continue;
            }

            if sleep_or_shutdown(&mut self.shutdown_rx, self.config.reconnect_backoff).await {
                break;
            }
        }
        self.set_state(ListenerState::Disconnected);
    }

    /// One streaming session. Always ends in an error unless shut down.
    async fn stream(&mut self, subscribed: &mut bool) -> Result<(), ListenerError> {
        let head = self.cancellable_head().await?;
        let start = self.start_block(head);

        let mut feed = or_shutdown(&mut self.shutdown_rx, self.chain.open_log_stream(&self.filter))
            .await
            .ok_or(ListenerError::Shutdown)??;
        *subscribed = true;
        self.set_state(ListenerState::Subscribed);
        info!(head, from = start, "Subscribed to contract logs");

        // The subscription only pushes logs from blocks after its ack, so the
        // window up to the head as of now is fetched explicitly. Overlap with
        // pushed logs is skipped by the cursor.
        let tip = self.cancellable_head().await?;
        let mut high_water = start;
        self.scan(&mut high_water, tip.max(head)).await?;

        let period = self.config.liveness_interval.max(Duration::from_millis(1));
        let mut liveness = tokio::time::interval(period);
        liveness.tick().await;

        let reason = loop {
            tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut self.shutdown_rx) => return Err(ListenerError::Shutdown),

                log = feed.next_log() => match log {
                    Some(log) => self.accept(&log),
                    None => break ListenerError::FeedClosed,
                },

                _ = liveness.tick() => {
                    if !feed.is_live() {
                        break ListenerError::FeedStalled;
                    }
                }
            }
        };

        self.set_state(ListenerState::Draining);
        drop(feed);
        Err(reason)
    }

    /// Poll for `limit` rounds, or until shutdown when `limit` is `None`.
    ///
    /// Returns `true` if stopped by shutdown.
    async fn poll_rounds(&mut self, limit: Option<u32>) -> bool {
        self.set_state(ListenerState::PollingFallback);
        // Next block not yet scanned
        let mut high_water: Option<u64> = None;
        let mut rounds: u32 = 0;

        loop {
            if limit.is_some_and(|limit| rounds >= limit) {
                return false;
            }
            rounds = rounds.saturating_add(1);

            let pause = match self.poll_once(&mut high_water).await {
                Ok(()) => self.config.poll_interval,
                Err(ListenerError::Shutdown) => return true,
                Err(e) => {
                    warn!(error = %e, resume_from = ?high_water, "Log poll failed");
                    self.config.poll_backoff
                }
            };
            if sleep_or_shutdown(&mut self.shutdown_rx, pause).await {
                return true;
            }
        }
    }

    async fn poll_once(&mut self, high_water: &mut Option<u64>) -> Result<(), ListenerError> {
        let head = self.cancellable_head().await?;
        let mut next = match *high_water {
            Some(next) => next,
            None => self.start_block(head),
        };
        let result = self.scan(&mut next, head).await;
        *high_water = Some(next);
        result
    }

    /// Fetch `[*next, head]` in `poll_range` chunks, advancing `*next` past
    /// every chunk that completed.
    async fn scan(&mut self, next: &mut u64, head: u64) -> Result<(), ListenerError> {
        let range = self.config.poll_range.max(1);
        while *next <= head {
            let from = *next;
            let to = from.saturating_add(range - 1).min(head);
            let logs = or_shutdown(
                &mut self.shutdown_rx,
                self.chain.poll_logs(from, to, &self.filter),
            )
            .await
            .ok_or(ListenerError::Shutdown)??;
            debug!(from, to, count = logs.len(), "Fetched logs");
            for log in &logs {
                self.accept(log);
            }
            *next = to.saturating_add(1);
        }
        Ok(())
    }

    async fn cancellable_head(&mut self) -> Result<u64, ListenerError> {
        Ok(or_shutdown(&mut self.shutdown_rx, self.chain.block_height())
            .await
            .ok_or(ListenerError::Shutdown)??)
    }

    /// `head - lookback`, but never before the last accepted log.
    fn start_block(&self, head: u64) -> u64 {
        let start = head.saturating_sub(self.config.lookback_blocks);
        match self.cursor {
            Some(cursor) => start.max(cursor.block),
            None => start,
        }
    }

    /// Decode one log and queue it for naming if it is a new mint.
    fn accept(&mut self, log: &RawLog) {
        if log.removed {
            // Logs that follow come from the new fork and may sit at or
            // before the orphaned position.
            if self.cursor.take().is_some() {
                debug!(block = ?log.block_number(), "Chain reorganised, cursor cleared");
            }
            return;
        }
        if let Some(position) = LogCursor::of(log) {
            if self.cursor.is_some_and(|cursor| position <= cursor) {
                debug!(block = position.block, index = position.log_index, "Skipping replayed log");
                return;
            }
            self.cursor = Some(position);
        }

        let Some(mint) = decode_mint(log) else {
            return;
        };
        debug!(token_id = %mint.token_id, block = mint.block_number, "Queueing mint for naming");
        if self.stage_tx.send(mint).is_err() {
            debug!("Name resolution stage stopped, dropping mint");
        }
    }

    fn set_state(&self, state: ListenerState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            info!(from = %previous, to = %state, "Listener state changed");
        }
    }
}
