//! Scripted stand-ins for the capability traits, shared by unit tests.

use crate::announce::{ChatError, ChatPlatform, MetadataError, MetadataSource};
use crate::chain::{ChainError, ChainRpc, LogFeed, TRANSFER_TOPIC};
use crate::events::DestinationId;
use crate::naming::{NameResolver, ResolveError};
use alloy_primitives::{Address, B256, Bytes, U64, U256, address};
use async_trait::async_trait;
use mintbell_sdk::client::ClientError;
use mintbell_sdk::objects::{LogFilter, RawLog, TokenMetadata};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

pub const CONTRACT: Address = address!("5b8bf1bcb3c7bd8e4fec2b3bd62d4d1b4ae5b2a0");
pub const MINTER: Address = address!("d3c7a31c4b0d50e8b6bb48e2a2a0a3f3a1e0f4f0");

pub fn address_topic(address: Address) -> B256 {
    address.into_word()
}

pub fn transfer_log(from: Address, to: Address, token_id: u64, block: u64, log_index: u64) -> RawLog {
    RawLog {
        address: CONTRACT,
        topics: vec![
            TRANSFER_TOPIC,
            address_topic(from),
            address_topic(to),
            B256::from(U256::from(token_id).to_be_bytes::<32>()),
        ],
        data: Bytes::new(),
        block_number: Some(U64::from(block)),
        transaction_hash: Some(B256::repeat_byte(0xab)),
        log_index: Some(U64::from(log_index)),
        removed: false,
    }
}

pub fn mint_log(token_id: u64, block: u64, log_index: u64) -> RawLog {
    transfer_log(Address::ZERO, MINTER, token_id, block, log_index)
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// What the next `open_log_stream` call does.
#[derive(Debug, Clone)]
pub enum FeedPlan {
    Fail,
    /// Deliver these logs, then stay open.
    Open(Vec<RawLog>),
    /// Open, but report not live.
    Dead,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainCall {
    Head,
    Open,
    Poll(u64, u64),
}

#[derive(Default)]
struct ChainScript {
    head: u64,
    logs: Vec<RawLog>,
    feeds: VecDeque<FeedPlan>,
    failing_polls: HashSet<usize>,
    calls: Vec<ChainCall>,
    /// Logs mined while the next subscription is being opened.
    mined_on_open: Vec<RawLog>,
    current_feed: Option<Arc<Mutex<VecDeque<RawLog>>>>,
}

#[derive(Clone, Default)]
pub struct MockChain {
    script: Arc<Mutex<ChainScript>>,
}

impl MockChain {
    pub fn new(head: u64) -> Self {
        let chain = Self::default();
        chain.script.lock().unwrap().head = head;
        chain
    }

    /// Make `log` visible to `poll_logs`.
    pub fn add_log(&self, log: RawLog) {
        self.script.lock().unwrap().logs.push(log);
    }

    pub fn plan_feeds(&self, plans: impl IntoIterator<Item = FeedPlan>) {
        self.script.lock().unwrap().feeds.extend(plans);
    }

    /// Mine `log` (and advance the head to its block) during the next
    /// `open_log_stream` call, after the listener has read the head.
    pub fn mine_during_open(&self, log: RawLog) {
        self.script.lock().unwrap().mined_on_open.push(log);
    }

    /// Fail the `n`th `poll_logs` call (zero based).
    pub fn fail_poll_call(&self, n: usize) {
        self.script.lock().unwrap().failing_polls.insert(n);
    }

    pub fn calls(&self) -> Vec<ChainCall> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn opens(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == ChainCall::Open)
            .count()
    }

    pub fn polls(&self) -> Vec<(u64, u64)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChainCall::Poll(from, to) => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    /// Logs not yet taken from the most recently opened feed.
    pub fn feed_remaining(&self) -> usize {
        match &self.script.lock().unwrap().current_feed {
            Some(queue) => queue.lock().unwrap().len(),
            None => usize::MAX,
        }
    }
}

pub struct MockFeed {
    queue: Arc<Mutex<VecDeque<RawLog>>>,
    live: bool,
}

#[async_trait]
impl LogFeed for MockFeed {
    async fn next_log(&mut self) -> Option<RawLog> {
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(log) => Some(log),
            None => std::future::pending().await,
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    type Feed = MockFeed;

    async fn block_height(&self) -> Result<u64, ChainError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(ChainCall::Head);
        Ok(script.head)
    }

    async fn open_log_stream(&self, _filter: &LogFilter) -> Result<MockFeed, ChainError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(ChainCall::Open);
        for log in std::mem::take(&mut script.mined_on_open) {
            let block = log.block_number().unwrap_or_default();
            script.head = script.head.max(block);
            script.logs.push(log);
        }
        let (logs, live) = match script.feeds.pop_front() {
            Some(FeedPlan::Fail) => {
                return Err(ChainError::Subscription("scripted failure".to_string()));
            }
            Some(FeedPlan::Open(logs)) => (logs, true),
            Some(FeedPlan::Dead) => (Vec::new(), false),
            None => (Vec::new(), true),
        };
        let queue = Arc::new(Mutex::new(VecDeque::from(logs)));
        script.current_feed = Some(queue.clone());
        Ok(MockFeed { queue, live })
    }

    async fn poll_logs(
        &self,
        from: u64,
        to: u64,
        _filter: &LogFilter,
    ) -> Result<Vec<RawLog>, ChainError> {
        let mut script = self.script.lock().unwrap();
        let call = script
            .calls
            .iter()
            .filter(|call| matches!(call, ChainCall::Poll(..)))
            .count();
        script.calls.push(ChainCall::Poll(from, to));
        if script.failing_polls.contains(&call) {
            return Err(ChainError::Subscription("scripted poll failure".to_string()));
        }
        Ok(script
            .logs
            .iter()
            .filter(|log| {
                log.block_number()
                    .is_some_and(|block| (from..=to).contains(&block))
            })
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Releases a gated resolver.
#[derive(Clone)]
pub struct Gate(Arc<watch::Sender<bool>>);

impl Gate {
    pub fn open(&self) {
        self.0.send_replace(true);
    }
}

pub struct StaticResolver {
    name: Option<String>,
    gate: Option<Gate>,
}

impl StaticResolver {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            gate: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            name: None,
            gate: None,
        }
    }

    /// Resolves to `name`, but only once the gate is opened.
    pub fn gated(name: &str) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            name: Some(name.to_string()),
            gate: Some(Gate(Arc::new(tx))),
        }
    }

    pub fn gate(&self) -> Gate {
        self.gate.clone().expect("resolver is not gated")
    }
}

#[async_trait]
impl NameResolver for StaticResolver {
    async fn reverse_resolve(&self, _address: Address) -> Result<String, ResolveError> {
        if let Some(gate) = &self.gate {
            let mut rx = gate.0.subscribe();
            let _ = rx.wait_for(|open| *open).await;
        }
        self.name.clone().ok_or(ResolveError::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ChatScript {
    unsendable: HashSet<u64>,
    failing_lookup: HashSet<u64>,
    failing_send: HashSet<u64>,
    sent: Vec<(DestinationId, String)>,
}

#[derive(Clone, Default)]
pub struct MockChat {
    script: Arc<Mutex<ChatScript>>,
}

impl MockChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unsendable(self, id: u64) -> Self {
        self.script.lock().unwrap().unsendable.insert(id);
        self
    }

    pub fn failing_lookup(self, id: u64) -> Self {
        self.script.lock().unwrap().failing_lookup.insert(id);
        self
    }

    pub fn failing_send(self, id: u64) -> Self {
        self.script.lock().unwrap().failing_send.insert(id);
        self
    }

    pub fn sent(&self) -> Vec<(DestinationId, String)> {
        self.script.lock().unwrap().sent.clone()
    }
}

#[async_trait]
impl ChatPlatform for MockChat {
    type Channel = DestinationId;

    async fn sendable_channel(&self, id: DestinationId) -> Result<Option<DestinationId>, ChatError> {
        let script = self.script.lock().unwrap();
        if script.failing_lookup.contains(&id.0) {
            return Err(ChatError::Rejected("scripted lookup failure".to_string()));
        }
        Ok((!script.unsendable.contains(&id.0)).then_some(id))
    }

    async fn send(&self, channel: &DestinationId, text: &str) -> Result<(), ChatError> {
        let mut script = self.script.lock().unwrap();
        if script.failing_send.contains(&channel.0) {
            return Err(ChatError::Rejected("scripted send failure".to_string()));
        }
        script.sent.push((*channel, text.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

pub struct MockMetadata {
    /// Names are `"{prefix} #{id}"`
    prefix: Option<String>,
    delay: Duration,
}

impl MockMetadata {
    pub fn named(prefix: &str) -> Self {
        Self {
            prefix: Some(prefix.to_string()),
            delay: Duration::ZERO,
        }
    }

    pub fn failing() -> Self {
        Self {
            prefix: None,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl MetadataSource for MockMetadata {
    async fn fetch(&self, token_id: U256) -> Result<TokenMetadata, MetadataError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.prefix {
            Some(prefix) => Ok(TokenMetadata {
                name: format!("{prefix} #{token_id}"),
                image: None,
            }),
            None => Err(MetadataError::Client(ClientError::Unexpected(
                "scripted failure".to_string(),
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Counts WARN events emitted on the current thread while installed.
#[derive(Clone, Default)]
pub struct WarnCounter {
    count: Arc<AtomicUsize>,
}

impl WarnCounter {
    /// Install as the thread's default subscriber until the guard drops.
    pub fn install(&self) -> DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}
