//! The notification channel between the listener and the dispatcher.
//!
//! It is unbounded so that detection never waits on delivery: the listener
//! may run arbitrarily far ahead of a slow dispatcher.

use super::types::MintEvent;
use tokio::sync::mpsc;
use tracing::debug;

/// Receiver handle for MintEvent events.
pub type MintEventReceiver = mpsc::UnboundedReceiver<MintEvent>;

/// Sender handle for MintEvent events.
///
/// Publishing never blocks and never fails the caller: if the dispatcher
/// is gone the event is dropped.
#[derive(Debug, Clone)]
pub struct MintEventSender {
    inner: mpsc::UnboundedSender<MintEvent>,
}

impl MintEventSender {
    /// Enqueue an event. Returns `false` if the channel is closed.
    pub fn publish(&self, event: MintEvent) -> bool {
        match self.inner.send(event) {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                debug!(
                    token_id = %event.token_id,
                    "Notification channel closed, dropping mint event"
                );
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// Create the notification channel.
///
/// Returns a (sender, receiver) pair; the sender goes to the listener and
/// the receiver to the dispatcher.
pub fn mint_event_channel() -> (MintEventSender, MintEventReceiver) {
    let (inner, rx) = mpsc::unbounded_channel();
    (MintEventSender { inner }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn event(id: u64) -> MintEvent {
        MintEvent {
            recipient: "alice.eth".to_string(),
            token_id: U256::from(id),
            block_number: 1,
        }
    }

    #[test]
    fn test_publish_never_waits_on_consumer() {
        let (tx, mut rx) = mint_event_channel();
        for id in 0..10_000 {
            assert!(tx.publish(event(id)));
        }
        assert_eq!(rx.try_recv().map(|e| e.token_id), Ok(U256::ZERO));
    }

    #[test]
    fn test_publish_after_close_is_dropped() {
        let (tx, rx) = mint_event_channel();
        drop(rx);
        assert!(tx.is_closed());
        assert!(!tx.publish(event(1)));
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (tx, mut rx) = mint_event_channel();
        for id in [3, 1, 2] {
            tx.publish(event(id));
        }
        drop(tx);
        let mut seen = Vec::new();
        while let Some(e) = rx.recv().await {
            seen.push(e.token_id);
        }
        assert_eq!(seen, vec![U256::from(3), U256::from(1), U256::from(2)]);
    }
}
