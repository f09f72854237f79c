//! In-process pub/sub notifier on a tokio broadcast channel

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use super::{RegisterNotice, RegisterNotifier};
use crate::utils::current_timestamp_millis;

/// Notice wrapper with metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NoticeMessage {
    #[serde(flatten)]
    pub notice: RegisterNotice,

    /// Monotonically increasing sequence ID for gap detection
    pub sequence_id: u64,

    /// Unix timestamp (millis) when the notice was sent
    pub timestamp: i64,
}

/// Broadcasts register notices to any number of subscribers
pub struct RegisterBroadcaster {
    tx: broadcast::Sender<NoticeMessage>,
    sequence_counter: AtomicU64,
}

impl RegisterBroadcaster {
    /// Create a new broadcaster with the given capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            sequence_counter: AtomicU64::new(0),
        }
    }

    /// Get the current sequence ID
    pub fn current_sequence_id(&self) -> u64 {
        self.sequence_counter.load(Ordering::SeqCst)
    }

    /// Subscribe to receive broadcast notices
    pub fn subscribe(&self) -> broadcast::Receiver<NoticeMessage> {
        self.tx.subscribe()
    }
}

impl RegisterNotifier for RegisterBroadcaster {
    fn notify(&self, notice: RegisterNotice) {
        let seq = self.sequence_counter.fetch_add(1, Ordering::SeqCst);
        let msg = NoticeMessage {
            notice,
            sequence_id: seq,
            timestamp: current_timestamp_millis(),
        };
        // No receivers connected
        if self.tx.send(msg).is_err() {
            trace!(sequence_id = seq, "register notice dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Register, RegisterKind};

    fn unauthorized_entry() -> Register {
        Register::unauthorized(
            RegisterKind::Entry,
            "ghost".to_string(),
            "s-1".to_string(),
            chrono::Utc::now(),
        )
    }

    #[test]
    fn test_sequence_increments_without_subscribers() {
        let broadcaster = RegisterBroadcaster::new(16);
        assert_eq!(broadcaster.current_sequence_id(), 0);

        broadcaster.notify(RegisterNotice::Created {
            register: unauthorized_entry(),
        });

        assert_eq!(broadcaster.current_sequence_id(), 1);
    }

    #[tokio::test]
    async fn test_subscriber_receives_notice() {
        let broadcaster = RegisterBroadcaster::new(16);
        let mut rx = broadcaster.subscribe();

        broadcaster.notify(RegisterNotice::Created {
            register: unauthorized_entry(),
        });

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.sequence_id, 0);
        assert!(matches!(msg.notice, RegisterNotice::Created { .. }));
    }

    #[test]
    fn test_notice_message_serialization() {
        let msg = NoticeMessage {
            notice: RegisterNotice::Created {
                register: unauthorized_entry(),
            },
            sequence_id: 42,
            timestamp: 1_234_567_890,
        };

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"created\""));
        assert!(json.contains("\"sequence_id\":42"));
    }
}
