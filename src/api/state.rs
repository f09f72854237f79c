//! Shared application state for HTTP handlers

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use crate::ledger::AccessLedger;
use crate::notify::RegisterBroadcaster;
use crate::utils::now_in;

pub struct AppState {
    /// The reconciliation engine
    pub ledger: Arc<AccessLedger>,

    /// Notice channel; its sequence id tags every response
    pub broadcaster: Arc<RegisterBroadcaster>,

    /// Offset that defines "today" for statistics
    pub utc_offset: FixedOffset,
}

impl AppState {
    pub fn new(
        ledger: Arc<AccessLedger>,
        broadcaster: Arc<RegisterBroadcaster>,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            ledger,
            broadcaster,
            utc_offset,
        }
    }

    pub fn current_sequence_id(&self) -> u64 {
        self.broadcaster.current_sequence_id()
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        now_in(self.utc_offset)
    }
}
