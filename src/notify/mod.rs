//! Register notifications
//!
//! The engine reports every stored register (and every match) through an
//! injected `RegisterNotifier`. Delivery is best effort: a notifier can drop
//! a notice without affecting the stored data.

mod broadcaster;

use serde::{Deserialize, Serialize};

use crate::types::Register;

pub use broadcaster::{NoticeMessage, RegisterBroadcaster};

/// What happened to a register
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegisterNotice {
    /// A register was stored
    Created { register: Register },

    /// A depart was matched with an entry
    Resolved { register: Register, counterpart: Register },
}

/// Fire-and-forget sink for register notices
pub trait RegisterNotifier: Send + Sync {
    fn notify(&self, notice: RegisterNotice);
}

/// Notifier that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl RegisterNotifier for NoopNotifier {
    fn notify(&self, _notice: RegisterNotice) {}
}
