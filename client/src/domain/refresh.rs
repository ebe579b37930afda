//! Generation counter guarding list reloads.
//!
//! Each reload takes a ticket before its requests start. When the responses
//! arrive the ticket is checked; a newer reload makes it stale and its data
//! is dropped instead of overwriting fresher state.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    /// Generation number.
    pub const fn generation(self) -> u64 {
        self.0
    }
}

/// Monotonic source of [`RefreshTicket`]s.
#[derive(Debug, Default)]
pub struct RefreshGeneration {
    latest: AtomicU64,
}

impl RefreshGeneration {
    /// Counter with no reload issued yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a reload, superseding every earlier ticket.
    pub fn begin(&self) -> RefreshTicket {
        RefreshTicket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `ticket` belongs to the most recent reload.
    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }
}
