//! Bookkeeping for the context lifecycle.
//!
//! Every context moves through Created -> Transferred -> Reclaimed -> Destroyed.
//! A ledger counts each transition so a completed trace can be checked for
//! leaks (transferred but never reclaimed) and double frees (reclaimed more
//! often than transferred).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    Created,
    Transferred,
    Reclaimed,
    Destroyed,
}

#[derive(Debug, Default)]
pub struct Ledger {
    created: AtomicU64,
    transferred: AtomicU64,
    reclaimed: AtomicU64,
    destroyed: AtomicU64,
}

/// Point-in-time copy of a [`Ledger`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    pub created: u64,
    pub transferred: u64,
    pub reclaimed: u64,
    pub destroyed: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, transition: Transition) {
        let counter = match transition {
            Transition::Created => &self.created,
            Transition::Transferred => &self.transferred,
            Transition::Reclaimed => &self.reclaimed,
            Transition::Destroyed => &self.destroyed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            created: self.created.load(Ordering::SeqCst),
            transferred: self.transferred.load(Ordering::SeqCst),
            reclaimed: self.reclaimed.load(Ordering::SeqCst),
            destroyed: self.destroyed.load(Ordering::SeqCst),
        }
    }
}

impl LedgerSnapshot {
    /// Handles currently owned by the foreign side.
    pub fn in_flight(&self) -> u64 {
        self.transferred.saturating_sub(self.reclaimed)
    }

    /// Every handed-out handle came back once and every context was freed.
    pub fn is_balanced(&self) -> bool {
        self.transferred == self.reclaimed && self.created == self.destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ledger_is_balanced() {
        let snapshot = Ledger::new().snapshot();
        assert!(snapshot.is_balanced());
        assert_eq!(snapshot.in_flight(), 0);
    }

    #[test]
    fn transferred_handle_is_in_flight_until_reclaimed() {
        let ledger = Ledger::new();
        ledger.record(Transition::Created);
        ledger.record(Transition::Transferred);
        assert_eq!(ledger.snapshot().in_flight(), 1);
        assert!(!ledger.snapshot().is_balanced());

        ledger.record(Transition::Reclaimed);
        ledger.record(Transition::Destroyed);
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.in_flight(), 0);
        assert!(snapshot.is_balanced());
    }

    #[test]
    fn double_reclaim_is_unbalanced() {
        let ledger = Ledger::new();
        ledger.record(Transition::Created);
        ledger.record(Transition::Transferred);
        ledger.record(Transition::Reclaimed);
        ledger.record(Transition::Reclaimed);
        ledger.record(Transition::Destroyed);
        assert!(!ledger.snapshot().is_balanced());
    }
}
