use std::collections::VecDeque;

use crate::{Listing, NotifiedSet};

pub type CycleId = u64;

/// Where the poll loop currently is within a cycle.
///
/// Extraction and deduplication happen inside the `FetchSucceeded`
/// transition, so they need no phase of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Notifying,
    Persisting,
    Sleeping,
}

/// What to do with a listing whose delivery failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyPolicy {
    /// Mark the listing notified anyway. A permanently failing sink then
    /// suppresses that listing forever; this matches the historical
    /// at-most-once-attempt behavior.
    #[default]
    MarkNotified,
    /// Withdraw the identifier so the listing is re-attempted next cycle.
    RetryNextCycle,
}

/// In-progress bookkeeping for the cycle currently past deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CycleScratch {
    /// New listings still awaiting a delivery attempt, oldest first.
    pub(crate) queue: VecDeque<Listing>,
    /// The set to persist once the queue drains.
    pub(crate) pending: NotifiedSet,
    /// Snapshot from the start of the cycle; persisting is skipped when
    /// `pending` ends up equal to it.
    pub(crate) baseline: NotifiedSet,
}

/// State of one search term's poll loop.
///
/// All state is partitioned by search term; two `WatchState` values never
/// share anything. The in-memory notified set is authoritative for the
/// lifetime of the process even when persistence fails, so an identifier is
/// never re-notified within one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchState {
    term: String,
    notified: NotifiedSet,
    policy: NotifyPolicy,
    phase: Phase,
    cycle: CycleId,
    pub(crate) scratch: Option<CycleScratch>,
}

impl WatchState {
    /// Creates the state for one search term, seeded with whatever the
    /// state store loaded (empty for a never-seen term).
    pub fn new(term: impl Into<String>, notified: NotifiedSet, policy: NotifyPolicy) -> Self {
        Self {
            term: term.into(),
            notified,
            policy,
            phase: Phase::Idle,
            cycle: 0,
            scratch: None,
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed or in-progress cycle count, starting at 1 for the first.
    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn notified(&self) -> &NotifiedSet {
        &self.notified
    }

    pub fn policy(&self) -> NotifyPolicy {
        self.policy
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn begin_cycle(&mut self) {
        self.cycle += 1;
        self.phase = Phase::Fetching;
        self.scratch = None;
    }

    pub(crate) fn notified_mut(&mut self) -> &mut NotifiedSet {
        &mut self.notified
    }

    pub(crate) fn set_notified(&mut self, notified: NotifiedSet) {
        self.notified = notified;
    }
}
