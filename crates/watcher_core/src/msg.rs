#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Scheduler starts the first cycle.
    PollDue,
    /// Fetch and extraction produced a batch, ordered newest-first as the
    /// source page lists it. May be empty.
    FetchSucceeded { batch: Vec<crate::Listing> },
    /// Fetch or extraction failed for this cycle.
    FetchFailed,
    /// Delivery of one listing finished, successfully or not.
    NotifyResolved { identifier: String, delivered: bool },
    /// The state store finished persisting, successfully or not.
    PersistResolved { persisted: bool },
    /// The configured interval elapsed.
    SleepFinished,
}
