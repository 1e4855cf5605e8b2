#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch and extract the current batch for the search term.
    Fetch,
    /// Deliver one listing to the notification sink.
    Notify(crate::Listing),
    /// Durably persist the notified set for the search term.
    Persist(crate::NotifiedSet),
    /// Wait for the configured interval before the next cycle.
    Sleep,
}
