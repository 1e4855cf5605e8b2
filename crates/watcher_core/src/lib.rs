//! Watcher core: pure deduplication engine and poll-cycle state machine.
mod dedupe;
mod effect;
mod listing;
mod msg;
mod notified;
mod state;
mod update;

pub use dedupe::{dedupe, DedupeOutcome};
pub use effect::Effect;
pub use listing::Listing;
pub use msg::Msg;
pub use notified::NotifiedSet;
pub use state::{CycleId, NotifyPolicy, Phase, WatchState};
pub use update::update;
