use crate::{Listing, NotifiedSet};

/// Result of deduplicating one cycle's batch against the notified set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupeOutcome {
    /// Listings not seen before, in the batch's oldest-to-newest order.
    pub new_listings: Vec<Listing>,
    /// The notified set merged with every identifier in the batch.
    pub updated: NotifiedSet,
}

/// Pure deduplication: splits `batch` into listings whose identifier is not
/// yet in `notified`, preserving the batch order, and returns the merged set.
///
/// The whole batch's identifiers are merged in, not just the new ones, so an
/// already-notified identifier that is extracted again stays accounted for.
/// A repeated identifier within one batch is reported once, at its first
/// position; later occurrences are absorbed by set membership.
pub fn dedupe(batch: &[Listing], notified: &NotifiedSet) -> DedupeOutcome {
    let mut updated = notified.clone();
    let mut new_listings = Vec::new();

    for listing in batch {
        if updated.insert(listing.identifier.clone()) {
            new_listings.push(listing.clone());
        }
    }

    DedupeOutcome {
        new_listings,
        updated,
    }
}
