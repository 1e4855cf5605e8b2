use std::hash::{Hash, Hasher};

/// One scraped marketplace offer.
///
/// The `identifier` is an opaque, site-assigned or content-derived string
/// that is stable for the lifetime of the offer. Equality and set membership
/// are defined on the identifier alone; all other fields are display data
/// and may be empty.
#[derive(Debug, Clone)]
pub struct Listing {
    pub identifier: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub link: String,
    pub published: String,
    pub thumbnail: Option<String>,
}

impl PartialEq for Listing {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for Listing {}

impl Hash for Listing {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}
