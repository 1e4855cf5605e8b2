use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;
use watcher_core::Listing;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    #[error("embedded state script not found")]
    MissingStateScript,
    #[error("embedded state is not valid json: {0}")]
    MalformedState(#[from] serde_json::Error),
}

/// Turns one fetched page into a batch of listings, ordered newest-first as
/// the site presents them.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> Result<Vec<Listing>, ExtractError>;
}

/// Extractor for the server-rendered offer list markup.
///
/// Field mapping per row: title and link from the first anchor with text,
/// description from the first `<p>`, price from the first `<strong>`,
/// published marker from the first `<span>`, thumbnail from the first
/// `<img>`. The identifier is content-derived: a sha256 over the row's
/// visible text. Rows with no visible text have no identifier and are
/// dropped.
pub struct OfferListExtractor {
    row: Selector,
    anchor: Selector,
    description: Selector,
    price: Selector,
    published: Selector,
    thumbnail: Selector,
    link_base: Url,
}

impl OfferListExtractor {
    pub fn new(row_selector: &str, link_base: &str) -> Result<Self, ExtractError> {
        let parse = |s: &str| {
            Selector::parse(s).map_err(|err| ExtractError::InvalidSelector(err.to_string()))
        };
        Ok(Self {
            row: parse(row_selector)?,
            anchor: parse("a")?,
            description: parse("p")?,
            price: parse("strong")?,
            published: parse("span")?,
            thumbnail: parse("img")?,
            link_base: Url::parse(link_base)
                .map_err(|err| ExtractError::InvalidBaseUrl(err.to_string()))?,
        })
    }

    fn extract_row(&self, row: ElementRef<'_>) -> Option<Listing> {
        let text = collapsed_text(row);
        if text.is_empty() {
            return None;
        }

        let mut title = String::new();
        let mut link = String::new();
        for anchor in row.select(&self.anchor) {
            let anchor_text = collapsed_text(anchor);
            if anchor_text.is_empty() {
                continue;
            }
            title = anchor_text;
            if let Some(href) = anchor.value().attr("href") {
                link = self
                    .link_base
                    .join(href)
                    .map(String::from)
                    .unwrap_or_else(|_| href.to_string());
            }
            break;
        }

        Some(Listing {
            identifier: hex_digest(&text),
            title,
            description: first_text(row, &self.description),
            price: first_text(row, &self.price),
            link,
            published: first_text(row, &self.published),
            thumbnail: row
                .select(&self.thumbnail)
                .next()
                .and_then(|img| img.value().attr("src"))
                .map(String::from),
        })
    }
}

impl Extractor for OfferListExtractor {
    fn extract(&self, html: &str) -> Result<Vec<Listing>, ExtractError> {
        let doc = Html::parse_document(html);
        Ok(doc
            .select(&self.row)
            .filter_map(|row| self.extract_row(row))
            .collect())
    }
}

/// Extractor for the client-rendered page variant, which embeds the full
/// offer data as JSON in a `window.__INITIAL_STATE__=` script tag.
///
/// Items carry a site-assigned id and a publish epoch; the batch is sorted
/// newest-first by that epoch. Items without an id are dropped.
pub struct InitialStateExtractor {
    script: Selector,
    detail_base: String,
    image_base: String,
}

const STATE_MARKER: &str = "window.__INITIAL_STATE__=";

impl InitialStateExtractor {
    pub fn new(detail_base: &str, image_base: &str) -> Result<Self, ExtractError> {
        Ok(Self {
            script: Selector::parse("script")
                .map_err(|err| ExtractError::InvalidSelector(err.to_string()))?,
            detail_base: detail_base.trim_end_matches('/').to_string(),
            image_base: image_base.trim_end_matches('/').to_string(),
        })
    }

    fn item_to_listing(&self, item: &serde_json::Value) -> Option<(i64, Listing)> {
        let id = item.get("id").and_then(|v| v.as_str())?;
        let epoch = item.get("epoch_time").and_then(|v| v.as_i64()).unwrap_or(0);
        let text_field = |key: &str| {
            item.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        let listing = Listing {
            identifier: id.to_string(),
            title: text_field("subject"),
            description: text_field("body"),
            price: text_field("price"),
            link: format!("{}/{id}", self.detail_base),
            published: epoch.to_string(),
            thumbnail: item
                .get("thumb_name")
                .and_then(|v| v.as_str())
                .map(|name| format!("{}/{name}", self.image_base)),
        };
        Some((epoch, listing))
    }
}

impl Extractor for InitialStateExtractor {
    fn extract(&self, html: &str) -> Result<Vec<Listing>, ExtractError> {
        let doc = Html::parse_document(html);
        let raw = doc
            .select(&self.script)
            .filter_map(|script| {
                let text: String = script.text().collect();
                text.find(STATE_MARKER)
                    .map(|at| text[at + STATE_MARKER.len()..].trim().to_string())
            })
            .next()
            .ok_or(ExtractError::MissingStateScript)?;

        let state: serde_json::Value = serde_json::from_str(raw.trim_end_matches(';'))?;
        let mut entries: Vec<(i64, Listing)> = state
            .get("items")
            .and_then(|items| items.as_object())
            .map(|items| {
                items
                    .values()
                    .filter_map(|item| self.item_to_listing(item))
                    .collect()
            })
            .unwrap_or_default();

        entries.sort_by_key(|(epoch, _)| std::cmp::Reverse(*epoch));
        Ok(entries.into_iter().map(|(_, listing)| listing).collect())
    }
}

fn first_text(row: ElementRef<'_>, selector: &Selector) -> String {
    row.select(selector)
        .next()
        .map(collapsed_text)
        .unwrap_or_default()
}

/// Element text with runs of whitespace collapsed, so identifiers derived
/// from it are stable across markup reformatting.
fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn hex_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
