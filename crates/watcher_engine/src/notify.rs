use serde_json::json;
use thiserror::Error;
use url::Url;
use watcher_core::Listing;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid webhook url: {0}")]
    InvalidWebhook(String),
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification rejected with status {0}")]
    Rejected(u16),
}

/// Delivers one listing as one outbound chat message.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, listing: &Listing) -> Result<(), NotifyError>;
}

/// Notifier posting Slack block-kit messages to an incoming webhook.
///
/// The webhook URL is handed in explicitly; there is no ambient
/// process-wide configuration.
#[derive(Debug)]
pub struct SlackWebhookNotifier {
    webhook: Url,
    client: reqwest::Client,
}

impl SlackWebhookNotifier {
    pub fn new(webhook: &str) -> Result<Self, NotifyError> {
        Ok(Self {
            webhook: Url::parse(webhook).map_err(|err| NotifyError::InvalidWebhook(err.to_string()))?,
            client: reqwest::Client::new(),
        })
    }

    fn payload(listing: &Listing) -> serde_json::Value {
        // On mobile the title link alone is unreliable, so the description
        // carries an extra "more" link to the offer.
        let text = format!(
            "*<{}|{}>*\n{} <{}|more>\n*:heavy_dollar_sign: {}*",
            listing.link,
            listing.title,
            listing.description,
            listing.link,
            price_footer(&listing.price),
        );

        let mut section = json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": text },
        });
        if let Some(thumbnail) = &listing.thumbnail {
            section["accessory"] = json!({
                "type": "image",
                "image_url": thumbnail,
                "alt_text": "Offer",
            });
        }

        json!({ "blocks": [section] })
    }
}

fn price_footer(price: &str) -> String {
    if price == "Gratis" {
        "Price: Free".to_string()
    } else {
        format!("Price: {price} CHF")
    }
}

#[async_trait::async_trait]
impl Notifier for SlackWebhookNotifier {
    async fn notify(&self, listing: &Listing) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.webhook.clone())
            .json(&Self::payload(listing))
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
