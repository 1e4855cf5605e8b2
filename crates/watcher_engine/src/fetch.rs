use std::time::Duration;

use reqwest::header::USER_AGENT;

use crate::{FailureKind, FetchError, SearchQuery};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Search results URL; the term, page and price bounds go on as query
    /// parameters.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.tutti.ch/de/li/ganze-schweiz/angebote".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches one result page (1-based) for the query and returns its body.
    async fn fetch_page(&self, query: &SearchQuery, page: u32) -> Result<String, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn page_url(&self, query: &SearchQuery, page: u32) -> Result<reqwest::Url, FetchError> {
        let mut url = reqwest::Url::parse(&self.settings.base_url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &query.term);
            pairs.append_pair("o", &page.to_string());
            if query.min_price.is_some() || query.max_price.is_some() {
                let min = query.min_price.map(|p| p.to_string()).unwrap_or_default();
                let max = query.max_price.map(|p| p.to_string()).unwrap_or_default();
                pairs.append_pair("price", &format!("{min},{max}"));
            }
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch_page(&self, query: &SearchQuery, page: u32) -> Result<String, FetchError> {
        let url = self.page_url(query, page)?;

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.settings.user_agent)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        response.text().await.map_err(map_reqwest_error)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
