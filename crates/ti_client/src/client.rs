use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::debug;
use url::Url;

use ti_core::models::{ArticleDetailResponse, ArticleListResponse};
use ti_core::{register_api, ArticlesApi, Error, Result, ARTICLES_CAPABILITY};

const USER_AGENT: &str = concat!("ti/", env!("CARGO_PKG_VERSION"));
const ENV_API_URL: &str = "TI_API_URL";
const ENV_API_KEY: &str = "TI_API_KEY";

/// Connection settings for the intelligence API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl ClientConfig {
    /// Read settings from `TI_API_URL` and `TI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let base_url = env::var(ENV_API_URL)
            .map_err(|_| Error::Config(format!("{} is not set", ENV_API_URL)))?;
        let api_key = env::var(ENV_API_KEY).ok().filter(|key| !key.is_empty());
        Ok(Self { base_url, api_key })
    }
}

/// HTTP client for the articles API.
///
/// Owns transport, auth and list-endpoint pagination. Failures are
/// propagated unchanged and no retries are attempted.
pub struct IntelClient {
    http: reqwest::Client,
    base_url: Url,
}

impl IntelClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Api-Key {}", key))
                .map_err(|e| Error::Config(format!("invalid API key: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http,
            base_url: parse_base_url(&config.base_url)?,
        })
    }

    /// Build a client from the environment and register it as the default
    /// articles capability.
    pub fn register_from_env() -> Result<Arc<Self>> {
        let client = Arc::new(Self::new(ClientConfig::from_env()?)?);
        register_api(ARTICLES_CAPABILITY, client.clone());
        Ok(client)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", path, e)))
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    // Url::join drops the last path segment when the base has no trailing
    // slash.
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).map_err(|e| Error::InvalidUrl(format!("{}: {}", raw, e)))
}

/// Fold one page into the merged listing. Returns true once the listing is
/// complete: an empty page, an unknown total, or all reported records
/// gathered.
fn accumulate(merged: &mut ArticleListResponse, page: ArticleListResponse) -> bool {
    if merged.total_records.is_none() {
        merged.total_records = page.total_records;
    }
    let batch = page.articles.unwrap_or_default();
    if batch.is_empty() {
        return true;
    }
    let collected = merged.articles.get_or_insert_with(Vec::new);
    collected.extend(batch);
    match merged.total_records {
        Some(total) => (collected.len() as u64) >= total,
        None => true,
    }
}

#[async_trait]
impl ArticlesApi for IntelClient {
    async fn get_articles(&self, created_after: NaiveDate) -> Result<ArticleListResponse> {
        let url = self.endpoint("publications/articles")?;
        let mut merged = ArticleListResponse::default();
        let mut page = 0u32;
        loop {
            debug!("fetching articles page {}", page);
            let response = self
                .http
                .get(url.clone())
                .query(&[
                    ("createdAfter", created_after.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await?
                .error_for_status()?
                .json::<ArticleListResponse>()
                .await?;
            if accumulate(&mut merged, response) {
                break;
            }
            page += 1;
        }
        Ok(merged)
    }

    async fn get_details(&self, guid: &str) -> Result<ArticleDetailResponse> {
        let url = self.endpoint(&format!("publications/article/{}", guid))?;
        Ok(self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn get_articles_for_indicator(&self, identifier: &str) -> Result<ArticleListResponse> {
        let url = self.endpoint("publications/articles/indicator")?;
        Ok(self
            .http
            .get(url)
            .query(&[("query", identifier)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ti_core::models::ArticleSummary;

    fn page(total: Option<u64>, guids: &[&str]) -> ArticleListResponse {
        ArticleListResponse {
            total_records: total,
            articles: Some(
                guids
                    .iter()
                    .map(|guid| ArticleSummary {
                        guid: Some(guid.to_string()),
                        ..Default::default()
                    })
                    .collect(),
            ),
        }
    }

    #[test]
    fn test_accumulate_single_complete_page() {
        let mut merged = ArticleListResponse::default();
        assert!(accumulate(&mut merged, page(Some(2), &["a", "b"])));
        assert_eq!(merged.total_records, Some(2));
        assert_eq!(merged.articles.unwrap().len(), 2);
    }

    #[test]
    fn test_accumulate_follows_pages_until_total() {
        let mut merged = ArticleListResponse::default();
        assert!(!accumulate(&mut merged, page(Some(3), &["a", "b"])));
        assert!(accumulate(&mut merged, page(Some(3), &["c"])));
        let articles = merged.articles.unwrap();
        let guids: Vec<_> = articles
            .iter()
            .map(|article| article.guid.as_deref().unwrap())
            .collect();
        assert_eq!(guids, vec!["a", "b", "c"]);
        assert_eq!(merged.total_records, Some(3));
    }

    #[test]
    fn test_accumulate_stops_without_reported_total() {
        let mut merged = ArticleListResponse::default();
        assert!(accumulate(&mut merged, page(None, &["a"])));
        assert!(merged.total_records.is_none());
    }

    #[test]
    fn test_accumulate_empty_page_ends_listing() {
        let mut merged = ArticleListResponse::default();
        assert!(accumulate(&mut merged, page(Some(10), &[])));
        assert!(merged.articles.is_none());
        assert_eq!(merged.total_records, Some(10));
    }

    #[test]
    fn test_base_url_normalization() {
        let client = IntelClient::new(ClientConfig {
            base_url: "https://intel.example.com/api/v2".to_string(),
            api_key: Some("secret".to_string()),
        })
        .unwrap();
        let url = client.endpoint("publications/articles").unwrap();
        assert_eq!(
            url.as_str(),
            "https://intel.example.com/api/v2/publications/articles"
        );

        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_config_from_env_requires_url() {
        // Sole test touching these variables in this binary.
        env::remove_var(ENV_API_URL);
        match ClientConfig::from_env() {
            Err(Error::Config(message)) => assert!(message.contains(ENV_API_URL)),
            other => panic!("expected config error, got {:?}", other),
        }

        env::set_var(ENV_API_URL, "https://intel.example.com/api/v2");
        env::set_var(ENV_API_KEY, "");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, "https://intel.example.com/api/v2");
        // An empty key means no auth header, not an empty one.
        assert!(config.api_key.is_none());
        env::remove_var(ENV_API_URL);
        env::remove_var(ENV_API_KEY);
    }
}
