//! Canned API client for tests that need hydration accounting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use ti_core::models::{
    ArticleDetailResponse, ArticleListResponse, ArticleSummary, IndicatorGroup,
};
use ti_core::{ArticlesApi, Result};

#[derive(Default)]
pub struct StubApi {
    pub list_response: ArticleListResponse,
    pub detail_response: ArticleDetailResponse,
    pub indicator_response: ArticleListResponse,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub indicator_calls: AtomicUsize,
    pub last_created_after: Mutex<Option<NaiveDate>>,
    pub last_indicator: Mutex<Option<String>>,
}

impl StubApi {
    pub fn with_list(mut self, response: ArticleListResponse) -> Self {
        self.list_response = response;
        self
    }

    pub fn with_details(mut self, response: ArticleDetailResponse) -> Self {
        self.detail_response = response;
        self
    }

    pub fn with_indicator(mut self, response: ArticleListResponse) -> Self {
        self.indicator_response = response;
        self
    }
}

#[async_trait]
impl ArticlesApi for StubApi {
    async fn get_articles(&self, created_after: NaiveDate) -> Result<ArticleListResponse> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_created_after.lock().unwrap() = Some(created_after);
        Ok(self.list_response.clone())
    }

    async fn get_details(&self, _guid: &str) -> Result<ArticleDetailResponse> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detail_response.clone())
    }

    async fn get_articles_for_indicator(&self, identifier: &str) -> Result<ArticleListResponse> {
        self.indicator_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_indicator.lock().unwrap() = Some(identifier.to_string());
        Ok(self.indicator_response.clone())
    }
}

/// Listing entry carrying only the always-present tier.
pub fn entry(guid: &str, title: &str) -> ArticleSummary {
    ArticleSummary {
        guid: Some(guid.to_string()),
        title: Some(title.to_string()),
        article_type: Some("public".to_string()),
        link: Some(format!("https://intel.example/articles/{}", guid)),
        ..Default::default()
    }
}

/// Listing entry that already carries the detail tier, so no hydration is
/// needed.
pub fn hydrated_entry(guid: &str, title: &str) -> ArticleSummary {
    let mut entry = entry(guid, title);
    entry.summary = Some(format!("Summary of {}.", title));
    entry.published_date = Some("2024-03-01T08:00:00+00:00".to_string());
    entry.created_date = Some("2024-02-20T00:00:00+00:00".to_string());
    entry.tags = Some(vec!["apt".to_string(), "phishing".to_string()]);
    entry.categories = Some(vec!["malware".to_string()]);
    entry
}

/// Detail payload matching what the listing endpoints omit.
pub fn detail_response() -> ArticleDetailResponse {
    ArticleDetailResponse {
        summary: Some("A long-running campaign.".to_string()),
        published_date: Some("2024-03-01T08:00:00+00:00".to_string()),
        created_date: Some("2024-02-20T00:00:00+00:00".to_string()),
        tags: Some(vec!["apt".to_string(), "phishing".to_string()]),
        categories: Some(vec!["malware".to_string()]),
        indicators: Some(vec![
            IndicatorGroup {
                group_type: Some("ip".to_string()),
                count: 2,
                values: vec!["203.0.113.7".to_string(), "203.0.113.9".to_string()],
            },
            IndicatorGroup {
                group_type: Some("domain".to_string()),
                count: 1,
                values: vec!["bad.example.com".to_string()],
            },
        ]),
    }
}

/// Listing response wrapping the given entries.
pub fn list_response(total: Option<u64>, entries: Vec<ArticleSummary>) -> ArticleListResponse {
    ArticleListResponse {
        total_records: total,
        articles: Some(entries),
    }
}
