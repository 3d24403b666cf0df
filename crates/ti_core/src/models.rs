use serde::{Deserialize, Serialize};

/// One bulk response from an article listing endpoint.
///
/// `total_records` is the count reported by the API and may exceed the
/// number of entries actually present in `articles`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListResponse {
    pub total_records: Option<u64>,
    pub articles: Option<Vec<ArticleSummary>>,
}

/// One article entry as returned by a listing endpoint.
///
/// Detail-tier fields (`summary`, `published_date`, `created_date`,
/// `categories`, `tags`, `indicators`) may be absent depending on which
/// endpoint produced the entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub guid: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub article_type: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub published_date: Option<String>,
    pub created_date: Option<String>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub indicators: Option<Vec<IndicatorGroup>>,
}

/// Detail endpoint payload used to hydrate an article.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetailResponse {
    pub summary: Option<String>,
    pub published_date: Option<String>,
    pub created_date: Option<String>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub indicators: Option<Vec<IndicatorGroup>>,
}

/// Indicators referenced by an article, grouped by indicator type.
///
/// At most one group per type is expected in a response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorGroup {
    #[serde(rename = "type")]
    pub group_type: Option<String>,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub values: Vec<String>,
}

impl IndicatorGroup {
    /// Placeholder returned when no group of a requested type exists.
    pub fn empty() -> Self {
        Self {
            group_type: None,
            count: 0,
            values: Vec::new(),
        }
    }
}
