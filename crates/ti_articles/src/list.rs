use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use tracing::{debug, info};

use ti_core::models::ArticleListResponse;
use ti_core::{config, get_api, ArticlesApi, RecordList, Result, ARTICLES_CAPABILITY};

use crate::article::{Article, TagSet, TextField};
use crate::export::{ExportOptions, RowSet};

/// Sort keys supported by article lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Age,
    Title,
    Type,
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Age(i64),
    Text(Option<String>),
}

/// List of threat intelligence articles parsed from one API response.
///
/// Records are held behind `Arc` so that filtered and re-sorted derivatives
/// share the parent's articles, including their hydration state.
pub struct ArticlesList {
    api: Arc<dyn ArticlesApi>,
    total_records: Option<u64>,
    query: Option<String>,
    records: Vec<Arc<Article>>,
}

impl ArticlesList {
    /// Empty list bound to an API handle.
    pub fn new(query: Option<String>, api: Arc<dyn ArticlesApi>) -> Self {
        Self {
            api,
            total_records: None,
            query,
            records: Vec::new(),
        }
    }

    /// Parse a listing response, replacing any existing record sequence.
    ///
    /// An empty or absent `articles` array parses to an empty list;
    /// `total_records` is kept exactly as reported and may exceed the
    /// number of records present.
    pub fn parse(&mut self, response: ArticleListResponse) {
        self.total_records = response.total_records;
        self.records = response
            .articles
            .unwrap_or_default()
            .into_iter()
            .map(|entry| {
                Arc::new(Article::from_summary(
                    entry,
                    self.query.clone(),
                    self.api.clone(),
                ))
            })
            .collect();
    }

    /// List built directly from a listing response.
    pub fn from_response(
        response: ArticleListResponse,
        query: Option<String>,
        api: Arc<dyn ArticlesApi>,
    ) -> Self {
        let mut list = Self::new(query, api);
        list.parse(response);
        list
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Article>> {
        self.records.iter()
    }

    /// Articles with an exact match on at least one of the given tags.
    ///
    /// Matching may hydrate articles whose tags were not part of the
    /// constructing response. The parent list is left untouched and the
    /// derivative can be iterated any number of times.
    pub async fn filter_tags(&self, tags: impl Into<TagSet>) -> Result<ArticlesList> {
        let tags = tags.into();
        let mut matched = Vec::new();
        for record in &self.records {
            if record.match_tags(tags.clone()).await? {
                matched.push(record.clone());
            }
        }
        debug!(
            "tag filter kept {} of {} articles",
            matched.len(),
            self.records.len()
        );
        Ok(self.with_records(matched))
    }

    /// Articles containing `text` in one of the given fields.
    pub async fn filter_text(&self, text: &str, fields: &[TextField]) -> Result<ArticlesList> {
        let mut matched = Vec::new();
        for record in &self.records {
            if record.match_text(text, fields).await? {
                matched.push(record.clone());
            }
        }
        debug!(
            "text filter kept {} of {} articles",
            matched.len(),
            self.records.len()
        );
        Ok(self.with_records(matched))
    }

    /// Re-sorted copy of this list. Sorting by age hydrates every article
    /// and fails if a create date is missing or malformed.
    pub async fn sorted_by(&self, key: SortKey, descending: bool) -> Result<ArticlesList> {
        let mut keyed: Vec<(SortValue, Arc<Article>)> = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let value = match key {
                SortKey::Age => SortValue::Age(record.age().await?),
                SortKey::Title => SortValue::Text(record.title().map(str::to_string)),
                SortKey::Type => SortValue::Text(record.article_type().map(str::to_string)),
            };
            keyed.push((value, record.clone()));
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        if descending {
            keyed.reverse();
        }
        Ok(self.with_records(keyed.into_iter().map(|(_, record)| record).collect()))
    }

    /// Project all records into a dataframe, one row per article.
    pub async fn to_dataframe(&self, options: ExportOptions) -> Result<DataFrame> {
        let mut rows = RowSet::default();
        for record in &self.records {
            rows.push(record.export_row(options).await?);
        }
        rows.into_dataframe(options.include_indicators)
    }
}

impl RecordList for ArticlesList {
    type Item = Article;

    fn total_records(&self) -> Option<u64> {
        self.total_records
    }

    fn source_query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    fn records(&self) -> &[Arc<Article>] {
        &self.records
    }

    /// Copies exactly the declared scalar metadata: the reported total and
    /// the source query.
    fn with_records(&self, records: Vec<Arc<Article>>) -> Self {
        Self {
            api: self.api.clone(),
            total_records: self.total_records,
            query: self.query.clone(),
            records,
        }
    }
}

impl fmt::Debug for ArticlesList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArticlesList")
            .field("total_records", &self.total_records)
            .field("query", &self.query)
            .field("records", &self.records.len())
            .finish()
    }
}

/// All articles created after a date, loaded at construction time.
///
/// The bound defaults to the process-wide configured start of range; see
/// [`ti_core::config::set_date_range`].
pub struct AllArticles {
    list: ArticlesList,
}

impl AllArticles {
    /// Load through the registered articles API.
    pub async fn new(created_after: Option<NaiveDate>) -> Result<Self> {
        Self::with_api(get_api(ARTICLES_CAPABILITY)?, created_after).await
    }

    /// Load through an explicit API handle.
    pub async fn with_api(
        api: Arc<dyn ArticlesApi>,
        created_after: Option<NaiveDate>,
    ) -> Result<Self> {
        let mut all = Self::empty(api);
        all.load(created_after).await?;
        Ok(all)
    }

    /// Unloaded list; call [`AllArticles::load`] to populate it.
    pub fn empty(api: Arc<dyn ArticlesApi>) -> Self {
        Self {
            list: ArticlesList::new(None, api),
        }
    }

    /// Query the API and parse the response, replacing current records.
    pub async fn load(&mut self, created_after: Option<NaiveDate>) -> Result<()> {
        let created_after = created_after.unwrap_or_else(config::start_date);
        let response = self.list.api.get_articles(created_after).await?;
        self.list.parse(response);
        info!(
            "📚 Loaded {} of {} articles created after {}",
            self.list.len(),
            self.list
                .total_records()
                .unwrap_or(self.list.len() as u64),
            created_after
        );
        Ok(())
    }
}

impl Deref for AllArticles {
    type Target = ArticlesList;

    fn deref(&self) -> &ArticlesList {
        &self.list
    }
}
