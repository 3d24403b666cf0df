use polars::prelude::*;

use ti_core::{Error, Result};

/// Options for tabular export.
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Hydrate detail fields before projecting. On by default.
    pub ensure_details: bool,
    /// Append the raw indicator groups and their total count as two extra
    /// columns. Off by default. Indicator columns come from the detail
    /// tier, so requesting them hydrates regardless of `ensure_details`.
    pub include_indicators: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            ensure_details: true,
            include_indicators: false,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ensure_details(mut self, ensure: bool) -> Self {
        self.ensure_details = ensure;
        self
    }

    pub fn with_indicators(mut self, include: bool) -> Self {
        self.include_indicators = include;
        self
    }
}

/// One article projected into flat cell values, in export column order.
#[derive(Debug, Clone)]
pub(crate) struct ArticleRow {
    pub query: Option<String>,
    pub guid: Option<String>,
    pub title: Option<String>,
    pub article_type: Option<String>,
    pub date_published: Option<String>,
    pub date_created: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
    pub categories: Option<String>,
    pub tags: Option<String>,
    pub indicators: Option<String>,
    pub indicator_count: i64,
}

/// Columnar accumulator shared by article- and list-level export.
#[derive(Debug, Default)]
pub(crate) struct RowSet {
    query: Vec<Option<String>>,
    guid: Vec<Option<String>>,
    title: Vec<Option<String>>,
    article_type: Vec<Option<String>>,
    date_published: Vec<Option<String>>,
    date_created: Vec<Option<String>>,
    summary: Vec<Option<String>>,
    link: Vec<Option<String>>,
    categories: Vec<Option<String>>,
    tags: Vec<Option<String>>,
    indicators: Vec<Option<String>>,
    indicator_count: Vec<i64>,
}

impl RowSet {
    pub fn push(&mut self, row: ArticleRow) {
        self.query.push(row.query);
        self.guid.push(row.guid);
        self.title.push(row.title);
        self.article_type.push(row.article_type);
        self.date_published.push(row.date_published);
        self.date_created.push(row.date_created);
        self.summary.push(row.summary);
        self.link.push(row.link);
        self.categories.push(row.categories);
        self.tags.push(row.tags);
        self.indicators.push(row.indicators);
        self.indicator_count.push(row.indicator_count);
    }

    /// Build the dataframe with the fixed column order `query, guid, title,
    /// type, date_published, date_created, summary, link, categories, tags`,
    /// appending `indicators` and `indicator_count` when requested.
    pub fn into_dataframe(self, include_indicators: bool) -> Result<DataFrame> {
        let mut df = df!(
            "query" => self.query,
            "guid" => self.guid,
            "title" => self.title,
            "type" => self.article_type,
            "date_published" => self.date_published,
            "date_created" => self.date_created,
            "summary" => self.summary,
            "link" => self.link,
            "categories" => self.categories,
            "tags" => self.tags
        )
        .map_err(|e| Error::Export(e.to_string()))?;
        if include_indicators {
            df.with_column(Series::new("indicators".into(), self.indicators))
                .map_err(|e| Error::Export(e.to_string()))?;
            df.with_column(Series::new("indicator_count".into(), self.indicator_count))
                .map_err(|e| Error::Export(e.to_string()))?;
        }
        Ok(df)
    }
}
