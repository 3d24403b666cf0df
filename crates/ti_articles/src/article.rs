use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

use ti_core::models::{ArticleSummary, IndicatorGroup};
use ti_core::time::parse_timestamp;
use ti_core::{ArticlesApi, Error, Record, Result};

use crate::export::{ArticleRow, ExportOptions, RowSet};
use crate::hosts::{Hostname, IpAddress};

/// Indicator group types projected into entity wrappers.
const IP_GROUP: &str = "ip";
const DOMAIN_GROUP: &str = "domain";

/// Text fields searchable by [`Article::match_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Tags,
    Title,
    Summary,
}

impl TextField {
    /// Default search field set.
    pub const ALL: [TextField; 3] = [TextField::Tags, TextField::Title, TextField::Summary];
}

/// Tag filter input, built from a comma-separated string or a list of tags.
///
/// No trimming or case folding is applied; matching is exact.
#[derive(Debug, Clone, Default)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn tags(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for TagSet {
    fn from(input: &str) -> Self {
        Self(input.split(',').map(str::to_string).collect())
    }
}

impl From<String> for TagSet {
    fn from(input: String) -> Self {
        Self::from(input.as_str())
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        Self(tags)
    }
}

impl From<&[&str]> for TagSet {
    fn from(tags: &[&str]) -> Self {
        Self(tags.iter().map(|tag| tag.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for TagSet {
    fn from(tags: [&str; N]) -> Self {
        Self(tags.iter().map(|tag| tag.to_string()).collect())
    }
}

/// A threat intelligence article.
///
/// Constructed from one entry of a listing response. List endpoints may
/// omit the detail tier (`summary`, dates, `categories`, `tags`,
/// `indicators`); accessors that need those fields are async and hydrate
/// them through one memoized detail fetch on first use.
pub struct Article {
    api: Arc<dyn ArticlesApi>,
    guid: Option<String>,
    title: Option<String>,
    article_type: Option<String>,
    link: Option<String>,
    query: Option<String>,
    details: RwLock<Details>,
    hydrated: OnceCell<()>,
}

#[derive(Debug, Clone, Default)]
struct Details {
    summary: Option<String>,
    published_date: Option<String>,
    created_date: Option<String>,
    categories: Option<Vec<String>>,
    tags: Option<Vec<String>>,
    indicators: Option<Vec<IndicatorGroup>>,
}

impl Article {
    /// Build an article from one listing entry. Absent keys become `None`;
    /// construction never fails. `query` records the search that produced
    /// the entry and is carried into exports.
    pub fn from_summary(
        entry: ArticleSummary,
        query: Option<String>,
        api: Arc<dyn ArticlesApi>,
    ) -> Self {
        Self {
            api,
            guid: entry.guid,
            title: entry.title,
            article_type: entry.article_type,
            link: entry.link,
            query,
            details: RwLock::new(Details {
                summary: entry.summary,
                published_date: entry.published_date,
                created_date: entry.created_date,
                categories: entry.categories,
                tags: entry.tags,
                indicators: entry.indicators,
            }),
            hydrated: OnceCell::new(),
        }
    }

    /// Article unique id within the source system.
    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref()
    }

    /// Article short title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Article visibility type (public, private).
    pub fn article_type(&self) -> Option<&str> {
        self.article_type.as_deref()
    }

    /// URL of the article detail page.
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    /// Query that produced this article, when known.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Hydrate detail fields if the constructing response omitted them.
    ///
    /// An article is missing details exactly when both `summary` and
    /// `publishedDate` are absent. At most one detail fetch is performed
    /// per instance, also under concurrent first access; a failed fetch is
    /// retried on the next call.
    pub async fn ensure_details(&self) -> Result<()> {
        self.hydrated
            .get_or_try_init(|| async {
                let missing = {
                    let details = self.details.read().await;
                    details.summary.is_none() && details.published_date.is_none()
                };
                if missing {
                    self.fetch_details().await?;
                }
                Ok::<(), Error>(())
            })
            .await?;
        Ok(())
    }

    /// One-shot detail fetch; overwrites the whole detail tier.
    async fn fetch_details(&self) -> Result<()> {
        let guid = self.guid.as_deref().ok_or(Error::MissingField("guid"))?;
        debug!("fetching details for article {}", guid);
        let response = self.api.get_details(guid).await?;
        let mut details = self.details.write().await;
        details.summary = response.summary;
        details.published_date = response.published_date;
        details.created_date = response.created_date;
        details.tags = response.tags;
        details.categories = response.categories;
        details.indicators = response.indicators;
        Ok(())
    }

    /// Article summary.
    pub async fn summary(&self) -> Result<Option<String>> {
        self.ensure_details().await?;
        Ok(self.details.read().await.summary.clone())
    }

    /// Date the article was published. Timestamps without an offset are
    /// treated as UTC; a malformed value is a hard failure.
    pub async fn date_published(&self) -> Result<DateTime<Utc>> {
        self.ensure_details().await?;
        let raw = self
            .details
            .read()
            .await
            .published_date
            .clone()
            .ok_or(Error::MissingField("publishedDate"))?;
        parse_timestamp(&raw)
    }

    /// Date the article was created in the source system.
    pub async fn date_created(&self) -> Result<DateTime<Utc>> {
        self.ensure_details().await?;
        let raw = self
            .details
            .read()
            .await
            .created_date
            .clone()
            .ok_or(Error::MissingField("createdDate"))?;
        parse_timestamp(&raw)
    }

    /// Age in whole days, measured from the create date to the current
    /// time. Recomputed on every call.
    pub async fn age(&self) -> Result<i64> {
        self.age_at(Utc::now()).await
    }

    /// Age in whole days at a given instant.
    pub async fn age_at(&self, now: DateTime<Utc>) -> Result<i64> {
        Ok((now - self.date_created().await?).num_days())
    }

    /// Categories this article is listed in.
    pub async fn categories(&self) -> Result<Vec<String>> {
        self.ensure_details().await?;
        Ok(self
            .details
            .read()
            .await
            .categories
            .clone()
            .unwrap_or_default())
    }

    /// Tags attached to this article.
    pub async fn tags(&self) -> Result<Vec<String>> {
        self.ensure_details().await?;
        Ok(self.details.read().await.tags.clone().unwrap_or_default())
    }

    /// Whether this article carries the given tag (exact match).
    pub async fn has_tag(&self, tag: &str) -> Result<bool> {
        Ok(self.tags().await?.iter().any(|t| t == tag))
    }

    /// Raw indicator groups associated with this article, one group per
    /// indicator type.
    pub async fn indicators(&self) -> Result<Vec<IndicatorGroup>> {
        self.ensure_details().await?;
        Ok(self
            .details
            .read()
            .await
            .indicators
            .clone()
            .unwrap_or_default())
    }

    /// First indicator group of the given type, or a synthetic empty group
    /// when the article has none of that type.
    pub async fn indicators_by_type(&self, group_type: &str) -> Result<IndicatorGroup> {
        Ok(self
            .indicators()
            .await?
            .into_iter()
            .find(|group| group.group_type.as_deref() == Some(group_type))
            .unwrap_or_else(IndicatorGroup::empty))
    }

    /// Sum of the counts of all indicator groups.
    pub async fn indicator_count(&self) -> Result<i64> {
        Ok(self.indicators().await?.iter().map(|group| group.count).sum())
    }

    /// Types of indicators present in this article.
    pub async fn indicator_types(&self) -> Result<Vec<String>> {
        Ok(self
            .indicators()
            .await?
            .into_iter()
            .filter_map(|group| group.group_type)
            .collect())
    }

    /// IP addresses referenced by this article, wrapped as indicator
    /// entities.
    pub async fn ips(&self) -> Result<Vec<IpAddress>> {
        Ok(self
            .indicators_by_type(IP_GROUP)
            .await?
            .values
            .into_iter()
            .map(IpAddress::new)
            .collect())
    }

    /// Hostnames referenced by this article, wrapped as indicator entities.
    pub async fn hostnames(&self) -> Result<Vec<Hostname>> {
        Ok(self
            .indicators_by_type(DOMAIN_GROUP)
            .await?
            .values
            .into_iter()
            .map(Hostname::new)
            .collect())
    }

    /// Whether any of the given tags exactly matches one of this article's
    /// tags. Matching is case-sensitive.
    pub async fn match_tags(&self, tags: impl Into<TagSet>) -> Result<bool> {
        let wanted = tags.into();
        let own = self.tags().await?;
        Ok(wanted.tags().iter().any(|tag| own.iter().any(|t| t == tag)))
    }

    /// Case-insensitive substring search across the given text fields.
    ///
    /// `title` and `summary` are searched as whole fields, tags one by one.
    /// Returns true on the first hit.
    pub async fn match_text(&self, text: &str, fields: &[TextField]) -> Result<bool> {
        let needle = text.to_lowercase();
        if fields.contains(&TextField::Title) {
            if let Some(title) = &self.title {
                if title.to_lowercase().contains(&needle) {
                    return Ok(true);
                }
            }
        }
        if fields.contains(&TextField::Summary) {
            if let Some(summary) = self.summary().await? {
                if summary.to_lowercase().contains(&needle) {
                    return Ok(true);
                }
            }
        }
        if fields.contains(&TextField::Tags) {
            for tag in self.tags().await? {
                if tag.to_lowercase().contains(&needle) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    pub(crate) async fn export_row(&self, options: ExportOptions) -> Result<ArticleRow> {
        // Indicator columns come from the detail tier.
        if options.ensure_details || options.include_indicators {
            self.ensure_details().await?;
        }
        let details = self.details.read().await;
        let indicators = if options.include_indicators {
            let groups = details.indicators.clone().unwrap_or_default();
            Some(serde_json::to_string(&groups)?)
        } else {
            None
        };
        let indicator_count = details
            .indicators
            .as_ref()
            .map(|groups| groups.iter().map(|group| group.count).sum())
            .unwrap_or(0);
        Ok(ArticleRow {
            query: self.query.clone(),
            guid: self.guid.clone(),
            title: self.title.clone(),
            article_type: self.article_type.clone(),
            date_published: details.published_date.clone(),
            date_created: details.created_date.clone(),
            summary: details.summary.clone(),
            link: self.link.clone(),
            categories: details.categories.as_ref().map(|list| list.join(", ")),
            tags: details.tags.as_ref().map(|list| list.join(", ")),
            indicators,
            indicator_count,
        })
    }

    /// Project this article into a single-row dataframe.
    pub async fn to_dataframe(&self, options: ExportOptions) -> Result<DataFrame> {
        let mut rows = RowSet::default();
        rows.push(self.export_row(options).await?);
        rows.into_dataframe(options.include_indicators)
    }
}

impl Record for Article {
    fn record_id(&self) -> Option<&str> {
        self.guid()
    }

    fn source_query(&self) -> Option<&str> {
        self.query()
    }
}

impl fmt::Display for Article {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title.as_deref().unwrap_or_default())
    }
}

impl fmt::Debug for Article {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Article")
            .field("guid", &self.guid)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}
