use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use ti_core::{get_api, ArticlesApi, Result, ARTICLES_CAPABILITY};

use crate::list::ArticlesList;

/// Capability for entities that may appear as indicators of compromise in
/// published articles.
///
/// Hosts supply their canonical identifier and own a memoization slot; the
/// provided [`HasArticles::articles`] method performs one indicator query on
/// first access and caches the resulting list for the lifetime of the
/// entity. There is no invalidation.
#[async_trait]
pub trait HasArticles {
    /// Canonical identifier used to search article indicator references.
    fn host_identifier(&self) -> &str;

    /// Memoization slot owned by the host entity.
    fn articles_cache(&self) -> &OnceCell<ArticlesList>;

    /// API handle used for the lookup; defaults to the registered articles
    /// capability.
    fn articles_api(&self) -> Result<Arc<dyn ArticlesApi>> {
        get_api(ARTICLES_CAPABILITY)
    }

    /// Articles that reference this entity as an indicator.
    async fn articles(&self) -> Result<&ArticlesList> {
        self.articles_cache()
            .get_or_try_init(|| async {
                let api = self.articles_api()?;
                let identifier = self.host_identifier();
                debug!("querying articles referencing {}", identifier);
                let response = api.get_articles_for_indicator(identifier).await?;
                Ok(ArticlesList::from_response(
                    response,
                    Some(identifier.to_string()),
                    api,
                ))
            })
            .await
    }
}

/// An IP address that may be referenced by articles as an indicator.
#[derive(Debug)]
pub struct IpAddress {
    value: String,
    articles: OnceCell<ArticlesList>,
}

impl IpAddress {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            articles: OnceCell::new(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[async_trait]
impl HasArticles for IpAddress {
    fn host_identifier(&self) -> &str {
        &self.value
    }

    fn articles_cache(&self) -> &OnceCell<ArticlesList> {
        &self.articles
    }
}

/// A hostname that may be referenced by articles as an indicator.
#[derive(Debug)]
pub struct Hostname {
    value: String,
    articles: OnceCell<ArticlesList>,
}

impl Hostname {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            articles: OnceCell::new(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[async_trait]
impl HasArticles for Hostname {
    fn host_identifier(&self) -> &str {
        &self.value
    }

    fn articles_cache(&self) -> &OnceCell<ArticlesList> {
        &self.articles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entry, list_response, StubApi};
    use std::sync::atomic::Ordering;
    use ti_core::{Record, RecordList};

    /// Host with an overridden API handle, bypassing the global registry.
    struct StubHost {
        identifier: String,
        api: Arc<StubApi>,
        cache: OnceCell<ArticlesList>,
    }

    #[async_trait]
    impl HasArticles for StubHost {
        fn host_identifier(&self) -> &str {
            &self.identifier
        }

        fn articles_cache(&self) -> &OnceCell<ArticlesList> {
            &self.cache
        }

        fn articles_api(&self) -> Result<Arc<dyn ArticlesApi>> {
            Ok(self.api.clone())
        }
    }

    #[tokio::test]
    async fn test_articles_are_memoized_per_host() {
        let api = Arc::new(StubApi::default().with_indicator(list_response(
            Some(2),
            vec![entry("a-1", "One"), entry("a-2", "Two")],
        )));
        let host = StubHost {
            identifier: "203.0.113.7".to_string(),
            api: api.clone(),
            cache: OnceCell::new(),
        };

        let articles = host.articles().await.unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles.source_query(), Some("203.0.113.7"));
        // The identifier is stamped onto each record for provenance.
        assert_eq!(
            articles.get(0).unwrap().source_query(),
            Some("203.0.113.7")
        );

        let again = host.articles().await.unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(api.indicator_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *api.last_indicator.lock().unwrap(),
            Some("203.0.113.7".to_string())
        );
    }

    // Single test for the registry-backed default path; IpAddress and
    // Hostname share the one registration to avoid cross-test races on the
    // global registry.
    #[tokio::test]
    async fn test_entity_wrappers_use_registered_capability() {
        let api = Arc::new(
            StubApi::default().with_indicator(list_response(Some(1), vec![entry("a-1", "One")])),
        );
        ti_core::register_api(ARTICLES_CAPABILITY, api.clone());

        let ip = IpAddress::new("198.51.100.4");
        assert_eq!(ip.to_string(), "198.51.100.4");
        assert_eq!(ip.articles().await.unwrap().len(), 1);
        assert_eq!(ip.articles().await.unwrap().len(), 1);

        let host = Hostname::new("bad.example.com");
        assert_eq!(host.value(), "bad.example.com");
        assert_eq!(host.articles().await.unwrap().len(), 1);

        // One query per entity, not per access.
        assert_eq!(api.indicator_calls.load(Ordering::SeqCst), 2);
    }
}
