use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{ArticleDetailResponse, ArticleListResponse};
use crate::{Error, Result};

/// Capability name the articles API client registers under.
pub const ARTICLES_CAPABILITY: &str = "articles";

/// Remote articles API surface consumed by the data model.
///
/// Implementations own transport, auth and response pagination. This layer
/// issues one logical request per operation, performs no retries, and
/// propagates transport failures unchanged.
#[async_trait]
pub trait ArticlesApi: Send + Sync {
    /// Articles created after the given date.
    async fn get_articles(&self, created_after: NaiveDate) -> Result<ArticleListResponse>;

    /// Full detail payload for one article.
    async fn get_details(&self, guid: &str) -> Result<ArticleDetailResponse>;

    /// Articles that reference the given indicator value.
    async fn get_articles_for_indicator(&self, identifier: &str) -> Result<ArticleListResponse>;
}

fn registry() -> &'static RwLock<HashMap<String, Arc<dyn ArticlesApi>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<dyn ArticlesApi>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Register an API client under a capability name, replacing any previous
/// registration.
pub fn register_api(name: &str, api: Arc<dyn ArticlesApi>) {
    registry()
        .write()
        .expect("api registry lock poisoned")
        .insert(name.to_string(), api);
}

/// Look up a registered API client by capability name.
pub fn get_api(name: &str) -> Result<Arc<dyn ArticlesApi>> {
    registry()
        .read()
        .expect("api registry lock poisoned")
        .get(name)
        .cloned()
        .ok_or_else(|| Error::UnknownCapability(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullApi;

    #[async_trait]
    impl ArticlesApi for NullApi {
        async fn get_articles(&self, _created_after: NaiveDate) -> Result<ArticleListResponse> {
            Ok(ArticleListResponse::default())
        }

        async fn get_details(&self, _guid: &str) -> Result<ArticleDetailResponse> {
            Ok(ArticleDetailResponse::default())
        }

        async fn get_articles_for_indicator(
            &self,
            _identifier: &str,
        ) -> Result<ArticleListResponse> {
            Ok(ArticleListResponse::default())
        }
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        register_api("articles-test", Arc::new(NullApi));
        let api = get_api("articles-test").unwrap();
        let response = api.get_articles(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).await;
        assert!(response.is_ok());

        match get_api("no-such-capability") {
            Err(Error::UnknownCapability(name)) => assert_eq!(name, "no-such-capability"),
            other => panic!("unexpected lookup result: {:?}", other.map(|_| ())),
        }
    }
}
