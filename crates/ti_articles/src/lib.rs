pub mod article;
pub mod export;
pub mod hosts;
pub mod list;

#[cfg(test)]
pub(crate) mod testing;

pub use article::{Article, TagSet, TextField};
pub use export::ExportOptions;
pub use hosts::{HasArticles, Hostname, IpAddress};
pub use list::{AllArticles, ArticlesList, SortKey};

pub mod prelude {
    pub use super::article::{Article, TagSet, TextField};
    pub use super::export::ExportOptions;
    pub use super::hosts::{HasArticles, Hostname, IpAddress};
    pub use super::list::{AllArticles, ArticlesList, SortKey};
    pub use ti_core::{Record, RecordList, Result};
}
