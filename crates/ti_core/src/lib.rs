pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod records;
pub mod time;

pub use api::{get_api, register_api, ArticlesApi, ARTICLES_CAPABILITY};
pub use error::{Error, Result};
pub use records::{Record, RecordList};
