use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use ti_articles::prelude::*;
use ti_client::IntelClient;
use ti_core::models::ArticleSummary;

#[derive(Parser)]
#[command(name = "ti", version, about = "Threat intelligence article explorer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List articles created after a date
    List {
        /// Only articles created after this date (defaults to the
        /// process-wide look-back window)
        #[arg(long)]
        created_after: Option<NaiveDate>,
        /// Keep articles with an exact match on one of these
        /// comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Keep articles containing this text in tags, title or summary
        #[arg(long)]
        text: Option<String>,
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        #[arg(long)]
        descending: bool,
        /// Append indicator columns to the output
        #[arg(long)]
        indicators: bool,
    },
    /// Show one article with full details
    Show { guid: String },
    /// List articles referencing an indicator value
    Indicator { value: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Age,
    Title,
    Type,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Age => SortKey::Age,
            SortArg::Title => SortKey::Title,
            SortArg::Type => SortKey::Type,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    IntelClient::register_from_env().context("failed to initialize the articles API client")?;

    match cli.command {
        Commands::List {
            created_after,
            tags,
            text,
            sort,
            descending,
            indicators,
        } => {
            let articles = AllArticles::new(created_after).await?;
            let mut list = match tags {
                Some(tags) => articles.filter_tags(tags).await?,
                None => articles.with_records(articles.records().to_vec()),
            };
            if let Some(text) = text {
                list = list.filter_text(&text, &TextField::ALL).await?;
            }
            if let Some(sort) = sort {
                list = list.sorted_by(sort.into(), descending).await?;
            }
            info!("🔎 {} of {} articles match", list.len(), articles.len());
            let df = list
                .to_dataframe(ExportOptions::new().with_indicators(indicators))
                .await?;
            println!("{}", df);
        }
        Commands::Show { guid } => {
            let api = ti_core::get_api(ti_core::ARTICLES_CAPABILITY)?;
            let article = Article::from_summary(
                ArticleSummary {
                    guid: Some(guid),
                    ..Default::default()
                },
                None,
                api,
            );
            let df = article
                .to_dataframe(ExportOptions::new().with_indicators(true))
                .await?;
            println!("{}", df);
        }
        Commands::Indicator { value } => {
            let df = if value.parse::<std::net::IpAddr>().is_ok() {
                let host = IpAddress::new(value);
                let articles = host.articles().await?;
                info!("📚 {} articles reference IP {}", articles.len(), host);
                articles.to_dataframe(ExportOptions::default()).await?
            } else {
                let host = Hostname::new(value);
                let articles = host.articles().await?;
                info!("📚 {} articles reference hostname {}", articles.len(), host);
                articles.to_dataframe(ExportOptions::default()).await?
            };
            println!("{}", df);
        }
    }

    Ok(())
}
