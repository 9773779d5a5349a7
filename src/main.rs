use std::path::PathBuf;

use chrono::Local;
use clap::Parser;
use pagewalk::{
    info_time, Config, InspectPage, MediaWikiClient, PageErrorPolicy, PageWalker, ResumeMode,
    Result,
};
use tracing_subscriber::EnvFilter;

/// Walks the next batch of wiki pages and stores where to resume.
#[derive(Debug, Parser)]
#[command(name = "pagewalk", version)]
struct Cli {
    /// TOML config file with `[wiki]` and `[walker]` tables.
    #[arg(long, short, value_name = "PATH")]
    config: Option<PathBuf>,
    /// URL of the wiki's api.php.
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
    #[arg(long)]
    batch_size: Option<usize>,
    #[arg(long, value_name = "TITLE")]
    checkpoint_page: Option<String>,
    #[arg(long, value_enum)]
    resume: Option<ResumeMode>,
    #[arg(long, value_enum)]
    on_page_error: Option<PageErrorPolicy>,
    /// Don't verify TLS certificates.
    #[arg(long)]
    accept_invalid_certs: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(api_url) = self.api_url {
            config.wiki.api_url = api_url;
        }
        if let Some(batch_size) = self.batch_size {
            config.walker.batch_size = batch_size;
        }
        if let Some(page) = self.checkpoint_page {
            config.walker.checkpoint_page = page;
        }
        if let Some(resume) = self.resume {
            config.walker.resume = resume;
        }
        if let Some(policy) = self.on_page_error {
            config.walker.on_page_error = policy;
        }
        config.wiki.accept_invalid_certs |= self.accept_invalid_certs;
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let start_time = Local::now();
    let config = Cli::parse().into_config()?;
    let client = MediaWikiClient::new(&config.wiki)?;
    info_time!("Walking {}", client.api_url());

    let mut walker = PageWalker::new(client, InspectPage::new(), config.walker)?;
    let report = walker.run().await.inspect_err(|e| {
        tracing::error!(error = %e, "run failed");
    })?;
    if report.wrapped() {
        info_time!("Reached the end of the catalog, next run starts over");
    }
    info_time!(start_time, "Full program time:");

    Ok(())
}
