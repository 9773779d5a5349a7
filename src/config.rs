//! Bot configuration.
//!
//! A [`Config`] is read once at startup, from a TOML file with a `[wiki]`
//! and a `[walker]` table, and handed to the client and the walker. Every
//! field has a default except `wiki.api_url`.

use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::{Error, Result};

/// Largest `aplimit` the MediaWiki API accepts from ordinary accounts.
pub const MAX_API_LIMIT: usize = 500;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub wiki: WikiConfig,
    pub walker: WalkerConfig,
}

/// How to reach the wiki.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WikiConfig {
    /// Full URL of the wiki's `api.php`.
    pub api_url: String,
    /// Namespace id whose pages are walked.
    pub namespace: i32,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent. If `None`, `pagewalk/<version>` is sent.
    pub user_agent: Option<String>,
    /// Skip TLS certificate verification, for test wikis with self-signed certificates.
    pub accept_invalid_certs: bool,
    /// Send the `bot` flag with edits so they are hidden from recent changes.
    pub mark_bot_edits: bool,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            namespace: 0,
            timeout_seconds: 30,
            user_agent: None,
            accept_invalid_certs: false,
            mark_bot_edits: true,
        }
    }
}

/// How the walker moves through the catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalkerConfig {
    /// Maximum number of pages processed per run.
    pub batch_size: usize,
    /// Page whose first line stores the checkpoint. Keep it in a namespace
    /// ordinary users can't edit.
    pub checkpoint_page: String,
    pub resume: ResumeMode,
    pub on_page_error: PageErrorPolicy,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 25,
            checkpoint_page: "MediaWiki:TemplateBotInfo".into(),
            resume: ResumeMode::default(),
            on_page_error: PageErrorPolicy::default(),
        }
    }
}

/// Whether the checkpoint title is processed again on the next run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ResumeMode {
    /// The next run starts *at* the checkpoint title, so the last page of a
    /// batch is seen twice.
    #[default]
    Inclusive,
    /// The next run starts *after* the checkpoint title.
    Exclusive,
}

/// What the walker does when the page action fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PageErrorPolicy {
    /// Fail the run without moving the checkpoint.
    #[default]
    Abort,
    /// Log the title and carry on with the rest of the batch.
    Skip,
}

impl Config {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.wiki.validate()?;
        self.walker.validate()
    }
}

impl WikiConfig {
    pub fn api_url(&self) -> Result<Url> {
        if self.api_url.is_empty() {
            return Err(Error::Config("wiki.api_url must be set".into()));
        }
        Ok(Url::parse(&self.api_url)?)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "wiki.api_url must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::Config(
                "wiki.timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

impl WalkerConfig {
    /// Number of titles requested from the listing API per run.
    ///
    /// Exclusive resumes ask for one extra title to make up for dropping the
    /// checkpoint title itself.
    pub fn fetch_limit(&self) -> usize {
        match self.resume {
            ResumeMode::Inclusive => self.batch_size,
            ResumeMode::Exclusive => self.batch_size.saturating_add(1),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config(
                "walker.batch_size must be greater than 0".into(),
            ));
        }
        // A full batch of one would store its only title and restart on it forever.
        if self.resume == ResumeMode::Inclusive && self.batch_size < 2 {
            return Err(Error::Config(
                "walker.batch_size must be at least 2 with inclusive resume".into(),
            ));
        }
        if self.fetch_limit() > MAX_API_LIMIT {
            return Err(Error::Config(format!(
                "walker.batch_size is too large, the API returns at most {MAX_API_LIMIT} titles"
            )));
        }
        if self.checkpoint_page.trim().is_empty() {
            return Err(Error::Config("walker.checkpoint_page must be set".into()));
        }
        Ok(())
    }
}
