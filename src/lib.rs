//! Resumable, alphabetical page walker for MediaWiki bots.
//!
//! A bot walks a bounded batch of pages per run, applies its [`PageAction`]
//! to each and stores the title to resume from on a checkpoint page. Once the
//! catalog is exhausted the next run wraps around to the first page.

pub mod action;
pub mod checkpoint;
pub mod config;
mod error;
pub mod http;
mod macros;
pub mod mediawiki;
pub mod store;
pub mod walker;

pub use action::{InspectPage, PageAction};
pub use checkpoint::Checkpoint;
pub use config::{Config, PageErrorPolicy, ResumeMode, WalkerConfig, WikiConfig};
pub use error::{Error, Result};
pub use mediawiki::MediaWikiClient;
pub use store::{DocumentStore, MemoryStore};
pub use walker::{PageWalker, RunReport};
