//! The resumable page walker.
//!
//! Each [`PageWalker::run`] handles one window of at most `batch_size`
//! titles, starting at the title stored on the checkpoint page, and stores
//! where the next run should pick up. When the listing comes back shorter
//! than requested the catalog is exhausted and the checkpoint wraps around
//! to the start.
//!
//! The checkpoint page is written once, after the whole batch. A run that
//! fails earlier leaves it untouched, so pages are processed at least once,
//! not exactly once. Nothing guards the checkpoint against two walkers
//! running at the same time: schedule exactly one instance.

use chrono::Local;

use crate::action::PageAction;
use crate::checkpoint::{Checkpoint, CHECKPOINT_SUMMARY};
use crate::config::{PageErrorPolicy, ResumeMode, WalkerConfig};
use crate::store::DocumentStore;
use crate::{info_time, Error, Result};

/// What a single run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Checkpoint read at the start of the run.
    pub started_from: Checkpoint,
    /// Checkpoint stored at the end of the run.
    pub next: Checkpoint,
    /// Titles the action completed on, in walk order.
    pub processed: Vec<String>,
    /// Titles the action failed on and that were skipped.
    pub skipped: Vec<String>,
}

impl RunReport {
    /// Whether the run reached the end of the catalog.
    pub fn wrapped(&self) -> bool {
        self.next.is_start()
    }
}

pub struct PageWalker<S, A> {
    store: S,
    action: A,
    config: WalkerConfig,
}

impl<S: DocumentStore, A: PageAction> PageWalker<S, A> {
    /// Fails if `config` doesn't pass [`WalkerConfig::validate`].
    pub fn new(store: S, action: A, config: WalkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            action,
            config,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn into_parts(self) -> (S, A) {
        (self.store, self.action)
    }

    /// Runs the action over the next batch of pages and stores the new checkpoint.
    pub async fn run(&mut self) -> Result<RunReport> {
        let start_time = Local::now();
        let started_from = self.read_checkpoint().await;
        info_time!("Starting from: {}", started_from);

        let limit = self.config.fetch_limit();
        let fetched = self.store.list_pages(started_from.as_str(), limit).await?;
        // Fewer titles than asked for is the only end-of-catalog signal the API gives.
        let exhausted = fetched.len() < limit;
        let batch = self.plan_batch(fetched, &started_from);
        tracing::debug!(count = batch.len(), exhausted, "fetched batch");

        let mut processed = Vec::with_capacity(batch.len());
        let mut skipped = Vec::new();
        for title in &batch {
            match self.action.process(title, &self.store).await {
                Ok(()) => processed.push(title.clone()),
                Err(err) => match self.config.on_page_error {
                    PageErrorPolicy::Abort => return Err(Error::page_action(title, err)),
                    PageErrorPolicy::Skip => {
                        tracing::warn!(title = %title, error = %err, "page action failed, skipping");
                        skipped.push(title.clone());
                    }
                },
            }
        }

        let next = Checkpoint::after_batch(batch.last().map(String::as_str), exhausted);
        self.store
            .write_page(&self.config.checkpoint_page, next.as_str(), CHECKPOINT_SUMMARY)
            .await?;

        info_time!(
            start_time,
            "Walked {} pages ({} skipped), next start: {}",
            processed.len(),
            skipped.len(),
            next
        );
        Ok(RunReport {
            started_from,
            next,
            processed,
            skipped,
        })
    }

    /// A missing or unreadable checkpoint page starts over from the beginning
    /// instead of failing, so a fresh bot needs no setup.
    async fn read_checkpoint(&self) -> Checkpoint {
        let page = &self.config.checkpoint_page;
        match self.store.read_page(page).await {
            Ok(Some(text)) => Checkpoint::from_page_text(&text),
            Ok(None) => {
                tracing::warn!(page = %page, "checkpoint page is missing, starting from the beginning");
                Checkpoint::start()
            }
            Err(err) => {
                tracing::warn!(page = %page, error = %err, "couldn't read the checkpoint page, starting from the beginning");
                Checkpoint::start()
            }
        }
    }

    fn plan_batch(&self, mut fetched: Vec<String>, from: &Checkpoint) -> Vec<String> {
        if self.config.resume == ResumeMode::Exclusive
            && !from.is_start()
            && fetched.first().map(String::as_str) == Some(from.as_str())
        {
            fetched.remove(0);
        }
        fetched.truncate(self.config.batch_size);
        fetched
    }
}
