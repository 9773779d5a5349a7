//! The document store the walker runs against.
//!
//! [`DocumentStore`] is the seam between the walker and the wiki:
//! [`MediaWikiClient`](crate::mediawiki::MediaWikiClient) talks to a live
//! wiki, [`MemoryStore`] keeps everything in a `BTreeMap` for dry runs and
//! tests of concrete bots.

use std::collections::BTreeMap;
use std::future::Future;
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard};

use crate::Result;

/// Read/write access to the pages of a wiki.
pub trait DocumentStore: Send + Sync {
    /// Returns up to `limit` titles in ascending order, starting at the first
    /// title `>= start`. An empty `start` lists from the first title.
    fn list_pages(
        &self,
        start: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Returns the text of a page, or `None` if the page doesn't exist.
    fn read_page(&self, title: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Overwrites the text of a page, recording `summary` as the edit note.
    fn write_page(
        &self,
        title: &str,
        content: &str,
        summary: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// An edit recorded by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub title: String,
    pub content: String,
    pub summary: String,
}

/// Namespace prefixes of a stock MediaWiki install. A title starting with
/// one of these followed by `:` is outside the main namespace.
pub const STANDARD_NAMESPACES: &[&str] = &[
    "Talk",
    "User",
    "User talk",
    "Project",
    "Project talk",
    "File",
    "File talk",
    "MediaWiki",
    "MediaWiki talk",
    "Template",
    "Template talk",
    "Help",
    "Help talk",
    "Category",
    "Category talk",
];

/// In-memory [`DocumentStore`]. Titles are ordered byte-wise, like the
/// default `uppercase` collation of MediaWiki.
///
/// Like `list=allpages`, listing only returns titles of one namespace: the
/// main one unless [`MemoryStore::in_namespace`] picks another. A checkpoint
/// page under `MediaWiki:` is therefore never walked.
#[derive(Debug)]
pub struct MemoryStore {
    pages: Mutex<BTreeMap<String, String>>,
    edits: Mutex<Vec<Edit>>,
    namespaces: Vec<String>,
    /// Prefix of the listed namespace, empty for the main one.
    listed: String,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            pages: Mutex::default(),
            edits: Mutex::default(),
            namespaces: STANDARD_NAMESPACES.iter().map(|ns| ns.to_string()).collect(),
            listed: String::new(),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists the pages of the namespace with this prefix (e.g. `"Help"`)
    /// instead of the main namespace. Unknown prefixes are registered.
    pub fn in_namespace(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.is_empty() && !self.namespaces.contains(&prefix) {
            self.namespaces.push(prefix.clone());
        }
        self.listed = prefix;
        self
    }

    /// Namespace prefix of a title, empty for the main namespace.
    pub fn namespace_of<'t>(&self, title: &'t str) -> &'t str {
        match title.split_once(':') {
            Some((prefix, _)) if self.namespaces.iter().any(|ns| ns == prefix) => prefix,
            _ => "",
        }
    }

    /// Creates a store holding the given pages, each with empty text.
    pub fn with_titles<I, T>(titles: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let pages = titles
            .into_iter()
            .map(|t| (t.into(), String::new()))
            .collect();
        Self {
            pages: Mutex::new(pages),
            ..Self::default()
        }
    }

    /// Sets a page's text without recording an edit.
    pub fn insert(&self, title: impl Into<String>, content: impl Into<String>) {
        lock(&self.pages).insert(title.into(), content.into());
    }

    pub fn get(&self, title: &str) -> Option<String> {
        lock(&self.pages).get(title).cloned()
    }

    /// All edits made through [`DocumentStore::write_page`], oldest first.
    pub fn edits(&self) -> Vec<Edit> {
        lock(&self.edits).clone()
    }
}

// Nothing panics while holding these locks, a poisoned one still has valid data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl DocumentStore for MemoryStore {
    async fn list_pages(&self, start: &str, limit: usize) -> Result<Vec<String>> {
        let titles = lock(&self.pages)
            .range::<str, _>((Bound::Included(start), Bound::Unbounded))
            .filter(|(title, _)| self.namespace_of(title) == self.listed)
            .take(limit)
            .map(|(title, _)| title.clone())
            .collect();
        Ok(titles)
    }

    async fn read_page(&self, title: &str) -> Result<Option<String>> {
        Ok(self.get(title))
    }

    async fn write_page(&self, title: &str, content: &str, summary: &str) -> Result<()> {
        self.insert(title, content);
        lock(&self.edits).push(Edit {
            title: title.into(),
            content: content.into(),
            summary: summary.into(),
        });
        Ok(())
    }
}
