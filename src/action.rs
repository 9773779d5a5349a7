use std::future::Future;

use crate::store::DocumentStore;
use crate::Result;

/// The work a bot does on each page it walks over.
///
/// The walker hands over the title and the store, so an action can read the
/// page and write it back. Returning an error is handled according to the
/// walker's [`PageErrorPolicy`](crate::config::PageErrorPolicy).
pub trait PageAction: Send {
    fn process<S: DocumentStore>(
        &mut self,
        title: &str,
        store: &S,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Reads a page and splits its text into lines. A missing or empty page is a
/// single empty line.
pub async fn page_lines<S: DocumentStore>(store: &S, title: &str) -> Result<Vec<String>> {
    let text = store.read_page(title).await?.unwrap_or_default();
    Ok(text.split('\n').map(str::to_owned).collect())
}

/// Starting point for a new bot: reads every page and logs its size, without
/// changing anything. Replace it with the bot's real work.
#[derive(Debug, Default)]
pub struct InspectPage {
    pages_seen: usize,
    lines_seen: usize,
}

impl InspectPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages_seen(&self) -> usize {
        self.pages_seen
    }

    pub fn lines_seen(&self) -> usize {
        self.lines_seen
    }
}

impl PageAction for InspectPage {
    async fn process<S: DocumentStore>(&mut self, title: &str, store: &S) -> Result<()> {
        let page_lines = page_lines(store, title).await?;
        tracing::debug!(title, lines = page_lines.len(), "inspected page");

        self.pages_seen += 1;
        self.lines_seen += page_lines.len();
        Ok(())
    }
}
