use std::fmt;

/// Edit summary of every checkpoint write.
pub const CHECKPOINT_SUMMARY: &str = "Store new page from last execution.";

/// The title the next run resumes from. Empty means the start of the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoint(String);

impl Checkpoint {
    pub fn start() -> Self {
        Self::default()
    }

    pub fn new(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    /// Parses the checkpoint from the text of the checkpoint page: its first
    /// line, without surrounding whitespace.
    pub fn from_page_text(text: &str) -> Self {
        let first_line = text.split('\n').next().unwrap_or_default();
        Self(first_line.trim().to_owned())
    }

    /// Checkpoint to store after a batch whose last title was `last_title`.
    /// An exhausted catalog wraps around to the start.
    pub fn after_batch(last_title: Option<&str>, exhausted: bool) -> Self {
        match last_title {
            Some(title) if !exhausted => Self::new(title),
            _ => Self::start(),
        }
    }

    pub fn is_start(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_start() {
            f.write_str("<start>")
        } else {
            f.write_str(&self.0)
        }
    }
}
