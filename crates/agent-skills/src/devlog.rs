// src/devlog.rs
//! Markdown writers for journal and research entries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Relative directory of the daily journal files
pub const JOURNAL_DIR: &str = "memory/journal";

/// One devlog entry
#[derive(Debug, Clone)]
pub struct DevlogEntry {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl DevlogEntry {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tags: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Markdown section for this entry
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} UTC: {}\n\n{}\n",
            self.timestamp.format("%H:%M:%S"),
            self.title,
            self.body.trim_end()
        );
        if !self.tags.is_empty() {
            let tags: Vec<String> = self.tags.iter().map(|t| format!("#{}", t)).collect();
            out.push_str(&format!("\n{}\n", tags.join(" ")));
        }
        out.push('\n');
        out
    }
}

/// Domain callback for recording what the agent did
#[async_trait]
pub trait DevlogWriter: Send + Sync {
    /// Append an entry and return the file it landed in
    async fn append(&self, entry: &DevlogEntry) -> std::io::Result<PathBuf>;
}

/// Writes entries to `<root>/memory/journal/<YYYY-MM-DD>.md`
#[derive(Debug, Clone)]
pub struct MarkdownJournal {
    root: PathBuf,
}

impl MarkdownJournal {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, timestamp: &DateTime<Utc>) -> PathBuf {
        self.root
            .join(JOURNAL_DIR)
            .join(format!("{}.md", timestamp.format("%Y-%m-%d")))
    }
}

#[async_trait]
impl DevlogWriter for MarkdownJournal {
    async fn append(&self, entry: &DevlogEntry) -> std::io::Result<PathBuf> {
        let path = self.path_for(&entry.timestamp);
        let header = format!("# Journal {}\n\n", entry.timestamp.format("%Y-%m-%d"));
        append_markdown(&path, &entry.to_markdown(), Some(&header)).await?;
        debug!(path = %path.display(), title = %entry.title, "Journal entry written");
        Ok(path)
    }
}

/// Append `section` to a markdown file, creating parent directories.
///
/// `header` is written first when the file does not exist yet.
pub async fn append_markdown(
    path: &Path,
    section: &str,
    header: Option<&str>,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let is_new = tokio::fs::metadata(path).await.is_err();
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    if is_new {
        if let Some(header) = header {
            file.write_all(header.as_bytes()).await?;
        }
    }
    file.write_all(section.as_bytes()).await?;
    file.flush().await
}
