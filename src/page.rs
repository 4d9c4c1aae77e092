//! Rendered comment pages and annotation.
//!
//! The pipeline never looks at markup directly. It reads records through
//! [`CommentPage::extract`] and writes translations back with [`annotate`].
//! Whether a comment has already been translated is read off the page itself
//! (an annotation sitting next to the comment), so nothing else needs to
//! remember which comments were handled.

use crate::comment::{CommentRecord, SourceHandle};
use crate::popularity::parse_popularity;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// The render tree a pipeline run reads from and annotates.
pub trait CommentPage: Send {
    /// Read every non-empty comment currently rendered, with `annotated`
    /// reflecting whether a translation is already attached.
    fn extract(&self) -> Vec<CommentRecord>;

    /// Check whether an annotation is already attached next to `handle`.
    fn has_annotation(&self, handle: SourceHandle) -> bool;

    /// Attach `annotation` next to `handle`. Must only add, never replace.
    fn append_annotation(&mut self, handle: SourceHandle, annotation: Annotation);
}

/// A rendered translation shown next to its source comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
    pub lang: String,
}

/// One rendered comment thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentThread {
    pub text: String,

    /// Like count as rendered (e.g. "1,234" or "1.2万")
    #[serde(default)]
    pub likes: String,

    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl CommentThread {
    pub fn new(text: impl Into<String>, likes: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            likes: likes.into(),
            annotations: Vec::new(),
        }
    }
}

/// A comment page snapshot stored as JSON.
///
/// A thread's position in `threads` is its [`SourceHandle`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDocument {
    #[serde(default)]
    pub threads: Vec<CommentThread>,
}

impl PageDocument {
    pub fn new(threads: Vec<CommentThread>) -> Self {
        Self { threads }
    }

    /// Load a snapshot from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page snapshot {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse page snapshot {}", path.display()))
    }

    /// Write the snapshot back to disk, annotations included
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize page snapshot")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write page snapshot {}", path.display()))
    }

    /// Total number of annotations attached across all threads
    pub fn annotation_count(&self) -> usize {
        self.threads.iter().map(|t| t.annotations.len()).sum()
    }
}

impl CommentPage for PageDocument {
    fn extract(&self) -> Vec<CommentRecord> {
        self.threads
            .iter()
            .enumerate()
            .filter_map(|(i, thread)| {
                let text = thread.text.trim();
                if text.is_empty() {
                    return None;
                }
                let record = CommentRecord::new(text, parse_popularity(&thread.likes), SourceHandle(i));
                Some(if thread.annotations.is_empty() {
                    record
                } else {
                    record.annotated()
                })
            })
            .collect()
    }

    fn has_annotation(&self, handle: SourceHandle) -> bool {
        self.threads
            .get(handle.0)
            .is_some_and(|t| !t.annotations.is_empty())
    }

    fn append_annotation(&mut self, handle: SourceHandle, annotation: Annotation) {
        if let Some(thread) = self.threads.get_mut(handle.0) {
            thread.annotations.push(annotation);
        }
    }
}

/// Attach `translated` next to `record` unless it already carries a translation.
///
/// Returns `true` when an annotation was added. The page is re-checked right
/// before mutating, so calling this twice for one handle adds one annotation.
pub fn annotate<P: CommentPage + ?Sized>(
    page: &mut P,
    record: &mut CommentRecord,
    translated: &str,
    lang: &str,
) -> bool {
    if record.is_annotated() || page.has_annotation(record.handle()) {
        debug!("Comment {} already annotated, skipping", record.handle());
        record.mark_annotated();
        return false;
    }

    page.append_annotation(
        record.handle(),
        Annotation {
            text: translated.to_string(),
            lang: lang.to_string(),
        },
    );
    record.mark_annotated();
    true
}
