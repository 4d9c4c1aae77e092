use std::fmt;

/// Opaque reference to where a comment is rendered.
///
/// Only the page that issued a handle can interpret it; the pipeline uses it
/// solely to route annotations back to the right place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceHandle(pub usize);

impl fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One extracted comment candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    text: String,
    popularity: u64,
    handle: SourceHandle,
    annotated: bool,
}

impl CommentRecord {
    pub fn new(text: impl Into<String>, popularity: u64, handle: SourceHandle) -> Self {
        Self {
            text: text.into(),
            popularity,
            handle,
            annotated: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn popularity(&self) -> u64 {
        self.popularity
    }

    pub fn handle(&self) -> SourceHandle {
        self.handle
    }

    pub fn is_annotated(&self) -> bool {
        self.annotated
    }

    /// Flag the record as already carrying a translation. There is no way back.
    pub fn mark_annotated(&mut self) {
        self.annotated = true;
    }

    /// Builder form of [`mark_annotated`](Self::mark_annotated).
    pub fn annotated(mut self) -> Self {
        self.annotated = true;
        self
    }
}
