//! Document access for the dispatcher.
//!
//! [`EditorAdapter`] is the seam through which the dispatcher reads the
//! current selection or document and writes a transformation result back.
//! Writes are guarded by a [`DocumentVersion`] captured when the input was
//! resolved, so a concurrent edit aborts the write instead of landing in a
//! stale range.

mod file;
mod memory;
mod position;

use std::fmt;
use std::io;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use thiserror::Error;

pub use file::FileDocument;
pub use memory::MemoryDocument;
pub use position::{Position, RangeParseError, TextRange};

/// Content-addressed version stamp of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentVersion(String);

impl DocumentVersion {
    /// Version of `text`.
    #[must_use]
    pub fn of(text: &str) -> Self {
        Self(format!("{:x}", Sha256::digest(text.as_bytes())))
    }
}

impl fmt::Display for DocumentVersion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.0.get(..12).unwrap_or(&self.0))
    }
}

/// Failures while reading or writing a document.
#[derive(Debug, Error)]
pub enum EditError {
    /// The document changed after the input was resolved.
    #[error("document changed since the transformation started (expected {expected}, found {actual})")]
    Conflict {
        /// Version captured when the input was resolved.
        expected: DocumentVersion,
        /// Version found at write time.
        actual: DocumentVersion,
    },
    /// The range does not lie within the document.
    #[error("range {range} lies outside the document")]
    InvalidRange {
        /// Offending range.
        range: TextRange,
    },
    /// Reading or writing the backing file failed.
    #[error("failed to access {path:?}: {source}")]
    Io {
        /// File that was accessed.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },
}

/// Primitives a host editor supplies to the dispatcher.
pub trait EditorAdapter {
    /// Current selection, if any.
    fn selection(&self) -> Option<TextRange>;

    /// Text within `range`.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::InvalidRange`] when the range lies outside the
    /// document.
    fn text(&self, range: TextRange) -> Result<String, EditError>;

    /// Range covering the whole document.
    fn full_range(&self) -> TextRange;

    /// Version stamp of the current content.
    fn version(&self) -> DocumentVersion;

    /// Language of the document, e.g. `python`.
    fn language_id(&self) -> &str;

    /// Replaces `range` with `text` provided the document is still at
    /// `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Conflict`] when the document changed, leaving it
    /// untouched.
    fn replace(
        &mut self,
        range: TextRange,
        text: &str,
        expected: &DocumentVersion,
    ) -> Result<(), EditError>;
}

/// Slices `range` out of `content`.
fn slice(content: &str, range: TextRange) -> Result<String, EditError> {
    range
        .byte_span(content)
        .and_then(|(start, end)| content.get(start..end))
        .map(str::to_owned)
        .ok_or(EditError::InvalidRange { range })
}

/// Returns `content` with `range` replaced by `replacement`.
fn splice(content: &str, range: TextRange, replacement: &str) -> Result<String, EditError> {
    let (head, tail) = range
        .byte_span(content)
        .and_then(|(start, end)| Some((content.get(..start)?, content.get(end..)?)))
        .ok_or(EditError::InvalidRange { range })?;
    let mut spliced = String::with_capacity(head.len() + replacement.len() + tail.len());
    spliced.push_str(head);
    spliced.push_str(replacement);
    spliced.push_str(tail);
    Ok(spliced)
}

fn check_version(expected: &DocumentVersion, content: &str) -> Result<(), EditError> {
    let actual = DocumentVersion::of(content);
    if &actual == expected {
        Ok(())
    } else {
        Err(EditError::Conflict {
            expected: expected.clone(),
            actual,
        })
    }
}
