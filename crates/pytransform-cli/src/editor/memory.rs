//! In-memory document.

use super::{
    DocumentVersion, EditError, EditorAdapter, TextRange, check_version, slice, splice,
};

/// A document held entirely in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDocument {
    content: String,
    selection: Option<TextRange>,
    language_id: String,
}

impl MemoryDocument {
    /// Creates a document with no selection.
    pub fn new(content: impl Into<String>, language_id: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            selection: None,
            language_id: language_id.into(),
        }
    }

    /// Sets the selection.
    #[must_use]
    pub fn with_selection(mut self, selection: TextRange) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Current content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Overwrites the content as a user edit would, clearing the selection.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.selection = None;
    }
}

impl EditorAdapter for MemoryDocument {
    fn selection(&self) -> Option<TextRange> {
        self.selection
    }

    fn text(&self, range: TextRange) -> Result<String, EditError> {
        slice(&self.content, range)
    }

    fn full_range(&self) -> TextRange {
        TextRange::covering(&self.content)
    }

    fn version(&self) -> DocumentVersion {
        DocumentVersion::of(&self.content)
    }

    fn language_id(&self) -> &str {
        &self.language_id
    }

    fn replace(
        &mut self,
        range: TextRange,
        text: &str,
        expected: &DocumentVersion,
    ) -> Result<(), EditError> {
        check_version(expected, &self.content)?;
        self.content = splice(&self.content, range, text)?;
        self.selection = None;
        Ok(())
    }
}
