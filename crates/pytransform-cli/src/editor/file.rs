//! File-backed document used by the terminal host.
//!
//! The file is read once on open. A replace re-reads it from disk and checks
//! the version before writing, so an edit made by another program between
//! resolution and apply is detected rather than overwritten.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{
    DocumentVersion, EditError, EditorAdapter, TextRange, check_version, slice, splice,
};

/// A document stored in a file on disk.
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
    content: String,
    selection: Option<TextRange>,
    language_id: String,
}

impl FileDocument {
    /// Loads `path`, inferring the language from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Io`] when the file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, EditError> {
        let path = path.into();
        let content = read(&path)?;
        let language_id = language_for(&path).to_owned();
        Ok(Self {
            path,
            content,
            selection: None,
            language_id,
        })
    }

    /// Sets the selection.
    #[must_use]
    pub fn with_selection(mut self, selection: TextRange) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Overrides the inferred language.
    #[must_use]
    pub fn with_language(mut self, language_id: impl Into<String>) -> Self {
        self.language_id = language_id.into();
        self
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content as last read or written.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl EditorAdapter for FileDocument {
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
        let on_disk = read(&self.path)?;
        check_version(expected, &on_disk)?;
        let updated = splice(&on_disk, range, text)?;
        write_atomically(&self.path, &updated)?;
        self.content = updated;
        self.selection = None;
        Ok(())
    }
}

fn language_for(path: &Path) -> &'static str {
    match path.extension().and_then(|extension| extension.to_str()) {
        Some("py" | "pyi" | "pyw") => "python",
        _ => "plaintext",
    }
}

fn read(path: &Path) -> Result<String, EditError> {
    fs::read_to_string(path).map_err(|source| io_error(path, source))
}

fn write_atomically(path: &Path, content: &str) -> Result<(), EditError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| {
            io_error(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })?
        .to_string_lossy();
    let permissions = fs::metadata(path)
        .map_err(|source| io_error(path, source))?
        .permissions();
    let staging = path.with_file_name(format!(".{file_name}.pytransform"));
    fs::write(&staging, content)
        .and_then(|()| fs::set_permissions(&staging, permissions))
        .and_then(|()| fs::rename(&staging, path))
        .map_err(|source| {
            let _ = fs::remove_file(&staging);
            io_error(path, source)
        })
}

fn io_error(path: &Path, source: io::Error) -> EditError {
    EditError::Io {
        path: path.to_path_buf(),
        source,
    }
}
