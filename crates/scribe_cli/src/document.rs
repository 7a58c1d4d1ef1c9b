use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use scribe_core::TextSelection;
use scribe_engine::EditorHost;
use scribe_logging::scribe_debug;
use tempfile::NamedTempFile;

use crate::error::CliError;

/// A text file held in memory while the session edits it.
pub struct FileDocument {
    path: PathBuf,
    text: Mutex<String>,
}

impl FileDocument {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            text: Mutex::new(text),
        })
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        self.text.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn byte_len(&self) -> usize {
        self.lock().len()
    }

    /// Selection over the byte range `start..end`.
    pub fn selection(&self, start: usize, end: usize) -> Result<TextSelection, CliError> {
        let text = self.lock();
        let selected = (start <= end)
            .then(|| text.get(start..end))
            .flatten()
            .ok_or(CliError::Selection { start, end })?;
        Ok(TextSelection::new(selected, start, end))
    }

    /// Writes the current text next to the original and renames it over.
    pub fn save(&self) -> Result<(), CliError> {
        let write_error = |source: std::io::Error| CliError::Write {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let content = self.lock().clone();

        let mut tmp = NamedTempFile::new_in(&dir).map_err(write_error)?;
        tmp.write_all(content.as_bytes()).map_err(write_error)?;
        tmp.flush().map_err(write_error)?;
        tmp.as_file_mut().sync_all().map_err(write_error)?;
        tmp.persist(&self.path)
            .map_err(|err| write_error(err.error))?;
        scribe_debug!("Saved {} ({} bytes)", self.path.display(), content.len());
        Ok(())
    }
}

impl EditorHost for FileDocument {
    fn document_content(&self) -> String {
        self.lock().clone()
    }

    fn replace_text(
        &self,
        selection: Option<&TextSelection>,
        original: &str,
        replacement: &str,
    ) -> bool {
        let mut text = self.lock();
        let at_selection = selection
            .map(|sel| sel.start..sel.end)
            .filter(|range| text.get(range.clone()) == Some(original));
        let range = at_selection
            .or_else(|| text.find(original).map(|start| start..start + original.len()));
        match range {
            Some(range) => {
                text.replace_range(range, replacement);
                true
            }
            None => false,
        }
    }
}
