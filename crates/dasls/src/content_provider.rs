//
// content_provider.rs
//
// Source access for require resolution that respects the
// open-docs-authoritative rule: the editor buffer of an open document wins
// over the file on disk.
//

use std::collections::HashMap;
use std::path::Path;

use tower_lsp::lsp_types::Url;

use crate::state::Document;
use crate::symbols::{DiskReader, SourceReader};

/// Reads open documents first, then falls back to disk
pub struct WorkspaceReader<'a> {
    documents: &'a HashMap<Url, Document>,
    disk: DiskReader,
}

impl<'a> WorkspaceReader<'a> {
    pub fn new(documents: &'a HashMap<Url, Document>) -> Self {
        Self {
            documents,
            disk: DiskReader,
        }
    }

    fn open_document(&self, path: &Path) -> Option<&'a Document> {
        let uri = Url::from_file_path(path).ok()?;
        self.documents.get(&uri)
    }
}

impl SourceReader for WorkspaceReader<'_> {
    fn exists(&self, path: &Path) -> bool {
        self.open_document(path).is_some() || self.disk.exists(path)
    }

    fn read(&self, path: &Path) -> Option<String> {
        match self.open_document(path) {
            Some(doc) => Some(doc.text()),
            None => self.disk.read(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_open_document_shadows_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("utils.das");
        fs::write(&path, "def on_disk()").unwrap();

        let mut documents = HashMap::new();
        documents.insert(
            Url::from_file_path(&path).unwrap(),
            Document::new("def in_editor()", Some(3)),
        );
        let reader = WorkspaceReader::new(&documents);
        assert!(reader.exists(&path));
        assert_eq!(reader.read(&path).as_deref(), Some("def in_editor()"));
    }

    #[test]
    fn test_falls_back_to_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("utils.das");
        fs::write(&path, "def on_disk()").unwrap();

        let documents = HashMap::new();
        let reader = WorkspaceReader::new(&documents);
        assert!(reader.exists(&path));
        assert_eq!(reader.read(&path).as_deref(), Some("def on_disk()"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.das");
        let documents = HashMap::new();
        let reader = WorkspaceReader::new(&documents);
        assert!(!reader.exists(&path));
        assert!(reader.read(&path).is_none());
        // Directories are not source files
        assert!(!reader.exists(dir.path()));
    }
}
