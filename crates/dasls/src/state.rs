//
// state.rs
//
// Server-wide state: open documents, the symbol cache and configuration
//

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use ropey::Rope;
use tower_lsp::lsp_types::{TextDocumentContentChangeEvent, Url};

use crate::config::ServerConfig;
use crate::content_provider::WorkspaceReader;
use crate::symbols::{FileSymbols, RequireResolver, SymbolCache, SymbolExtractor};
use crate::utf16::utf16_column_to_char_index;

/// An open document
pub struct Document {
    pub contents: Rope,
    pub version: Option<i32>,
}

impl Document {
    pub fn new(text: &str, version: Option<i32>) -> Self {
        Self {
            contents: Rope::from_str(text),
            version,
        }
    }

    pub fn apply_change(&mut self, change: TextDocumentContentChangeEvent) {
        if let Some(range) = change.range {
            let start_idx = self.char_index(range.start.line, range.start.character);
            let end_idx = self.char_index(range.end.line, range.end.character);
            self.contents.remove(start_idx..end_idx.max(start_idx));
            self.contents.insert(start_idx, &change.text);
        } else {
            // Full document sync
            self.contents = Rope::from_str(&change.text);
        }
    }

    /// Char index of an LSP position, clamped to the document
    fn char_index(&self, line: u32, utf16_col: u32) -> usize {
        let line = line as usize;
        if line >= self.contents.len_lines() {
            return self.contents.len_chars();
        }
        let line_text = self.line_text(line);
        let col = utf16_column_to_char_index(&line_text, utf16_col);
        self.contents.line_to_char(line) + col
    }

    pub fn text(&self) -> String {
        self.contents.to_string()
    }

    /// Text of line `line` without its line terminator
    pub fn line_text(&self, line: usize) -> String {
        if line >= self.contents.len_lines() {
            return String::new();
        }
        let text = self.contents.line(line).to_string();
        text.trim_end_matches(['\n', '\r']).to_string()
    }
}

/// Global state
pub struct WorldState {
    pub documents: HashMap<Url, Document>,
    pub workspace_folders: Vec<Url>,
    pub symbol_cache: SymbolCache,
    pub config: ServerConfig,
    resolver: RequireResolver,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

impl WorldState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            documents: HashMap::new(),
            workspace_folders: Vec::new(),
            symbol_cache: SymbolCache::new(),
            resolver: config.resolver(),
            config,
        }
    }

    pub fn open_document(&mut self, uri: Url, text: &str, version: Option<i32>) {
        self.documents.insert(uri, Document::new(text, version));
    }

    pub fn get_document(&self, uri: &Url) -> Option<&Document> {
        self.documents.get(uri)
    }

    pub fn close_document(&mut self, uri: &Url) {
        self.documents.remove(uri);
        // Unsaved edits die with the buffer; the next lookup reads disk
        if let Ok(path) = uri.to_file_path() {
            self.symbol_cache.invalidate(&path);
        }
    }

    /// Apply configuration. Returns true when cached symbols were dropped.
    pub fn set_config(&mut self, config: ServerConfig) -> bool {
        let stale = self.config.resolution_settings_changed(&config);
        self.resolver = config.resolver();
        self.config = config;
        if stale {
            log::info!("Require resolution settings changed, clearing symbol cache");
            self.symbol_cache.invalidate_all();
        }
        stale
    }

    /// Resolved symbols of an open document, from cache when available.
    pub fn symbols(&mut self, uri: &Url) -> Option<Arc<FileSymbols>> {
        let path = uri.to_file_path().ok()?;
        let text = self.documents.get(uri)?.text();
        let reader = WorkspaceReader::new(&self.documents);
        let extractor = SymbolExtractor::new(&reader, &self.resolver);
        Some(extractor.symbols_for(&path, &text, &mut self.symbol_cache, false))
    }

    /// Rescan an open document after its text changed.
    ///
    /// Returns the new symbols and the open documents whose cached symbols were
    /// dropped because they required this one.
    pub fn refresh(&mut self, uri: &Url) -> Option<(Arc<FileSymbols>, Vec<Url>)> {
        let path = uri.to_file_path().ok()?;
        let text = self.documents.get(uri)?.text();
        let reader = WorkspaceReader::new(&self.documents);
        let extractor = SymbolExtractor::new(&reader, &self.resolver);
        let (symbols, stale) = extractor.refresh(&path, &text, &mut self.symbol_cache);
        Some((symbols, self.open_uris_for(stale)))
    }

    /// A file changed on disk outside the editor.
    ///
    /// Returns the open documents whose cached symbols were dropped.
    pub fn file_changed_on_disk(&mut self, path: &std::path::Path) -> Vec<Url> {
        let removed = self.symbol_cache.invalidate(path);
        self.open_uris_for(removed)
    }

    fn open_uris_for(&self, paths: Vec<PathBuf>) -> Vec<Url> {
        paths
            .into_iter()
            .filter_map(|p| Url::from_file_path(p).ok())
            .filter(|u| self.documents.contains_key(u))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::{Position, Range};

    fn uri(path: &str) -> Url {
        Url::from_file_path(path).unwrap()
    }

    fn edit(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range {
                start: Position::new(start.0, start.1),
                end: Position::new(end.0, end.1),
            }),
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_incremental_edit() {
        let mut doc = Document::new("def f(a)\ndef g()\n", Some(1));
        doc.apply_change(edit((0, 6), (0, 7), "x, y"));
        assert_eq!(doc.text(), "def f(x, y)\ndef g()\n");
        doc.apply_change(edit((1, 4), (1, 5), "h"));
        assert_eq!(doc.line_text(1), "def h()");
    }

    #[test]
    fn test_edit_after_surrogate_pair() {
        let mut doc = Document::new("s = \"😀\" + x\n", Some(1));
        // x sits at UTF-16 column 11
        doc.apply_change(edit((0, 11), (0, 12), "y"));
        assert_eq!(doc.text(), "s = \"😀\" + y\n");
    }

    #[test]
    fn test_full_sync() {
        let mut doc = Document::new("old", None);
        doc.apply_change(TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new".to_string(),
        });
        assert_eq!(doc.text(), "new");
    }

    #[test]
    fn test_line_text_out_of_range() {
        let doc = Document::new("a\r\nb", None);
        assert_eq!(doc.line_text(0), "a");
        assert_eq!(doc.line_text(1), "b");
        assert_eq!(doc.line_text(7), "");
    }

    #[test]
    fn test_symbols_use_open_document_text() {
        let mut state = WorldState::default();
        let main = uri("/nonexistent/ws/main.das");
        let utils = uri("/nonexistent/ws/utils.das");
        state.open_document(utils.clone(), "def helper()", Some(1));
        state.open_document(main.clone(), "require utils\ndef run()", Some(1));

        let symbols = state.symbols(&main).unwrap();
        let names: Vec<_> = symbols.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["helper", "run"]);
    }

    #[test]
    fn test_refresh_reports_open_dependents() {
        let mut state = WorldState::default();
        let main = uri("/nonexistent/ws/main.das");
        let utils = uri("/nonexistent/ws/utils.das");
        state.open_document(utils.clone(), "def helper()", Some(1));
        state.open_document(main.clone(), "require utils", Some(1));
        state.symbols(&main).unwrap();

        state
            .documents
            .get_mut(&utils)
            .unwrap()
            .apply_change(edit((0, 4), (0, 10), "assist"));
        let (symbols, stale) = state.refresh(&utils).unwrap();
        assert_eq!(symbols.functions[0].name, "assist");
        assert_eq!(stale, vec![main.clone()]);

        let main_symbols = state.symbols(&main).unwrap();
        assert_eq!(main_symbols.functions[0].name, "assist");
    }

    #[test]
    fn test_opening_missing_required_file_refreshes_requirer() {
        let mut state = WorldState::default();
        let main = uri("/nonexistent/ws/main.das");
        let utils = uri("/nonexistent/ws/utils.das");
        state.open_document(main.clone(), "require utils\ndef run()", Some(1));
        let symbols = state.symbols(&main).unwrap();
        assert_eq!(symbols.functions.len(), 1);

        state.open_document(utils.clone(), "def helper()", Some(1));
        let (_, stale) = state.refresh(&utils).unwrap();
        assert_eq!(stale, vec![main.clone()]);

        let symbols = state.symbols(&main).unwrap();
        let names: Vec<_> = symbols.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["helper", "run"]);
    }

    #[test]
    fn test_created_file_on_disk_refreshes_requirer() {
        let mut state = WorldState::default();
        let main = uri("/nonexistent/ws/main.das");
        state.open_document(main.clone(), "require missing", Some(1));
        state.symbols(&main).unwrap();

        let affected = state.file_changed_on_disk(std::path::Path::new("/nonexistent/missing.spec.das"));
        assert_eq!(affected, vec![main]);
    }

    #[test]
    fn test_symbols_cached_between_requests() {
        let mut state = WorldState::default();
        let main = uri("/nonexistent/ws/main.das");
        state.open_document(main.clone(), "def f()", Some(1));
        state.symbols(&main).unwrap();
        state.symbols(&main).unwrap();
        assert_eq!(state.symbol_cache.scan_count(), 1);
    }

    #[test]
    fn test_close_invalidates() {
        let mut state = WorldState::default();
        let main = uri("/nonexistent/ws/main.das");
        state.open_document(main.clone(), "def f()", Some(1));
        state.symbols(&main).unwrap();
        state.close_document(&main);
        assert!(state.symbol_cache.is_empty());
        assert!(state.symbols(&main).is_none());
    }

    #[test]
    fn test_set_config_clears_cache_on_resolution_change() {
        let mut state = WorldState::default();
        let main = uri("/nonexistent/ws/main.das");
        state.open_document(main.clone(), "def f()", Some(1));
        state.symbols(&main).unwrap();

        let mut config = state.config.clone();
        config.identifier_completions = false;
        assert!(!state.set_config(config.clone()));
        assert!(!state.symbol_cache.is_empty());

        config.file_extension = "dascript".to_string();
        assert!(state.set_config(config));
        assert!(state.symbol_cache.is_empty());
    }
}
