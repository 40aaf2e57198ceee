//
// symbols/extract.rs
//
// Cross-file symbol extraction: scan one file, follow its require directives
// and merge the required files' symbols into its own table.
//

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use super::cache::{CircularRequire, FileSymbols, SymbolCache};
use super::require::RequireResolver;
use super::scanner::{scan, ScanItem};
use super::FunctionRecord;

/// Read access to source files that are not the one being extracted.
pub trait SourceReader {
    /// Whether `path` names a readable source file
    fn exists(&self, path: &Path) -> bool;

    /// Full text of `path`, or `None` when it is absent or unreadable
    fn read(&self, path: &Path) -> Option<String>;
}

/// Reads sources straight from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskReader;

impl SourceReader for DiskReader {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Extracts the resolved symbol set of a file, writing results into a
/// `SymbolCache`.
pub struct SymbolExtractor<'a, R: SourceReader + ?Sized> {
    reader: &'a R,
    resolver: &'a RequireResolver,
}

impl<'a, R: SourceReader + ?Sized> SymbolExtractor<'a, R> {
    pub fn new(reader: &'a R, resolver: &'a RequireResolver) -> Self {
        Self { reader, resolver }
    }

    /// Cached symbols of `path` unless `force` is set or nothing is cached yet,
    /// in which case `text` is extracted and the cache entry replaced.
    pub fn symbols_for(
        &self,
        path: &Path,
        text: &str,
        cache: &mut SymbolCache,
        force: bool,
    ) -> Arc<FileSymbols> {
        if !force {
            if let Some(cached) = cache.get(path) {
                return cached;
            }
        }
        self.extract(path, text, cache)
    }

    /// Re-extract `path` after its text changed.
    ///
    /// Entries of files that required `path` are dropped first so they pick up
    /// the new symbols the next time they are requested. Returns the new
    /// symbols and the dependent paths that were invalidated.
    pub fn refresh(
        &self,
        path: &Path,
        text: &str,
        cache: &mut SymbolCache,
    ) -> (Arc<FileSymbols>, Vec<PathBuf>) {
        let mut stale = cache.invalidate(path);
        stale.retain(|p| p != path);
        (self.extract(path, text, cache), stale)
    }

    /// Scan `text` as the contents of `path`, resolve its requires and store the
    /// merged result in `cache`.
    pub fn extract(&self, path: &Path, text: &str, cache: &mut SymbolCache) -> Arc<FileSymbols> {
        let mut resolving = HashSet::new();
        self.extract_with_chain(path, text, cache, &mut resolving)
    }

    fn extract_with_chain(
        &self,
        path: &Path,
        text: &str,
        cache: &mut SymbolCache,
        resolving: &mut HashSet<PathBuf>,
    ) -> Arc<FileSymbols> {
        log::trace!("Extracting symbols from {} ({} bytes)", path.display(), text.len());
        resolving.insert(path.to_path_buf());
        cache.record_scan();

        let mut table: IndexMap<String, FunctionRecord> = IndexMap::new();
        let mut cycles = Vec::new();
        let mut requires: Vec<PathBuf> = Vec::new();
        let mut watched: IndexSet<PathBuf> = IndexSet::new();

        for item in scan(path, text) {
            match item {
                ScanItem::Function(func) => {
                    // Redeclaration replaces the record but keeps its slot
                    table.insert(func.name.clone(), func);
                }
                ScanItem::Require(directive) => {
                    let target = self.resolver.resolve(path, &directive.module, |candidate| {
                        watched.insert(candidate.to_path_buf());
                        cache.contains(candidate) || self.reader.exists(candidate)
                    });
                    let Some(target) = target else {
                        continue;
                    };

                    if resolving.contains(&target) {
                        log::warn!(
                            "Circular require of {} from {} at line {}",
                            target.display(),
                            path.display(),
                            directive.line + 1
                        );
                        cycles.push(CircularRequire {
                            line: directive.line,
                            module: directive.module,
                            target,
                        });
                        continue;
                    }

                    let Some(required) = self.required_symbols(&target, cache, resolving) else {
                        continue;
                    };

                    if !required.cycles.is_empty() {
                        cycles.push(CircularRequire {
                            line: directive.line,
                            module: directive.module,
                            target: target.clone(),
                        });
                    }

                    let mut merged = 0;
                    for func in &required.functions {
                        if !table.contains_key(&func.name) {
                            table.insert(func.name.clone(), func.required_copy());
                            merged += 1;
                        }
                    }
                    log::trace!(
                        "  merged {} of {} symbols from {}",
                        merged,
                        required.functions.len(),
                        target.display()
                    );

                    if !requires.contains(&target) {
                        requires.push(target);
                    }
                }
            }
        }

        resolving.remove(path);

        let symbols = FileSymbols {
            functions: table.into_values().collect(),
            cycles,
            requires,
            watched: watched.into_iter().collect(),
        };
        log::trace!(
            "Extraction of {} complete: {} functions, {} requires",
            path.display(),
            symbols.functions.len(),
            symbols.requires.len()
        );
        cache.insert(path.to_path_buf(), symbols)
    }

    fn required_symbols(
        &self,
        target: &Path,
        cache: &mut SymbolCache,
        resolving: &mut HashSet<PathBuf>,
    ) -> Option<Arc<FileSymbols>> {
        if let Some(cached) = cache.get(target) {
            return Some(cached);
        }
        let Some(text) = self.reader.read(target) else {
            log::warn!("Required file {} could not be read", target.display());
            return None;
        };
        Some(self.extract_with_chain(target, &text, cache, resolving))
    }
}
