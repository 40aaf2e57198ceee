//
// symbols/cache.rs
//
// Per-file cache of extracted (and merged) function symbols
//

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::FunctionRecord;

/// A `require` that was not followed because its target was already being
/// resolved further up the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircularRequire {
    /// 0-based line of the require directive in the requiring file
    pub line: u32,
    /// Module reference as written
    pub module: String,
    /// File the directive resolved to
    pub target: PathBuf,
}

/// Resolved symbol set of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSymbols {
    /// Own declarations merged with everything pulled in through `require`
    pub functions: Vec<FunctionRecord>,
    /// Require cycles reachable from this file
    pub cycles: Vec<CircularRequire>,
    /// Files whose symbols were merged in (direct requires only)
    pub requires: Vec<PathBuf>,
    /// Every candidate path probed while resolving requires, whether or not it
    /// existed. A file appearing at any of these paths can change the result.
    pub watched: Vec<PathBuf>,
}

impl FileSymbols {
    pub fn find(&self, name: &str) -> Option<&FunctionRecord> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// Cache of `FileSymbols` keyed by absolute path.
///
/// Entries are replaced whole, never patched. There is no eviction: an entry
/// lives until it is invalidated or recomputed. Reverse edges from every probed
/// require candidate are tracked so that invalidating a file also drops every
/// entry that merged its symbols or would resolve to it now.
#[derive(Debug, Default)]
pub struct SymbolCache {
    entries: HashMap<PathBuf, Arc<FileSymbols>>,
    /// probed candidate -> files whose resolution probed it
    dependents: HashMap<PathBuf, HashSet<PathBuf>>,
    scans: u64,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<FileSymbols>> {
        self.entries.get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of scans performed on behalf of this cache
    pub fn scan_count(&self) -> u64 {
        self.scans
    }

    pub(crate) fn record_scan(&mut self) {
        self.scans += 1;
    }

    /// Replace the entry for `path`.
    pub fn insert(&mut self, path: PathBuf, symbols: FileSymbols) -> Arc<FileSymbols> {
        if let Some(old) = self.entries.remove(&path) {
            self.unlink(&path, &old.watched);
        }
        for required in &symbols.watched {
            self.dependents
                .entry(required.clone())
                .or_default()
                .insert(path.clone());
        }
        let symbols = Arc::new(symbols);
        self.entries.insert(path, symbols.clone());
        symbols
    }

    /// Files whose cached entries depend on `path`
    pub fn dependents_of(&self, path: &Path) -> Vec<PathBuf> {
        let mut deps: Vec<PathBuf> = self
            .dependents
            .get(path)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        deps.sort();
        deps
    }

    /// Drop the entry for `path` and, transitively, every entry that required it.
    ///
    /// Returns the paths whose entries were removed.
    pub fn invalidate(&mut self, path: &Path) -> Vec<PathBuf> {
        let mut removed = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([path.to_path_buf()]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(entry) = self.entries.remove(&current) {
                self.unlink(&current, &entry.watched);
                removed.push(current.clone());
            }
            if let Some(deps) = self.dependents.get(&current) {
                queue.extend(deps.iter().cloned());
            }
        }

        if !removed.is_empty() {
            log::trace!(
                "Invalidated {} symbol cache entries starting at {}",
                removed.len(),
                path.display()
            );
        }
        removed
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.dependents.clear();
    }

    fn unlink(&mut self, path: &Path, watched: &[PathBuf]) {
        for required in watched {
            if let Some(set) = self.dependents.get_mut(required) {
                set.remove(path);
                if set.is_empty() {
                    self.dependents.remove(required);
                }
            }
        }
    }
}
