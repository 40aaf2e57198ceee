//
// symbols/require.rs
//
// Resolution of `require <module>` directives to files on disk.
//
// A module reference is looked up relative to the requiring file's directory
// first, then relative to each ancestor directory in turn, up to and including
// the filesystem root. At every level two spellings are tried:
//
//   <dir>/<module>.<ext>
//   <dir>/<module>.<spec_suffix>.<ext>
//
// The first existing candidate wins.
//

use std::path::{Component, Path, PathBuf};

pub const DEFAULT_EXTENSION: &str = "das";
pub const DEFAULT_SPEC_SUFFIX: &str = "spec";

/// Resolves module references of require directives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireResolver {
    extension: String,
    spec_suffix: String,
}

impl Default for RequireResolver {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSION, DEFAULT_SPEC_SUFFIX)
    }
}

impl RequireResolver {
    pub fn new(extension: &str, spec_suffix: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
            spec_suffix: spec_suffix.trim_matches('.').to_string(),
        }
    }

    /// The two candidate files for `module` relative to `dir`, plain spelling first.
    pub fn candidates(&self, dir: &Path, module: &str) -> [PathBuf; 2] {
        let base = normalize_path(&dir.join(module));
        let plain = append_suffix(&base, &format!(".{}", self.extension));
        let spec = append_suffix(
            &base,
            &format!(".{}.{}", self.spec_suffix, self.extension),
        );
        [plain, spec]
    }

    /// Resolve `module` as required from `requiring_file`.
    ///
    /// `exists` decides whether a candidate is present; it lets callers count
    /// open documents and cached entries as existing files. It is called once
    /// per probed candidate, nearest directory first.
    pub fn resolve<F>(&self, requiring_file: &Path, module: &str, mut exists: F) -> Option<PathBuf>
    where
        F: FnMut(&Path) -> bool,
    {
        let mut dir = requiring_file.parent();
        while let Some(current) = dir {
            for candidate in self.candidates(current, module) {
                if exists(&candidate) {
                    log::trace!(
                        "Resolved require '{}' from {} to {}",
                        module,
                        requiring_file.display(),
                        candidate.display()
                    );
                    return Some(candidate);
                }
            }
            dir = current.parent();
        }
        log::trace!(
            "Unresolved require '{}' from {}",
            module,
            requiring_file.display()
        );
        None
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// Lexically normalize `.` and `..` components, keeping root and prefix.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
            Component::CurDir => {}
            c => components.push(c),
        }
    }

    components.iter().collect()
}
