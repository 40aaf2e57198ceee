//! Deterministic fixture workspace generator for benchmarks and tests.
//!
//! Generates synthetic daScript workspaces with controlled characteristics:
//! file count, functions per file, require chains, and extra lines of
//! non-declaration code.
//!
//! All output is deterministic (no randomness) so benchmarks are reproducible.

use std::fmt::Write;
use std::path::Path;
use tempfile::TempDir;

/// Configuration for generating a fixture workspace.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    pub file_count: usize,
    pub functions_per_file: usize,
    pub require_chain_depth: usize,
    pub extra_lines_per_file: usize,
}

impl FixtureConfig {
    /// Small workspace: 10 files, 5 functions each, require chain depth 3.
    pub fn small() -> Self {
        Self {
            file_count: 10,
            functions_per_file: 5,
            require_chain_depth: 3,
            extra_lines_per_file: 5,
        }
    }

    /// Medium workspace: 50 files, 10 functions each, require chain depth 10.
    pub fn medium() -> Self {
        Self {
            file_count: 50,
            functions_per_file: 10,
            require_chain_depth: 10,
            extra_lines_per_file: 10,
        }
    }

    /// Large workspace: 200 files, 20 functions each, require chain depth 15.
    pub fn large() -> Self {
        Self {
            file_count: 200,
            functions_per_file: 20,
            require_chain_depth: 15,
            extra_lines_per_file: 20,
        }
    }
}

/// Generate the content of a single source file deterministically.
///
/// - `index`: file index (0-based), used for naming and require chain linkage
/// - `config`: the workspace configuration
pub fn generate_file_content(index: usize, config: &FixtureConfig) -> String {
    let mut content = String::new();

    // Require chain: file_0 requires file_1, file_1 requires file_2, etc.
    if index < config.require_chain_depth && index + 1 < config.file_count {
        writeln!(content, "require file_{}", index + 1).unwrap();
        content.push('\n');
    }

    for func_i in 0..config.functions_per_file {
        writeln!(content, "/**").unwrap();
        writeln!(content, " * Function {} of file {}", func_i, index).unwrap();
        writeln!(content, " * @param x first operand").unwrap();
        writeln!(content, " */").unwrap();
        if func_i % 2 == 0 {
            writeln!(content, "[export]").unwrap();
        }
        writeln!(
            content,
            "def func_{}_{}(x: int, y: float)",
            index, func_i
        )
        .unwrap();
        writeln!(content, "    let result = x + int(y) * {}", func_i + 1).unwrap();
        writeln!(content, "    return result").unwrap();
        content.push('\n');
    }

    for line_i in 0..config.extra_lines_per_file {
        writeln!(content, "var var_{}_{} = {}", index, line_i, line_i + 1).unwrap();
    }

    content
}

/// Create a temporary fixture workspace from the given configuration.
///
/// Returns a `TempDir` whose path contains the generated `.das` files.
/// The directory is cleaned up when the `TempDir` is dropped.
pub fn create_fixture_workspace(config: &FixtureConfig) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory for fixture workspace");
    write_fixture_workspace(temp_dir.path(), config);
    temp_dir
}

/// Write fixture files into an existing directory.
pub fn write_fixture_workspace(dir: &Path, config: &FixtureConfig) {
    for i in 0..config.file_count {
        let content = generate_file_content(i, config);
        let filename = format!("file_{}.das", i);
        std::fs::write(dir.join(&filename), &content)
            .unwrap_or_else(|e| panic!("Failed to write fixture file {}: {}", filename, e));
    }
}
