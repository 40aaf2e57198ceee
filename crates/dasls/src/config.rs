//
// config.rs
//
// Server configuration read from LSP initialization options and
// workspace/didChangeConfiguration settings
//

use serde::Deserialize;
use tower_lsp::lsp_types::DiagnosticSeverity;

use crate::symbols::{RequireResolver, DEFAULT_EXTENSION, DEFAULT_SPEC_SUFFIX};

/// Server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Extension of source files, without the dot
    pub file_extension: String,
    /// Infix of the alternative `<module>.<spec_suffix>.<ext>` spelling
    pub spec_suffix: String,
    /// Offer every identifier of the document as a plain-text completion
    pub identifier_completions: bool,
    /// Severity of circular require diagnostics
    pub circular_require_severity: DiagnosticSeverity,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            file_extension: DEFAULT_EXTENSION.to_string(),
            spec_suffix: DEFAULT_SPEC_SUFFIX.to_string(),
            identifier_completions: true,
            circular_require_severity: DiagnosticSeverity::WARNING,
        }
    }
}

impl ServerConfig {
    pub fn resolver(&self) -> RequireResolver {
        RequireResolver::new(&self.file_extension, &self.spec_suffix)
    }

    /// Whether switching to `other` changes how require directives resolve,
    /// which makes every cached symbol set stale.
    pub fn resolution_settings_changed(&self, other: &ServerConfig) -> bool {
        self.file_extension != other.file_extension || self.spec_suffix != other.spec_suffix
    }

    /// Whether `path` looks like a source file of this language
    pub fn is_source_file(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == self.file_extension)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolSettings {
    file_extension: Option<String>,
    spec_suffix: Option<String>,
    identifier_completions: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiagnosticSettings {
    circular_require_severity: Option<String>,
}

/// Parse configuration from LSP settings.
///
/// Reads the `symbols` and `diagnostics` sections; absent fields keep their
/// defaults. Returns `None` when neither section is present or a section is
/// malformed.
///
/// ```json
/// {
///   "symbols": { "fileExtension": "das", "specSuffix": "spec", "identifierCompletions": true },
///   "diagnostics": { "circularRequireSeverity": "warning" }
/// }
/// ```
pub fn parse_config(settings: &serde_json::Value) -> Option<ServerConfig> {
    let symbols = settings.get("symbols");
    let diagnostics = settings.get("diagnostics");
    if symbols.is_none() && diagnostics.is_none() {
        return None;
    }

    let symbols: SymbolSettings = match symbols {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| log::warn!("Invalid 'symbols' settings: {}", e))
            .ok()?,
        None => SymbolSettings::default(),
    };
    let diagnostics: DiagnosticSettings = match diagnostics {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| log::warn!("Invalid 'diagnostics' settings: {}", e))
            .ok()?,
        None => DiagnosticSettings::default(),
    };

    let mut config = ServerConfig::default();
    if let Some(ext) = symbols.file_extension.filter(|e| !e.trim().is_empty()) {
        config.file_extension = ext.trim().trim_start_matches('.').to_string();
    }
    if let Some(suffix) = symbols.spec_suffix.filter(|s| !s.trim().is_empty()) {
        config.spec_suffix = suffix.trim().trim_matches('.').to_string();
    }
    if let Some(v) = symbols.identifier_completions {
        config.identifier_completions = v;
    }
    if let Some(sev) = diagnostics.circular_require_severity {
        config.circular_require_severity = parse_severity(&sev);
    }

    log::info!("Server configuration:");
    log::info!("  file_extension: {}", config.file_extension);
    log::info!("  spec_suffix: {}", config.spec_suffix);
    log::info!("  identifier_completions: {}", config.identifier_completions);
    log::info!(
        "  circular_require_severity: {:?}",
        config.circular_require_severity
    );

    Some(config)
}

fn parse_severity(s: &str) -> DiagnosticSeverity {
    match s.to_lowercase().as_str() {
        "error" => DiagnosticSeverity::ERROR,
        "warning" => DiagnosticSeverity::WARNING,
        "information" | "info" => DiagnosticSeverity::INFORMATION,
        "hint" => DiagnosticSeverity::HINT,
        _ => DiagnosticSeverity::WARNING,
    }
}
