//
// symbols/mod.rs
//
// Function-signature extraction for daScript sources
//

pub mod cache;
pub mod doc_comment;
pub mod extract;
pub mod require;
pub mod scanner;


pub use cache::{CircularRequire, FileSymbols, SymbolCache};
pub use extract::{DiskReader, SourceReader, SymbolExtractor};
pub use require::{RequireResolver, DEFAULT_EXTENSION, DEFAULT_SPEC_SUFFIX};
pub use scanner::{scan, RequireDirective, ScanItem};

use std::fmt::Write;
use std::path::PathBuf;

/// A single declared parameter: `name` or `name: type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: Option<String>,
}

impl Parameter {
    /// Label used in rendered signatures. Whitespace inside the type is dropped,
    /// so `array < int >` renders as `array<int>`.
    pub fn label(&self) -> String {
        match &self.ty {
            Some(ty) => {
                let compact: String = ty.split_whitespace().collect();
                format!("{}: {}", self.name, compact)
            }
            None => self.name.clone(),
        }
    }
}

/// A function declaration recovered from a `def name(args)` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// True iff the preceding non-blank line is the export marker
    pub is_exported: bool,
    /// File holding the header line (the origin file for required records)
    pub declaring_file: PathBuf,
    /// 0-based line of the header in `declaring_file`
    pub declaring_line: u32,
    pub doc_comment: String,
}

impl FunctionRecord {
    /// Copy of this record as seen through a `require` directive.
    ///
    /// The copy is an independent value; only the origin keeps its export flag.
    pub fn required_copy(&self) -> Self {
        Self {
            is_exported: false,
            ..self.clone()
        }
    }

    /// `name(a: int, b)`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.parameters.iter().map(Parameter::label).collect();
        format!("{}({})", self.name, params.join(", "))
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    /// Markdown shown in hover and completion documentation: the doc comment
    /// followed by the signature in a code block.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        if !self.doc_comment.is_empty() {
            md.push_str(&self.doc_comment);
            md.push_str("\n\n");
        }
        // Writing to a String cannot fail
        let _ = write!(md, "```dascript\n{}\n```", self.signature());
        md
    }
}
