//
// symbols/scanner.rs
//
// Line-oriented scanner recovering function headers, doc comments, export
// markers and require directives from one file.
//
// The scanner is pure: it never touches the filesystem. Require directives are
// reported in source order alongside the function records so the extractor can
// apply them at the right point of the merge.
//

use std::path::Path;

use super::doc_comment::DocCommentBuilder;
use super::{FunctionRecord, Parameter};

/// Marker placed on the line directly above an exported declaration
pub const EXPORT_MARKER: &str = "[export]";

/// Prefix of a require directive line
pub const REQUIRE_PREFIX: &str = "require ";

const DEF_KEYWORD: &str = "def ";

/// A `require <module>` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireDirective {
    /// Module reference as written, e.g. `daslib/json` or `utils`
    pub module: String,
    /// 0-based line of the directive
    pub line: u32,
}

/// One item recovered by the scanner, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanItem {
    Function(FunctionRecord),
    Require(RequireDirective),
}

/// Running state of the single forward pass.
#[derive(Debug, Default)]
struct ScanState {
    pending_export: bool,
    open_comment: Option<DocCommentBuilder>,
    last_comment: Option<String>,
}

/// Scan `text` (the contents of `path`) into an ordered list of items.
pub fn scan(path: &Path, text: &str) -> Vec<ScanItem> {
    let mut state = ScanState::default();
    let mut items = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let line_num = line_num as u32;

        if line.trim().is_empty() {
            // Comments do not attach across blank lines
            state.last_comment = None;
            continue;
        }

        if let Some(rest) = line.strip_prefix(REQUIRE_PREFIX) {
            state.pending_export = false;
            let module = rest.trim();
            if !module.is_empty() {
                log::trace!("  require '{}' at line {}", module, line_num);
                items.push(ScanItem::Require(RequireDirective {
                    module: module.to_string(),
                    line: line_num,
                }));
            }
            continue;
        }

        let code = track_comment(&mut state, line);

        if let Some(header) = parse_header(code.before).or_else(|| parse_header(code.after)) {
            log::trace!("  def '{}' at line {}", header.name, line_num);
            items.push(ScanItem::Function(FunctionRecord {
                name: header.name.to_string(),
                parameters: parse_parameters(header.args),
                is_exported: state.pending_export,
                declaring_file: path.to_path_buf(),
                declaring_line: line_num,
                // Stays attached to every header until a blank line
                doc_comment: state.last_comment.clone().unwrap_or_default(),
            }));
        }

        state.pending_export = line.starts_with(EXPORT_MARKER);
    }

    items
}

/// The parts of a line that lie outside any block comment.
#[derive(Debug, Default, PartialEq, Eq)]
struct CodeSpans<'a> {
    /// Text before a comment opener, or the whole line when no comment is involved
    before: &'a str,
    /// Text after the closer of the comment that ends on this line
    after: &'a str,
}

/// Feed one line through the block-comment tracker.
///
/// Returns the spans of the line that are code and so eligible for header
/// detection. A line that lies wholly inside an open comment has none.
fn track_comment<'a>(state: &mut ScanState, line: &'a str) -> CodeSpans<'a> {
    let mut spans = CodeSpans::default();

    // A second opener inside an open comment is just text
    if state.open_comment.is_none() {
        match line.find("/*") {
            Some(open) => {
                spans.before = &line[..open];
                state.open_comment = Some(DocCommentBuilder::new());
            }
            None => {
                spans.before = line;
                return spans;
            }
        }
    }

    if let Some(builder) = state.open_comment.as_mut() {
        builder.push_line(line);
    }

    if let Some(close) = line.rfind("*/") {
        state.last_comment = state.open_comment.take().map(DocCommentBuilder::finish);
        spans.after = &line[close + 2..];
    }

    spans
}

#[derive(Debug, PartialEq, Eq)]
struct Header<'a> {
    name: &'a str,
    args: &'a str,
}

/// Cursor over a single line, used to recognise `def <name>(<args>)`.
struct LineCursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// Advance past the next standalone `def ` keyword.
    fn skip_to_def(&mut self) -> bool {
        while let Some(offset) = self.rest().find(DEF_KEYWORD) {
            let start = self.pos + offset;
            self.pos = start + DEF_KEYWORD.len();
            let standalone = self.text[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !is_identifier_char(c));
            if standalone {
                return true;
            }
        }
        false
    }

    /// Take text up to (not including) `delim` and step over it.
    fn take_until(&mut self, delim: char) -> Option<&'a str> {
        let rest = self.rest();
        let offset = rest.find(delim)?;
        self.pos += offset + delim.len_utf8();
        Some(&rest[..offset])
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Recognise a single-line function header anywhere on the line.
fn parse_header(line: &str) -> Option<Header<'_>> {
    let mut cursor = LineCursor::new(line);
    while cursor.skip_to_def() {
        let resume = cursor.pos;
        let name = cursor.take_until('(')?.trim();
        if name.is_empty() {
            cursor.pos = resume;
            continue;
        }
        // Argument lists spanning lines are not recognised
        let args = cursor.take_until(')')?;
        return Some(Header { name, args });
    }
    None
}

/// Split a raw argument list into parameters.
///
/// `a: int, b` yields `a` typed `int` and untyped `b`. Pieces without a name
/// are dropped, so `()` and `(,)` produce no parameters.
fn parse_parameters(args: &str) -> Vec<Parameter> {
    args.split(',')
        .filter_map(|piece| {
            let (name, ty) = match piece.split_once(':') {
                Some((name, ty)) => (name.trim(), Some(ty.trim().to_string())),
                None => (piece.trim(), None),
            };
            if name.is_empty() {
                None
            } else {
                Some(Parameter {
                    name: name.to_string(),
                    ty,
                })
            }
        })
        .collect()
}
