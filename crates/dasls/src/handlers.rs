//
// handlers.rs
//
// LSP request handlers built on the resolved symbol list of a document
//

use std::collections::HashSet;

use tower_lsp::lsp_types::*;

use crate::identifier::{enclosing_call, harvest_identifiers, identifier_at};
use crate::state::WorldState;
use crate::symbols::FunctionRecord;
use crate::utf16::utf16_column_to_char_index;

const DIAGNOSTIC_SOURCE: &str = "dasls";

/// Line under the cursor and the cursor's char offset within it
fn cursor_line(state: &WorldState, uri: &Url, position: Position) -> Option<(String, usize)> {
    let doc = state.get_document(uri)?;
    let line = doc.line_text(position.line as usize);
    let offset = utf16_column_to_char_index(&line, position.character);
    Some((line, offset))
}

/// Identifier under the cursor, `None` when the cursor is not on one
fn identifier_under_cursor(state: &WorldState, uri: &Url, position: Position) -> Option<String> {
    let (line, offset) = cursor_line(state, uri, position)?;
    let ident = identifier_at(&line, offset);
    if ident.is_empty() {
        None
    } else {
        Some(ident)
    }
}

fn markdown(value: String) -> MarkupContent {
    MarkupContent {
        kind: MarkupKind::Markdown,
        value,
    }
}

// ============================================================================
// Completion
// ============================================================================

/// Function records of the document first, then every other identifier of
/// the document as plain text.
pub fn completion(state: &mut WorldState, uri: &Url, _position: Position) -> Option<CompletionResponse> {
    let symbols = state.symbols(uri)?;

    let mut items: Vec<CompletionItem> = symbols
        .functions
        .iter()
        .map(|func| CompletionItem {
            label: func.name.clone(),
            kind: Some(CompletionItemKind::FUNCTION),
            detail: Some(func.signature()),
            documentation: Some(Documentation::MarkupContent(markdown(func.to_markdown()))),
            ..Default::default()
        })
        .collect();

    if state.config.identifier_completions {
        let known: HashSet<&str> = symbols.functions.iter().map(|f| f.name.as_str()).collect();
        let text = state.get_document(uri)?.text();
        items.extend(
            harvest_identifiers(&text, &known)
                .into_iter()
                .map(|ident| CompletionItem {
                    label: ident,
                    kind: Some(CompletionItemKind::TEXT),
                    ..Default::default()
                }),
        );
    }

    log::trace!("Completion for {}: {} items", uri, items.len());
    Some(CompletionResponse::Array(items))
}

// ============================================================================
// Hover
// ============================================================================

pub fn hover(state: &mut WorldState, uri: &Url, position: Position) -> Option<Hover> {
    let ident = identifier_under_cursor(state, uri, position)?;
    let symbols = state.symbols(uri)?;
    let func = symbols.find(&ident)?;
    Some(Hover {
        contents: HoverContents::Markup(markdown(func.to_markdown())),
        range: None,
    })
}

// ============================================================================
// Goto Definition
// ============================================================================

/// Location of the header line of the function under the cursor. For required
/// functions this is in the file that declares them.
pub fn goto_definition(
    state: &mut WorldState,
    uri: &Url,
    position: Position,
) -> Option<GotoDefinitionResponse> {
    let ident = identifier_under_cursor(state, uri, position)?;
    let symbols = state.symbols(uri)?;
    let func = symbols.find(&ident)?;
    let target = Url::from_file_path(&func.declaring_file).ok()?;
    let start = Position::new(func.declaring_line, 0);
    Some(GotoDefinitionResponse::Scalar(Location {
        uri: target,
        range: Range { start, end: start },
    }))
}

// ============================================================================
// Signature Help
// ============================================================================

pub fn signature_help(
    state: &mut WorldState,
    uri: &Url,
    position: Position,
) -> Option<SignatureHelp> {
    let (line, offset) = cursor_line(state, uri, position)?;
    let call = enclosing_call(&line, offset)?;
    let symbols = state.symbols(uri)?;
    let func = symbols.find(&call.callee)?;
    Some(signature_for(func, call.active_parameter))
}

fn signature_for(func: &FunctionRecord, active_parameter: u32) -> SignatureHelp {
    let parameters: Vec<ParameterInformation> = func
        .parameters
        .iter()
        .map(|p| ParameterInformation {
            label: ParameterLabel::Simple(p.label()),
            documentation: None,
        })
        .collect();

    let active = if parameters.is_empty() {
        None
    } else {
        Some(active_parameter.min(parameters.len() as u32 - 1))
    };
    let documentation = if func.doc_comment.is_empty() {
        None
    } else {
        Some(Documentation::MarkupContent(markdown(func.doc_comment.clone())))
    };

    SignatureHelp {
        signatures: vec![SignatureInformation {
            label: func.signature(),
            documentation,
            parameters: Some(parameters),
            active_parameter: active,
        }],
        active_signature: Some(0),
        active_parameter: active,
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Circular require diagnostics for an open document
pub fn diagnostics(state: &mut WorldState, uri: &Url) -> Vec<Diagnostic> {
    let Some(symbols) = state.symbols(uri) else {
        return Vec::new();
    };
    let Some(doc) = state.get_document(uri) else {
        return Vec::new();
    };
    let severity = state.config.circular_require_severity;

    symbols
        .cycles
        .iter()
        .map(|cycle| {
            let line_text = doc.line_text(cycle.line as usize);
            let end = line_text.encode_utf16().count() as u32;
            Diagnostic {
                range: Range {
                    start: Position::new(cycle.line, 0),
                    end: Position::new(cycle.line, end),
                },
                severity: Some(severity),
                source: Some(DIAGNOSTIC_SOURCE.to_string()),
                message: format!(
                    "Circular require: '{}' ({}) leads back to a file that is already being resolved",
                    cycle.module,
                    cycle.target.display()
                ),
                ..Default::default()
            }
        })
        .collect()
}
