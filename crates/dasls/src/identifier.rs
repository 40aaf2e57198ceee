//
// identifier.rs
//
// Identifier tokenizing around a cursor: the word under the cursor, every
// identifier of a document, and the callee of the call enclosing the cursor.
//
// Offsets are char indices into the line. Identifier characters are ASCII
// letters, digits and underscore.
//

use indexmap::IndexSet;
use std::collections::HashSet;

pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// The maximal run of identifier characters containing `offset`.
///
/// Returns an empty string when the character at `offset` is not an
/// identifier character (or `offset` is past the end of the line).
pub fn identifier_at(line: &str, offset: usize) -> String {
    let chars: Vec<char> = line.chars().collect();
    match chars.get(offset) {
        Some(&c) if is_identifier_char(c) => {}
        _ => return String::new(),
    }

    let mut start = offset;
    while start > 0 && is_identifier_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = offset;
    while end < chars.len() && is_identifier_char(chars[end]) {
        end += 1;
    }
    chars[start..end].iter().collect()
}

/// Every distinct identifier of `text` in order of first occurrence, skipping
/// names contained in `known`.
pub fn harvest_identifiers(text: &str, known: &HashSet<&str>) -> Vec<String> {
    let mut found: IndexSet<String> = IndexSet::new();
    for line in text.lines() {
        for word in line.split(|c: char| !is_identifier_char(c)) {
            if !word.is_empty() && !known.contains(word) && !found.contains(word) {
                found.insert(word.to_string());
            }
        }
    }
    found.into_iter().collect()
}

/// Call enclosing a cursor position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosingCall {
    /// Identifier immediately before the unmatched `(`
    pub callee: String,
    /// Number of top-level commas between the `(` and the cursor
    pub active_parameter: u32,
}

/// Find the call whose argument list contains `offset`.
///
/// Scans backward from the character before `offset`, skipping balanced
/// parentheses, to the first unmatched `(`, then reads the identifier right
/// before it. Whitespace between the callee and `(` is not allowed.
pub fn enclosing_call(line: &str, offset: usize) -> Option<EnclosingCall> {
    let chars: Vec<char> = line.chars().collect();
    let mut idx = offset.min(chars.len());
    let mut depth = 0u32;
    let mut commas = 0u32;

    let open = loop {
        if idx == 0 {
            return None;
        }
        idx -= 1;
        match chars[idx] {
            ')' => depth += 1,
            '(' if depth == 0 => break idx,
            '(' => depth -= 1,
            ',' if depth == 0 => commas += 1,
            _ => {}
        }
    };

    let mut start = open;
    while start > 0 && is_identifier_char(chars[start - 1]) {
        start -= 1;
    }
    if start == open {
        return None;
    }

    Some(EnclosingCall {
        callee: chars[start..open].iter().collect(),
        active_parameter: commas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identifier_at_inside_word() {
        assert_eq!(identifier_at("abc_1 + def", 2), "abc_1");
        assert_eq!(identifier_at("abc_1 + def", 0), "abc_1");
        assert_eq!(identifier_at("abc_1 + def", 4), "abc_1");
        assert_eq!(identifier_at("abc_1 + def", 9), "def");
    }

    #[test]
    fn test_identifier_at_non_identifier() {
        assert_eq!(identifier_at("abc_1 + def", 5), "");
        assert_eq!(identifier_at("abc_1 + def", 6), "");
        assert_eq!(identifier_at("abc", 3), "");
        assert_eq!(identifier_at("", 0), "");
    }

    #[test]
    fn test_identifier_at_non_ascii_line() {
        // offsets are char indices, not bytes
        assert_eq!(identifier_at("é = foo", 5), "foo");
        assert_eq!(identifier_at("é = foo", 0), "");
    }

    #[test]
    fn test_harvest_skips_known_and_duplicates() {
        let known: HashSet<&str> = ["print"].into_iter().collect();
        let found = harvest_identifiers("let x = 1\nprint(x, y_2)\n", &known);
        assert_eq!(found, vec!["let", "x", "1", "y_2"]);
    }

    #[test]
    fn test_enclosing_call_simple() {
        let call = enclosing_call("foo(a, b", 8).unwrap();
        assert_eq!(call.callee, "foo");
        assert_eq!(call.active_parameter, 1);
    }

    #[test]
    fn test_enclosing_call_skips_nested_calls() {
        let line = "outer(inner(1, 2), x";
        let call = enclosing_call(line, line.len()).unwrap();
        assert_eq!(call.callee, "outer");
        assert_eq!(call.active_parameter, 1);
    }

    #[test]
    fn test_enclosing_call_cursor_inside_inner() {
        let call = enclosing_call("outer(inner(1, ", 15).unwrap();
        assert_eq!(call.callee, "inner");
        assert_eq!(call.active_parameter, 1);
    }

    #[test]
    fn test_enclosing_call_none() {
        assert_eq!(enclosing_call("foo(a)", 6), None);
        assert_eq!(enclosing_call("(a", 2), None);
        assert_eq!(enclosing_call("foo (a", 6), None);
        assert_eq!(enclosing_call("x = 1", 5), None);
    }

    proptest! {
        #[test]
        fn prop_identifier_at_is_maximal_run(line in "[a-z_ +().,0-9]{0,24}", offset in 0usize..26) {
            let ident = identifier_at(&line, offset);
            let chars: Vec<char> = line.chars().collect();
            match chars.get(offset) {
                Some(&c) if is_identifier_char(c) => {
                    prop_assert!(!ident.is_empty());
                    prop_assert!(ident.chars().all(is_identifier_char));
                    prop_assert!(line.contains(&ident));
                    // Maximal: the run cannot be extended on either side
                    let start = (0..=offset)
                        .rev()
                        .take_while(|&i| is_identifier_char(chars[i]))
                        .last()
                        .unwrap();
                    prop_assert_eq!(ident.chars().count(), {
                        let mut end = start;
                        while end < chars.len() && is_identifier_char(chars[end]) {
                            end += 1;
                        }
                        end - start
                    });
                }
                _ => prop_assert!(ident.is_empty()),
            }
        }
    }
}
