//
// symbols/doc_comment.rs
//
// Rendering of `/* ... */` block comments into markdown documentation.
//
// Lines of a block comment are stripped of their comment markers and joined
// into a paragraph. A line carrying an `@tag` annotation starts on a new
// markdown line and has the tag emphasized, so
//
//   /**
//    * Adds two numbers
//    * @param a left operand
//    */
//
// renders as `Adds two numbers  \n_@param_ a left operand`.
//

use regex::Regex;
use std::sync::OnceLock;

/// Markdown hard line break
const LINE_BREAK: &str = "  \n";

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // The tag starts the content or follows whitespace, so `a@b.com` is not one
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|\s)(@[A-Za-z_][A-Za-z0-9_]*)").expect("valid tag regex")
    })
}

/// Accumulates the lines of one open block comment.
#[derive(Debug, Default, Clone)]
pub struct DocCommentBuilder {
    text: String,
}

impl DocCommentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one source line that belongs to the open comment.
    pub fn push_line(&mut self, line: &str) {
        let content = strip_comment_markers(line);
        if content.is_empty() {
            return;
        }

        if let Some(tag) = tag_pattern().captures(content).and_then(|c| c.get(1)) {
            self.text.push_str(LINE_BREAK);
            self.text.push_str(&content[..tag.start()]);
            self.text.push('_');
            self.text.push_str(tag.as_str());
            self.text.push('_');
            self.text.push_str(&content[tag.end()..]);
        } else {
            if !self.text.is_empty() && !self.text.ends_with('\n') {
                self.text.push(' ');
            }
            self.text.push_str(content);
        }
    }

    pub fn finish(self) -> String {
        self.text.trim().to_string()
    }
}

/// Strip `/*`, `/**`, `*/` and a leading `*` decoration from a comment line.
fn strip_comment_markers(line: &str) -> &str {
    let mut s = line;
    if let Some(idx) = s.find("/*") {
        s = &s[idx + 2..];
        if !s.starts_with("*/") {
            s = s.strip_prefix('*').unwrap_or(s);
        }
    }
    if let Some(idx) = s.find("*/") {
        s = &s[..idx];
    }
    let s = s.trim();
    s.strip_prefix('*').map(str::trim).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(lines: &[&str]) -> String {
        let mut builder = DocCommentBuilder::new();
        for line in lines {
            builder.push_line(line);
        }
        builder.finish()
    }

    #[test]
    fn test_single_line_comment() {
        assert_eq!(render(&["/* doc */"]), "doc");
    }

    #[test]
    fn test_javadoc_style_block() {
        let doc = render(&[
            "/**",
            " * Adds two numbers",
            " * together",
            " * @param a left operand",
            " * @return the sum",
            " */",
        ]);
        assert_eq!(
            doc,
            "Adds two numbers together  \n_@param_ a left operand  \n_@return_ the sum"
        );
    }

    #[test]
    fn test_text_after_tag_line_joins_with_space() {
        let doc = render(&["/* @deprecated", "use other */"]);
        assert_eq!(doc, "_@deprecated_ use other");
    }

    #[test]
    fn test_email_address_is_not_a_tag() {
        let doc = render(&["/* Summary", " * contact a@b.com", " */"]);
        assert_eq!(doc, "Summary contact a@b.com");
    }

    #[test]
    fn test_tag_after_leading_text() {
        let doc = render(&["/* Summary", " * see also @ref other */"]);
        assert_eq!(doc, "Summary  \nsee also _@ref_ other");
    }

    #[test]
    fn test_empty_comment() {
        assert_eq!(render(&["/*", " *", " */"]), "");
    }

    #[test]
    fn test_strip_markers_keeps_inner_text() {
        assert_eq!(strip_comment_markers("x = 1 /* note"), "note");
        assert_eq!(strip_comment_markers("   * item */"), "item");
        assert_eq!(strip_comment_markers("plain text"), "plain text");
        assert_eq!(strip_comment_markers("/**/"), "");
    }
}
