//! Cursor context resolution
//!
//! Replays the parser's indentation bookkeeping over the lines above the
//! cursor to find which keys enclose it. Only keys that open a nested block
//! (empty value or a block-scalar marker) become part of the path; a key with
//! an inline value is a leaf.

use tracing::trace;

use crate::parser::{
    find_key_separator, is_block_marker, is_skippable, leading_spaces, list_item_body, offset_of,
    strip_inline_comment, unquote,
};

/// Keys from the document root to the container enclosing a cursor.
/// Empty means the cursor is at root level.
pub type ContextPath = Vec<String>;

struct ContextFrame {
    indent: isize,
    key: String,
    block_scalar: bool,
}

/// Resolve the context path for the 0-based `cursor_line` of `text`.
pub fn resolve_context(text: &str, cursor_line: usize) -> ContextPath {
    let lines: Vec<&str> = text.lines().collect();
    resolve_lines(&lines, cursor_line)
}

/// Resolve the context path for the 0-based `cursor_line` of `lines`.
pub fn resolve_lines(lines: &[&str], cursor_line: usize) -> ContextPath {
    let mut stack: Vec<ContextFrame> = Vec::new();

    for line in lines.iter().take(cursor_line) {
        if is_skippable(line) {
            continue;
        }
        let indent = leading_spaces(line) as isize;

        // Lines inside a block scalar are text, not structure.
        if matches!(stack.last(), Some(top) if top.block_scalar && indent > top.indent) {
            continue;
        }
        while matches!(stack.last(), Some(top) if top.indent >= indent) {
            stack.pop();
        }

        let body = line[indent as usize..].trim();
        let entry = list_item_body(body).unwrap_or(body);
        let Some(separator) = find_key_separator(entry) else {
            continue;
        };
        let value = strip_inline_comment(&entry[separator + 1..]).trim();
        if value.is_empty() || is_block_marker(value) {
            stack.push(ContextFrame {
                indent: indent + offset_of(body, entry) as isize,
                key: unquote(entry[..separator].trim()),
                block_scalar: !value.is_empty(),
            });
        }
    }

    let cursor_text = lines.get(cursor_line).copied().unwrap_or("");
    let cursor_indent = if cursor_text.trim().is_empty() {
        cursor_text.chars().count()
    } else {
        leading_spaces(cursor_text)
    } as isize;
    while matches!(stack.last(), Some(top) if top.indent >= cursor_indent) {
        stack.pop();
    }

    let path: ContextPath = stack.into_iter().map(|frame| frame.key).collect();
    trace!(cursor_line, ?path, "resolved context");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_level_is_empty() {
        assert!(resolve_context("", 0).is_empty());
        assert!(resolve_context("services:\n  web:\n    image: x\n", 3).is_empty());
        assert!(resolve_context("version: \"3\"\n", 1).is_empty());
    }

    #[test]
    fn blank_line_uses_its_length_as_indent() {
        let text = "services:\n  web:\n    deploy:\n      ";
        assert_eq!(resolve_context(text, 3), vec!["services", "web", "deploy"]);

        let text = "services:\n  web:\n    deploy:\n    ";
        assert_eq!(resolve_context(text, 3), vec!["services", "web"]);

        let text = "services:\n  web:\n    deploy:\n  ";
        assert_eq!(resolve_context(text, 3), vec!["services"]);
    }

    #[test]
    fn partially_typed_key_uses_leading_spaces() {
        let text = "services:\n  web:\n    restart: always\n    hea";
        assert_eq!(resolve_context(text, 3), vec!["services", "web"]);
    }

    #[test]
    fn keys_with_inline_values_are_leaves() {
        let text = "services:\n  web:\n    image: nginx\n      ";
        assert_eq!(resolve_context(text, 3), vec!["services", "web"]);
    }

    #[test]
    fn list_item_keys_use_their_own_column() {
        let text = "x:\n  - build:\n      \n";
        assert_eq!(resolve_context(text, 2), vec!["x", "build"]);

        let text = "x:\n  - build:\n    ";
        assert_eq!(resolve_context(text, 2), vec!["x"]);
    }

    #[test]
    fn block_scalar_content_is_not_structure() {
        let text = "services:\n  web:\n    command: |\n      echo: hi\n      ";
        assert_eq!(resolve_context(text, 4), vec!["services", "web", "command"]);
    }

    #[test]
    fn later_siblings_replace_earlier_ones() {
        let text = "\
services:
  web:
    deploy:
      replicas: 2
    healthcheck:
      ";
        assert_eq!(resolve_context(text, 5), vec!["services", "web", "healthcheck"]);
    }

    #[test]
    fn cursor_past_the_end_is_root() {
        assert!(resolve_context("services:\n  web:\n", 10).is_empty());
    }
}
