//! Hover information provider

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position, Range};

use crate::context::resolve_lines;
use crate::parser::{find_key_separator, list_item_body, offset_of, unquote};
use crate::schema;

/// Schema facts about the key under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverInfo {
    pub key: String,
    pub type_label: String,
    pub description: &'static str,
    pub values: Option<&'static [&'static str]>,
    /// 0-based character span of the key on its line.
    pub start: usize,
    pub end: usize,
}

impl HoverInfo {
    pub fn to_markdown(&self) -> String {
        let mut out = format!("**{}** `{}`\n\n{}", self.key, self.type_label, self.description);
        if let Some(values) = self.values {
            let listed: Vec<String> = values.iter().map(|v| format!("`{v}`")).collect();
            out.push_str("\n\nAllowed values: ");
            out.push_str(&listed.join(", "));
        }
        out
    }
}

/// Describe the key at the 0-based `line` and `column`, if the cursor is on one
/// the schema knows about.
pub fn describe_key(text: &str, line: usize, column: usize) -> Option<HoverInfo> {
    let lines: Vec<&str> = text.lines().collect();
    let current = *lines.get(line)?;
    let body = current.trim_start();
    let entry = list_item_body(body).unwrap_or(body);
    let separator = find_key_separator(entry)?;
    let raw_key = entry[..separator].trim_end();

    let start_byte = offset_of(current, entry);
    let end_byte = start_byte + raw_key.len();
    let start = current[..start_byte].chars().count();
    let end = current[..end_byte].chars().count();
    if column < start || column > end {
        return None;
    }

    let key = unquote(raw_key);
    let path = resolve_lines(&lines, line);
    let node = schema::compose().resolve(path.as_slice())?.child(&key)?;
    Some(HoverInfo {
        type_label: node.type_label(),
        description: node.description,
        values: node.values,
        key,
        start,
        end,
    })
}

/// Generate hover information for the given document and position
pub fn provide_hover(text: &str, position: Position) -> Option<Hover> {
    let info = describe_key(text, position.line as usize, position.character as usize)?;

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: info.to_markdown(),
        }),
        range: Some(Range {
            start: Position::new(position.line, info.start as u32),
            end: Position::new(position.line, info.end as u32),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "\
services:
  web:
    restart: always
    deploy:
      replicas: 2
    depends_on:
      - db
";

    #[test]
    fn describes_service_keys() {
        let info = describe_key(TEXT, 2, 6).unwrap();
        assert_eq!(info.key, "restart");
        assert_eq!(info.type_label, "string");
        assert_eq!(info.values, Some(&["no", "always", "on-failure", "unless-stopped"][..]));
        assert_eq!((info.start, info.end), (4, 11));
    }

    #[test]
    fn describes_nested_keys() {
        let info = describe_key(TEXT, 4, 8).unwrap();
        assert_eq!(info.key, "replicas");
        assert_eq!(info.description, "Number of containers to run");
        assert_eq!(info.type_label, "number | string");
    }

    #[test]
    fn user_chosen_names_use_the_wildcard_entry() {
        let info = describe_key(TEXT, 1, 3).unwrap();
        assert_eq!(info.key, "web");
        assert_eq!(info.description, "A service definition");
    }

    #[test]
    fn nothing_outside_a_key() {
        assert!(describe_key(TEXT, 2, 14).is_none());
        assert!(describe_key(TEXT, 2, 1).is_none());
        assert!(describe_key(TEXT, 6, 8).is_none());
        assert!(describe_key(TEXT, 40, 0).is_none());
        assert!(describe_key("foo:\n  bar: 1\n", 1, 3).is_none());
    }

    #[test]
    fn hover_renders_markdown_with_key_range() {
        let hover = provide_hover(TEXT, Position::new(2, 5)).unwrap();
        let HoverContents::Markup(content) = hover.contents else {
            panic!("expected markup");
        };
        assert!(content.value.starts_with("**restart** `string`"));
        assert!(content.value.contains("`unless-stopped`"));
        assert_eq!(
            hover.range,
            Some(Range::new(Position::new(2, 4), Position::new(2, 11)))
        );
    }
}
