//! Indentation-driven parsing of Compose documents
//!
//! The parser never fails. Malformed lines are reported as structural
//! diagnostics and integrated into the tree on a best-effort basis, so that a
//! document that is half-typed still yields something to validate and complete.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value as JsonValue};
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticKind};

/// An object node: keys in insertion order, later duplicates overwrite.
pub type Mapping = IndexMap<String, Node>;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Number(Number),
    Bool(bool),
    Null,
}

/// A node in the parsed tree. Positions are not tracked on nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Array(Vec<Node>),
    Object(Mapping),
}

impl Node {
    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Node::Scalar(Scalar::String(value.into()))
    }

    pub fn as_object(&self) -> Option<&Mapping> {
        match self {
            Node::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Null))
    }

    /// Text of a scalar as it would be compared against enumerated values.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s.clone()),
            Node::Scalar(Scalar::Number(n)) => Some(n.to_string()),
            Node::Scalar(Scalar::Bool(b)) => Some(b.to_string()),
            Node::Scalar(Scalar::Null) => Some("null".to_string()),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Node::Scalar(Scalar::String(s)) => JsonValue::String(s.clone()),
            Node::Scalar(Scalar::Number(n)) => JsonValue::Number(n.clone()),
            Node::Scalar(Scalar::Bool(b)) => JsonValue::Bool(*b),
            Node::Scalar(Scalar::Null) => JsonValue::Null,
            Node::Array(items) => JsonValue::Array(items.iter().map(Node::to_json).collect()),
            Node::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

/// A parsed document: the root mapping plus structural diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Always a [`Node::Object`].
    pub root: Node,
    pub diagnostics: Vec<Diagnostic>,
}

impl Document {
    pub fn root_mapping(&self) -> Option<&Mapping> {
        self.root.as_object()
    }
}

/// Parse `text` into a tree, collecting structural diagnostics.
pub fn parse(text: &str) -> Document {
    let mut session = ParseSession::new(text);
    session.run();
    let document = session.finish();
    debug!(
        keys = document.root_mapping().map_or(0, Mapping::len),
        diagnostics = document.diagnostics.len(),
        "parsed document"
    );
    document
}

/// Where a finished container is attached when its frame closes.
#[derive(Debug)]
enum Slot {
    Root,
    Key(String),
    Item,
}

#[derive(Debug)]
struct Frame {
    indent: isize,
    container: Node,
    slot: Slot,
}

/// Mutable state threaded through one parse call.
struct ParseSession<'a> {
    lines: Vec<&'a str>,
    stack: Vec<Frame>,
    diagnostics: Vec<Diagnostic>,
    indent_unit: Option<usize>,
    previous_indent: Option<usize>,
}

impl<'a> ParseSession<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            stack: vec![Frame {
                indent: -1,
                container: Node::Object(Mapping::new()),
                slot: Slot::Root,
            }],
            diagnostics: Vec::new(),
            indent_unit: None,
            previous_indent: None,
        }
    }

    fn run(&mut self) {
        let mut index = 0;
        while index < self.lines.len() {
            let line = self.lines[index];
            if is_skippable(line) {
                index += 1;
                continue;
            }

            let line_number = index + 1;
            if let Some(tab) = line.find('\t') {
                self.diagnostics.push(Diagnostic::error(
                    DiagnosticKind::TabCharacter,
                    line_number,
                    line[..tab].chars().count() + 1,
                    "Tab character found; use spaces for indentation",
                ));
            }

            let indent = leading_spaces(line);
            self.check_indentation(indent, line_number);
            self.close_frames(indent);

            let body = line[indent..].trim();
            index = self.parse_line(index, indent, body);
        }
    }

    fn finish(mut self) -> Document {
        while self.stack.len() > 1 {
            self.close_top();
        }
        let root = self
            .stack
            .pop()
            .map(|frame| frame.container)
            .unwrap_or_else(|| Node::Object(Mapping::new()));
        Document {
            root,
            diagnostics: self.diagnostics,
        }
    }

    fn check_indentation(&mut self, indent: usize, line_number: usize) {
        if indent > 0 {
            match self.indent_unit {
                None => self.indent_unit = Some(indent),
                Some(unit) => {
                    if indent % unit != 0 {
                        self.diagnostics.push(Diagnostic::error(
                            DiagnosticKind::IndentationNotMultiple,
                            line_number,
                            indent + 1,
                            format!(
                                "Indentation of {indent} spaces is not a multiple of {unit}"
                            ),
                        ));
                    }
                    let previous = self.previous_indent.unwrap_or(0);
                    if indent > previous + unit {
                        self.diagnostics.push(Diagnostic::error(
                            DiagnosticKind::IndentationJump,
                            line_number,
                            indent + 1,
                            format!(
                                "Indentation jumps from {previous} to {indent} spaces; expected at most {}",
                                previous + unit
                            ),
                        ));
                    }
                }
            }
        }
        self.previous_indent = Some(indent);
    }

    fn parse_line(&mut self, index: usize, indent: usize, body: &str) -> usize {
        if let Some(rest) = list_item_body(body) {
            return self.parse_list_item(index, indent, body, rest);
        }

        if let Some(separator) = find_key_separator(body) {
            let key = unquote(body[..separator].trim());
            return self.parse_entry(index, indent, key, &body[separator + 1..]);
        }

        self.diagnostics.push(Diagnostic::error(
            DiagnosticKind::InvalidSyntax,
            index + 1,
            indent + 1,
            "Invalid syntax: expected 'key: value' or '- item'",
        ));
        index + 1
    }

    fn parse_list_item(&mut self, index: usize, indent: usize, body: &str, rest: &str) -> usize {
        if !matches!(self.top().container, Node::Array(_)) {
            let outcome = if self.can_attach_item() {
                "attached to the preceding key"
            } else {
                "the item was discarded"
            };
            self.diagnostics.push(Diagnostic::error(
                DiagnosticKind::ListParentMismatch,
                index + 1,
                indent + 1,
                format!("List item found where a mapping was expected; {outcome}"),
            ));
        }

        let rest = strip_inline_comment(rest).trim();
        if rest.is_empty() {
            match self.next_content(index) {
                Some((next_indent, next_body)) if next_indent > indent => {
                    let container = if list_item_body(next_body).is_some() {
                        Node::Array(Vec::new())
                    } else {
                        Node::Object(Mapping::new())
                    };
                    self.stack.push(Frame {
                        indent: indent as isize,
                        container,
                        slot: Slot::Item,
                    });
                }
                _ => self.push_item(Node::null()),
            }
            return index + 1;
        }

        if !rest.starts_with(['[', '{']) {
            if let Some(separator) = find_key_separator(rest) {
                let key_indent = indent + offset_of(body, rest);
                self.stack.push(Frame {
                    indent: indent as isize,
                    container: Node::Object(Mapping::new()),
                    slot: Slot::Item,
                });
                let key = unquote(rest[..separator].trim());
                return self.parse_entry(index, key_indent, key, &rest[separator + 1..]);
            }
        }

        self.push_item(parse_value(rest));
        index + 1
    }

    /// Handle `key: value`, where `key_indent` is the column the key starts at.
    fn parse_entry(&mut self, index: usize, key_indent: usize, key: String, raw_value: &str) -> usize {
        let value = strip_inline_comment(raw_value).trim();

        if value.is_empty() {
            match self.next_content(index) {
                Some((next_indent, next_body)) if next_indent > key_indent => {
                    let container = if list_item_body(next_body).is_some() {
                        Node::Array(Vec::new())
                    } else {
                        Node::Object(Mapping::new())
                    };
                    self.stack.push(Frame {
                        indent: key_indent as isize,
                        container,
                        slot: Slot::Key(key),
                    });
                }
                _ => self.insert_entry(key, Node::null()),
            }
            return index + 1;
        }

        if is_block_marker(value) {
            let (text, next) = self.read_block_scalar(index, key_indent, value);
            self.insert_entry(key, Node::string(text));
            return next;
        }

        self.insert_entry(key, parse_value(value));
        index + 1
    }

    /// Consume the lines of a `|` or `>` block scalar opened on line `index`.
    fn read_block_scalar(&self, index: usize, key_indent: usize, marker: &str) -> (String, usize) {
        let mut next = index + 1;
        let mut collected: Vec<&str> = Vec::new();
        while next < self.lines.len() {
            let line = self.lines[next];
            if line.trim().is_empty() {
                collected.push("");
            } else if leading_spaces(line) <= key_indent {
                break;
            } else {
                collected.push(line);
            }
            next += 1;
        }
        while collected.last() == Some(&"") {
            collected.pop();
        }

        let block_indent = collected
            .iter()
            .filter(|line| !line.is_empty())
            .map(|line| leading_spaces(line))
            .min()
            .unwrap_or(0);
        let body: Vec<&str> = collected
            .iter()
            .map(|line| line.get(block_indent..).unwrap_or(""))
            .collect();

        let mut text = if marker.starts_with('|') {
            body.join("\n")
        } else {
            let mut folded = String::new();
            for line in body {
                if line.is_empty() {
                    folded.push('\n');
                } else {
                    if !folded.is_empty() && !folded.ends_with('\n') {
                        folded.push(' ');
                    }
                    folded.push_str(line);
                }
            }
            folded
        };
        if !marker.ends_with('-') && !text.is_empty() {
            text.push('\n');
        }
        (text, next)
    }

    /// Indent and trimmed body of the next non-blank, non-comment line.
    fn next_content(&self, index: usize) -> Option<(usize, &'a str)> {
        self.lines[index + 1..]
            .iter()
            .copied()
            .find(|line| !is_skippable(line))
            .map(|line| {
                let indent = leading_spaces(line);
                (indent, line[indent..].trim())
            })
    }

    fn top(&self) -> &Frame {
        // The root frame is never popped.
        &self.stack[self.stack.len() - 1]
    }

    fn top_container(&mut self) -> &mut Node {
        let last = self.stack.len() - 1;
        &mut self.stack[last].container
    }

    /// Close every frame opened at or deeper than `indent`.
    fn close_frames(&mut self, indent: usize) {
        while self.stack.len() > 1 && self.top().indent >= indent as isize {
            self.close_top();
        }
    }

    fn close_top(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame.slot {
            Slot::Key(key) => self.insert_entry(key, frame.container),
            Slot::Item => self.push_item(frame.container),
            Slot::Root => self.stack.push(frame),
        }
    }

    fn insert_entry(&mut self, key: String, node: Node) {
        match self.top_container() {
            Node::Object(map) => {
                map.insert(key, node);
            }
            // A mapping line directly inside a sequence joins the trailing
            // mapping item, or starts one.
            Node::Array(items) => match items.last_mut() {
                Some(Node::Object(map)) => {
                    map.insert(key, node);
                }
                _ => {
                    let mut map = Mapping::new();
                    map.insert(key, node);
                    items.push(Node::Object(map));
                }
            },
            Node::Scalar(_) => {}
        }
    }

    /// Whether [`Self::push_item`] would keep an item pushed now.
    fn can_attach_item(&self) -> bool {
        match &self.top().container {
            Node::Array(_) => true,
            Node::Object(map) => {
                matches!(map.last(), Some((_, last)) if last.is_null() || matches!(last, Node::Array(_)))
            }
            Node::Scalar(_) => false,
        }
    }

    fn push_item(&mut self, node: Node) {
        match self.top_container() {
            Node::Array(items) => items.push(node),
            // List item under a mapping: attach it to the sequence held by
            // the most recent key, if that key is empty or already a sequence.
            Node::Object(map) => match map.last_mut() {
                Some((_, Node::Array(items))) => items.push(node),
                Some((_, last)) if last.is_null() => *last = Node::Array(vec![node]),
                _ => debug!("dropping list item with no sequence to attach to"),
            },
            Node::Scalar(_) => {}
        }
    }
}

/// Blank lines, comment lines and the `---` document marker carry no structure.
pub(crate) fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#') || trimmed == "---"
}

/// Number of leading space characters (tabs do not count).
pub(crate) fn leading_spaces(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ').count()
}

/// If `body` is a list item, the text after the dash.
pub(crate) fn list_item_body(body: &str) -> Option<&str> {
    if body == "-" {
        return Some("");
    }
    body.strip_prefix("- ").map(str::trim_start)
}

/// Byte offset of `inner` within `outer`, where `inner` is a subslice of it.
pub(crate) fn offset_of(outer: &str, inner: &str) -> usize {
    (inner.as_ptr() as usize)
        .checked_sub(outer.as_ptr() as usize)
        .filter(|offset| *offset <= outer.len())
        .unwrap_or(0)
}

pub(crate) fn is_block_marker(value: &str) -> bool {
    matches!(value, "|" | ">" | "|-" | ">-" | "|+" | ">+")
}

/// Find the `:` that separates a key from its value.
///
/// The colon must sit outside quotes and brackets and be followed by
/// whitespace or the end of the text, so `80:80` and `http://x` are not keys.
pub(crate) fn find_key_separator(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut previous: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' if opens_quote(previous) => quote = Some(c),
                '[' | '{' => depth += 1,
                ']' | '}' => depth = depth.saturating_sub(1),
                '#' if previous.map_or(true, char::is_whitespace) => return None,
                ':' if depth == 0 => {
                    if chars.peek().map_or(true, |(_, next)| next.is_whitespace()) {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        previous = Some(c);
    }
    None
}

/// A quote only opens a quoted span at the start of a token.
fn opens_quote(previous: Option<char>) -> bool {
    previous.map_or(true, |c| c.is_whitespace() || matches!(c, '[' | '{' | ',' | ':'))
}

/// Drop a trailing ` # comment` that sits outside quotes.
pub(crate) fn strip_inline_comment(value: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut previous: Option<char> = None;

    for (i, c) in value.char_indices() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' if opens_quote(previous) => quote = Some(c),
                '#' if previous.map_or(true, char::is_whitespace) => return &value[..i],
                _ => {}
            },
        }
        previous = Some(c);
    }
    value
}

/// Remove matching surrounding quotes, resolving escapes.
pub(crate) fn unquote(token: &str) -> String {
    if token.len() >= 2 {
        if let Some(inner) = token.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            return unescape_double(inner);
        }
        if let Some(inner) = token.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
            return inner.replace("''", "'");
        }
    }
    token.to_string()
}

fn unescape_double(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn is_quoted(token: &str) -> bool {
    token.len() >= 2
        && ((token.starts_with('"') && token.ends_with('"'))
            || (token.starts_with('\'') && token.ends_with('\'')))
}

/// Parse the value part of a line: a flow sequence, `{}`, or a scalar.
pub(crate) fn parse_value(value: &str) -> Node {
    match value {
        "[]" => return Node::Array(Vec::new()),
        "{}" => return Node::Object(Mapping::new()),
        _ => {}
    }
    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        return Node::Array(
            split_flow_items(inner)
                .into_iter()
                .map(|item| Node::Scalar(parse_scalar(item)))
                .collect(),
        );
    }
    Node::Scalar(parse_scalar(value))
}

/// Split the inside of a flow sequence on commas outside quotes.
fn split_flow_items(inner: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                ',' => {
                    items.push(inner[start..i].trim());
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    items.push(inner[start..].trim());
    items.retain(|item| !item.is_empty());
    items
}

/// Interpret a single literal token.
pub fn parse_scalar(token: &str) -> Scalar {
    match token {
        "true" | "True" | "TRUE" => return Scalar::Bool(true),
        "false" | "False" | "FALSE" => return Scalar::Bool(false),
        "null" | "Null" | "NULL" | "~" => return Scalar::Null,
        _ => {}
    }
    if is_quoted(token) {
        return Scalar::String(unquote(token));
    }
    if let Some(number) = parse_number(token) {
        return Scalar::Number(number);
    }
    Scalar::String(token.to_string())
}

fn parse_number(token: &str) -> Option<Number> {
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    if digits.is_empty() {
        return None;
    }

    if digits.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = token.parse::<i64>() {
            return Some(Number::from(n));
        }
        if let Ok(n) = digits.parse::<u64>() {
            if !token.starts_with('-') {
                return Some(Number::from(n));
            }
        }
        return token.parse::<f64>().ok().and_then(Number::from_f64);
    }

    // Decimal and exponent forms: `1.5`, `2e10`, `1.5E-7`.
    let (mantissa, exponent) = match digits.find(['e', 'E']) {
        Some(e) => (&digits[..e], Some(&digits[e + 1..])),
        None => (digits, None),
    };
    let (whole, fraction) = match mantissa.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (mantissa, None),
    };
    let is_float = is_digits(whole)
        && fraction.map_or(true, is_digits)
        && exponent.map_or(true, |e| is_digits(e.strip_prefix(['-', '+']).unwrap_or(e)));
    if !is_float {
        return None;
    }
    token.parse::<f64>().ok().and_then(Number::from_f64)
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(document: &Document) -> Vec<DiagnosticKind> {
        document.diagnostics.iter().map(|d| d.kind).collect()
    }

    fn json(text: &str) -> JsonValue {
        parse(text).root.to_json()
    }

    #[test]
    fn parses_nested_mappings() {
        let document = parse("services:\n  web:\n    image: nginx\n");
        assert!(document.diagnostics.is_empty());
        assert_eq!(
            document.root.to_json(),
            serde_json::json!({ "services": { "web": { "image": "nginx" } } })
        );
    }

    #[test]
    fn parses_scalars() {
        assert_eq!(parse_scalar("true"), Scalar::Bool(true));
        assert_eq!(parse_scalar("FALSE"), Scalar::Bool(false));
        assert_eq!(parse_scalar("~"), Scalar::Null);
        assert_eq!(parse_scalar("Null"), Scalar::Null);
        assert_eq!(parse_scalar("42"), Scalar::Number(Number::from(42)));
        assert_eq!(parse_scalar("-7"), Scalar::Number(Number::from(-7)));
        assert_eq!(
            parse_scalar("3.5"),
            Scalar::Number(Number::from_f64(3.5).unwrap())
        );
        assert_eq!(parse_scalar("\"3.5\""), Scalar::String("3.5".into()));
        assert_eq!(parse_scalar("'it''s'"), Scalar::String("it's".into()));
        assert_eq!(parse_scalar("\"a\\\"b\""), Scalar::String("a\"b".into()));
        assert_eq!(parse_scalar("yes"), Scalar::String("yes".into()));
        assert_eq!(parse_scalar("1.2.3"), Scalar::String("1.2.3".into()));
        assert_eq!(parse_scalar("-"), Scalar::String("-".into()));
    }

    #[test]
    fn parses_exponent_numbers() {
        let float = |f: f64| Scalar::Number(Number::from_f64(f).unwrap());
        assert_eq!(parse_scalar("1e-7"), float(1e-7));
        assert_eq!(parse_scalar("1E+20"), float(1e20));
        assert_eq!(parse_scalar("-2.5e3"), float(-2500.0));
        assert_eq!(parse_scalar("100000000000000000000"), float(1e20));
        assert_eq!(parse_scalar("e5"), Scalar::String("e5".into()));
        assert_eq!(parse_scalar("1e"), Scalar::String("1e".into()));
        assert_eq!(parse_scalar("1.e5"), Scalar::String("1.e5".into()));
        assert_eq!(parse_scalar("1e400"), Scalar::String("1e400".into()));
        assert_eq!(parse_scalar("3."), Scalar::String("3.".into()));
    }

    #[test]
    fn parses_sequences_of_scalars_and_mappings() {
        let text = "\
services:
  web:
    ports:
      - \"80:80\"
      - 443:443
    volumes:
      - type: bind
        source: ./data
        target: /data
      - logs:/var/log
";
        let document = parse(text);
        assert!(document.diagnostics.is_empty(), "{:?}", document.diagnostics);
        assert_eq!(
            document.root.to_json(),
            serde_json::json!({
                "services": { "web": {
                    "ports": ["80:80", "443:443"],
                    "volumes": [
                        { "type": "bind", "source": "./data", "target": "/data" },
                        "logs:/var/log"
                    ]
                }}
            })
        );
    }

    #[test]
    fn empty_values_become_null_or_containers() {
        assert_eq!(json("a:\nb: 1\n"), serde_json::json!({ "a": null, "b": 1 }));
        assert_eq!(json("a: []\nb: {}\n"), serde_json::json!({ "a": [], "b": {} }));
        assert_eq!(json("a:\n  - x\n"), serde_json::json!({ "a": ["x"] }));
        assert_eq!(json("a:\n  x: 1\n"), serde_json::json!({ "a": { "x": 1 } }));
    }

    #[test]
    fn inline_list_item_key_with_nested_block() {
        let text = "\
items:
  - build:
      context: .
    image: app
";
        let document = parse(text);
        // The nested block sits two units deeper than the dash line.
        assert_eq!(kinds(&document), vec![DiagnosticKind::IndentationJump]);
        assert_eq!(
            document.root.to_json(),
            serde_json::json!({ "items": [ { "build": { "context": "." }, "image": "app" } ] })
        );
    }

    #[test]
    fn bare_dash_opens_mapping_or_sequence() {
        let text = "\
a:
  -
    x: 1
  -
    - y
  -
";
        let document = parse(text);
        assert!(document.diagnostics.is_empty(), "{:?}", document.diagnostics);
        assert_eq!(
            document.root.to_json(),
            serde_json::json!({ "a": [ { "x": 1 }, ["y"], null ] })
        );
    }

    #[test]
    fn skips_comments_and_strips_inline_comments() {
        let text = "\
# leading comment
---
services:
  # a comment
  web:
    image: nginx # trailing
    command: \"echo # not a comment\"
";
        let document = parse(text);
        assert!(document.diagnostics.is_empty());
        assert_eq!(
            document.root.to_json(),
            serde_json::json!({ "services": { "web": {
                "image": "nginx",
                "command": "echo # not a comment"
            }}})
        );
    }

    #[test]
    fn duplicate_keys_overwrite_in_place() {
        let document = parse("a: 1\nb: 2\na: 3\n");
        let root = document.root_mapping().unwrap();
        assert_eq!(root.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(root["a"], Node::Scalar(Scalar::Number(Number::from(3))));
    }

    #[test]
    fn flow_sequences_parse_to_arrays() {
        assert_eq!(
            json("test: [\"CMD\", \"curl\", \"-f\", \"http://localhost\"]\n"),
            serde_json::json!({ "test": ["CMD", "curl", "-f", "http://localhost"] })
        );
        assert_eq!(json("a: [1, two]\n"), serde_json::json!({ "a": [1, "two"] }));
        assert_eq!(json("a: {x: 1}\n"), serde_json::json!({ "a": "{x: 1}" }));
    }

    #[test]
    fn block_scalars_consume_their_lines() {
        let text = "\
a: |
  first: line
    indented
  last
b: >-
  folded
  text

  para
c: 1
";
        let document = parse(text);
        assert!(document.diagnostics.is_empty(), "{:?}", document.diagnostics);
        assert_eq!(
            document.root.to_json(),
            serde_json::json!({
                "a": "first: line\n  indented\nlast\n",
                "b": "folded text\npara",
                "c": 1
            })
        );
    }

    #[test]
    fn tab_is_reported_once_and_parsing_continues() {
        let document = parse("services:\n\tweb:\n  db:\n    image: postgres\n");
        assert_eq!(kinds(&document), vec![DiagnosticKind::TabCharacter]);
        assert_eq!(document.diagnostics[0].line, 2);
        assert_eq!(document.diagnostics[0].column, 1);
        assert!(document.root_mapping().unwrap().contains_key("services"));
    }

    #[test]
    fn indentation_not_multiple_of_unit() {
        let document = parse("a:\n  b:\n     c: 1\n");
        assert!(kinds(&document).contains(&DiagnosticKind::IndentationNotMultiple));
        assert_eq!(
            document.root.to_json(),
            serde_json::json!({ "a": { "b": { "c": 1 } } })
        );
    }

    #[test]
    fn indentation_jump_is_reported_once() {
        let document = parse("a:\n  b:\n      c: 1\n");
        assert_eq!(kinds(&document), vec![DiagnosticKind::IndentationJump]);
        assert_eq!(document.diagnostics[0].line, 3);
        assert_eq!(
            document.root.to_json(),
            serde_json::json!({ "a": { "b": { "c": 1 } } })
        );
    }

    #[test]
    fn first_indent_sets_the_unit() {
        let document = parse("a:\n    b:\n        c: 1\n");
        assert!(document.diagnostics.is_empty());
    }

    #[test]
    fn list_item_under_mapping_is_recovered() {
        let document = parse("a:\nb:\n- x\n- y\n");
        assert_eq!(
            kinds(&document),
            vec![
                DiagnosticKind::ListParentMismatch,
                DiagnosticKind::ListParentMismatch
            ]
        );
        assert_eq!(document.root.to_json(), serde_json::json!({ "a": null, "b": ["x", "y"] }));
    }

    #[test]
    fn list_item_with_nothing_to_attach_is_dropped() {
        let document = parse("- x\n");
        assert_eq!(kinds(&document), vec![DiagnosticKind::ListParentMismatch]);
        assert!(document.diagnostics[0].message.ends_with("the item was discarded"));
        assert_eq!(document.root.to_json(), serde_json::json!({}));
    }

    #[test]
    fn mismatch_message_says_whether_the_item_was_kept() {
        let document = parse("services:\n  web:\n    image: x\n  - stray\n");
        assert_eq!(kinds(&document), vec![DiagnosticKind::ListParentMismatch]);
        assert_eq!(document.diagnostics[0].line, 4);
        assert!(document.diagnostics[0].message.contains("discarded"));
        assert_eq!(
            document.root.to_json(),
            serde_json::json!({ "services": { "web": { "image": "x" } } })
        );

        let kept = parse("a:\nb:\n- x\n- y\n");
        for diagnostic in &kept.diagnostics {
            assert!(diagnostic.message.ends_with("attached to the preceding key"));
        }
    }

    #[test]
    fn line_without_colon_is_invalid_syntax() {
        let document = parse("services:\n  web\n  db:\n    image: x\n");
        assert_eq!(kinds(&document), vec![DiagnosticKind::InvalidSyntax]);
        assert_eq!(document.diagnostics[0].line, 2);
        assert_eq!(document.diagnostics[0].column, 3);
        assert_eq!(
            document.root.to_json(),
            serde_json::json!({ "services": { "db": { "image": "x" } } })
        );
    }

    #[test]
    fn key_separator_ignores_quoted_and_embedded_colons() {
        assert_eq!(find_key_separator("image: nginx"), Some(5));
        assert_eq!(find_key_separator("key:"), Some(3));
        assert_eq!(find_key_separator("\"a: b\": c"), Some(6));
        assert_eq!(find_key_separator("80:80"), None);
        assert_eq!(find_key_separator("http://example.com"), None);
        assert_eq!(find_key_separator("{a: 1}"), None);
        assert_eq!(find_key_separator("web # note: here"), None);
    }

    #[test]
    fn quoted_keys_are_unquoted() {
        assert_eq!(json("\"my key\": 1\n'other': 2\n"), serde_json::json!({ "my key": 1, "other": 2 }));
    }

    #[test]
    fn empty_input_yields_empty_root() {
        let document = parse("");
        assert_eq!(document.root, Node::Object(Mapping::new()));
        assert!(document.diagnostics.is_empty());
    }
}
