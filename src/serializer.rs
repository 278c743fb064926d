//! Tree to text, the inverse of [`crate::parser::parse`].

use crate::parser::{parse_scalar, Mapping, Node, Scalar};

const INDENT: &str = "  ";

/// Render a tree in the block style the parser reads back.
pub fn serialize(root: &Node) -> String {
    let mut out = String::new();
    match root {
        Node::Object(map) => write_mapping(&mut out, map, 0),
        Node::Array(items) => write_sequence(&mut out, items, 0),
        Node::Scalar(scalar) => {
            out.push_str(&format_scalar(scalar));
            out.push('\n');
        }
    }
    out
}

fn write_mapping(out: &mut String, map: &Mapping, depth: usize) {
    for (key, value) in map {
        pad(out, depth);
        out.push_str(&format_key(key));
        out.push(':');
        write_value(out, value, depth);
    }
}

fn write_sequence(out: &mut String, items: &[Node], depth: usize) {
    for item in items {
        pad(out, depth);
        out.push('-');
        write_value(out, item, depth);
    }
}

/// Write what follows `key:` or `-`: an inline literal, or a nested block.
fn write_value(out: &mut String, value: &Node, depth: usize) {
    match value {
        Node::Object(map) if !map.is_empty() => {
            out.push('\n');
            write_mapping(out, map, depth + 1);
        }
        Node::Array(items) if !items.is_empty() => {
            out.push('\n');
            write_sequence(out, items, depth + 1);
        }
        Node::Object(_) => out.push_str(" {}\n"),
        Node::Array(_) => out.push_str(" []\n"),
        Node::Scalar(scalar) => {
            out.push(' ');
            out.push_str(&format_scalar(scalar));
            out.push('\n');
        }
    }
}

fn pad(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn format_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Number(n) => n.to_string(),
        Scalar::String(s) if needs_quotes(s) => quote(s),
        Scalar::String(s) => s.clone(),
    }
}

fn format_key(key: &str) -> String {
    if needs_quotes(key) {
        quote(key)
    } else {
        key.to_string()
    }
}

/// Whether a string must be quoted to read back as the same string.
fn needs_quotes(s: &str) -> bool {
    if s.is_empty() || s.trim() != s {
        return true;
    }
    if s.contains([':', '#', '"', '\'', '\n', '\r', '\t']) {
        return true;
    }
    if s.starts_with(['-', '[', '{', '|', '>', '&', '*', '!', '%', '@', '`', '?', ',']) {
        return true;
    }
    !matches!(parse_scalar(s), Scalar::String(ref parsed) if parsed == s)
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn writes_block_style() {
        let document = parse(
            "services:\n  web:\n    image: nginx\n    ports:\n      - \"80:80\"\n    environment: {}\n    volumes: []\n",
        );
        assert_eq!(
            serialize(&document.root),
            "services:\n  web:\n    image: nginx\n    ports:\n      - \"80:80\"\n    environment: {}\n    volumes: []\n"
        );
    }

    #[test]
    fn quotes_strings_that_would_change_meaning() {
        assert_eq!(format_scalar(&Scalar::String("true".into())), "\"true\"");
        assert_eq!(format_scalar(&Scalar::String("42".into())), "\"42\"");
        assert_eq!(format_scalar(&Scalar::String("~".into())), "\"~\"");
        assert_eq!(format_scalar(&Scalar::String("".into())), "\"\"");
        assert_eq!(format_scalar(&Scalar::String(" padded".into())), "\" padded\"");
        assert_eq!(format_scalar(&Scalar::String("a#b".into())), "\"a#b\"");
        assert_eq!(format_scalar(&Scalar::String("say \"hi\"".into())), "\"say \\\"hi\\\"\"");
        assert_eq!(format_scalar(&Scalar::String("two\nlines".into())), "\"two\\nlines\"");
        assert_eq!(format_scalar(&Scalar::String("nginx:latest".into())), "\"nginx:latest\"");
        assert_eq!(format_scalar(&Scalar::String("plain text".into())), "plain text");
    }

    #[test]
    fn nests_mappings_inside_sequences() {
        let text = "a:\n  -\n    x: 1\n    y: two\n  -\n    - nested\n  - null\n";
        let document = parse(text);
        assert!(document.diagnostics.is_empty());
        assert_eq!(serialize(&document.root), text);
    }

    #[test]
    fn numbers_printed_in_exponent_form_read_back() {
        let document = parse("tiny: 0.0000001\nhuge: 100000000000000000000\nplain: 2.5\n");
        assert!(document.diagnostics.is_empty());
        let text = serialize(&document.root);
        assert_eq!(text, "tiny: 1e-7\nhuge: 1e20\nplain: 2.5\n");
        let reparsed = parse(&text);
        assert!(reparsed.diagnostics.is_empty());
        assert_eq!(reparsed.root, document.root);
        assert_eq!(format_scalar(&Scalar::String("1e5".into())), "\"1e5\"");
    }

    #[test]
    fn block_scalars_survive_a_round_trip() {
        let document = parse("script: |\n  echo one\n  echo two\n");
        let reparsed = parse(&serialize(&document.root));
        assert!(reparsed.diagnostics.is_empty());
        assert_eq!(reparsed.root, document.root);
    }
}
