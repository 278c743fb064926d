//! Schema-driven validation of a parsed Compose document
//!
//! The validator walks the tree once and accumulates every violation it finds.
//! Nodes carry no positions, so each diagnostic is placed by searching the
//! source text for the line declaring the offending key, starting from the
//! line of its enclosing key. When a key name repeats earlier than that
//! anchor the search can land on the wrong occurrence.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ops::Range;

use regex::Regex;
use tracing::{debug, error};

use crate::compose_schema::VERSIONS;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::parser::{Document, Mapping, Node};
use crate::schema::{self, SchemaNode, WILDCARD};

const NAMED_SECTIONS: &[(&str, &str)] = &[
    ("networks", "network"),
    ("volumes", "volume"),
    ("configs", "config"),
    ("secrets", "secret"),
];

/// Check `document` against the Compose schema.
pub fn validate(text: &str, document: &Document) -> Vec<Diagnostic> {
    let Some(root) = document.root_mapping() else {
        return Vec::new();
    };
    if root.is_empty() {
        return Vec::new();
    }

    let mut validator = Validator {
        locator: LineLocator::new(text),
        schema: schema::compose(),
        diagnostics: Vec::new(),
    };
    validator.validate_root(root);

    debug!(count = validator.diagnostics.len(), "validated document");
    validator.diagnostics
}

struct Validator<'a> {
    locator: LineLocator<'a>,
    schema: &'static SchemaNode,
    diagnostics: Vec<Diagnostic>,
}

impl Validator<'_> {
    fn validate_root(&mut self, root: &Mapping) {
        let top_level = self.schema.key_names();

        for key in root.keys() {
            if schema::is_extension_key(key) || self.schema.exact_child(key).is_some() {
                continue;
            }
            let (line, column) = self.locator.find(key, 0);
            let diagnostic = if schema::is_service_key(key) {
                misplaced_service_key(key, line, column)
            } else if schema::is_deploy_key(key) {
                Diagnostic::error(
                    DiagnosticKind::MisplacedDeployKey,
                    line,
                    column,
                    format!(
                        "'{key}' belongs inside a service's deploy section (services.<name>.deploy.{key}). Check indentation."
                    ),
                )
            } else {
                Diagnostic::error(
                    DiagnosticKind::UnknownTopLevelKey,
                    line,
                    column,
                    format!("Unknown top-level key '{key}'"),
                )
                .with_valid_keys(top_level.iter().copied())
            };
            self.diagnostics.push(diagnostic);
        }

        if let Some(version) = root.get("version") {
            self.validate_version(version);
        }

        if let Some(Node::Object(services)) = root.get("services") {
            self.validate_services(services);
        }

        for (section, entry_label) in NAMED_SECTIONS {
            if let Some(Node::Object(entries)) = root.get(*section) {
                self.validate_named_section(section, entry_label, entries);
            }
        }
    }

    fn validate_version(&mut self, version: &Node) {
        let Some(text) = version.scalar_text() else {
            return;
        };
        let text = text.trim_matches(['"', '\'']);
        if VERSIONS.contains(&text) {
            return;
        }
        let (line, column) = self.locator.find("version", 0);
        self.diagnostics.push(
            Diagnostic::warning(
                DiagnosticKind::InvalidVersion,
                line,
                column,
                format!(
                    "Unsupported Compose version '{text}'. Accepted versions: {}",
                    VERSIONS.join(", ")
                ),
            )
            .with_valid_values(VERSIONS.iter().copied()),
        );
    }

    fn validate_services(&mut self, services: &Mapping) {
        let Some(service_schema) = self.schema.resolve(&["services", WILDCARD]) else {
            error!("Compose schema has no service definition");
            return;
        };
        let valid_keys = service_schema.key_names();
        let (services_line, _) = self.locator.find("services", 0);

        for (name, service) in services {
            let (service_line, service_column) = self.locator.find(name, services_line);
            let Node::Object(service) = service else {
                // `image: nginx` one level too shallow lands here as a scalar "service".
                if matches!(service, Node::Scalar(_)) && !service.is_null() && schema::is_service_key(name) {
                    self.diagnostics
                        .push(misplaced_service_key(name, service_line, service_column));
                }
                continue;
            };

            if !service.contains_key("image") && !service.contains_key("build") {
                self.diagnostics.push(Diagnostic::error(
                    DiagnosticKind::MissingImageOrBuild,
                    service_line,
                    service_column,
                    format!("Service '{name}' must specify either 'image' or 'build'"),
                ));
            }

            for (key, value) in service {
                if schema::is_extension_key(key) {
                    continue;
                }
                let Some(key_schema) = service_schema.exact_child(key) else {
                    let (line, column) = self.locator.find(key, service_line);
                    self.diagnostics.push(
                        Diagnostic::error(
                            DiagnosticKind::UnknownServiceKey,
                            line,
                            column,
                            format!("Unknown key '{key}' in service '{name}'"),
                        )
                        .with_valid_keys(valid_keys.iter().copied()),
                    );
                    continue;
                };
                if matches!(value, Node::Array(_)) || key_schema.free_form {
                    continue;
                }
                let (line, _) = self.locator.find(key, service_line);
                self.validate_nested(value, key, key_schema, line);
            }
        }
    }

    fn validate_named_section(&mut self, section: &str, entry_label: &str, entries: &Mapping) {
        let Some(entry_schema) = self.schema.resolve(&[section, WILDCARD]) else {
            error!(section, "Compose schema has no entry definition");
            return;
        };
        let valid_keys = entry_schema.key_names();
        let (section_line, _) = self.locator.find(section, 0);

        for (name, entry) in entries {
            // `null` entries and shorthands such as `external: true` carry no keys to check.
            let Node::Object(entry) = entry else {
                continue;
            };
            let (entry_line, _) = self.locator.find(name, section_line);

            for key in entry.keys() {
                if schema::is_extension_key(key) || key == "name" || key == "external" {
                    continue;
                }
                if entry_schema.exact_child(key).is_some() {
                    continue;
                }
                let (line, column) = self.locator.find(key, entry_line);
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::UnknownSectionKey,
                        line,
                        column,
                        format!("Unknown key '{key}' in {entry_label} '{name}'"),
                    )
                    .with_valid_keys(valid_keys.iter().copied()),
                );
            }
        }
    }

    /// Check a value against its schema entry; `line` is where `key` was found.
    fn validate_nested(&mut self, value: &Node, key: &str, key_schema: &SchemaNode, line: usize) {
        // Sequence items vary too much in shape to check generically.
        if key_schema.free_form || matches!(value, Node::Array(_)) {
            return;
        }

        if let (Some(values), Some(text)) = (key_schema.values, value.as_str()) {
            if !key_schema.allows_value(text) {
                let (line, column) = self.locator.find(key, line);
                self.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::InvalidEnumValue,
                        line,
                        column,
                        format!("Invalid value '{text}' for '{key}'"),
                    )
                    .with_valid_values(values.iter().copied()),
                );
            }
        }

        let (Some(_), Node::Object(entries)) = (key_schema.children(), value) else {
            return;
        };
        for (sub_key, sub_value) in entries {
            if key_schema.extensions && schema::is_extension_key(sub_key) {
                continue;
            }
            let (sub_line, column) = self.locator.find(sub_key, line);
            match key_schema.child(sub_key) {
                Some(sub_schema) => self.validate_nested(sub_value, sub_key, sub_schema, sub_line),
                None => self.diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::UnknownNestedKey,
                        sub_line,
                        column,
                        format!("Unknown key '{sub_key}' in '{key}'"),
                    )
                    .with_valid_keys(key_schema.key_names()),
                ),
            }
        }
    }
}

fn misplaced_service_key(key: &str, line: usize, column: usize) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::MisplacedServiceKey,
        line,
        column,
        format!(
            "'{key}' should be inside a service definition (services.<name>.{key}). Check indentation."
        ),
    )
}

/// Finds the line declaring a key by searching the source text.
struct LineLocator<'a> {
    lines: Vec<&'a str>,
    /// Compiled key-line patterns, one per key name seen in this pass.
    patterns: HashMap<String, Regex>,
}

impl<'a> LineLocator<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            patterns: HashMap::new(),
        }
    }

    /// 1-based (line, column) of the first line at or after the 1-based line
    /// `from` that declares `key`, optionally behind a list dash. Falls back to
    /// a search of the whole text, then to the first line.
    fn find(&mut self, key: &str, from: usize) -> (usize, usize) {
        let regex = match self.patterns.entry(key.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let pattern = format!(
                    r#"^(\s*(?:-\s+)?)["']?{}["']?\s*:(?:\s|$)"#,
                    regex::escape(key)
                );
                match Regex::new(&pattern) {
                    Ok(regex) => entry.insert(regex),
                    Err(err) => {
                        error!(key, %err, "failed to build key pattern");
                        return (1, 1);
                    }
                }
            }
        };

        let lines = &self.lines;
        let start = from.saturating_sub(1).min(lines.len());
        scan(lines, regex, start..lines.len())
            .or_else(|| scan(lines, regex, 0..start))
            .unwrap_or((1, 1))
    }
}

fn scan(lines: &[&str], regex: &Regex, range: Range<usize>) -> Option<(usize, usize)> {
    range.into_iter().find_map(|index| {
        let captures = regex.captures(lines[index])?;
        let prefix = captures.get(1).map_or(0, |m| m.as_str().chars().count());
        Some((index + 1, prefix + 1))
    })
}
