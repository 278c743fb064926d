//! Completion provider implementation

use serde::Serialize;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, Documentation, MarkupContent, MarkupKind,
};
use tracing::debug;

use crate::context::resolve_lines;
use crate::parser::{find_key_separator, list_item_body, unquote};
use crate::schema::{self, SchemaNode};

/// Default cap on the number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Key,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub label: String,
    pub kind: SuggestionKind,
    pub description: String,
}

/// Schema containers that have a hand-curated key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionContext {
    TopLevel,
    Service,
    Deploy,
    Healthcheck,
    Resources,
    Placement,
    UpdateConfig,
    RestartPolicy,
    Build,
    Logging,
    Network,
    Volume,
    SecretOrConfig,
    Limits,
}

impl CompletionContext {
    /// Classify a context path by its shape.
    pub fn for_path<S: AsRef<str>>(path: &[S]) -> Option<Self> {
        let path: Vec<&str> = path.iter().map(AsRef::as_ref).collect();
        let context = match path.as_slice() {
            [] => Self::TopLevel,
            ["services", _] => Self::Service,
            ["networks", _] => Self::Network,
            ["volumes", _] => Self::Volume,
            ["secrets" | "configs", _] => Self::SecretOrConfig,
            [.., last] => match *last {
                "deploy" => Self::Deploy,
                "healthcheck" => Self::Healthcheck,
                "resources" => Self::Resources,
                "placement" => Self::Placement,
                "update_config" | "rollback_config" => Self::UpdateConfig,
                "restart_policy" => Self::RestartPolicy,
                "build" => Self::Build,
                "logging" => Self::Logging,
                "limits" | "reservations" => Self::Limits,
                _ => return None,
            },
        };
        Some(context)
    }

    pub const fn priority(self) -> &'static [&'static str] {
        match self {
            Self::TopLevel => &["version", "services", "networks", "volumes", "configs", "secrets", "name"],
            Self::Service => &[
                "image",
                "build",
                "container_name",
                "command",
                "entrypoint",
                "ports",
                "volumes",
                "environment",
                "env_file",
                "depends_on",
                "networks",
                "restart",
                "deploy",
                "healthcheck",
                "logging",
                "labels",
                "working_dir",
                "user",
            ],
            Self::Deploy => &[
                "mode",
                "replicas",
                "placement",
                "resources",
                "restart_policy",
                "update_config",
                "rollback_config",
                "endpoint_mode",
                "labels",
            ],
            Self::Healthcheck => &["test", "interval", "timeout", "retries", "start_period", "start_interval", "disable"],
            Self::Resources => &["limits", "reservations"],
            Self::Placement => &["constraints", "preferences", "max_replicas_per_node"],
            Self::UpdateConfig => &["parallelism", "delay", "failure_action", "monitor", "max_failure_ratio", "order"],
            Self::RestartPolicy => &["condition", "delay", "max_attempts", "window"],
            Self::Build => &["context", "dockerfile", "args", "target", "cache_from", "labels", "network", "shm_size"],
            Self::Logging => &["driver", "options"],
            Self::Network => &["driver", "driver_opts", "external", "name", "attachable", "internal", "ipam", "enable_ipv6", "labels"],
            Self::Volume => &["driver", "driver_opts", "external", "name", "labels"],
            Self::SecretOrConfig => &["file", "external", "name", "environment", "content"],
            Self::Limits => &["cpus", "memory", "pids", "devices"],
        }
    }
}

/// What the user is typing at the cursor.
#[derive(Debug, PartialEq, Eq)]
enum CursorTarget<'a> {
    Key { fragment: &'a str },
    Value { key: String, fragment: &'a str },
}

fn cursor_target(line: &str, column: usize) -> CursorTarget<'_> {
    let end = line
        .char_indices()
        .nth(column)
        .map_or(line.len(), |(i, _)| i);
    let typed = line[..end].trim_start();
    let entry = list_item_body(typed).unwrap_or(typed);

    // Any colon already typed ends the key, even before the space follows it.
    match find_key_separator(entry).or_else(|| entry.find(':')) {
        Some(separator) => CursorTarget::Value {
            key: unquote(entry[..separator].trim()),
            fragment: entry[separator + 1..].trim().trim_start_matches(['"', '\'']),
        },
        None => CursorTarget::Key {
            fragment: entry.trim(),
        },
    }
}

/// Suggest keys or values for the 0-based `line` and `column` of `text`.
pub fn suggest(text: &str, line: usize, column: usize) -> Vec<Suggestion> {
    suggest_with_limit(text, line, column, MAX_SUGGESTIONS)
}

pub fn suggest_with_limit(text: &str, line: usize, column: usize, limit: usize) -> Vec<Suggestion> {
    let lines: Vec<&str> = text.lines().collect();
    let current = lines.get(line).copied().unwrap_or("");
    let path = resolve_lines(&lines, line);

    let (candidates, fragment) = match cursor_target(current, column) {
        CursorTarget::Key { fragment } => (key_candidates(&path), fragment),
        CursorTarget::Value { key, fragment } => (value_candidates(&path, &key), fragment),
    };
    let suggestions = filter_candidates(candidates, fragment, limit);
    debug!(?path, fragment, count = suggestions.len(), "computed suggestions");
    suggestions
}

fn key_candidates(path: &[String]) -> Vec<Suggestion> {
    let Some(node) = schema::compose().resolve(path) else {
        return Vec::new();
    };
    let mut keys: Vec<(&'static str, &SchemaNode)> = node.named_children().collect();
    if let Some(context) = CompletionContext::for_path(path) {
        rank_keys(&mut keys, context.priority());
    } else {
        keys.sort_by_key(|(key, _)| *key);
    }

    keys.into_iter()
        .map(|(key, child)| Suggestion {
            label: key.to_string(),
            kind: SuggestionKind::Key,
            description: child.description.to_string(),
        })
        .collect()
}

/// Listed keys first, in list order; the rest alphabetically after them.
fn rank_keys(keys: &mut [(&'static str, &SchemaNode)], priority: &[&str]) {
    keys.sort_by(|(a, _), (b, _)| {
        let rank_a = priority.iter().position(|p| p == a);
        let rank_b = priority.iter().position(|p| p == b);
        match (rank_a, rank_b) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
}

fn value_candidates(path: &[String], key: &str) -> Vec<Suggestion> {
    let Some(node) = schema::compose().resolve(path).and_then(|n| n.child(key)) else {
        return Vec::new();
    };
    let Some(values) = node.values else {
        return Vec::new();
    };
    values
        .iter()
        .map(|value| Suggestion {
            label: value.to_string(),
            kind: SuggestionKind::Value,
            description: node.description.to_string(),
        })
        .collect()
}

/// Keep candidates matching `fragment`, prefix matches first, at most `limit`.
fn filter_candidates(candidates: Vec<Suggestion>, fragment: &str, limit: usize) -> Vec<Suggestion> {
    let needle = fragment.to_lowercase();
    let mut scored: Vec<(u8, Suggestion)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let label = candidate.label.to_lowercase();
            if label.starts_with(&needle) {
                Some((0, candidate))
            } else if label.contains(&needle) {
                Some((1, candidate))
            } else {
                None
            }
        })
        .collect();
    scored.sort_by_key(|(rank, _)| *rank);
    scored
        .into_iter()
        .take(limit)
        .map(|(_, candidate)| candidate)
        .collect()
}

/// Create a completion item for a suggestion, keeping its rank in `sort_text`
pub fn to_completion_item(rank: usize, suggestion: &Suggestion) -> CompletionItem {
    let (kind, detail) = match suggestion.kind {
        SuggestionKind::Key => (CompletionItemKind::PROPERTY, "Compose key"),
        SuggestionKind::Value => (CompletionItemKind::ENUM_MEMBER, "Compose value"),
    };
    CompletionItem {
        label: suggestion.label.clone(),
        kind: Some(kind),
        detail: Some(detail.to_string()),
        documentation: (!suggestion.description.is_empty()).then(|| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: suggestion.description.clone(),
            })
        }),
        sort_text: Some(format!("{rank:04}")),
        ..CompletionItem::default()
    }
}
