//! Compose schema representation and lookups
//!
//! The schema is a read-only tree built once at startup (see
//! [`crate::compose_schema`]). Lookups go by exact key first and fall back to
//! the reserved wildcard key, which stands for user-chosen names such as
//! service or network names.

use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::compose_schema;

/// Key under which a container declares the schema of dynamically named children.
pub const WILDCARD: &str = "*";

/// Keys with this prefix are extension fields and are never validated.
pub const EXTENSION_PREFIX: &str = "x-";

static COMPOSE: Lazy<SchemaNode> = Lazy::new(compose_schema::build);

/// The compiled-in Compose schema root.
pub fn compose() -> &'static SchemaNode {
    &COMPOSE
}

/// Whether `key` is an extension field (`x-...`).
pub fn is_extension_key(key: &str) -> bool {
    key.starts_with(EXTENSION_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Null,
    Any,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Object => "object",
            ValueType::Array => "array",
            ValueType::Null => "null",
            ValueType::Any => "any",
        };
        f.write_str(name)
    }
}

/// Either a leaf type descriptor or a container with named children.
#[derive(Debug, Clone)]
pub enum Shape {
    Leaf,
    Container(IndexMap<&'static str, SchemaNode>),
}

#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub types: Vec<ValueType>,
    pub description: &'static str,
    /// Allowed literal values, if the key is enumerated.
    pub values: Option<&'static [&'static str]>,
    pub shape: Shape,
    /// Children are dynamically named (declared under [`WILDCARD`]).
    pub wildcard: bool,
    /// Contents are arbitrary user data and are never checked.
    pub free_form: bool,
    /// Extension-prefixed keys are accepted and ignored under this node.
    pub extensions: bool,
}

impl SchemaNode {
    pub fn leaf(types: &[ValueType], description: &'static str) -> Self {
        Self {
            types: types.to_vec(),
            description,
            values: None,
            shape: Shape::Leaf,
            wildcard: false,
            free_form: false,
            extensions: false,
        }
    }

    pub fn container<I>(types: &[ValueType], description: &'static str, children: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, SchemaNode)>,
    {
        let children: IndexMap<_, _> = children.into_iter().collect();
        let wildcard = children.contains_key(WILDCARD);
        Self {
            shape: Shape::Container(children),
            wildcard,
            ..Self::leaf(types, description)
        }
    }

    pub fn with_values(mut self, values: &'static [&'static str]) -> Self {
        self.values = Some(values);
        self
    }

    pub fn free_form(mut self) -> Self {
        self.free_form = true;
        self
    }

    pub fn with_extensions(mut self) -> Self {
        self.extensions = true;
        self
    }

    pub fn children(&self) -> Option<&IndexMap<&'static str, SchemaNode>> {
        match &self.shape {
            Shape::Leaf => None,
            Shape::Container(children) => Some(children),
        }
    }

    /// Look up a child by exact name, then through the wildcard entry.
    pub fn child(&self, key: &str) -> Option<&SchemaNode> {
        let children = self.children()?;
        children.get(key).or_else(|| children.get(WILDCARD))
    }

    /// Look up a child by exact name only.
    pub fn exact_child(&self, key: &str) -> Option<&SchemaNode> {
        self.children()?.get(key)
    }

    /// Named children in declaration order, excluding the wildcard entry.
    pub fn named_children(&self) -> impl Iterator<Item = (&'static str, &SchemaNode)> {
        self.children()
            .into_iter()
            .flatten()
            .filter(|(key, _)| **key != WILDCARD)
            .map(|(key, node)| (*key, node))
    }

    /// Names of the children, excluding the wildcard entry.
    pub fn key_names(&self) -> Vec<&'static str> {
        self.named_children().map(|(key, _)| key).collect()
    }

    /// Walk a key path from this node, resolving each step with [`Self::child`].
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Option<&SchemaNode> {
        path.iter()
            .try_fold(self, |node, key| node.child(key.as_ref()))
    }

    pub fn accepts(&self, value_type: ValueType) -> bool {
        self.types
            .iter()
            .any(|t| *t == value_type || *t == ValueType::Any)
    }

    /// Human-readable union of the accepted types, e.g. `string | array`.
    pub fn type_label(&self) -> String {
        self.types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Check `value` against the enumerated values.
    ///
    /// Entries ending in a bracketed placeholder (`service:[service name]`)
    /// accept any value starting with the text before the bracket.
    pub fn allows_value(&self, value: &str) -> bool {
        let Some(values) = self.values else {
            return true;
        };
        values.iter().any(|allowed| match allowed.find('[') {
            Some(open) if allowed.ends_with(']') => value.starts_with(&allowed[..open]),
            _ => *allowed == value,
        })
    }
}

/// Keys that only make sense inside a service definition.
pub fn is_service_key(key: &str) -> bool {
    compose()
        .resolve(&["services", WILDCARD])
        .and_then(|service| service.exact_child(key))
        .is_some()
}

/// Keys that only make sense inside a service's `deploy` section.
pub fn is_deploy_key(key: &str) -> bool {
    compose()
        .resolve(&["services", WILDCARD, "deploy"])
        .and_then(|deploy| deploy.exact_child(key))
        .is_some()
}
