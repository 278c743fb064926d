//! Docker Compose language server and document engine
//! Parses, validates and completes Compose files without a YAML library

pub mod completion;
pub mod compose_schema;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod hover;
pub mod parser;
pub mod schema;
pub mod serializer;
mod server;
pub mod validator;

// Re-export the modules needed for public API
pub use completion::{suggest, Suggestion, SuggestionKind};
pub use config::Settings;
pub use context::resolve_context;
pub use diagnostics::{analyze, is_valid, Analysis, Diagnostic, DiagnosticKind, Severity};
pub use error::{Error, Result};
pub use hover::describe_key;
pub use parser::{parse, Document, Node, Scalar};
pub use serializer::serialize;
pub use server::Backend;
pub use validator::validate;
