//! Validation and diagnostics

use serde::Serialize;
use tower_lsp::lsp_types::{self, DiagnosticSeverity, NumberOrString, Position, Range};
use tracing::debug;

use crate::config::Settings;
use crate::parser::{self, Document};
use crate::validator;

/// How serious a diagnostic is. Only errors make a document invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Every condition the engine knows how to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    // Structural (parser)
    TabCharacter,
    IndentationNotMultiple,
    IndentationJump,
    ListParentMismatch,
    InvalidSyntax,
    // Semantic (validator)
    UnknownTopLevelKey,
    MisplacedServiceKey,
    MisplacedDeployKey,
    MissingImageOrBuild,
    UnknownServiceKey,
    UnknownSectionKey,
    UnknownNestedKey,
    InvalidEnumValue,
    InvalidVersion,
}

impl DiagnosticKind {
    /// Stable code used when the diagnostic leaves the engine (LSP `code`).
    pub const fn code(self) -> &'static str {
        match self {
            Self::TabCharacter => "tab-character",
            Self::IndentationNotMultiple => "indentation-not-multiple",
            Self::IndentationJump => "indentation-jump",
            Self::ListParentMismatch => "list-parent-mismatch",
            Self::InvalidSyntax => "invalid-syntax",
            Self::UnknownTopLevelKey => "unknown-top-level-key",
            Self::MisplacedServiceKey => "misplaced-service-key",
            Self::MisplacedDeployKey => "misplaced-deploy-key",
            Self::MissingImageOrBuild => "missing-image-or-build",
            Self::UnknownServiceKey => "unknown-service-key",
            Self::UnknownSectionKey => "unknown-section-key",
            Self::UnknownNestedKey => "unknown-nested-key",
            Self::InvalidEnumValue => "invalid-enum-value",
            Self::InvalidVersion => "invalid-version",
        }
    }

    /// Whether the parser (as opposed to the validator) emits this kind.
    pub const fn is_structural(self) -> bool {
        matches!(
            self,
            Self::TabCharacter
                | Self::IndentationNotMultiple
                | Self::IndentationJump
                | Self::ListParentMismatch
                | Self::InvalidSyntax
        )
    }
}

/// A single finding, positioned by 1-based line and column.
///
/// Serializes to the wire shape `{line, column, message, severity,
/// validValues?, validKeys?}`. The kind travels with the value in Rust but is
/// not part of the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_keys: Option<Vec<String>>,
    #[serde(skip)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error, line, column, message.into())
    }

    pub fn warning(kind: DiagnosticKind, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, line, column, message.into())
    }

    fn new(kind: DiagnosticKind, severity: Severity, line: usize, column: usize, message: String) -> Self {
        Self {
            line: line.max(1),
            column: column.max(1),
            message,
            severity,
            valid_values: None,
            valid_keys: None,
            kind,
        }
    }

    pub fn with_valid_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_valid_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// A document is valid when none of its diagnostics is an error.
pub fn is_valid(diagnostics: &[Diagnostic]) -> bool {
    !diagnostics.iter().any(Diagnostic::is_error)
}

/// Result of a full structural + semantic pass over one text.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
    pub is_valid: bool,
}

/// Parse and validate `text`, merging both diagnostic sets.
pub fn analyze(text: &str, settings: &Settings) -> Analysis {
    let document = parser::parse(text);

    let mut diagnostics = document.diagnostics.clone();
    if settings.semantic_validation {
        diagnostics.extend(validator::validate(text, &document));
    }
    if !settings.report_warnings {
        diagnostics.retain(Diagnostic::is_error);
    }
    diagnostics.sort_by_key(|d| (d.line, d.column));

    let is_valid = is_valid(&diagnostics);
    debug!(
        count = diagnostics.len(),
        is_valid, "analyzed document"
    );

    Analysis {
        document,
        diagnostics,
        is_valid,
    }
}

/// Generate LSP diagnostics for the given document text
pub fn validate_document(text: &str, settings: &Settings) -> Vec<lsp_types::Diagnostic> {
    let lines: Vec<&str> = text.lines().collect();
    analyze(text, settings)
        .diagnostics
        .iter()
        .map(|diagnostic| to_lsp(diagnostic, &lines))
        .collect()
}

/// Convert an engine diagnostic to its LSP form, spanning the rest of the line.
pub fn to_lsp(diagnostic: &Diagnostic, lines: &[&str]) -> lsp_types::Diagnostic {
    let line = diagnostic.line.saturating_sub(1);
    let start = diagnostic.column.saturating_sub(1);
    let end = lines
        .get(line)
        .map(|text| text.chars().count())
        .unwrap_or(start)
        .max(start);

    let severity = match diagnostic.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
    };

    let mut message = diagnostic.message.clone();
    if let Some(keys) = &diagnostic.valid_keys {
        if !keys.is_empty() {
            message.push_str(&format!("\nValid keys: {}", keys.join(", ")));
        }
    }

    lsp_types::Diagnostic {
        range: Range {
            start: Position::new(line as u32, start as u32),
            end: Position::new(line as u32, end as u32),
        },
        severity: Some(severity),
        code: Some(NumberOrString::String(diagnostic.kind.code().to_string())),
        code_description: None,
        source: Some("compose-ls".to_string()),
        message,
        related_information: None,
        tags: None,
        data: None,
    }
}
