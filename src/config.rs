//! Engine and server settings

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::completion::MAX_SUGGESTIONS;
use crate::error::{Error, Result};

/// Knobs a client can set through LSP `initializationOptions`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Upper bound on the number of completion candidates returned.
    pub max_suggestions: usize,
    /// Run the schema validator on top of the structural parser.
    pub semantic_validation: bool,
    /// Publish warnings alongside errors.
    pub report_warnings: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_suggestions: MAX_SUGGESTIONS,
            semantic_validation: true,
            report_warnings: true,
        }
    }
}

impl Settings {
    /// Read settings from a JSON value. `null` yields the defaults.
    pub fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(Error::Settings)
    }

    /// Read settings from optional initialization options, falling back to the
    /// defaults when they are absent or malformed.
    pub fn from_init_options(options: Option<Value>) -> Self {
        let Some(options) = options else {
            debug!("No initialization options, using default settings");
            return Self::default();
        };

        match Self::from_value(options) {
            Ok(settings) => {
                debug!(?settings, "Loaded settings from initialization options");
                settings
            }
            Err(e) => {
                warn!("{e}; using default settings");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_when_absent() {
        assert_eq!(Settings::from_init_options(None), Settings::default());
        assert_eq!(Settings::from_value(Value::Null).unwrap(), Settings::default());
    }

    #[test]
    fn partial_options_keep_other_defaults() {
        let settings = Settings::from_value(json!({ "maxSuggestions": 5 })).unwrap();
        assert_eq!(settings.max_suggestions, 5);
        assert!(settings.semantic_validation);
        assert!(settings.report_warnings);
    }

    #[test]
    fn malformed_options_are_an_error() {
        let err = Settings::from_value(json!({ "maxSuggestions": "lots" })).unwrap_err();
        assert!(matches!(err, Error::Settings(_)));
        assert_eq!(
            Settings::from_init_options(Some(json!({ "reportWarnings": 3 }))),
            Settings::default()
        );
    }
}
