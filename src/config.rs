//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Options controlling how directives are recognized and evaluated.
///
/// Every field has a default, so a partial JSON document such as
/// `{"prefix": "tw"}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Attribute prefix; directives are written `{prefix}-{kind}`.
    pub prefix: String,
    /// Recognize `bind`, `if`, `show`, `cloak`, `ref` and `model` in addition to
    /// `on`, `data` and `text`. They are parsed but never executed.
    pub reserved_directives: bool,
    /// Name under which `on` handlers see `{ type: <event type> }`.
    ///
    /// `None` keeps the event away from handler expressions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_variable: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: "x".to_string(),
            reserved_directives: true,
            event_variable: None,
        }
    }
}

impl Config {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the attribute prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Enables or disables recognition of the reserved directive kinds.
    #[must_use]
    pub const fn with_reserved_directives(mut self, enabled: bool) -> Self {
        self.reserved_directives = enabled;
        self
    }

    /// Exposes the triggering event to `on` handlers under `name`.
    #[must_use]
    pub fn with_event_variable(mut self, name: impl Into<String>) -> Self {
        self.event_variable = Some(name.into());
        self
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is malformed or the prefix is empty.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrefix`] if the prefix is empty or contains characters that
    /// cannot appear in an attribute name.
    pub fn validate(&self) -> Result<(), Error> {
        let valid = !self.prefix.is_empty()
            && self
                .prefix
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if valid {
            Ok(())
        } else {
            Err(Error::InvalidPrefix(self.prefix.clone()))
        }
    }

    /// Returns the name of the attribute that declares a component root, e.g. `x-data`.
    #[must_use]
    pub fn data_attribute(&self) -> String {
        format!("{}-data", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.prefix, "x");
        assert!(config.reserved_directives);
        assert_eq!(config.event_variable, None);
        assert_eq!(config.data_attribute(), "x-data");
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .with_prefix("tw")
            .with_reserved_directives(false)
            .with_event_variable("$event");
        assert_eq!(config.data_attribute(), "tw-data");
        assert!(!config.reserved_directives);
        assert_eq!(config.event_variable.as_deref(), Some("$event"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{"prefix": "v"}"#).unwrap();
        assert_eq!(config.prefix, "v");
        assert!(config.reserved_directives);

        let config = Config::from_json(r#"{"event_variable": "$event"}"#).unwrap();
        assert_eq!(config.prefix, "x");
        assert_eq!(config.event_variable.as_deref(), Some("$event"));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Config::from_json("{\"prefix\": 3}"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{"prefix": ""}"#),
            Err(Error::InvalidPrefix(prefix)) if prefix.is_empty()
        ));
        assert!(matches!(
            Config::from_json(r#"{"prefix": "x:y"}"#),
            Err(Error::InvalidPrefix(_))
        ));
    }
}
