//! Directive attribute parsing.
//!
//! A directive is an attribute named `{prefix}-{kind}[:{value}][.{modifier}]*`, for
//! example `x-on:click.prevent="count++"`. Parsing is purely syntactic; the attribute
//! value is carried along unparsed and only evaluated when the directive runs.

use core::fmt;

use tidewater_dom::{Attribute, Element};

use crate::Config;

/// The recognized directive keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `on:<event>` registers an event handler.
    On,
    /// `data` declares a component root and its initial data.
    Data,
    /// `text` renders a data property as the element's text.
    Text,
    /// `bind:<attribute>`, reserved.
    Bind,
    /// `if`, reserved.
    If,
    /// `show`, reserved.
    Show,
    /// `cloak`, reserved.
    Cloak,
    /// `ref`, reserved.
    Ref,
    /// `model`, reserved.
    Model,
}

impl DirectiveKind {
    /// Every kind, executed ones first.
    pub const ALL: [Self; 9] = [
        Self::On,
        Self::Data,
        Self::Text,
        Self::Bind,
        Self::If,
        Self::Show,
        Self::Cloak,
        Self::Ref,
        Self::Model,
    ];

    /// Returns the keyword as written in attribute names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Data => "data",
            Self::Text => "text",
            Self::Bind => "bind",
            Self::If => "if",
            Self::Show => "show",
            Self::Cloak => "cloak",
            Self::Ref => "ref",
            Self::Model => "model",
        }
    }

    /// Looks up a kind by keyword.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == keyword)
    }

    /// Returns `true` for kinds that are recognized but have no behavior.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        !matches!(self, Self::On | Self::Data | Self::Text)
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directive extracted from one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// The directive keyword.
    pub kind: DirectiveKind,
    /// The suffix after `:`, such as the event name of `on:click`.
    pub value: Option<String>,
    /// Dot-separated suffixes, in the order written.
    pub modifiers: Vec<String>,
    /// The attribute value, unparsed.
    pub expression: String,
}

/// Parses one attribute, returning `None` if it is not a directive under `config`.
#[must_use]
pub fn parse_attribute(attribute: &Attribute, config: &Config) -> Option<Directive> {
    let rest = attribute
        .name()
        .strip_prefix(config.prefix.as_str())?
        .strip_prefix('-')?;

    let keyword_end = rest.find([':', '.']).unwrap_or(rest.len());
    let kind = DirectiveKind::from_keyword(&rest[..keyword_end])?;
    if kind.is_reserved() && !config.reserved_directives {
        return None;
    }

    let mut rest = &rest[keyword_end..];
    let mut value = None;
    if let Some(after_colon) = rest.strip_prefix(':') {
        let value_end = after_colon.find('.').unwrap_or(after_colon.len());
        value = Some(&after_colon[..value_end])
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        rest = &after_colon[value_end..];
    }

    let modifiers = rest
        .split('.')
        .filter(|modifier| !modifier.is_empty())
        .map(str::to_string)
        .collect();

    Some(Directive {
        kind,
        value,
        modifiers,
        expression: attribute.value().to_string(),
    })
}

/// Returns the directives declared on `element`, in attribute order.
#[must_use]
pub fn directives(element: &Element, config: &Config) -> Vec<Directive> {
    element
        .attributes()
        .iter()
        .filter_map(|attribute| parse_attribute(attribute, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidewater_dom::Document;

    fn parse(name: &str, value: &str) -> Option<Directive> {
        parse_attribute(&Attribute::new(name, value), &Config::default())
    }

    #[test]
    fn test_event_directive_with_modifiers() {
        let directive = parse("x-on:click.prevent.once", "count++").unwrap();
        assert_eq!(directive.kind, DirectiveKind::On);
        assert_eq!(directive.value.as_deref(), Some("click"));
        assert_eq!(directive.modifiers, ["prevent", "once"]);
        assert_eq!(directive.expression, "count++");
    }

    #[test]
    fn test_plain_directives() {
        let text = parse("x-text", "label").unwrap();
        assert_eq!(text.kind, DirectiveKind::Text);
        assert_eq!(text.value, None);
        assert!(text.modifiers.is_empty());

        let data = parse("x-data", "{ open: false }").unwrap();
        assert_eq!(data.kind, DirectiveKind::Data);
        assert_eq!(data.expression, "{ open: false }");
    }

    #[test]
    fn test_value_with_hyphen_and_modifier_without_value() {
        let bind = parse("x-bind:aria-label", "label").unwrap();
        assert_eq!(bind.kind, DirectiveKind::Bind);
        assert_eq!(bind.value.as_deref(), Some("aria-label"));

        let model = parse("x-model.lazy", "name").unwrap();
        assert_eq!(model.value, None);
        assert_eq!(model.modifiers, ["lazy"]);
    }

    #[test]
    fn test_non_directives_are_skipped() {
        assert_eq!(parse("class", "x-on"), None);
        assert_eq!(parse("x-unknown", ""), None);
        assert_eq!(parse("x-onclick", ""), None);
        assert_eq!(parse("data-x-on:click", ""), None);
        assert_eq!(parse("xon:click", ""), None);
    }

    #[test]
    fn test_empty_value_and_modifiers() {
        let directive = parse("x-on:.stop..", "").unwrap();
        assert_eq!(directive.value, None);
        assert_eq!(directive.modifiers, ["stop"]);
    }

    #[test]
    fn test_reserved_directives_switch() {
        let minimal = Config::default().with_reserved_directives(false);
        assert!(parse_attribute(&Attribute::new("x-show", "open"), &minimal).is_none());
        assert!(parse_attribute(&Attribute::new("x-text", "open"), &minimal).is_some());
        assert!(parse("x-show", "open").is_some());
    }

    #[test]
    fn test_custom_prefix() {
        let config = Config::default().with_prefix("tw");
        let directive = parse_attribute(&Attribute::new("tw-on:input", "n++"), &config).unwrap();
        assert_eq!(directive.kind, DirectiveKind::On);
        assert!(parse_attribute(&Attribute::new("x-on:input", "n++"), &config).is_none());
    }

    #[test]
    fn test_element_directives_keep_attribute_order() {
        let document = Document::new();
        let button = document.create_element("button");
        button.set_attribute("x-text", "label");
        button.set_attribute("id", "go");
        button.set_attribute("x-on:click", "count++");

        let kinds: Vec<_> = directives(&button, &Config::default())
            .into_iter()
            .map(|directive| directive.kind)
            .collect();
        assert_eq!(kinds, [DirectiveKind::Text, DirectiveKind::On]);
    }

    #[test]
    fn test_keyword_round_trip() {
        for kind in DirectiveKind::ALL {
            assert_eq!(DirectiveKind::from_keyword(kind.as_str()), Some(kind));
        }
        assert!(!DirectiveKind::Text.is_reserved());
        assert!(DirectiveKind::Cloak.is_reserved());
    }
}
