//! Parsed line values handed to the typewriter.
//!
//! A [`MarkupParseResult`] is produced upstream by whatever parses the dialogue
//! script. The typewriter and the markup handlers only read it.
use indexmap::IndexMap;
use serde::Deserialize;

/// A value attached to a markup attribute property.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum MarkupValue {
    /// An integer property, like `[pause=500/]`.
    Integer(i64),
    /// A float property, like `[pause=0.5/]`.
    Float(f32),
    /// A string property, like `[character name="Bob"]`.
    String(String),
    /// A boolean property.
    Bool(bool),
}

impl MarkupValue {
    /// The name of the variant, used in log messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            MarkupValue::Integer(_) => "Integer",
            MarkupValue::Float(_) => "Float",
            MarkupValue::String(_) => "String",
            MarkupValue::Bool(_) => "Bool",
        }
    }

    /// Returns the string content if this is a [`MarkupValue::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MarkupValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for MarkupValue {
    fn from(value: i64) -> Self {
        MarkupValue::Integer(value)
    }
}

impl From<f32> for MarkupValue {
    fn from(value: f32) -> Self {
        MarkupValue::Float(value)
    }
}

impl From<bool> for MarkupValue {
    fn from(value: bool) -> Self {
        MarkupValue::Bool(value)
    }
}

impl From<&str> for MarkupValue {
    fn from(value: &str) -> Self {
        MarkupValue::String(value.to_string())
    }
}

impl From<String> for MarkupValue {
    fn from(value: String) -> Self {
        MarkupValue::String(value)
    }
}

/// A named markup attribute anchored at a character position of the line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarkupAttribute {
    /// The attribute name, e.g. `pause` or `emotion`.
    pub name: String,
    /// Index of the first character the attribute applies to.
    pub position: usize,
    /// Number of characters the attribute spans. Zero for self-closing markers.
    #[serde(default)]
    pub length: usize,
    /// The attribute properties, in declaration order.
    #[serde(default)]
    pub properties: IndexMap<String, MarkupValue>,
}

impl MarkupAttribute {
    /// Creates an attribute without properties.
    pub fn new(name: &str, position: usize) -> Self {
        Self {
            name: name.to_string(),
            position,
            length: 0,
            properties: IndexMap::new(),
        }
    }

    /// Sets the number of characters the attribute spans.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Adds a property to the attribute.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bevy_typewriter::prelude::*;
    ///
    /// let attr = MarkupAttribute::new("emotion", 4).with_property("emotion", "happy");
    /// assert_eq!(attr.string_property("emotion"), Some("happy"));
    /// ```
    pub fn with_property(mut self, name: &str, value: impl Into<MarkupValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Returns the property with the given name.
    pub fn property(&self, name: &str) -> Option<&MarkupValue> {
        self.properties.get(name)
    }

    /// Returns the property with the given name if it holds a string.
    pub fn string_property(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(MarkupValue::as_str)
    }
}

/// The plain text of a line together with its markup attributes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MarkupParseResult {
    /// The text with all markup removed.
    pub text: String,
    /// The attributes found in the line.
    #[serde(default)]
    pub attributes: Vec<MarkupAttribute>,
}

impl MarkupParseResult {
    /// Creates a line without attributes.
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            attributes: vec![],
        }
    }

    /// Adds an attribute to the line.
    pub fn with_attribute(mut self, attribute: MarkupAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Returns the first attribute with the given name.
    pub fn attribute_with_name(&self, name: &str) -> Option<&MarkupAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Iterates over every attribute with the given name.
    pub fn attributes_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a MarkupAttribute> + 'a {
        self.attributes.iter().filter(move |a| a.name == name)
    }

    /// Parses a line from RON.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bevy_typewriter::prelude::*;
    ///
    /// let line = MarkupParseResult::from_ron(r#"(
    ///     text: "Wait... what?",
    ///     attributes: [(name: "pause", position: 7, properties: {"pause": Integer(250)})],
    /// )"#).unwrap();
    /// assert_eq!(line.attributes[0].property("pause"), Some(&MarkupValue::Integer(250)));
    /// ```
    pub fn from_ron(ron: &str) -> Result<Self, serde_ron::error::SpannedError> {
        serde_ron::from_str(ron)
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn line() -> MarkupParseResult {
        MarkupParseResult::new("Hello there, friend")
            .with_attribute(MarkupAttribute::new("character", 0).with_property("name", "Bob"))
            .with_attribute(MarkupAttribute::new("emotion", 6).with_property("emotion", "happy"))
            .with_attribute(MarkupAttribute::new("emotion", 13).with_property("emotion", "sad"))
    }

    #[rstest]
    fn attribute_with_name_finds_first(line: MarkupParseResult) {
        let emotion = line.attribute_with_name("emotion").unwrap();
        assert_eq!(emotion.position, 6);
        assert!(line.attribute_with_name("move").is_none());
    }

    #[rstest]
    fn attributes_named_keeps_order(line: MarkupParseResult) {
        let positions: Vec<usize> = line.attributes_named("emotion").map(|a| a.position).collect();
        assert_eq!(positions, vec![6, 13]);
    }

    #[rstest]
    #[case(MarkupValue::Integer(3), None)]
    #[case(MarkupValue::Float(0.5), None)]
    #[case(MarkupValue::Bool(true), None)]
    #[case(MarkupValue::from("Bob"), Some("Bob"))]
    fn string_property_only_for_strings(#[case] value: MarkupValue, #[case] expected: Option<&str>) {
        let attr = MarkupAttribute::new("x", 0).with_property("p", value);
        assert_eq!(attr.string_property("p"), expected);
    }

    #[test]
    fn parse_line_from_ron() {
        let line = MarkupParseResult::from_ron(
            r#"(
                text: "Go!",
                attributes: [
                    (name: "character", position: 0, length: 3, properties: {"name": String("Alice")}),
                    (name: "pause", position: 2),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(line.text, "Go!");
        assert_eq!(line.attributes.len(), 2);
        assert_eq!(line.attributes[0].length, 3);
        assert_eq!(line.attributes[0].string_property("name"), Some("Alice"));
        assert!(line.attributes[1].properties.is_empty());
    }

    #[test]
    fn parse_line_without_attributes() {
        let line = MarkupParseResult::from_ron(r#"(text: "Hi")"#).unwrap();
        assert_eq!(line, MarkupParseResult::new("Hi"));
    }
}
