use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::store::check_name;
use crate::error::{Result, StyleError};
use crate::fields::{kind_of, FieldSet};

/// Every theme as one JSON object, e.g.
/// `{"Night": {"textColor": "#eee", "pageBackground": "#111"}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ThemeDocument {
    themes: BTreeMap<String, FieldSet>,
}

impl ThemeDocument {
    pub fn new(themes: BTreeMap<String, FieldSet>) -> Self {
        Self { themes }
    }

    pub fn themes(&self) -> &BTreeMap<String, FieldSet> {
        &self.themes
    }

    pub fn into_themes(self) -> BTreeMap<String, FieldSet> {
        self.themes
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parses an exported document. Any structural problem rejects the whole
    /// document; field names outside the vocabulary are dropped.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| StyleError::Parse(e.to_string()))?;
        let object = value.as_object().ok_or_else(|| {
            StyleError::Parse(format!("expected an object of themes, got {}", kind_of(&value)))
        })?;

        let mut themes = BTreeMap::new();
        for (name, fields) in object {
            check_name(name).map_err(|_| StyleError::Parse(format!("invalid theme name {:?}", name)))?;
            let decoded = FieldSet::from_value(fields)
                .map_err(|e| StyleError::Parse(format!("theme {:?}: {}", name, e)))?;
            if !decoded.unknown.is_empty() {
                tracing::warn!(theme = %name, unknown = ?decoded.unknown, "dropping unknown fields");
            }
            themes.insert(name.clone(), decoded.fields);
        }
        Ok(Self { themes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldName;

    #[test]
    fn test_parse_document() {
        let doc = ThemeDocument::parse(
            r##"{"Night": {"textColor": "#eee", "pageBackground": "#111"}, "Plain": {}}"##,
        )
        .unwrap();
        assert_eq!(doc.themes().len(), 2);
        assert_eq!(doc.themes()["Night"].get(FieldName::PageBackground), "#111");
        assert!(doc.themes()["Plain"].is_empty());
    }

    #[test]
    fn test_to_json_parses_back() {
        let mut themes = BTreeMap::new();
        themes.insert(
            "Sepia".to_string(),
            FieldSet::from_pairs([(FieldName::TextColor, "#5b4636"), (FieldName::FontSize, "18px")]),
        );
        themes.insert("No theme".to_string(), FieldSet::new());
        let doc = ThemeDocument::new(themes);

        let json = doc.to_json();
        assert!(json.contains("\"Sepia\""));
        assert!(json.contains("\"textColor\": \"#5b4636\""));
        assert_eq!(ThemeDocument::parse(&json).unwrap(), doc);
    }

    #[test]
    fn test_parse_rejects_malformed_documents() {
        for text in [
            "not json",
            "[]",
            r#"{"Night": "textColor"}"#,
            r#"{"Night": {"textColor": 12}}"#,
            r#"{"": {}}"#,
            r#"{"Select a theme...": {}}"#,
        ] {
            assert!(
                matches!(ThemeDocument::parse(text), Err(StyleError::Parse(_))),
                "{}",
                text
            );
        }
    }
}
