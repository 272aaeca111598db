use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

/// Every field the customization form offers, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    TextColor,
    FontFamily,
    #[serde(rename = "fontURL")]
    FontUrl,
    FontSize,
    LineHeight,
    PageBackground,
    PageWidth,
    PageMargin,
    PagePadding,
    PageBorderRadius,
    PageBorder,
    PageBorderLeft,
    PageBorderRight,
    PageBorderTop,
    PageBorderBottom,
    EditorBackground,
}

impl FieldName {
    pub const ALL: [FieldName; 16] = [
        FieldName::TextColor,
        FieldName::FontFamily,
        FieldName::FontUrl,
        FieldName::FontSize,
        FieldName::LineHeight,
        FieldName::PageBackground,
        FieldName::PageWidth,
        FieldName::PageMargin,
        FieldName::PagePadding,
        FieldName::PageBorderRadius,
        FieldName::PageBorder,
        FieldName::PageBorderLeft,
        FieldName::PageBorderRight,
        FieldName::PageBorderTop,
        FieldName::PageBorderBottom,
        FieldName::EditorBackground,
    ];

    /// The name used in forms, persisted keys and exported documents.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::TextColor => "textColor",
            FieldName::FontFamily => "fontFamily",
            FieldName::FontUrl => "fontURL",
            FieldName::FontSize => "fontSize",
            FieldName::LineHeight => "lineHeight",
            FieldName::PageBackground => "pageBackground",
            FieldName::PageWidth => "pageWidth",
            FieldName::PageMargin => "pageMargin",
            FieldName::PagePadding => "pagePadding",
            FieldName::PageBorderRadius => "pageBorderRadius",
            FieldName::PageBorder => "pageBorder",
            FieldName::PageBorderLeft => "pageBorderLeft",
            FieldName::PageBorderRight => "pageBorderRight",
            FieldName::PageBorderTop => "pageBorderTop",
            FieldName::PageBorderBottom => "pageBorderBottom",
            FieldName::EditorBackground => "editorBackground",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("Unknown field: {}", s))
    }
}

/// Field values for one form submission or one stored theme.
///
/// A blank field and an absent one are both unset; blank values are never
/// stored, so sets differing only in blanks compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldSet {
    values: BTreeMap<FieldName, String>,
}

/// Result of decoding a loosely-typed JSON object into a [`FieldSet`].
#[derive(Debug, Default)]
pub struct DecodedFields {
    pub fields: FieldSet,
    /// Keys that are not part of the vocabulary; they are dropped.
    pub unknown: Vec<String>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from `(field, value)` pairs; blank values are skipped.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (FieldName, S)>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for (field, value) in pairs {
            set.set(field, value);
        }
        set
    }

    /// Value of `field`, or `""` when unset.
    pub fn get(&self, field: FieldName) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Value of `field` when it is set to something non-empty.
    pub fn value(&self, field: FieldName) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn is_set(&self, field: FieldName) -> bool {
        self.values.contains_key(&field)
    }

    /// Stores `value`; storing the empty string unsets the field.
    pub fn set(&mut self, field: FieldName, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.values.remove(&field);
        } else {
            self.values.insert(field, value);
        }
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Decodes a JSON object of string values.
    ///
    /// Unknown keys are reported but not fatal; a non-object or a non-string
    /// value is an error.
    pub fn from_value(value: &Value) -> Result<DecodedFields, String> {
        let object = value
            .as_object()
            .ok_or_else(|| format!("expected an object of field values, got {}", kind_of(value)))?;

        let mut decoded = DecodedFields::default();
        for (key, raw) in object {
            let text = raw
                .as_str()
                .ok_or_else(|| format!("field {:?} must be a string, got {}", key, kind_of(raw)))?;
            match key.parse::<FieldName>() {
                Ok(field) => decoded.fields.set(field, text),
                Err(_) => decoded.unknown.push(key.clone()),
            }
        }
        Ok(decoded)
    }

    pub fn from_json(text: &str) -> Result<DecodedFields, String> {
        let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        Self::from_value(&value)
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_round_trip_through_str() {
        for field in FieldName::ALL {
            assert_eq!(field.as_str().parse::<FieldName>(), Ok(field));
        }
        assert!("fontUrl".parse::<FieldName>().is_err());
    }

    #[test]
    fn test_empty_value_is_unset() {
        let mut fields = FieldSet::new();
        fields.set(FieldName::TextColor, "#fff");
        fields.set(FieldName::FontFamily, "");
        assert!(fields.is_set(FieldName::TextColor));
        assert!(!fields.is_set(FieldName::FontFamily));
        assert_eq!(fields.get(FieldName::FontFamily), "");

        fields.set(FieldName::TextColor, "");
        assert!(fields.is_empty());
        assert_eq!(fields, FieldSet::new());
    }

    #[test]
    fn test_json_uses_form_names_in_form_order() {
        let fields = FieldSet::from_pairs([
            (FieldName::EditorBackground, "url(a.png)"),
            (FieldName::FontUrl, "https://fonts.example/x.css"),
            (FieldName::TextColor, "red"),
        ]);
        assert_eq!(
            fields.to_json(),
            r#"{"textColor":"red","fontURL":"https://fonts.example/x.css","editorBackground":"url(a.png)"}"#
        );
    }

    #[test]
    fn test_from_json_drops_unknown_and_blank_fields() {
        let decoded = FieldSet::from_json(r#"{"textColor":"red","fontSize":"","bogus":"x"}"#).unwrap();
        assert_eq!(decoded.fields, FieldSet::from_pairs([(FieldName::TextColor, "red")]));
        assert_eq!(decoded.unknown, vec!["bogus".to_string()]);
    }

    #[test]
    fn test_from_json_rejects_non_string_values() {
        assert!(FieldSet::from_json(r#"{"textColor":3}"#).is_err());
        assert!(FieldSet::from_json(r#"["textColor"]"#).is_err());
        assert!(FieldSet::from_json("not json").is_err());
    }
}
