use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fields::{FieldName, FieldSet};

const TEXT_SELECTOR: &str =
    ".super-editor-content-wrapper, #editorContent p span, #editorContent p font, #editorContent p b";
const FONT_SELECTOR: &str =
    ".editor-content-wrapper, .mediumEditorSpace p, #editorContent p span, #editorContent p font, #editorContent p b";
const EDITOR_SELECTOR: &str = ".super-editor-content-wrapper";
const PAGE_SELECTOR: &str = "#editorContent";
const TEXT_RUN_SELECTOR: &str = "#editorContent p span, #editorContent p font";

/// Compiled stylesheet text. Empty means "no customization".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CssText(String);

impl CssText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CssText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One declaration inside an emitted rule.
#[derive(Debug, Clone, Copy)]
pub enum Declaration {
    /// `property: <field value>`.
    Value(&'static str),
    /// `property: <field value> !important`.
    Important(&'static str),
    /// A literal declaration emitted alongside the value.
    Fixed(&'static str),
}

use Declaration::{Fixed, Important, Value};

/// A rule emitted when `field` carries a value.
#[derive(Debug, Clone, Copy)]
pub struct EmissionRule {
    pub field: FieldName,
    pub selector: &'static str,
    pub declarations: &'static [Declaration],
}

const fn page_rule(field: FieldName, declarations: &'static [Declaration]) -> EmissionRule {
    EmissionRule {
        field,
        selector: PAGE_SELECTOR,
        declarations,
    }
}

/// Emission order of the per-field rules. `fontURL` has no entry: it travels
/// through the font import side channel instead.
pub const RULES: &[EmissionRule] = &[
    EmissionRule {
        field: FieldName::TextColor,
        selector: TEXT_SELECTOR,
        declarations: &[Important("color")],
    },
    EmissionRule {
        field: FieldName::FontFamily,
        selector: FONT_SELECTOR,
        declarations: &[Important("font-family")],
    },
    EmissionRule {
        field: FieldName::FontSize,
        selector: EDITOR_SELECTOR,
        declarations: &[Value("font-size")],
    },
    page_rule(FieldName::LineHeight, &[Important("line-height")]),
    page_rule(FieldName::PageBackground, &[Value("background")]),
    page_rule(FieldName::PageMargin, &[Value("margin")]),
    page_rule(FieldName::PagePadding, &[Value("padding")]),
    page_rule(FieldName::PageWidth, &[Value("max-width")]),
    page_rule(FieldName::PageBorderRadius, &[Value("border-radius")]),
    page_rule(FieldName::PageBorder, &[Value("border")]),
    page_rule(FieldName::PageBorderLeft, &[Value("border-left")]),
    page_rule(FieldName::PageBorderRight, &[Value("border-right")]),
    page_rule(FieldName::PageBorderTop, &[Value("border-top")]),
    page_rule(FieldName::PageBorderBottom, &[Value("border-bottom")]),
    EmissionRule {
        field: FieldName::EditorBackground,
        selector: EDITOR_SELECTOR,
        declarations: &[
            Value("background"),
            Fixed("background-position: center"),
            Fixed("background-size: cover"),
        ],
    },
];

/// Policy knobs the compiler does not hard-code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilePolicy {
    /// Emit `@font-face { src: local(..) }` when a font family is chosen
    /// without a font URL to import it from.
    pub local_font_face: bool,
}

impl Default for CompilePolicy {
    fn default() -> Self {
        Self {
            local_font_face: true,
        }
    }
}

/// Walks [`RULES`] in order, emitting a rule only for set fields. Values are
/// spliced in verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssCompiler {
    policy: CompilePolicy,
}

impl CssCompiler {
    pub fn new(policy: CompilePolicy) -> Self {
        Self { policy }
    }

    pub fn compile(&self, fields: &FieldSet) -> CssText {
        let mut css = String::new();

        for rule in RULES {
            let Some(raw) = fields.value(rule.field) else {
                continue;
            };
            push_rule(&mut css, rule.selector, rule.declarations, raw);

            if rule.field == FieldName::FontFamily
                && self.policy.local_font_face
                && !fields.is_set(FieldName::FontUrl)
            {
                css.push_str(&format!(
                    "@font-face {{ font-family: {raw}; src: local({raw}); }}\n"
                ));
            }
        }

        // Legacy inline spans carry their own background; clear it so page and
        // editor backgrounds show through.
        if fields.is_set(FieldName::PageBackground) || fields.is_set(FieldName::EditorBackground) {
            css.push_str(TEXT_RUN_SELECTOR);
            css.push_str(" { background-color: transparent !important; }\n");
        }

        CssText(css)
    }
}

fn push_rule(css: &mut String, selector: &str, declarations: &[Declaration], raw: &str) {
    css.push_str(selector);
    css.push_str(" {");
    for declaration in declarations {
        match *declaration {
            Value(property) => css.push_str(&format!(" {property}: {raw};")),
            Important(property) => css.push_str(&format!(" {property}: {raw} !important;")),
            Fixed(text) => css.push_str(&format!(" {text};")),
        }
    }
    css.push_str(" }\n");
}

/// The font URL to import, if one is set.
pub fn font_import_url(fields: &FieldSet) -> Option<&str> {
    fields.value(FieldName::FontUrl)
}
