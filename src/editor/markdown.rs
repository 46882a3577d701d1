//! Markdown hover content

use serde::Serialize;

/// Markdown text handed to the host for hovers.
///
/// `is_trusted` lets the host render command and http links as clickable;
/// only set it for content built from trusted values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkdownString {
    pub value: String,
    pub is_trusted: bool,
    pub support_theme_icons: bool,
}

impl MarkdownString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trusted() -> Self {
        Self {
            is_trusted: true,
            ..Self::default()
        }
    }

    pub fn append_markdown(&mut self, value: &str) -> &mut Self {
        self.value.push_str(value);
        self
    }

    /// Append text with markdown control characters escaped
    pub fn append_text(&mut self, value: &str) -> &mut Self {
        for c in value.chars() {
            if matches!(
                c,
                '\\' | '`' | '*' | '_' | '{' | '}' | '[' | ']' | '(' | ')' | '#' | '+' | '-' | '.' | '!' | '|'
            ) {
                self.value.push('\\');
            }
            self.value.push(c);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}
