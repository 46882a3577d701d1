//! Editor-facing decoration types
//!
//! The host editor is reached through [`RenderSurface`]; everything else
//! here is plain data describing what to draw: a badge after the end of a
//! line plus a markdown hover.

pub mod decorator;
pub mod markdown;
pub mod terminal;

pub use decorator::{EditorDecorator, SCORE_PREFIX};
pub use markdown::MarkdownString;
pub use terminal::TerminalSurface;

use serde::Serialize;

/// Column used for "end of line content"; hosts clamp it to the line length
pub const END_OF_LINE: u32 = u32::MAX;

/// Reference to a theme color, resolved by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeColor(pub String);

impl ThemeColor {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Text drawn after the decorated range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOptions {
    pub content_text: String,
    pub color: ThemeColor,
    pub font_weight: String,
}

impl RenderOptions {
    /// Badge styling shared by every advisor decoration
    pub fn badge(content_text: impl Into<String>) -> Self {
        Self {
            content_text: content_text.into(),
            color: ThemeColor::new("descriptionForeground"),
            font_weight: "normal".to_string(),
        }
    }
}

/// Zero-based editor range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditorRange {
    pub start_line: u32,
    pub start_character: u32,
    pub end_line: u32,
    pub end_character: u32,
}

impl EditorRange {
    /// Zero-width range at the end of a line's content
    pub fn end_of_line(line: u32) -> Self {
        Self {
            start_line: line,
            start_character: END_OF_LINE,
            end_line: line,
            end_character: END_OF_LINE,
        }
    }
}

/// Annotation for one editor line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineDecoration {
    /// Zero-based line index
    pub line_index: u32,
    pub range: EditorRange,
    pub render_options: RenderOptions,
    pub hover: MarkdownString,
}

impl LineDecoration {
    pub fn badge_text(&self) -> &str {
        &self.render_options.content_text
    }

    /// Same decoration with the badge text replaced
    pub fn with_badge(&self, text: impl Into<String>) -> Self {
        Self {
            render_options: RenderOptions {
                content_text: text.into(),
                ..self.render_options.clone()
            },
            ..self.clone()
        }
    }
}

/// Style shared by all decorations of one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecorationTypeOptions {
    /// CSS margin of the `after` attachment
    pub after_margin: String,
}

/// Host handle for a created decoration type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecorationType {
    pub key: String,
    pub options: DecorationTypeOptions,
}

/// Painting capabilities of the host editor
pub trait RenderSurface {
    fn create_decoration_type(&mut self, options: DecorationTypeOptions) -> DecorationType;

    /// Replace every decoration of `decoration_type` shown for `file_path`
    /// with `decorations`; an empty slice clears them.
    fn set_decorations(&mut self, file_path: &str, decoration_type: &DecorationType, decorations: &[LineDecoration]);
}

/// Hand decorations to the host, dropping any without badge text
pub fn update_decorations<S: RenderSurface + ?Sized>(
    surface: &mut S,
    file_path: &str,
    decorations: &[LineDecoration],
    decoration_type: &DecorationType,
) {
    let visible: Vec<LineDecoration> = decorations
        .iter()
        .filter(|d| !d.badge_text().is_empty())
        .cloned()
        .collect();
    surface.set_decorations(file_path, decoration_type, &visible);
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSurface;
    use super::*;

    fn decoration(line: u32, badge: &str) -> LineDecoration {
        LineDecoration {
            line_index: line,
            range: EditorRange::end_of_line(line),
            render_options: RenderOptions::badge(badge),
            hover: MarkdownString::new(),
        }
    }

    #[test]
    fn test_update_filters_empty_badges() {
        let mut surface = RecordingSurface::default();
        let decoration_type = surface.create_decoration_type(DecorationTypeOptions {
            after_margin: "0".to_string(),
        });
        update_decorations(
            &mut surface,
            "a.json",
            &[decoration(1, "x"), decoration(2, ""), decoration(3, "y")],
            &decoration_type,
        );
        let drawn = surface.last_for("a.json").unwrap();
        assert_eq!(drawn.len(), 2);
        assert_eq!(drawn[1].line_index, 3);
    }

    #[test]
    fn test_with_badge_keeps_hover_and_range() {
        let mut original = decoration(4, "Advisor Score 12/100");
        original.hover.append_markdown("hover");
        let blank = original.with_badge("");
        assert_eq!(blank.badge_text(), "");
        assert_eq!(blank.hover, original.hover);
        assert_eq!(blank.range, original.range);
        assert_eq!(blank.render_options.color.id(), "descriptionForeground");
    }
}
