//! Terminal rendering surface
//!
//! Stands in for an editor when running from the command line: decorations
//! are kept per file and printed next to the source lines they annotate.

use crate::editor::{DecorationType, DecorationTypeOptions, LineDecoration, RenderSurface};
use console::style;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct TerminalSurface {
    sources: HashMap<String, String>,
    drawn: HashMap<String, Vec<LineDecoration>>,
    types_created: usize,
}

/// One decorated line in `--format json` output
#[derive(Debug, Serialize)]
struct DecoratedLine<'a> {
    line: u32,
    text: &'a str,
    badge: &'a str,
    hover: &'a str,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document text used to show the annotated lines
    pub fn set_source(&mut self, file_path: &str, text: impl Into<String>) {
        self.sources.insert(file_path.to_string(), text.into());
    }

    /// What is currently drawn for a file
    pub fn drawn(&self, file_path: &str) -> &[LineDecoration] {
        self.drawn.get(file_path).map(Vec::as_slice).unwrap_or(&[])
    }

    fn line_text(&self, file_path: &str, line_index: u32) -> &str {
        self.sources
            .get(file_path)
            .and_then(|s| s.lines().nth(line_index as usize))
            .unwrap_or("")
    }

    /// Human-readable listing of the drawn badges
    pub fn render_text(&self, file_path: &str) -> String {
        let drawn = self.drawn(file_path);
        if drawn.is_empty() {
            return format!("{} {}\n", style("✓").green(), style(file_path).dim());
        }

        let mut out = format!("{}\n", style(file_path).cyan().bold());
        for decoration in drawn {
            out.push_str(&format!(
                "  {} {}  {}\n",
                style(format!("{:>4}", decoration.line_index + 1)).dim(),
                self.line_text(file_path, decoration.line_index).trim_end(),
                style(decoration.badge_text()).yellow()
            ));
        }
        out
    }

    pub fn render_json(&self, file_path: &str) -> serde_json::Result<String> {
        let lines: Vec<DecoratedLine> = self
            .drawn(file_path)
            .iter()
            .map(|d| DecoratedLine {
                line: d.line_index + 1,
                text: self.line_text(file_path, d.line_index).trim(),
                badge: d.badge_text(),
                hover: &d.hover.value,
            })
            .collect();
        serde_json::to_string_pretty(&serde_json::json!({
            "file": file_path,
            "decorations": lines,
        }))
    }
}

impl RenderSurface for TerminalSurface {
    fn create_decoration_type(&mut self, options: DecorationTypeOptions) -> DecorationType {
        self.types_created += 1;
        DecorationType {
            key: format!("terminal-{}", self.types_created),
            options,
        }
    }

    fn set_decorations(&mut self, file_path: &str, _decoration_type: &DecorationType, decorations: &[LineDecoration]) {
        self.drawn.insert(file_path.to_string(), decorations.to_vec());
    }
}
