//! Score badges for manifest and import lines
//!
//! The decorator keeps one decoration set per file. `apply_scores` replaces
//! it, `reset_decorations` blanks the badges while an edit is in flight, and
//! `clear` forgets the file entirely.

use crate::editor::{
    update_decorations, DecorationType, DecorationTypeOptions, EditorRange, LineDecoration, MarkdownString,
    RenderOptions, RenderSurface,
};
use crate::models::AdvisorScore;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Badge text prefix, followed by `N/100`
pub const SCORE_PREFIX: &str = "Advisor Score";

const AFTER_MARGIN: &str = "0 0 0 1rem";

pub struct EditorDecorator<S: RenderSurface> {
    surface: S,
    decoration_type: DecorationType,
    /// Advisor detail link base, e.g. `https://snyk.io/advisor/npm-package`
    advisor_url: String,
    threshold: f64,
    file_decorations: HashMap<String, Vec<LineDecoration>>,
}

impl<S: RenderSurface> EditorDecorator<S> {
    pub fn new(mut surface: S, advisor_url: impl Into<String>, threshold: f64) -> Self {
        let decoration_type = surface.create_decoration_type(DecorationTypeOptions {
            after_margin: AFTER_MARGIN.to_string(),
        });
        Self {
            surface,
            decoration_type,
            advisor_url: advisor_url.into(),
            threshold,
            file_decorations: HashMap::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn decoration_type(&self) -> &DecorationType {
        &self.decoration_type
    }

    /// Stored decorations for a file, if any were applied
    pub fn decorations(&self, file_path: &str) -> Option<&[LineDecoration]> {
        self.file_decorations.get(file_path).map(Vec::as_slice)
    }

    /// Badge every `(name, line)` whose score is known and below the threshold.
    ///
    /// Lines are 1-based; negative lines are skipped. A line carries at most
    /// one badge: a later entry on the same line replaces an earlier one.
    /// The new set replaces whatever was stored for `file_path` and is sent
    /// to the surface even when empty, so stale badges disappear.
    pub fn apply_scores(&mut self, file_path: &str, scores: &[AdvisorScore], name_to_line: &[(String, i64)]) {
        let mut by_line: BTreeMap<u32, LineDecoration> = BTreeMap::new();
        for (name, line) in name_to_line {
            if *line < 1 {
                continue;
            }
            let Some(score) = scores.iter().find(|s| &s.name == name) else {
                continue;
            };
            if score.score <= 0.0 || score.score >= self.threshold {
                continue;
            }

            let line_index = (*line - 1) as u32;
            by_line.insert(
                line_index,
                LineDecoration {
                    line_index,
                    range: EditorRange::end_of_line(line_index),
                    render_options: RenderOptions::badge(format!("{} {}/100", SCORE_PREFIX, score.percent())),
                    hover: self.hover_message(score),
                },
            );
        }
        let decorations: Vec<LineDecoration> = by_line.into_values().collect();

        debug!("{} advisor decorations for {}", decorations.len(), file_path);
        update_decorations(&mut self.surface, file_path, &decorations, &self.decoration_type);
        self.file_decorations.insert(file_path.to_string(), decorations);
    }

    /// Blank every stored badge for `file_path` without forgetting the set
    pub fn reset_decorations(&mut self, file_path: &str) {
        let Some(decorations) = self.file_decorations.get(file_path) else {
            return;
        };
        if decorations.is_empty() {
            return;
        }

        let empty: Vec<LineDecoration> = decorations.iter().map(|d| d.with_badge("")).collect();
        update_decorations(&mut self.surface, file_path, &empty, &self.decoration_type);
    }

    /// Forget the stored set and remove everything drawn for `file_path`
    pub fn clear(&mut self, file_path: &str) {
        self.file_decorations.remove(file_path);
        update_decorations(&mut self.surface, file_path, &[], &self.decoration_type);
    }

    /// Label table plus a link to the package's advisor page
    pub fn hover_message(&self, score: &AdvisorScore) -> MarkdownString {
        let mut md = MarkdownString::trusted();
        md.append_markdown("| |  | |  |");
        md.append_markdown("\n");
        md.append_markdown("| ---- | ---- | ---- |  :---- |");
        md.append_markdown("\n");
        for (label, value) in &score.labels {
            md.append_markdown(&format!("| {}: | | | {} |", label, value));
            md.append_markdown("\n");
        }
        md.append_markdown(&format!("[More Details]({}/{})", self.advisor_url, score.name));
        md
    }
}
