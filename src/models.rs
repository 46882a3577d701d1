//! Core data models for advisor-lens
//!
//! These models are shared by the parsers, the scoring service and the
//! decorator: module references found in a document and the scores the
//! advisor API returns for them.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Document flavors the pipeline knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Html,
    #[serde(rename = "package.json")]
    PackageJson,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::TypeScript => write!(f, "TypeScript"),
            Language::JavaScript => write!(f, "JavaScript"),
            Language::Html => write!(f, "HTML"),
            Language::PackageJson => write!(f, "package.json"),
        }
    }
}

/// A point in a source document. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Span of a module reference inside its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: Position,
    pub end: Position,
}

impl SourceRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Shift a range found in an embedded block back into document coordinates.
    ///
    /// `line_offset` is the number of document lines before the block and
    /// `first_line_column` the column where the block starts; only positions
    /// on the block's first line are shifted horizontally.
    pub fn translate(&self, line_offset: u32, first_line_column: u32) -> Self {
        let shift = |p: Position| Position {
            line: p.line + line_offset,
            column: if p.line == 1 {
                p.column + first_line_column
            } else {
                p.column
            },
        };
        Self {
            start: shift(self.start),
            end: shift(self.end),
        }
    }
}

/// A package referenced by a document (import, require, manifest entry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReference {
    pub file_name: String,
    /// Package name; narrowed to the package root by validation
    pub name: String,
    /// 1-based line of the reference, when known
    pub line: Option<u32>,
    pub location: Option<SourceRange>,
    /// Source text the reference was read from
    pub raw_text: String,
    /// Declared version range (manifest entries only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ModuleReference {
    pub fn new(file_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            name: name.into(),
            line: None,
            location: None,
            raw_text: String::new(),
            version: None,
        }
    }

    pub fn with_location(mut self, location: SourceRange) -> Self {
        self.line = Some(location.start.line);
        self.location = Some(location);
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_raw_text(mut self, raw_text: impl Into<String>) -> Self {
        self.raw_text = raw_text.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Package health score returned by the advisor API
///
/// `score` is in `[0, 1]`; zero (or a missing value) means the service has
/// no data for the package.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdvisorScore {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: IndexMap<String, String>,
}

impl AdvisorScore {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score,
            labels: IndexMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Score scaled to the 0-100 range shown in badges
    pub fn percent(&self) -> i64 {
        (self.score * 100.0).round() as i64
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode an advisor response body; `null` entries become default scores
pub fn scores_from_json(body: &str) -> serde_json::Result<Vec<AdvisorScore>> {
    let raw: Vec<Option<AdvisorScore>> = serde_json::from_str(body)?;
    Ok(raw.into_iter().map(Option::unwrap_or_default).collect())
}
