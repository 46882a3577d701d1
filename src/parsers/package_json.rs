//! package.json parser
//!
//! Reads the dependency groups of an npm manifest with serde_json and
//! locates each entry in the manifest text so badges land on the line that
//! declares the dependency.

use crate::models::{Language, ModuleReference, Position, SourceRange};
use crate::parsers::ModuleParser;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Dependency groups, in the order they are reported
pub const DEPENDENCY_SECTIONS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

/// npm manifest dependency extractor
#[derive(Debug, Default, Clone, Copy)]
pub struct PackageJsonParser;

impl PackageJsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl ModuleParser for PackageJsonParser {
    fn get_modules(&self, file_name: &str, source: &str, _language: Language) -> Vec<ModuleReference> {
        if source.trim().is_empty() {
            return Vec::new();
        }

        let json: Value = match serde_json::from_str(source) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to parse {}: {}", file_name, e);
                return Vec::new();
            }
        };
        let Some(root) = json.as_object() else {
            warn!("{} is not a JSON object", file_name);
            return Vec::new();
        };

        let locator = ManifestText::new(source);
        let mut modules = Vec::new();

        for section in DEPENDENCY_SECTIONS {
            let Some(dependencies) = root.get(*section).and_then(|d| d.as_object()) else {
                continue;
            };
            let key_spans = locator.section_keys(section);

            for (name, version) in dependencies {
                let mut module = ModuleReference::new(file_name, name.as_str());
                if let Some(version) = version.as_str() {
                    module = module.with_version(version);
                }
                if let Some(&(start, end)) = key_spans.get(name.as_str()) {
                    module = module
                        .with_location(SourceRange::new(locator.position(start), locator.position(end)))
                        .with_raw_text(locator.line_text(start));
                }
                modules.push(module);
            }
        }

        debug!("Parsed {} dependencies from {}", modules.len(), file_name);
        modules
    }
}

/// Object key found while scanning the manifest
#[derive(Debug, Clone, Copy)]
struct KeyToken {
    /// Offset of the opening quote
    start: usize,
    /// Offset just past the closing quote
    end: usize,
    /// Offset just past the `:`
    after_colon: usize,
    /// `{`/`[` nesting at the key; top-level keys sit at 1
    depth: usize,
}

/// Byte-level lookups into the manifest text
struct ManifestText<'a> {
    text: &'a str,
    /// Byte offsets where each line starts
    line_starts: Vec<usize>,
    /// Every object key, in document order
    keys: Vec<KeyToken>,
}

impl<'a> ManifestText<'a> {
    fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(memchr::memchr_iter(b'\n', text.as_bytes()).map(|i| i + 1));
        Self {
            text,
            line_starts,
            keys: scan_keys(text.as_bytes()),
        }
    }

    fn key_name(&self, key: &KeyToken) -> &'a str {
        &self.text[key.start + 1..key.end - 1]
    }

    /// Spans of the keys directly inside the object value of top-level
    /// `"section":`. A repeated key keeps its first span.
    fn section_keys(&self, section: &str) -> HashMap<&'a str, (usize, usize)> {
        let mut found = HashMap::new();
        let Some(index) = self
            .keys
            .iter()
            .position(|k| k.depth == 1 && self.key_name(k) == section)
        else {
            return found;
        };

        let bytes = self.text.as_bytes();
        let after = self.keys[index].after_colon;
        if bytes[after..].iter().find(|b| !b.is_ascii_whitespace()) != Some(&b'{') {
            return found;
        }

        // The next top-level key closes the section
        for key in self.keys[index + 1..].iter().take_while(|k| k.depth >= 2) {
            if key.depth == 2 {
                found.entry(self.key_name(key)).or_insert((key.start, key.end));
            }
        }
        found
    }

    fn position(&self, offset: usize) -> Position {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let column = offset - self.line_starts[line - 1];
        Position::new(line as u32, column as u32)
    }

    fn line_text(&self, offset: usize) -> String {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map_or(self.text.len(), |next| next - 1);
        self.text[start..end].trim().to_string()
    }
}

/// One pass over a JSON document collecting every string followed by `:`
fn scan_keys(bytes: &[u8]) -> Vec<KeyToken> {
    let mut keys = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let start = i;
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                let end = (i + 1).min(bytes.len());
                let colon = bytes[end..]
                    .iter()
                    .position(|b| !b.is_ascii_whitespace())
                    .map(|p| end + p)
                    .filter(|&c| bytes[c] == b':');
                if let Some(colon) = colon {
                    keys.push(KeyToken {
                        start,
                        end,
                        after_colon: colon + 1,
                        depth,
                    });
                }
                i = end;
            }
            b'{' | b'[' => {
                depth += 1;
                i += 1;
            }
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            _ => i += 1,
        }
    }
    keys
}
