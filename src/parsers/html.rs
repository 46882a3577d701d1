//! HTML parser
//!
//! Finds inline `<script>` blocks with memchr, hands each block to the
//! script parser and maps the positions it reports back onto the HTML
//! document.

use crate::models::{Language, ModuleReference};
use crate::parsers::typescript::{Grammar, ScriptParser};
use crate::parsers::ModuleParser;
use memchr::{memchr_iter, memmem, memrchr};
use tracing::{debug, warn};

const SCRIPT_OPEN: &[u8] = b"<script";
const SCRIPT_CLOSE: &[u8] = b"</script>";

/// One inline script found in a markup document
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScriptBlock<'a> {
    source_text: &'a str,
    /// Byte offset of the block content inside the document
    source_offset: usize,
    grammar: Grammar,
}

/// Markup document import extractor
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlParser {
    scripts: ScriptParser,
}

impl HtmlParser {
    pub fn new() -> Self {
        Self {
            scripts: ScriptParser::new(),
        }
    }
}

impl ModuleParser for HtmlParser {
    fn get_modules(&self, file_name: &str, source: &str, _language: Language) -> Vec<ModuleReference> {
        let blocks = extract_scripts(file_name, source);
        debug!("Found {} inline script blocks in {}", blocks.len(), file_name);

        let bytes = source.as_bytes();
        let mut modules = Vec::new();
        // Blocks come in document order, so line counting resumes where the
        // previous block left off.
        let mut scanned = 0;
        let mut line_offset = 0u32;
        let mut line_start = 0;
        for block in blocks {
            let gap = &bytes[scanned..block.source_offset];
            line_offset += memchr_iter(b'\n', gap).count() as u32;
            if let Some(pos) = memrchr(b'\n', gap) {
                line_start = scanned + pos + 1;
            }
            scanned = block.source_offset;
            let first_line_column = (block.source_offset - line_start) as u32;

            for mut module in self
                .scripts
                .parse_source(file_name, block.source_text, block.grammar)
            {
                module.line = module.line.map(|line| line + line_offset);
                module.location = module
                    .location
                    .map(|range| range.translate(line_offset, first_line_column));
                modules.push(module);
            }
        }
        modules
    }
}

/// Collect inline script blocks in document order.
///
/// Tag names match in any case. An unclosed `<script>` ends the scan;
/// blocks found before it are kept.
fn extract_scripts<'a>(file_name: &str, source: &'a str) -> Vec<ScriptBlock<'a>> {
    let bytes = source.as_bytes();
    // ASCII lowering keeps byte offsets, so hits index straight into `source`
    let folded = source.to_ascii_lowercase();
    let folded = folded.as_bytes();
    let mut blocks = Vec::new();
    let mut pointer = 0;

    while let Some(start) = find_from(folded, pointer, SCRIPT_OPEN) {
        pointer = start + SCRIPT_OPEN.len();

        // Skip "<scripts", "<scripting" and friends
        if pointer < bytes.len() && !matches!(bytes[pointer], b' ' | b'\t' | b'\n' | b'\r' | b'>' | b'/') {
            continue;
        }

        let Some(tag_end) = find_closing_angle(bytes, pointer) else {
            warn!("Unclosed <script> tag at byte {} in {}", start, file_name);
            break;
        };
        let attributes = &source[pointer..tag_end];
        pointer = tag_end + 1;

        if bytes[tag_end - 1] == b'/' {
            continue;
        }

        let Some(end) = find_from(folded, pointer, SCRIPT_CLOSE) else {
            warn!("Missing </script> for tag at byte {} in {}", start, file_name);
            break;
        };

        blocks.push(ScriptBlock {
            source_text: &source[pointer..end],
            source_offset: pointer,
            grammar: grammar_for_attributes(attributes),
        });
        pointer = end + SCRIPT_CLOSE.len();
    }

    blocks
}

fn find_from(bytes: &[u8], start: usize, needle: &[u8]) -> Option<usize> {
    memmem::find(&bytes[start..], needle).map(|pos| start + pos)
}

/// Closing `>` of a tag, ignoring any inside quoted attribute values
fn find_closing_angle(bytes: &[u8], start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &byte) in bytes[start..].iter().enumerate() {
        match (byte, quote) {
            (b'"' | b'\'', None) => quote = Some(byte),
            (b'"' | b'\'', Some(open)) if open == byte => quote = None,
            (b'>', None) => return Some(start + i),
            _ => {}
        }
    }
    None
}

fn grammar_for_attributes(attributes: &str) -> Grammar {
    let attributes = attributes.to_ascii_lowercase();
    if attributes.contains("lang=\"ts\"")
        || attributes.contains("lang='ts'")
        || attributes.contains("typescript")
    {
        Grammar::TypeScript
    } else {
        Grammar::JavaScript
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translates_lines_to_document() {
        let html = r#"<!DOCTYPE html>
<html>
<head>
  <script src="https://unpkg.com/react"></script>
  <script>
    const _ = require('lodash');
  </script>
</head>
<body>
  <script type="module">import confetti from 'canvas-confetti';</script>
</body>
</html>
"#;
        let modules = HtmlParser::new().get_modules("index.html", html, Language::Html);
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].name, "lodash");
        assert_eq!(modules[0].line, Some(6));
        assert_eq!(modules[0].location.unwrap().start.column, 22);
        assert_eq!(modules[1].name, "canvas-confetti");
        assert_eq!(modules[1].line, Some(10));
        let column = modules[1].location.unwrap().start.column as usize;
        let line = html.lines().nth(9).unwrap();
        assert_eq!(&line[column..column + 17], "'canvas-confetti'");
    }

    #[test]
    fn test_quoted_angle_in_attributes() {
        let html = "<script data-x=\"a>b\">require('axios')</script>";
        let modules = HtmlParser::new().get_modules("a.html", html, Language::Html);
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name, "axios");
    }

    #[test]
    fn test_typescript_block() {
        let html = "<script lang=\"ts\">\nimport type { A } from 'pkg-a';\nlet n: number = 1;\n</script>";
        let modules = HtmlParser::new().get_modules("c.html", html, Language::Html);
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].line, Some(2));
    }

    #[test]
    fn test_unclosed_script_keeps_earlier_blocks() {
        let html = "<script>require('a-pkg')</script>\n<script>require('b-pkg')";
        let modules = HtmlParser::new().get_modules("u.html", html, Language::Html);
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name, "a-pkg");
    }

    #[test]
    fn test_tag_names_ignore_case() {
        let parser = HtmlParser::new();
        let modules = parser.get_modules(
            "upper.html",
            "<HTML><SCRIPT>const x = require('axios');</SCRIPT></HTML>",
            Language::Html,
        );
        let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["axios"]);

        let html = "<Script Type=\"module\">\nimport dayjs from 'dayjs';\n</sCrIpT>";
        let modules = parser.get_modules("mixed.html", html, Language::Html);
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name, "dayjs");
        assert_eq!(modules[0].line, Some(2));
    }

    #[test]
    fn test_many_blocks_keep_line_and_column() {
        let html = "<script>require('a-pkg')</script>\n\
                    <p>text</p>\n\
                    <p>x</p><script>\n  require('b-pkg')</script><script>require('c-pkg')</script>\n\
                    <script>require('d-pkg')</script>";
        let modules = HtmlParser::new().get_modules("m.html", html, Language::Html);
        let found: Vec<(&str, Option<u32>)> = modules.iter().map(|m| (m.name.as_str(), m.line)).collect();
        assert_eq!(
            found,
            vec![("a-pkg", Some(1)), ("b-pkg", Some(4)), ("c-pkg", Some(4)), ("d-pkg", Some(5))]
        );
        for module in &modules {
            let loc = module.location.unwrap();
            let line = html.lines().nth(loc.start.line as usize - 1).unwrap();
            let column = loc.start.column as usize;
            assert_eq!(&line[column..column + 7], format!("'{}'", module.name));
        }
    }

    #[test]
    fn test_no_scripts() {
        let parser = HtmlParser::new();
        assert!(parser.get_modules("e.html", "", Language::Html).is_empty());
        assert!(parser
            .get_modules("p.html", "<p>scripting is fun</p><scripts></scripts>", Language::Html)
            .is_empty());
    }
}
