//! TypeScript/JavaScript parser using tree-sitter
//!
//! Extracts the packages a script depends on: static imports, re-exports,
//! `require()` calls, dynamic `import()` and TypeScript's
//! `import x = require()` form.

use crate::models::{Language, ModuleReference, Position, SourceRange};
use crate::parsers::ModuleParser;
use tree_sitter::{Node, Parser, Tree};
use tracing::{debug, warn};

/// Grammar used for one parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    JavaScript,
    TypeScript,
    Tsx,
}

impl Grammar {
    /// Pick the grammar for a document of the given language
    pub fn for_document(file_name: &str, language: Language) -> Self {
        match language {
            Language::TypeScript if file_name.ends_with(".tsx") => Grammar::Tsx,
            Language::TypeScript => Grammar::TypeScript,
            _ => Grammar::JavaScript,
        }
    }

    fn language(self) -> tree_sitter::Language {
        match self {
            Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Grammar::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Script import extractor
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptParser;

impl ScriptParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse script source with an explicit grammar.
    ///
    /// Syntax errors do not abort the parse: tree-sitter recovers and every
    /// well-formed import outside the damaged region is still reported.
    pub fn parse_source(&self, file_name: &str, source: &str, grammar: Grammar) -> Vec<ModuleReference> {
        if source.trim().is_empty() {
            return Vec::new();
        }

        let Some(tree) = parse_tree(source, grammar) else {
            warn!("Failed to parse {} as {:?}", file_name, grammar);
            return Vec::new();
        };

        let root = tree.root_node();
        if root.has_error() {
            debug!("{} has syntax errors, import list may be partial", file_name);
        }

        let modules = collect_imports(&root, source.as_bytes(), file_name);
        debug!("Found {} module references in {}", modules.len(), file_name);
        modules
    }
}

impl ModuleParser for ScriptParser {
    fn get_modules(&self, file_name: &str, source: &str, language: Language) -> Vec<ModuleReference> {
        self.parse_source(file_name, source, Grammar::for_document(file_name, language))
    }
}

fn parse_tree(source: &str, grammar: Grammar) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&grammar.language()) {
        warn!("Failed to set {:?} language: {}", grammar, e);
        return None;
    }
    parser.parse(source, None)
}

/// Walk the whole tree once, in document order
fn collect_imports(root: &Node, source: &[u8], file_name: &str) -> Vec<ModuleReference> {
    let mut modules = Vec::new();
    let mut cursor = root.walk();

    loop {
        let node = cursor.node();
        if let Some(reference) = module_reference(&node, source, file_name) {
            modules.push(reference);
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return modules;
            }
        }
    }
}

/// Build a reference when `node` is an import-like construct
fn module_reference(node: &Node, source: &[u8], file_name: &str) -> Option<ModuleReference> {
    let specifier = match node.kind() {
        "import_statement" => node.child_by_field_name("source").or_else(|| {
            // import x = require('y')
            let mut cursor = node.walk();
            let clause = node
                .named_children(&mut cursor)
                .find(|child| child.kind() == "import_require_clause");
            clause.and_then(|c| {
                c.child_by_field_name("source").or_else(|| {
                    let mut inner = c.walk();
                    let literal = c.named_children(&mut inner).find(|n| n.kind() == "string");
                    literal
                })
            })
        })?,
        "export_statement" => node.child_by_field_name("source")?,
        "call_expression" => {
            let callee = node.child_by_field_name("function")?;
            let is_loader = match callee.kind() {
                "import" => true,
                "identifier" => callee.utf8_text(source).ok() == Some("require"),
                _ => false,
            };
            if !is_loader {
                return None;
            }
            let arguments = node.child_by_field_name("arguments")?;
            let mut cursor = arguments.walk();
            let first = arguments.named_children(&mut cursor).next()?;
            first
        }
        _ => return None,
    };

    if specifier.kind() != "string" {
        return None;
    }

    let name = string_value(&specifier, source)?;
    let start = specifier.start_position();
    let end = specifier.end_position();
    let location = SourceRange::new(
        Position::new(start.row as u32 + 1, start.column as u32),
        Position::new(end.row as u32 + 1, end.column as u32),
    );
    let raw_text = node.utf8_text(source).unwrap_or_default();

    Some(
        ModuleReference::new(file_name, name)
            .with_location(location)
            .with_raw_text(raw_text),
    )
}

/// Contents of a string literal without its quotes
fn string_value(node: &Node, source: &[u8]) -> Option<String> {
    let text = node.utf8_text(source).ok()?;
    let value = text
        .trim_start_matches(['"', '\''])
        .trim_end_matches(['"', '\'']);
    Some(value.to_string())
}
