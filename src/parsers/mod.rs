//! Module reference parsers
//!
//! This module turns a document into the list of packages it references.
//! Each document flavor has a parser implementing [`ModuleParser`]; the
//! [`ParserRegistry`] picks one by [`Language`] and the validator filters
//! the output down to scorable npm names.

pub mod html;
pub mod package_json;
pub mod typescript;
pub mod validate;

use crate::models::{Language, ModuleReference};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

pub use html::HtmlParser;
pub use package_json::PackageJsonParser;
pub use typescript::ScriptParser;
pub use validate::{check_module_name, filter_valid, validate, Rejection};

/// Editor language ids
pub const TYPESCRIPT: &str = "typescript";
pub const TYPESCRIPT_REACT: &str = "typescriptreact";
pub const JAVASCRIPT: &str = "javascript";
pub const JAVASCRIPT_REACT: &str = "javascriptreact";
pub const HTML: &str = "html";
pub const JSON: &str = "json";

/// File name every npm manifest carries
pub const MANIFEST_FILE_NAME: &str = "package.json";

static TYPESCRIPT_FILE_REGEX: OnceLock<Regex> = OnceLock::new();
static JAVASCRIPT_FILE_REGEX: OnceLock<Regex> = OnceLock::new();
static HTML_FILE_REGEX: OnceLock<Regex> = OnceLock::new();
static JSON_FILE_REGEX: OnceLock<Regex> = OnceLock::new();

fn file_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static file pattern is valid"))
}

/// Extracts module references from one document flavor
pub trait ModuleParser: Send + Sync {
    /// Every module reference in `source`, in document order.
    ///
    /// Never fails: malformed input yields an empty or partial list.
    fn get_modules(&self, file_name: &str, source: &str, language: Language) -> Vec<ModuleReference>;
}

/// Classify a document by its declared language id, falling back to its
/// file name. Manifests additionally need the canonical manifest file name.
pub fn supported_language(file_name: &str, language_id: &str) -> Option<Language> {
    if language_id == TYPESCRIPT
        || language_id == TYPESCRIPT_REACT
        || file_regex(&TYPESCRIPT_FILE_REGEX, r"\.[cm]?tsx?$").is_match(file_name)
    {
        Some(Language::TypeScript)
    } else if language_id == JAVASCRIPT
        || language_id == JAVASCRIPT_REACT
        || file_regex(&JAVASCRIPT_FILE_REGEX, r"\.[cm]?jsx?$").is_match(file_name)
    {
        Some(Language::JavaScript)
    } else if language_id == HTML || file_regex(&HTML_FILE_REGEX, r"\.html?$").is_match(file_name) {
        Some(Language::Html)
    } else if (language_id == JSON || file_regex(&JSON_FILE_REGEX, r"\.json$").is_match(file_name))
        && file_name.ends_with(MANIFEST_FILE_NAME)
    {
        Some(Language::PackageJson)
    } else {
        None
    }
}

/// Table of parsers keyed by language
pub struct ParserRegistry {
    parsers: HashMap<Language, Box<dyn ModuleParser>>,
}

impl ParserRegistry {
    /// Registry with no parsers; every lookup yields an empty list
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Add or replace the parser for a language
    pub fn register(&mut self, language: Language, parser: Box<dyn ModuleParser>) {
        self.parsers.insert(language, parser);
    }

    pub fn parser_for(&self, language: Language) -> Option<&dyn ModuleParser> {
        self.parsers.get(&language).map(|p| p.as_ref())
    }

    /// Raw module references for a document, before validation
    pub fn get_modules(&self, file_name: &str, source: &str, language: Language) -> Vec<ModuleReference> {
        match self.parser_for(language) {
            Some(parser) => parser.get_modules(file_name, source, language),
            None => Vec::new(),
        }
    }

    /// Module references narrowed to scorable package names
    pub fn extract_modules(&self, file_name: &str, source: &str, language: Language) -> Vec<ModuleReference> {
        filter_valid(self.get_modules(file_name, source, language))
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Language::TypeScript, Box::new(ScriptParser::new()));
        registry.register(Language::JavaScript, Box::new(ScriptParser::new()));
        registry.register(Language::Html, Box::new(HtmlParser::new()));
        registry.register(Language::PackageJson, Box::new(PackageJsonParser::new()));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_language_wins() {
        assert_eq!(supported_language("notes.txt", "typescript"), Some(Language::TypeScript));
        assert_eq!(supported_language("notes.txt", "javascriptreact"), Some(Language::JavaScript));
        assert_eq!(supported_language("notes.txt", "html"), Some(Language::Html));
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(supported_language("src/app.tsx", "plaintext"), Some(Language::TypeScript));
        assert_eq!(supported_language("lib/index.mjs", ""), Some(Language::JavaScript));
        assert_eq!(supported_language("public/index.htm", ""), Some(Language::Html));
        assert_eq!(supported_language("README.md", "markdown"), None);
    }

    #[test]
    fn test_manifest_needs_canonical_file_name() {
        assert_eq!(
            supported_language("/work/app/package.json", "json"),
            Some(Language::PackageJson)
        );
        assert_eq!(supported_language("/work/app/package.json", ""), Some(Language::PackageJson));
        assert_eq!(supported_language("/work/app/tsconfig.json", "json"), None);
    }

    #[test]
    fn test_registry_dispatch_and_validation() {
        let registry = ParserRegistry::default();
        let source = "import a from './a';\nimport fp from 'lodash/fp';\nimport fs from 'fs';\n";
        let raw = registry.get_modules("x.js", source, Language::JavaScript);
        assert_eq!(raw.len(), 3);
        let valid = registry.extract_modules("x.js", source, Language::JavaScript);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].name, "lodash");
        assert_eq!(valid[0].line, Some(2));
    }

    #[test]
    fn test_registry_without_parser_returns_empty() {
        let registry = ParserRegistry::empty();
        assert!(registry
            .get_modules("x.js", "import a from 'a';", Language::JavaScript)
            .is_empty());
    }

    struct FixedParser;

    impl ModuleParser for FixedParser {
        fn get_modules(&self, file_name: &str, _source: &str, _language: Language) -> Vec<ModuleReference> {
            vec![ModuleReference::new(file_name, "fixed").with_line(1)]
        }
    }

    #[test]
    fn test_register_replaces_parser() {
        let mut registry = ParserRegistry::default();
        registry.register(Language::Html, Box::new(FixedParser));
        let modules = registry.get_modules("a.html", "<p></p>", Language::Html);
        assert_eq!(modules[0].name, "fixed");
    }
}
