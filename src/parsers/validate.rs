//! Module name validation
//!
//! Turns raw import specifiers into scorable npm package names: built-in
//! Node modules and relative paths are dropped, deep imports are narrowed
//! to their package root, and whatever remains must be a legal npm name.

use crate::models::ModuleReference;
use thiserror::Error;
use tracing::trace;

/// Node.js core modules; these never resolve to a registry package
const NATIVE_MODULES: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Names the npm registry refuses outright
const BLACKLISTED_NAMES: &[&str] = &["node_modules", "favicon.ico"];

const MAX_NAME_LENGTH: usize = 214;

/// Why a reference was dropped before scoring
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("'{0}' is a Node.js built-in module")]
    Builtin(String),

    #[error("module name is empty")]
    Empty,

    #[error("'{0}' is a relative or absolute path")]
    RelativePath(String),

    #[error("'{name}' is not a valid npm package name: {reason}")]
    InvalidName { name: String, reason: &'static str },
}

fn is_native_module(name: &str) -> bool {
    NATIVE_MODULES.contains(&name.to_lowercase().as_str())
}

/// Check a raw specifier and return the package name to score.
///
/// Unscoped deep imports (`lodash/fp`) are narrowed to the package root;
/// scoped names are returned exactly as given or rejected.
pub fn check_module_name(raw: &str) -> Result<String, Rejection> {
    if is_native_module(raw) {
        return Err(Rejection::Builtin(raw.to_string()));
    }

    if raw.trim().is_empty() {
        return Err(Rejection::Empty);
    }
    if raw.starts_with('.') || raw.starts_with('~') {
        return Err(Rejection::RelativePath(raw.to_string()));
    }

    let name = if raw.contains('/') && !raw.starts_with('@') {
        let root = raw.split('/').next().unwrap_or_default();
        if root.is_empty() {
            return Err(Rejection::RelativePath(raw.to_string()));
        }
        if is_native_module(root) {
            return Err(Rejection::Builtin(raw.to_string()));
        }
        root
    } else {
        raw
    };

    validate_npm_name(name)?;
    Ok(name.to_string())
}

/// npm registry naming rules. Only hard errors reject; rules npm treats as
/// warnings for legacy packages are traced and accepted.
fn validate_npm_name(name: &str) -> Result<(), Rejection> {
    let invalid = |reason: &'static str| Rejection::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name length must be greater than zero"));
    }
    if name.starts_with('.') {
        return Err(invalid("name cannot start with a period"));
    }
    if name.starts_with('_') {
        return Err(invalid("name cannot start with an underscore"));
    }
    if name.trim() != name {
        return Err(invalid("name cannot contain leading or trailing spaces"));
    }
    if BLACKLISTED_NAMES
        .iter()
        .any(|blocked| blocked.eq_ignore_ascii_case(name))
    {
        return Err(invalid("name is blacklisted"));
    }

    let url_safe = match scoped_parts(name) {
        Some((scope, package)) => is_url_safe(scope) && is_url_safe(package),
        None => is_url_safe(name),
    };
    if !url_safe {
        return Err(invalid("name can only contain URL-friendly characters"));
    }

    if name.len() > MAX_NAME_LENGTH {
        trace!("{} is longer than {} characters", name, MAX_NAME_LENGTH);
    }
    if name.chars().any(|c| c.is_ascii_uppercase()) {
        trace!("{} contains capital letters", name);
    }
    if name.contains(['~', '\'', '!', '(', ')', '*']) {
        trace!("{} contains special characters", name);
    }

    Ok(())
}

/// Split `@scope/name` into its parts; anything else (including deeper
/// scoped paths) is not a scoped package name.
fn scoped_parts(name: &str) -> Option<(&str, &str)> {
    let rest = name.strip_prefix('@')?;
    let (scope, package) = rest.split_once('/')?;
    if scope.is_empty() || package.is_empty() || package.contains('/') {
        return None;
    }
    Some((scope, package))
}

/// Characters `encodeURIComponent` leaves untouched
fn is_url_safe(part: &str) -> bool {
    part.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '!' | '~' | '*' | '\'' | '(' | ')')
    })
}

/// Validate one reference, returning a copy carrying the canonical name
pub fn validate(reference: &ModuleReference) -> Option<ModuleReference> {
    match check_module_name(&reference.name) {
        Ok(name) => Some(ModuleReference {
            name,
            ..reference.clone()
        }),
        Err(rejection) => {
            trace!("Skipping module reference: {}", rejection);
            None
        }
    }
}

/// Keep only scorable references, narrowed to their package names
pub fn filter_valid(modules: Vec<ModuleReference>) -> Vec<ModuleReference> {
    modules.iter().filter_map(validate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_builtins_case_insensitive() {
        assert_eq!(
            check_module_name("fs"),
            Err(Rejection::Builtin("fs".to_string()))
        );
        assert!(matches!(check_module_name("Path"), Err(Rejection::Builtin(_))));
        assert!(matches!(
            check_module_name("fs/promises"),
            Err(Rejection::Builtin(_))
        ));
    }

    #[test]
    fn test_rejects_relative_and_empty() {
        assert_eq!(
            check_module_name("../utils"),
            Err(Rejection::RelativePath("../utils".to_string()))
        );
        assert!(matches!(
            check_module_name("./local"),
            Err(Rejection::RelativePath(_))
        ));
        assert!(matches!(
            check_module_name("~/home/thing"),
            Err(Rejection::RelativePath(_))
        ));
        assert!(matches!(
            check_module_name("/abs/path"),
            Err(Rejection::RelativePath(_))
        ));
        assert_eq!(check_module_name("   "), Err(Rejection::Empty));
        assert_eq!(check_module_name(""), Err(Rejection::Empty));
    }

    #[test]
    fn test_narrows_unscoped_subpath() {
        assert_eq!(check_module_name("lodash/fp").unwrap(), "lodash");
        assert_eq!(
            check_module_name("date-fns/locale/en-US").unwrap(),
            "date-fns"
        );
    }

    #[test]
    fn test_scoped_names_are_not_narrowed() {
        assert_eq!(check_module_name("@babel/core").unwrap(), "@babel/core");
        assert_eq!(
            check_module_name("@types/node").unwrap(),
            "@types/node"
        );
        // A scoped deep import is never rewritten; npm rules reject it as-is.
        assert!(matches!(
            check_module_name("@scope/pkg/sub"),
            Err(Rejection::InvalidName { .. })
        ));
    }

    #[test]
    fn test_npm_name_rules() {
        assert!(matches!(
            check_module_name("_private"),
            Err(Rejection::InvalidName { .. })
        ));
        assert!(matches!(
            check_module_name(" lodash"),
            Err(Rejection::InvalidName { .. })
        ));
        assert!(matches!(
            check_module_name("node_modules"),
            Err(Rejection::InvalidName { .. })
        ));
        assert!(matches!(
            check_module_name("has space"),
            Err(Rejection::InvalidName { .. })
        ));
        assert!(matches!(
            check_module_name("node:fs"),
            Err(Rejection::InvalidName { .. })
        ));
        assert!(matches!(
            check_module_name("https://cdn.example.com/x.js"),
            Err(Rejection::InvalidName { .. })
        ));
        // Warnings only
        assert_eq!(check_module_name("JSONStream").unwrap(), "JSONStream");
        assert_eq!(check_module_name("left-pad").unwrap(), "left-pad");
    }

    #[test]
    fn test_validate_returns_narrowed_copy() {
        let original = ModuleReference::new("index.js", "lodash/fp").with_line(3);
        let validated = validate(&original).unwrap();
        assert_eq!(validated.name, "lodash");
        assert_eq!(validated.line, Some(3));
        assert_eq!(original.name, "lodash/fp");
    }

    #[test]
    fn test_filter_valid_keeps_duplicates() {
        let modules = vec![
            ModuleReference::new("a.js", "react").with_line(1),
            ModuleReference::new("a.js", "../utils").with_line(2),
            ModuleReference::new("a.js", "react").with_line(5),
            ModuleReference::new("a.js", "path").with_line(6),
        ];
        let valid = filter_valid(modules);
        assert_eq!(valid.len(), 2);
        assert!(valid.iter().all(|m| m.name == "react"));
        assert_eq!(valid[1].line, Some(5));
    }
}
