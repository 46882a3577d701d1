//! `advisor-lens modules` - list the packages a document references

use anyhow::Result;
use console::style;
use std::path::Path;

use super::{load_document, require_supported};
use crate::models::ModuleReference;
use crate::parsers::ParserRegistry;

pub fn run(path: &Path, language: Option<&str>, format: &str) -> Result<()> {
    let document = load_document(path, language)?;
    let language = require_supported(&document)?;

    let modules = ParserRegistry::default().extract_modules(&document.file_name, &document.text, language);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&modules)?);
        return Ok(());
    }

    print!("{}", format_modules(&document.file_name, &modules));
    Ok(())
}

fn format_modules(file_name: &str, modules: &[ModuleReference]) -> String {
    if modules.is_empty() {
        return format!("{} No npm packages referenced in {}\n", style("·").dim(), file_name);
    }

    let mut out = format!(
        "{} ({} packages)\n",
        style(file_name).cyan().bold(),
        modules.len()
    );
    for module in modules {
        let line = module.line.map_or_else(|| "-".to_string(), |l| l.to_string());
        out.push_str(&format!("  {}  {}", style(format!("{:>5}", line)).dim(), module.name));
        if let Some(version) = &module.version {
            out.push_str(&format!(" {}", style(version).dim()));
        }
        out.push('\n');
    }
    out
}
