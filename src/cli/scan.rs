//! `advisor-lens scan` - score a document once and print its badges

use anyhow::Result;
use crossbeam_channel::Sender;
use std::path::Path;
use tracing::debug;

use super::{load_config, load_document, require_supported, Overrides};
use crate::advisor::{AdvisorClient, AdvisorService, NPM_REGISTRY};
use crate::config::SharedConfig;
use crate::editor::{EditorDecorator, TerminalSurface};
use crate::models::Language;
use crate::parsers::ParserRegistry;
use crate::session::{AdvisorSession, Disposable, EventSource, ListenerKind, SessionEvent};

/// Event source for a single pass: nothing ever fires
struct OneShot;

struct Unregistered;

impl Disposable for Unregistered {
    fn dispose(&mut self) {}
}

impl EventSource for OneShot {
    fn subscribe(&mut self, kind: ListenerKind, _sender: Sender<SessionEvent>) -> Box<dyn Disposable> {
        debug!("One-shot scan ignores {:?} listener", kind);
        Box::new(Unregistered)
    }
}

pub fn run(path: &Path, language: Option<&str>, format: &str, overrides: &Overrides) -> Result<()> {
    let document = load_document(path, language)?;
    let language = require_supported(&document)?;

    let config = SharedConfig::new(load_config(overrides)?);
    let threshold = config.snapshot().score_threshold;
    let client = AdvisorClient::new(config);
    let advisor_url = client.advisor_url(NPM_REGISTRY);

    let mut surface = TerminalSurface::new();
    surface.set_source(&document.file_name, document.text.clone());
    let mut decorator = EditorDecorator::new(surface, advisor_url, threshold);
    let registry = ParserRegistry::default();
    let mut service = AdvisorService::new(client);

    let rendered = if language == Language::PackageJson {
        let mut session = AdvisorSession::new(registry, service, decorator);
        session.activate(&document, &mut OneShot);
        let output = render(session.decorator().surface(), &document.file_name, format)?;
        session.dispose();
        output
    } else {
        // Scripts and markup are scored directly, without a session
        let modules = registry.extract_modules(&document.file_name, &document.text, language);
        let scores = service.get_scores(&modules);
        let name_to_line: Vec<(String, i64)> = modules
            .iter()
            .map(|m| (m.name.clone(), m.line.map_or(-1, i64::from)))
            .collect();
        decorator.apply_scores(&document.file_name, &scores, &name_to_line);
        render(decorator.surface(), &document.file_name, format)?
    };

    print!("{}", rendered);
    Ok(())
}

fn render(surface: &TerminalSurface, file_name: &str, format: &str) -> Result<String> {
    if format == "json" {
        Ok(format!("{}\n", surface.render_json(file_name)?))
    } else {
        Ok(surface.render_text(file_name))
    }
}
