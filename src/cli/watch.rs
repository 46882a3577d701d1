//! `advisor-lens watch` - keep a manifest scored while it is edited
//!
//! Saves to the manifest reach the session as document-changed events;
//! edits to the user config are applied to the running client.

use anyhow::{Context, Result};
use console::style;
use crossbeam_channel::Sender;
use notify::RecursiveMode;
use notify_debouncer_full::{new_debouncer, DebounceEventResult};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{load_config, load_document, require_supported, Overrides};
use crate::advisor::{AdvisorClient, AdvisorService, NPM_REGISTRY};
use crate::config::{SharedConfig, UserConfig};
use crate::editor::{EditorDecorator, TerminalSurface};
use crate::models::Language;
use crate::parsers::ParserRegistry;
use crate::session::{
    AdvisorSession, ContentChange, Disposable, EventSource, ListenerKind, SessionEvent, TextDocument,
};

type Listeners = Rc<RefCell<Vec<(usize, ListenerKind, Sender<SessionEvent>)>>>;

/// Event source fed by the file watcher
#[derive(Default)]
struct WatchHost {
    listeners: Listeners,
    next_id: usize,
}

struct WatchListener {
    id: usize,
    listeners: Listeners,
}

impl Disposable for WatchListener {
    fn dispose(&mut self) {
        self.listeners.borrow_mut().retain(|(id, _, _)| *id != self.id);
    }
}

impl EventSource for WatchHost {
    fn subscribe(&mut self, kind: ListenerKind, sender: Sender<SessionEvent>) -> Box<dyn Disposable> {
        self.next_id += 1;
        self.listeners.borrow_mut().push((self.next_id, kind, sender));
        Box::new(WatchListener {
            id: self.next_id,
            listeners: Rc::clone(&self.listeners),
        })
    }
}

impl WatchHost {
    /// Deliver to every listener of `kind`. Returns how many received it.
    fn emit(&self, kind: ListenerKind, event: SessionEvent) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .filter(|(_, _, tx)| tx.send(event.clone()).is_ok())
            .count()
    }
}

pub fn run(path: &Path, language: Option<&str>, overrides: &Overrides) -> Result<()> {
    let file_path = std::fs::canonicalize(path).with_context(|| format!("Path does not exist: {}", path.display()))?;
    let document = load_document(&file_path, language)?;
    if require_supported(&document)? != Language::PackageJson {
        anyhow::bail!(
            "watch follows package.json manifests; use `advisor-lens scan {}` for other files",
            path.display()
        );
    }
    let file_name = document.file_name.clone();
    let language_id = document.language_id.clone();

    let config = SharedConfig::new(load_config(overrides)?);
    let threshold = config.snapshot().score_threshold;
    let client = AdvisorClient::new(config.clone());
    let advisor_url = client.advisor_url(NPM_REGISTRY);

    let mut surface = TerminalSurface::new();
    surface.set_source(&file_name, document.text.clone());
    let decorator = EditorDecorator::new(surface, advisor_url, threshold);
    let mut session = AdvisorSession::new(ParserRegistry::default(), AdvisorService::new(client), decorator);

    println!("\nWatching {} for changes...\n", style(file_path.display()).cyan());
    println!("  {} Save the manifest to re-score it", style("→").dim());
    println!("  {} Press Ctrl+C to stop\n", style("→").dim());

    let mut host = WatchHost::default();
    session.activate(&document, &mut host);
    print!("{}", session.decorator().surface().render_text(&file_name));

    // Set up file watcher with debouncing
    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(
        Duration::from_millis(300),
        None,
        move |result: DebounceEventResult| {
            if let Ok(events) = result {
                let _ = tx.send(events);
            }
        },
    )?;

    let watch_dir = file_path
        .parent()
        .with_context(|| format!("No parent directory for {}", file_path.display()))?;
    debouncer.watch(watch_dir, RecursiveMode::NonRecursive)?;

    let config_path = UserConfig::user_config_path();
    if let Some(config_dir) = config_path.as_deref().and_then(Path::parent).filter(|d| d.exists()) {
        if let Err(e) = debouncer.watch(config_dir, RecursiveMode::NonRecursive) {
            warn!("Not watching {} for config changes: {}", config_dir.display(), e);
        }
    }

    let mut last_text = document.text;

    // Main event loop
    while let Ok(events) = rx.recv() {
        let changed: HashSet<PathBuf> = events
            .iter()
            .flat_map(|event| event.paths.iter())
            .cloned()
            .collect();

        if config_path.as_ref().is_some_and(|p| changed.contains(p)) {
            reload_config(&config, overrides);
        }
        if !changed.contains(&file_path) {
            continue;
        }

        if !file_path.exists() {
            println!("{} {} was removed", style("✗").red(), style(&file_name).dim());
            session.handle(SessionEvent::Closed {
                file_name: file_name.clone(),
            });
            break;
        }

        let text = match std::fs::read_to_string(&file_path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read {}: {}", file_path.display(), e);
                continue;
            }
        };
        if text == last_text {
            debug!("{} touched without content changes", file_name);
            continue;
        }

        let change = ContentChange {
            range_offset: 0,
            range_length: last_text.len(),
            text: text.clone(),
        };
        session.decorator_mut().surface_mut().set_source(&file_name, text.clone());
        host.emit(
            ListenerKind::DocumentChanged,
            SessionEvent::DocumentChanged {
                document: TextDocument::new(file_name.clone(), language_id.clone(), text.clone()),
                content_changes: vec![change],
            },
        );
        last_text = text;

        session.process_pending();
        print!("{}", session.decorator().surface().render_text(&file_name));
    }

    session.dispose();
    Ok(())
}

/// Re-read the user config and hand it to the running client
fn reload_config(config: &SharedConfig, overrides: &Overrides) {
    match load_config(overrides) {
        Ok(reloaded) => {
            config.replace(reloaded);
            info!("Reloaded user config");
        }
        Err(e) => warn!("Keeping previous config: {:#}", e),
    }
}
