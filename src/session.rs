//! Per-document advisor session
//!
//! A session follows one manifest document: it scores the document's
//! dependencies when activated, then keeps the badges in step with edits
//! and editor switches until the document closes.
//!
//! Host notifications arrive as [`SessionEvent`]s on a crossbeam channel.
//! Listeners registered with the host's [`EventSource`] forward into that
//! channel, and the session handles events in arrival order, so a slow
//! scoring call simply delays the next event instead of racing it.

use crate::advisor::{AdvisorService, ScoreApi};
use crate::editor::{EditorDecorator, RenderSurface};
use crate::models::{AdvisorScore, Language, ModuleReference};
use crate::parsers::{supported_language, ParserRegistry};
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, trace};

/// Open document as the host sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub file_name: String,
    pub language_id: String,
    pub text: String,
    /// Unsaved edits pending
    pub is_dirty: bool,
}

impl TextDocument {
    pub fn new(file_name: impl Into<String>, language_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            language_id: language_id.into(),
            text: text.into(),
            is_dirty: false,
        }
    }

    pub fn dirty(mut self, is_dirty: bool) -> Self {
        self.is_dirty = is_dirty;
        self
    }
}

/// One edit within a document change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    pub range_offset: usize,
    pub range_length: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    DocumentChanged {
        document: TextDocument,
        content_changes: Vec<ContentChange>,
    },
    /// `None` when no editor is focused
    ActiveEditorChanged { document: Option<TextDocument> },
    Closed { file_name: String },
}

impl SessionEvent {
    fn file_name(&self) -> Option<&str> {
        match self {
            SessionEvent::DocumentChanged { document, .. } => Some(&document.file_name),
            SessionEvent::ActiveEditorChanged { document } => document.as_ref().map(|d| d.file_name.as_str()),
            SessionEvent::Closed { file_name } => Some(file_name),
        }
    }
}

/// Host notifications a session listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    DocumentChanged,
    ActiveEditorChanged,
}

/// Handle that unregisters something from the host
pub trait Disposable {
    fn dispose(&mut self);
}

/// Host notification source
pub trait EventSource {
    /// Forward notifications of `kind` into `sender` until the returned
    /// handle is disposed.
    fn subscribe(&mut self, kind: ListenerKind, sender: Sender<SessionEvent>) -> Box<dyn Disposable>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Inactive,
    Activating,
    Active,
    Disposed,
}

pub struct AdvisorSession<A: ScoreApi, S: RenderSurface> {
    state: SessionState,
    registry: ParserRegistry,
    service: AdvisorService<A>,
    decorator: EditorDecorator<S>,
    file_name: Option<String>,
    language: Option<Language>,
    last_modules: Vec<ModuleReference>,
    last_scores: Vec<AdvisorScore>,
    listeners: Vec<Box<dyn Disposable>>,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
    scores_changed: Receiver<()>,
}

impl<A: ScoreApi, S: RenderSurface> AdvisorSession<A, S> {
    pub fn new(registry: ParserRegistry, mut service: AdvisorService<A>, decorator: EditorDecorator<S>) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let scores_changed = service.subscribe();
        Self {
            state: SessionState::Inactive,
            registry,
            service,
            decorator,
            file_name: None,
            language: None,
            last_modules: Vec::new(),
            last_scores: Vec::new(),
            listeners: Vec::new(),
            events_tx,
            events_rx,
            scores_changed,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn decorator(&self) -> &EditorDecorator<S> {
        &self.decorator
    }

    pub fn decorator_mut(&mut self) -> &mut EditorDecorator<S> {
        &mut self.decorator
    }

    pub fn service(&self) -> &AdvisorService<A> {
        &self.service
    }

    pub fn last_modules(&self) -> &[ModuleReference] {
        &self.last_modules
    }

    pub fn last_scores(&self) -> &[AdvisorScore] {
        &self.last_scores
    }

    /// Sender for delivering events to this session directly
    pub fn sender(&self) -> Sender<SessionEvent> {
        self.events_tx.clone()
    }

    /// Fires whenever a remote call replaced the cached scores
    pub fn scores_changed(&self) -> &Receiver<()> {
        &self.scores_changed
    }

    /// Start following `document`.
    ///
    /// Only manifests start a session; anything else leaves it `Inactive`
    /// and returns false.
    pub fn activate(&mut self, document: &TextDocument, events: &mut dyn EventSource) -> bool {
        if self.state != SessionState::Inactive {
            debug!("Session for {:?} is {:?}, not activating", self.file_name, self.state);
            return false;
        }
        self.state = SessionState::Activating;

        let language = supported_language(&document.file_name, &document.language_id);
        if language != Some(Language::PackageJson) {
            trace!("{} is not a manifest, advisor session stays inactive", document.file_name);
            self.state = SessionState::Inactive;
            return false;
        }

        self.file_name = Some(document.file_name.clone());
        self.language = language;

        let modules = self
            .registry
            .extract_modules(&document.file_name, &document.text, Language::PackageJson);
        self.last_scores = self.service.get_scores(&modules);
        self.last_modules = modules;
        self.redecorate();

        self.listeners
            .push(events.subscribe(ListenerKind::DocumentChanged, self.events_tx.clone()));
        self.listeners
            .push(events.subscribe(ListenerKind::ActiveEditorChanged, self.events_tx.clone()));

        self.state = SessionState::Active;
        info!(
            "Advisor session active for {} ({} packages)",
            document.file_name,
            self.last_modules.len()
        );
        true
    }

    /// Apply one host event
    pub fn handle(&mut self, event: SessionEvent) {
        if self.state != SessionState::Active {
            trace!("Ignoring event in {:?} state", self.state);
            return;
        }
        let Some(file_name) = self.file_name.clone() else {
            return;
        };
        if event.file_name() != Some(file_name.as_str()) {
            trace!("Ignoring event for {:?}", event.file_name());
            return;
        }

        match event {
            SessionEvent::DocumentChanged {
                document,
                content_changes,
            } => {
                if !content_changes.is_empty() {
                    self.decorator.reset_decorations(&file_name);
                }
                if !document.is_dirty && supported_language(&document.file_name, &document.language_id).is_some() {
                    self.refresh(&document);
                }
            }
            SessionEvent::ActiveEditorChanged { document: Some(document) } => {
                if supported_language(&document.file_name, &document.language_id).is_some() {
                    self.refresh(&document);
                }
            }
            SessionEvent::ActiveEditorChanged { document: None } => {}
            SessionEvent::Closed { .. } => self.dispose(),
        }
    }

    /// Handle every queued event without blocking. Returns how many were taken.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Block on the event channel until the session is disposed
    pub fn run(&mut self) {
        while self.state == SessionState::Active {
            match self.events_rx.recv() {
                Ok(event) => self.handle(event),
                Err(_) => break,
            }
        }
    }

    /// Unregister listeners (newest first) and remove the file's badges.
    /// Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.state == SessionState::Disposed {
            return;
        }
        while let Some(mut listener) = self.listeners.pop() {
            listener.dispose();
        }
        if let Some(file_name) = &self.file_name {
            self.decorator.clear(file_name);
        }
        self.state = SessionState::Disposed;
        debug!("Advisor session disposed for {:?}", self.file_name);
    }

    /// Re-parse, rescore when the package count moved, redecorate
    fn refresh(&mut self, document: &TextDocument) {
        let (Some(file_name), Some(language)) = (&self.file_name, self.language) else {
            return;
        };

        let modules = self.registry.extract_modules(file_name, &document.text, language);
        if modules.len() != self.last_scores.len() {
            self.last_scores = self.service.get_scores(&modules);
        }
        self.last_modules = modules;
        self.redecorate();
    }

    fn redecorate(&mut self) {
        let Some(file_name) = &self.file_name else {
            return;
        };
        let name_to_line: Vec<(String, i64)> = self
            .last_modules
            .iter()
            .map(|m| (m.name.clone(), m.line.map_or(-1, i64::from)))
            .collect();
        self.decorator
            .apply_scores(file_name, &self.last_scores, &name_to_line);
    }
}
