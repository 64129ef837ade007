//! The controller: new quote → edit → review → (re-edit | new | export).
//!
//! A `Session` owns its collaborators and the one working quote. Nothing here
//! is global; the interactive surface drives it through `&mut self`, which
//! also means a submit or export can never overlap with another one.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::editor::QuoteEditor;
use crate::error::SessionError;
use crate::export::Exporter;
use crate::model::{CompanyProfile, DocumentKind, Quote};
use crate::notify::{Notification, Notifier};
use crate::render::{self, DocumentRenderer, RenderedDocument};
use crate::store::QuoteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Editor open on a brand-new quote.
    Creating,
    /// Editor open on a copy of a sealed quote.
    Editing,
    /// Sealed quote on display.
    Reviewing,
}

enum Stage {
    Editing(QuoteEditor),
    Reviewing(Quote),
}

type Clock = Box<dyn FnMut() -> DateTime<Local>>;

pub struct Session<S, E, N> {
    store: S,
    exporter: E,
    notifier: N,
    renderer: DocumentRenderer,
    clock: Clock,
    default_company: Option<CompanyProfile>,
    kind: DocumentKind,
    stage: Stage,
}

impl<S: QuoteStore, E: Exporter, N: Notifier> Session<S, E, N> {
    pub fn new(store: S, exporter: E, notifier: N, renderer: DocumentRenderer) -> Self {
        Self {
            store,
            exporter,
            notifier,
            renderer,
            clock: Box::new(Local::now),
            default_company: None,
            kind: DocumentKind::default(),
            stage: Stage::Editing(QuoteEditor::new()),
        }
    }

    pub fn with_clock(mut self, clock: impl FnMut() -> DateTime<Local> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Company block used to pre-fill every new quote.
    pub fn with_default_company(mut self, company: CompanyProfile) -> Self {
        self.default_company = Some(company);
        if self.state() == SessionState::Creating {
            self.stage = Stage::Editing(self.fresh_editor());
        }
        self
    }

    fn fresh_editor(&self) -> QuoteEditor {
        match &self.default_company {
            Some(company) => QuoteEditor::with_company(company.clone()),
            None => QuoteEditor::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.stage {
            Stage::Editing(editor) if editor.is_seeded() => SessionState::Editing,
            Stage::Editing(_) => SessionState::Creating,
            Stage::Reviewing(_) => SessionState::Reviewing,
        }
    }

    pub fn document_kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn editor(&self) -> Option<&QuoteEditor> {
        match &self.stage {
            Stage::Editing(editor) => Some(editor),
            Stage::Reviewing(_) => None,
        }
    }

    pub fn editor_mut(&mut self) -> Option<&mut QuoteEditor> {
        match &mut self.stage {
            Stage::Editing(editor) => Some(editor),
            Stage::Reviewing(_) => None,
        }
    }

    /// The sealed quote under review.
    pub fn quote(&self) -> Option<&Quote> {
        match &self.stage {
            Stage::Reviewing(quote) => Some(quote),
            Stage::Editing(_) => None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn wrong_state(&self) -> SessionError {
        SessionError::WrongState(match self.state() {
            SessionState::Creating => "creating",
            SessionState::Editing => "editing",
            SessionState::Reviewing => "reviewing",
        })
    }

    // ==========================================
    // Editing → Reviewing
    // ==========================================

    /// Seals and persists the working quote, then moves to review.
    ///
    /// Invalid input is returned without touching the store. A store failure
    /// is announced and leaves the editor exactly as it was.
    pub fn submit(&mut self) -> Result<Quote, SessionError> {
        let issued_at = (self.clock)();
        let Stage::Editing(editor) = &self.stage else {
            return Err(self.wrong_state());
        };
        let updated = editor.is_seeded();

        match editor.submit(&mut self.store, self.kind, issued_at) {
            Ok(quote) => {
                self.notifier.notify(Notification::quote_saved(updated));
                self.stage = Stage::Reviewing(quote.clone());
                info!(updated, "reviewing sealed quote");
                Ok(quote)
            }
            Err(SessionError::Invalid(errors)) => {
                debug!(count = errors.len(), "submission blocked by validation");
                Err(SessionError::Invalid(errors))
            }
            Err(err) => {
                warn!(error = %err, "failed to save quote");
                self.notifier.notify(Notification::save_failed());
                Err(err)
            }
        }
    }

    // ==========================================
    // Reviewing
    // ==========================================

    /// Switches between estimate and receipt. While reviewing, only the
    /// displayed copy changes; the stored record is never rewritten.
    pub fn set_document_kind(&mut self, kind: DocumentKind) {
        self.kind = kind;
        if let Stage::Reviewing(quote) = &mut self.stage {
            quote.document_kind = kind;
        }
    }

    /// Fresh render of the quote under review.
    pub fn document(&self) -> Result<RenderedDocument, SessionError> {
        let Stage::Reviewing(quote) = &self.stage else {
            return Err(self.wrong_state());
        };
        Ok(self.renderer.render(quote, self.kind)?)
    }

    pub fn preview(&self) -> Option<String> {
        self.quote().map(|quote| render::preview(quote, self.kind))
    }

    /// Back to the editor with a new working copy; resubmitting appends a new record.
    pub fn edit(&mut self) -> Result<(), SessionError> {
        let Stage::Reviewing(quote) = &self.stage else {
            return Err(self.wrong_state());
        };
        self.stage = Stage::Editing(QuoteEditor::from_quote(quote));
        Ok(())
    }

    pub fn new_quote(&mut self) -> Result<(), SessionError> {
        if self.state() != SessionState::Reviewing {
            return Err(self.wrong_state());
        }
        self.stage = Stage::Editing(self.fresh_editor());
        Ok(())
    }

    /// Exports the current document. Success or failure, the review stays as is.
    ///
    /// A template that fails to render is announced like any other export
    /// failure.
    pub fn export(&mut self) -> Result<PathBuf, SessionError> {
        if self.state() != SessionState::Reviewing {
            return Err(self.wrong_state());
        }

        let result = self
            .document()
            .and_then(|document| self.exporter.export(&document).map_err(SessionError::from));

        match result {
            Ok(path) => {
                info!(path = %path.display(), "exported");
                self.notifier.notify(Notification::pdf_generated());
                Ok(path)
            }
            Err(err) => {
                warn!(error = %err, "export failed");
                self.notifier.notify(Notification::export_failed());
                Err(err)
            }
        }
    }
}
