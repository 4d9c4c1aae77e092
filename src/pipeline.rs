//! Extract, filter, select, translate and annotate comments in one run.
//!
//! A [`Pipeline`] owns one page context. Runs on the same pipeline are
//! serialized: the page lock is held from extraction to the last annotation,
//! so a trigger arriving mid-run waits and then sees the fresh annotations.

use crate::comment::CommentRecord;
use crate::config::SettingsSource;
use crate::language::SourceLanguage;
use crate::metrics::PipelineMetrics;
use crate::page::{annotate, CommentPage};
use crate::selector::select;
use crate::translator::{Translator, DEFAULT_TARGET_LANG};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Where a pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Extracting,
    Filtering,
    Selecting,
    Translating,
    Annotating,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Extracting => "extracting",
            RunState::Filtering => "filtering",
            RunState::Selecting => "selecting",
            RunState::Translating => "translating",
            RunState::Annotating => "annotating",
            RunState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Errors that end a run before any translation is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    #[error("DeepL API key not configured")]
    MissingCredential,

    #[error("Failed to read settings: {0}")]
    Settings(String),
}

/// Outcome of one run. Every failure mode ends up here; `run` never errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub selected: usize,
    pub translated: usize,
    pub failed: usize,

    /// Fatal error that aborted the run, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    fn empty(started_at: DateTime<Utc>) -> Self {
        Self {
            selected: 0,
            translated: 0,
            failed: 0,
            error: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

pub struct Pipeline<P> {
    page: Mutex<P>,
    translator: Arc<dyn Translator>,
    settings: Box<dyn SettingsSource>,
    language: SourceLanguage,
    target_lang: String,
    state: watch::Sender<RunState>,
    metrics: PipelineMetrics,
}

impl<P: CommentPage> Pipeline<P> {
    pub fn new(page: P, translator: Arc<dyn Translator>, settings: Box<dyn SettingsSource>) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            page: Mutex::new(page),
            translator,
            settings,
            language: SourceLanguage::default(),
            target_lang: DEFAULT_TARGET_LANG.to_string(),
            state,
            metrics: PipelineMetrics::new(),
        }
    }

    /// Only comments in `language` are considered for translation
    pub fn with_language(mut self, language: SourceLanguage) -> Self {
        self.language = language;
        self
    }

    /// Language code recorded on each annotation
    pub fn with_target_lang(mut self, target_lang: impl Into<String>) -> Self {
        self.target_lang = target_lang.into();
        self
    }

    /// Watch the pipeline state
    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Lock the page. Waits for any run in progress to finish.
    pub async fn page(&self) -> MutexGuard<'_, P> {
        self.page.lock().await
    }

    fn set_state(&self, state: RunState) {
        debug!("Pipeline state: {}", state);
        self.state.send_replace(state);
    }

    /// Run the pipeline once against the current page.
    pub async fn run(&self) -> RunSummary {
        let mut page = self.page.lock().await;
        let started_at = Utc::now();
        self.metrics.record_run();

        info!("Starting comment extraction and translation");
        self.set_state(RunState::Extracting);

        // Settings are read fresh for every run
        let settings = match self.settings.load() {
            Ok(settings) => settings,
            Err(e) => return self.abort(RunError::Settings(format!("{:#}", e)), started_at),
        };
        let Some(credential) = settings.credential else {
            return self.abort(RunError::MissingCredential, started_at);
        };

        let records = page.extract();
        info!("Extracted {} total comments", records.len());

        self.set_state(RunState::Filtering);
        let mut candidates: Vec<CommentRecord> = records
            .into_iter()
            .filter(|r| self.language.matches(r.text()))
            .collect();
        info!("Found {} {} comments", candidates.len(), self.language.name());

        // Identical text is one comment: a translated copy covers the others
        let covered: HashSet<String> = candidates
            .iter()
            .filter(|r| r.is_annotated())
            .map(|r| r.text().to_string())
            .collect();
        for record in candidates.iter_mut().filter(|r| covered.contains(r.text())) {
            record.mark_annotated();
        }

        self.set_state(RunState::Selecting);
        let selected: Vec<CommentRecord> = select(&candidates, &settings.selection)
            .into_iter()
            .cloned()
            .collect();
        info!(
            "Selected {} comments (top {}% or >= {} likes, excluding already translated)",
            selected.len(),
            settings.selection.percent(),
            settings.selection.like_threshold()
        );

        if selected.is_empty() {
            info!("Nothing to translate");
            self.set_state(RunState::Idle);
            return RunSummary::empty(started_at);
        }

        self.set_state(RunState::Translating);
        let total = selected.len();
        let mut translations = Vec::with_capacity(total);
        let mut failed = 0;

        // One request at a time; a failure skips that comment only
        for (index, record) in selected.into_iter().enumerate() {
            let progress = index + 1;
            self.metrics.record_api_call();

            match self.translator.translate(record.text(), &credential).await {
                Ok(translated) => {
                    info!(
                        "[{}/{}] ✓ {} ({} likes)",
                        progress,
                        total,
                        record.handle(),
                        record.popularity()
                    );
                    translations.push((record, translated));
                }
                Err(e) => {
                    failed += 1;
                    self.metrics.record_api_failure();
                    warn!("[{}/{}] ✗ {} - {}", progress, total, record.handle(), e);
                }
            }
        }

        self.set_state(RunState::Annotating);
        let translated = translations.len();
        for (record, text) in translations {
            for copy in candidates.iter_mut().filter(|c| c.text() == record.text()) {
                if annotate(&mut *page, copy, &text, &self.target_lang) {
                    self.metrics.record_annotation();
                }
            }
        }

        info!(
            "Run complete: {} selected, {} translated, {} failed",
            total, translated, failed
        );
        self.set_state(RunState::Idle);

        RunSummary {
            selected: total,
            translated,
            failed,
            error: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    fn abort(&self, error: RunError, started_at: DateTime<Utc>) -> RunSummary {
        warn!("Run aborted: {}", error);
        self.metrics.record_aborted_run();
        self.set_state(RunState::Aborted);

        RunSummary {
            error: Some(error.to_string()),
            ..RunSummary::empty(started_at)
        }
    }
}
