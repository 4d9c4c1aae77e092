//! HTTP trigger surface.
//!
//! `POST /trigger` runs the pipeline once and answers `{ "success": ... }`.
//! `GET /health` and `GET /metrics` are for operators.

use crate::config::Config;
use crate::metrics::MetricsReport;
use crate::page::PageDocument;
use crate::pipeline::{Pipeline, RunSummary};
use crate::security::is_trigger_authorized;
use crate::translator::DeepLTranslator;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub const TRIGGER_TOKEN_HEADER: &str = "x-trigger-token";

pub struct AppState {
    pub pipeline: Pipeline<PageDocument>,

    /// Where the annotated page is written after each run
    pub snapshot: Option<PathBuf>,

    pub trigger_token: Option<String>,

    /// Annotation count the snapshot file holds
    saved_annotations: AtomicUsize,
}

impl AppState {
    /// `saved_annotations` is the annotation count already on disk at `snapshot`
    pub fn new(
        pipeline: Pipeline<PageDocument>,
        snapshot: Option<PathBuf>,
        trigger_token: Option<String>,
        saved_annotations: usize,
    ) -> Self {
        Self {
            pipeline,
            snapshot,
            trigger_token,
            saved_annotations: AtomicUsize::new(saved_annotations),
        }
    }

    /// Write the page to the snapshot if it holds annotations the file lacks.
    ///
    /// Annotations are only ever added, so a changed count means unsaved work,
    /// including work left over from an earlier run whose save failed.
    pub async fn save_if_changed(&self) -> Result<bool> {
        let Some(path) = &self.snapshot else {
            return Ok(false);
        };

        let page = self.pipeline.page().await;
        let count = page.annotation_count();
        if count == self.saved_annotations.load(Ordering::SeqCst) {
            return Ok(false);
        }

        page.save(path)?;
        self.saved_annotations.store(count, Ordering::SeqCst);
        info!("✓ Saved {} annotations to {}", count, path.display());
        Ok(true)
    }
}

/// Acknowledgement sent back to whoever pulled the trigger.
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,
}

impl TriggerResponse {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            selected: None,
            translated: None,
            failed: None,
        }
    }
}

impl From<&RunSummary> for TriggerResponse {
    fn from(summary: &RunSummary) -> Self {
        match &summary.error {
            Some(error) => Self::failure(error.clone()),
            None => Self {
                success: true,
                error: None,
                selected: Some(summary.selected),
                translated: Some(summary.translated),
                failed: Some(summary.failed),
            },
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/trigger", post(trigger))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn trigger(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<TriggerResponse>) {
    let provided = headers
        .get(TRIGGER_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if !is_trigger_authorized(state.trigger_token.as_deref(), provided) {
        warn!("Rejected trigger with missing or invalid token");
        return (
            StatusCode::UNAUTHORIZED,
            Json(TriggerResponse::failure("Unauthorized")),
        );
    }

    let summary = state.pipeline.run().await;

    if let Err(e) = state.save_if_changed().await {
        error!("Failed to save annotated page: {:#}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(TriggerResponse::failure(format!("{:#}", e))),
        );
    }

    (StatusCode::OK, Json(TriggerResponse::from(&summary)))
}

async fn health() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsReport> {
    Json(state.pipeline.metrics().report())
}

/// Build the production state from config: snapshot page, DeepL and the configured settings source
pub fn build_state(config: &Config) -> Result<AppState> {
    let page = PageDocument::load(&config.page_snapshot)?;
    let saved_annotations = page.annotation_count();
    info!(
        "Loaded {} comment threads from {}",
        page.threads.len(),
        config.page_snapshot.display()
    );

    let translator = DeepLTranslator::new(
        reqwest::Client::new(),
        config.deepl_api_url.clone(),
        config.target_lang.clone(),
    );

    let pipeline = Pipeline::new(page, Arc::new(translator), config.settings_source())
        .with_language(config.source_language)
        .with_target_lang(config.target_lang.clone());

    Ok(AppState::new(
        pipeline,
        Some(config.page_snapshot.clone()),
        config.trigger_token.clone(),
        saved_annotations,
    ))
}

/// Serve the trigger endpoint until the process is stopped
pub async fn serve(config: &Config) -> Result<()> {
    let state = Arc::new(build_state(config)?);
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("✓ Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
