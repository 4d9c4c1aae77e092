use crate::language::SourceLanguage;
use crate::selector::{SelectionConfig, DEFAULT_LIKE_THRESHOLD, DEFAULT_PERCENT};
use crate::translator::{DEFAULT_DEEPL_API_URL, DEFAULT_TARGET_LANG};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // DeepL
    pub deepl_api_url: String,
    pub target_lang: String,

    // Filtering
    pub source_language: SourceLanguage,

    // Page
    pub page_snapshot: PathBuf,

    // Per-run settings (credential, percent, threshold)
    pub settings_file: Option<PathBuf>,

    // Server
    pub trigger_token: Option<String>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let source_code = std::env::var("SOURCE_LANGUAGE").unwrap_or_else(|_| "ko".to_string());

        Ok(Self {
            // DeepL
            deepl_api_url: std::env::var("DEEPL_API_URL")
                .unwrap_or_else(|_| DEFAULT_DEEPL_API_URL.to_string()),
            target_lang: std::env::var("TARGET_LANG")
                .unwrap_or_else(|_| DEFAULT_TARGET_LANG.to_string()),

            // Filtering
            source_language: SourceLanguage::from_code(&source_code)
                .context("SOURCE_LANGUAGE is not a supported language")?,

            // Page
            page_snapshot: std::env::var("PAGE_SNAPSHOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/page.json")),

            settings_file: std::env::var("SETTINGS_FILE").ok().map(PathBuf::from),

            // Server
            trigger_token: std::env::var("TRIGGER_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }

    /// Build the per-run settings source this config points at
    pub fn settings_source(&self) -> Box<dyn SettingsSource> {
        match &self.settings_file {
            Some(path) => Box::new(JsonSettingsFile::new(path)),
            None => Box::new(EnvSettings),
        }
    }
}

/// Settings read at the start of every pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub credential: Option<String>,
    pub selection: SelectionConfig,
}

impl RunSettings {
    pub fn new(credential: Option<String>, selection: SelectionConfig) -> Self {
        Self {
            credential: credential.filter(|c| !c.trim().is_empty()),
            selection,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::new(None, SelectionConfig::default())
    }
}

/// Where per-run settings come from. Implementations must not cache:
/// a change made between runs has to show up on the next `load`.
pub trait SettingsSource: Send + Sync {
    fn load(&self) -> Result<RunSettings>;
}

/// Reads `DEEPL_API_KEY`, `TOP_PERCENT` and `LIKE_THRESHOLD` from the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSettings;

impl SettingsSource for EnvSettings {
    fn load(&self) -> Result<RunSettings> {
        Ok(RunSettings::new(
            std::env::var("DEEPL_API_KEY").ok(),
            SelectionConfig::new(
                std::env::var("TOP_PERCENT")
                    .ok()
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(DEFAULT_PERCENT),
                std::env::var("LIKE_THRESHOLD")
                    .ok()
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(DEFAULT_LIKE_THRESHOLD),
            ),
        ))
    }
}

/// Stored settings as written by the options page.
///
/// Numbers may arrive as JSON numbers or strings, so they are kept loose and
/// parsed on read.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    deepl_api_key: Option<String>,
    top_percent: Option<serde_json::Value>,
    like_threshold: Option<serde_json::Value>,
}

fn loose_number(value: Option<&serde_json::Value>) -> Option<u64> {
    match value? {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads settings from a JSON file on every load. A missing file means defaults.
#[derive(Debug, Clone)]
pub struct JsonSettingsFile {
    path: PathBuf,
}

impl JsonSettingsFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SettingsSource for JsonSettingsFile {
    fn load(&self) -> Result<RunSettings> {
        if !self.path.exists() {
            return Ok(RunSettings::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings file {}", self.path.display()))?;
        let stored: StoredSettings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", self.path.display()))?;

        let percent = loose_number(stored.top_percent.as_ref())
            .map(|p| p.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(DEFAULT_PERCENT);
        let like_threshold =
            loose_number(stored.like_threshold.as_ref()).unwrap_or(DEFAULT_LIKE_THRESHOLD);

        Ok(RunSettings::new(
            stored.deepl_api_key,
            SelectionConfig::new(percent, like_threshold),
        ))
    }
}

/// Fixed settings, for tests and one-off runs.
impl SettingsSource for RunSettings {
    fn load(&self) -> Result<RunSettings> {
        Ok(self.clone())
    }
}
