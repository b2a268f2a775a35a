use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tokio::fs;
use tracing::info;

use crate::{
    ai::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL},
    pipeline::text::DEFAULT_DPI,
};

pub const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub working_dir: PathBuf,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            allowed_extensions: vec!["pdf".to_string()],
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub tesseract_path: PathBuf,
    pub pdftoppm_path: PathBuf,
    pub dpi: u32,
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: PathBuf::new(),
            pdftoppm_path: PathBuf::from("pdftoppm"),
            dpi: DEFAULT_DPI,
            language: "eng".to_string(),
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            request_timeout_secs: 600,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
        info!(path = %path.display(), "Configuration loaded from disk");
        Ok(config)
    }

    /// Overlays environment variables; blank values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(key) = var("GOOGLE_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = var("GEMINI_MODEL") {
            self.llm.model = model;
        }
        if let Some(path) = var("TESSERACT_PATH") {
            self.ocr.tesseract_path = PathBuf::from(path);
        }
        if let Some(dir) = var("UPLOAD_FOLDER") {
            self.uploads.dir = PathBuf::from(dir);
        }
        if let Some(extensions) = var("ALLOWED_EXTENSIONS") {
            self.uploads.allowed_extensions = extensions
                .split(',')
                .map(|ext| ext.trim().to_string())
                .filter(|ext| !ext.is_empty())
                .collect();
        }
    }

    /// Startup checks; any failure here aborts before the server binds.
    pub fn validate(&self) -> Result<()> {
        if self.api_key().is_none() {
            bail!("GOOGLE_API_KEY is not set");
        }
        if self.ocr.tesseract_path.as_os_str().is_empty() || !self.ocr.tesseract_path.exists() {
            bail!(
                "TESSERACT_PATH is invalid or missing: '{}'",
                self.ocr.tesseract_path.display()
            );
        }
        let search_path = std::env::var_os("PATH");
        if resolve_binary(&self.ocr.pdftoppm_path, search_path.as_deref()).is_none() {
            bail!("pdftoppm not found: '{}'", self.ocr.pdftoppm_path.display());
        }
        if self.ocr.dpi == 0 {
            bail!("ocr.dpi must be greater than zero");
        }
        if self.uploads.allowed_extensions.is_empty() {
            bail!("uploads.allowed_extensions must not be empty");
        }
        if self.uploads.max_bytes == 0 {
            bail!("uploads.max_bytes must be greater than zero");
        }
        Ok(())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.llm
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Locates an executable. Bare names are searched in `search_path` like a
/// shell would; anything with a directory part must exist as given.
pub fn resolve_binary(binary: &Path, search_path: Option<&OsStr>) -> Option<PathBuf> {
    if binary.as_os_str().is_empty() {
        return None;
    }
    if binary.components().count() > 1 || binary.is_absolute() {
        return binary.is_file().then(|| binary.to_path_buf());
    }
    std::env::split_paths(search_path?)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

pub fn config_path() -> PathBuf {
    std::env::var("APP_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}
