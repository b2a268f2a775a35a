use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use image::GrayImage;
use tokio::{process::Command, task::spawn_blocking};

/// Recognizes text in a preprocessed page image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &GrayImage) -> Result<String>;
}

/// Runs the tesseract command-line binary.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &GrayImage) -> Result<String> {
        let workdir = tempfile::tempdir().context("failed to create OCR directory")?;
        let input = workdir.path().join("page.png");
        let page = image.clone();
        let target = input.clone();
        spawn_blocking(move || {
            page.save(&target)
                .with_context(|| format!("failed to write {}", target.display()))
        })
        .await
        .context("page encoding task failed")??;

        let output = Command::new(&self.binary)
            .arg(&input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
