use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use image::DynamicImage;
use tokio::{process::Command, task::spawn_blocking};
use tracing::debug;

/// Renders document pages to images.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// One image per page, in page order.
    async fn rasterize(&self, document: &Path, dpi: u32) -> Result<Vec<DynamicImage>>;
}

/// Rasterizes with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, document: &Path, dpi: u32) -> Result<Vec<DynamicImage>> {
        let workdir = tempfile::tempdir().context("failed to create rasterization directory")?;
        let prefix = workdir.path().join("page");

        let output = Command::new(&self.binary)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(document)
            .arg(&prefix)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        // pdftoppm zero-pads page numbers, so name order is page order.
        let mut page_files = Vec::new();
        let mut entries = tokio::fs::read_dir(workdir.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "png") {
                page_files.push(path);
            }
        }
        page_files.sort();
        debug!(pages = page_files.len(), dpi, "rendered document pages");

        let pages = spawn_blocking(move || {
            page_files
                .iter()
                .map(|path| {
                    image::open(path)
                        .with_context(|| format!("failed to decode page image {}", path.display()))
                })
                .collect::<Result<Vec<_>>>()
        })
        .await
        .context("page decoding task failed")??;

        Ok(pages)
    }
}
