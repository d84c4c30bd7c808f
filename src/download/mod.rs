//! Saving PDF payloads to disk
//!
//! The terminal stand-in for a browser download: files land in one directory
//! and an existing file is never overwritten.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::api::payload::PdfPayload;

/// File name used when a transactions sync saves its PDF automatically
pub const SYNC_FILE_NAME: &str = "transactions.pdf";

/// File name offered by the manual "Download PDF" action
pub const MANUAL_FILE_NAME: &str = "Asset Report.pdf";

/// Platform file-save primitive
pub trait Downloader: Send + Sync {
    /// Store `bytes` under `file_name` and return where they ended up
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes downloads into a directory
#[derive(Debug, Clone)]
pub struct DirDownloader {
    dir: PathBuf,
}

impl DirDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First free path for `file_name`: `name.pdf`, `name (1).pdf`, ...
    fn available_path(&self, file_name: &str) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }

        let (stem, ext) = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (file_name, None),
        };

        (1..)
            .map(|n| {
                let name = match ext {
                    Some(ext) => format!("{} ({}).{}", stem, n, ext),
                    None => format!("{} ({})", stem, n),
                };
                self.dir.join(name)
            })
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

impl Downloader for DirDownloader {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Could not create {}", self.dir.display()))?;

        let path = self.available_path(file_name);
        std::fs::write(&path, bytes)
            .with_context(|| format!("Could not write {}", path.display()))?;

        tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

/// Decode a PDF payload and hand it to the downloader
pub fn save_pdf(downloader: &dyn Downloader, pdf: &PdfPayload, file_name: &str) -> Result<PathBuf> {
    let bytes = pdf.decode()?;
    downloader.save(file_name, &bytes)
}
