//! Screenshot queues.
//!
//! Capture itself is out of scope; the pipeline only needs the two queues
//! (main: the problem, extra: follow-up shots for debugging) as base64
//! payloads, plus a way to empty the extra queue after a fresh solve.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use snapsolve_core::config::ScreenshotsConfig;
use snapsolve_core::types::ImagePayload;
use snapsolve_core::utils::expand_home;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

#[async_trait]
pub trait ScreenshotSource: Send + Sync {
    /// Screenshots of the problem, in capture order.
    async fn main_queue(&self) -> std::io::Result<Vec<ImagePayload>>;

    /// Follow-up screenshots used by the debug flow.
    async fn extra_queue(&self) -> std::io::Result<Vec<ImagePayload>>;

    async fn clear_extra_queue(&self) -> std::io::Result<()>;
}

/// Reads image files from two directories. File names sort in capture order
/// (timestamped names), so queues are returned sorted by name.
#[derive(Clone, Debug)]
pub struct DirScreenshotSource {
    main_dir: PathBuf,
    extra_dir: PathBuf,
}

impl DirScreenshotSource {
    pub fn new(main_dir: impl Into<PathBuf>, extra_dir: impl Into<PathBuf>) -> Self {
        Self {
            main_dir: main_dir.into(),
            extra_dir: extra_dir.into(),
        }
    }

    pub fn from_config(config: &ScreenshotsConfig) -> Self {
        Self::new(expand_home(&config.queue_dir), expand_home(&config.extra_queue_dir))
    }

    pub fn main_dir(&self) -> &Path {
        &self.main_dir
    }

    pub fn extra_dir(&self) -> &Path {
        &self.extra_dir
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files directly inside `dir`, sorted by name. A missing directory is
/// an empty queue.
async fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_image(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

async fn load_dir(dir: &Path) -> std::io::Result<Vec<ImagePayload>> {
    let mut payloads = Vec::new();
    for path in list_images(dir).await? {
        let bytes = tokio::fs::read(&path).await?;
        payloads.push(ImagePayload::new(path, STANDARD.encode(bytes)));
    }
    debug!(dir = %dir.display(), count = payloads.len(), "loaded screenshot queue");
    Ok(payloads)
}

#[async_trait]
impl ScreenshotSource for DirScreenshotSource {
    async fn main_queue(&self) -> std::io::Result<Vec<ImagePayload>> {
        load_dir(&self.main_dir).await
    }

    async fn extra_queue(&self) -> std::io::Result<Vec<ImagePayload>> {
        load_dir(&self.extra_dir).await
    }

    async fn clear_extra_queue(&self) -> std::io::Result<()> {
        for path in list_images(&self.extra_dir).await? {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "failed to remove screenshot");
            }
        }
        Ok(())
    }
}
