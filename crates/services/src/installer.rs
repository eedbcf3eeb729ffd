//! Download-and-install pipeline for Python and FFmpeg.
//!
//! Stages run strictly in order: download, extract, copy into the install
//! directory, add to PATH, write the manifest. The scratch directory is
//! removed after every run. When a job is aborted, the blocking stage in
//! flight is told to stop and awaited before the directory goes away.

use crate::archive;
use crate::download::{Fetcher, ProgressTracker};
use crate::user_path::{PathEditError, UserPathEditor};
use anyhow::{Context, Result};
use futures::channel::oneshot;
use futures::future::{AbortHandle, AbortRegistration, Abortable};
use parking_lot::Mutex;
use shared::environment::Tool;
use shared::install::{
    InstallEvent, InstallManifest, InstallOutcome, InstallStage, MANIFEST_FILE_NAME,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tempfile::TempDir;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Where users can fetch Python themselves
pub const PYTHON_DOWNLOAD_PAGE: &str = "https://www.python.org/downloads/";

/// Release bundle for a tool on the given platform
pub fn download_url_for(tool: Tool, windows: bool) -> &'static str {
    match (tool, windows) {
        (Tool::Interpreter, true) => {
            "https://www.python.org/ftp/python/3.11.0/python-3.11.0-amd64.exe"
        }
        (Tool::Interpreter, false) => "https://www.python.org/ftp/python/3.11.0/Python-3.11.0.tgz",
        (Tool::MediaTool, true) => {
            "https://github.com/BtbN/FFmpeg-Builds/releases/download/latest/ffmpeg-master-latest-win64-gpl.zip"
        }
        (Tool::MediaTool, false) => "https://evermeet.cx/ffmpeg/getrelease/zip",
    }
}

pub fn download_url(tool: Tool) -> &'static str {
    download_url_for(tool, cfg!(windows))
}

/// Parent of all per-tool install directories
pub fn default_install_root() -> Option<PathBuf> {
    if cfg!(windows) {
        dirs::data_local_dir().map(|d| d.join("Programs"))
    } else {
        dirs::home_dir().map(|h| h.join(".local").join("bin"))
    }
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Could not create a temporary directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("Download failed: {0:#}")]
    Download(#[source] anyhow::Error),

    #[error("Extraction failed: {0:#}")]
    Extract(#[source] anyhow::Error),

    #[error("Copying files failed: {0:#}")]
    Install(#[source] anyhow::Error),

    #[error("PATH configuration failed: {0}")]
    Path(#[from] PathEditError),

    #[error("Writing install info failed: {0:#}")]
    Manifest(#[source] anyhow::Error),

    #[error("No install location available on this system")]
    NoInstallRoot,

    #[error("Cancelled")]
    Cancelled,
}

/// One download-and-install run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallJob {
    pub source_url: String,
    pub target_name: String,
    pub install_dir: PathBuf,
}

impl InstallJob {
    pub fn new(
        source_url: impl Into<String>,
        target_name: impl Into<String>,
        install_root: &Path,
    ) -> Self {
        let target_name = target_name.into();
        Self {
            source_url: source_url.into(),
            install_dir: install_root.join(&target_name),
            target_name,
        }
    }

    /// Job for a tool using the platform's release URL and install root.
    pub fn for_tool(tool: Tool) -> Result<Self, InstallError> {
        let root = default_install_root().ok_or(InstallError::NoInstallRoot)?;
        Ok(Self::new(download_url(tool), tool.install_name(), &root))
    }

    /// File name for the downloaded bundle.
    ///
    /// Keeps the URL's own name when it has an extension, otherwise
    /// `<target>.zip`.
    pub fn download_file_name(&self) -> String {
        let last = self
            .source_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .rsplit('/')
            .next()
            .unwrap_or_default();
        if last.contains('.') && !last.ends_with('.') {
            last.to_string()
        } else {
            format!("{}.zip", self.target_name)
        }
    }
}

pub struct ToolInstaller {
    fetcher: Arc<dyn Fetcher>,
    path_editor: Arc<dyn UserPathEditor>,
    temp_root: Option<PathBuf>,
}

impl ToolInstaller {
    pub fn new(fetcher: Arc<dyn Fetcher>, path_editor: Arc<dyn UserPathEditor>) -> Self {
        Self {
            fetcher,
            path_editor,
            temp_root: None,
        }
    }

    /// Create scratch directories under `root` instead of the system temp dir.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Run the whole pipeline, reporting through `tx`.
    ///
    /// Always ends with exactly one `InstallEvent::Finished`.
    pub async fn run(&self, job: &InstallJob, tx: &Sender<InstallEvent>) -> InstallOutcome {
        let (_handle, abort_reg) = AbortHandle::new_pair();
        self.run_abortable(job, tx, abort_reg).await
    }

    /// Like [`run`](Self::run), but stops early when the abort handle fires.
    pub async fn run_abortable(
        &self,
        job: &InstallJob,
        tx: &Sender<InstallEvent>,
        abort_reg: AbortRegistration,
    ) -> InstallOutcome {
        let outcome = self.run_to_outcome(job, tx, abort_reg).await;
        let _ = tx.send(InstallEvent::Finished(outcome.clone()));
        outcome
    }

    async fn run_to_outcome(
        &self,
        job: &InstallJob,
        tx: &Sender<InstallEvent>,
        abort_reg: AbortRegistration,
    ) -> InstallOutcome {
        let temp = match self.create_temp_dir() {
            Ok(t) => t,
            Err(e) => {
                error!("{}", e);
                return InstallOutcome::Failure(e.to_string());
            }
        };

        let blocking = BlockingStage::default();
        let result = match Abortable::new(self.execute(job, temp.path(), tx, &blocking), abort_reg)
            .await
        {
            Ok(result) => result,
            Err(_aborted) => {
                warn!("Install of {} cancelled", job.target_name);
                blocking.stop().await;
                Err(InstallError::Cancelled)
            }
        };

        let temp_path = temp.path().to_path_buf();
        if let Err(e) = temp.close() {
            warn!("Failed to remove {}: {}", temp_path.display(), e);
        }

        match result {
            Ok(dir) => {
                info!("{} installed to {}", job.target_name, dir.display());
                InstallOutcome::Success(format!("{} installed successfully", job.target_name))
            }
            Err(e @ InstallError::Cancelled) => InstallOutcome::Failure(e.to_string()),
            Err(e) => {
                error!("Install of {} failed: {}", job.target_name, e);
                InstallOutcome::Failure(e.to_string())
            }
        }
    }

    fn create_temp_dir(&self) -> Result<TempDir, InstallError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("zhenxun-install-");
        match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(InstallError::TempDir)
    }

    async fn execute(
        &self,
        job: &InstallJob,
        temp: &Path,
        tx: &Sender<InstallEvent>,
        blocking: &BlockingStage,
    ) -> Result<PathBuf, InstallError> {
        let status = |stage: InstallStage| {
            let _ = tx.send(InstallEvent::Status(stage.status_text(&job.target_name)));
        };

        status(InstallStage::Downloading);
        let download_path = temp.join(job.download_file_name());
        {
            let mut tracker = ProgressTracker::default();
            let progress_tx = tx.clone();
            let mut on_bytes = move |received: u64, total: Option<u64>| {
                if let Some(pct) = tracker.observe(received, total) {
                    let _ = progress_tx.send(InstallEvent::Progress(pct));
                }
            };
            self.fetcher
                .fetch(&job.source_url, &download_path, &mut on_bytes)
                .await
                .map_err(InstallError::Download)?;
        }

        status(InstallStage::Extracting);
        let extracted = temp.join("extracted");
        {
            let archive_path = download_path.clone();
            let dest = extracted.clone();
            blocking
                .run(move |cancel| archive::extract(&archive_path, &dest, cancel).map(|_| ()))
                .await
                .map_err(InstallError::Extract)?;
        }

        status(InstallStage::Installing);
        {
            let src = extracted.clone();
            let dest = job.install_dir.clone();
            blocking
                .run(move |cancel| copy_tree(&src, &dest, cancel))
                .await
                .map_err(InstallError::Install)?;
        }

        status(InstallStage::ConfiguringPath);
        let path_dir = find_bin_dir(&job.install_dir).unwrap_or_else(|| job.install_dir.clone());
        self.path_editor.append_to_user_path(&path_dir)?;

        write_manifest(&job.install_dir).map_err(InstallError::Manifest)?;
        Ok(job.install_dir.clone())
    }
}

/// The blocking task a job is currently waiting on.
///
/// Aborting the job drops its future but not the thread doing the work, so
/// the task stays reachable here until it has been stopped and joined.
#[derive(Default)]
struct BlockingStage {
    cancel: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl BlockingStage {
    async fn run<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&AtomicBool) -> Result<()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let (done_tx, done_rx) = oneshot::channel();
        let task = tokio::task::spawn_blocking(move || {
            let _ = done_tx.send(f(&cancel));
        });
        *self.task.lock() = Some(task);
        done_rx.await.context("Worker task panicked")?
    }

    /// Ask the running task to stop and wait until it has returned.
    async fn stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Blocking install stage failed: {}", e);
            }
        }
    }
}

/// Merge-copy everything under `src` into `dest`, checking `cancel` before
/// each entry.
pub fn copy_tree(src: &Path, dest: &Path, cancel: &AtomicBool) -> Result<()> {
    archive::check_cancelled(cancel)?;
    fs::create_dir_all(dest).with_context(|| format!("Failed to create {}", dest.display()))?;

    for entry in WalkDir::new(src).min_depth(1) {
        archive::check_cancelled(cancel)?;
        let entry = entry?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy to {}", target.display()))?;
        }
    }
    Ok(())
}

/// The shallowest directory named `bin` under `base`.
pub fn find_bin_dir(base: &Path) -> Option<PathBuf> {
    WalkDir::new(base)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && e.file_name() == "bin")
        .min_by_key(|e| e.depth())
        .map(|e| e.into_path())
}

fn write_manifest(install_dir: &Path) -> Result<()> {
    let manifest = InstallManifest::new(install_dir.to_path_buf());
    let json = serde_json::to_vec_pretty(&manifest)?;
    let path = install_dir.join(MANIFEST_FILE_NAME);
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
