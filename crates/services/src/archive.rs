//! Unpacking downloaded tool bundles.

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::debug;

/// Returned by blocking stages that noticed their cancel flag.
#[derive(Debug, Error)]
#[error("Cancelled")]
pub struct Cancelled;

/// Fail with [`Cancelled`] once `cancel` is set.
pub fn check_cancelled(cancel: &AtomicBool) -> Result<()> {
    if cancel.load(Ordering::Relaxed) {
        return Err(Cancelled.into());
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
    /// Not an archive (e.g. a bare installer executable)
    Plain,
}

/// Detect the archive type from the first bytes of the file.
pub fn detect_archive_kind(path: &Path) -> Result<ArchiveKind> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut magic = [0u8; 4];
    let n = file.read(&mut magic)?;

    Ok(match &magic[..n] {
        [0x50, 0x4B, 0x03, 0x04] => ArchiveKind::Zip,
        [0x1F, 0x8B, ..] => ArchiveKind::TarGz,
        _ => ArchiveKind::Plain,
    })
}

/// Unpack `archive` into `dest`, which is created if needed.
///
/// `cancel` is checked before every entry.
pub fn extract(archive: &Path, dest: &Path, cancel: &AtomicBool) -> Result<ArchiveKind> {
    check_cancelled(cancel)?;
    fs::create_dir_all(dest).with_context(|| format!("Failed to create {}", dest.display()))?;

    let kind = detect_archive_kind(archive)?;
    debug!("Extracting {} as {:?}", archive.display(), kind);
    match kind {
        ArchiveKind::Zip => extract_zip(archive, dest, cancel)?,
        ArchiveKind::TarGz => extract_tar_gz(archive, dest, cancel)?,
        ArchiveKind::Plain => {
            let name = archive
                .file_name()
                .context("Downloaded file has no name")?;
            fs::copy(archive, dest.join(name))?;
        }
    }
    Ok(kind)
}

fn extract_zip(archive_path: &Path, dest: &Path, cancel: &AtomicBool) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive =
        zip::ZipArchive::new(BufReader::new(file)).context("Not a readable zip archive")?;

    for i in 0..archive.len() {
        check_cancelled(cancel)?;
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            bail!("Archive entry escapes the target directory: {}", entry.name());
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?;
        io::copy(&mut entry, &mut out)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))?;
        }
    }
    Ok(())
}

fn extract_tar_gz(archive_path: &Path, dest: &Path, cancel: &AtomicBool) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    let entries = archive
        .entries()
        .with_context(|| format!("Failed to read {}", archive_path.display()))?;
    for entry in entries {
        check_cancelled(cancel)?;
        let mut entry = entry?;
        // unpack_in refuses entries that would land outside `dest`
        entry
            .unpack_in(dest)
            .with_context(|| format!("Failed to unpack {}", archive_path.display()))?;
    }
    Ok(())
}
