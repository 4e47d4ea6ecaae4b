//! Archiving of source PDFs under their report key.

use std::path::{Path, PathBuf};

use crate::paths::{OutputKey, pdf_path};
use crate::{StoreError, write_atomic};

/// Result of archiving a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Archived(PathBuf),
    /// An archive for this key already existed and was left untouched.
    KeptExisting(PathBuf),
}

impl ArchiveOutcome {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Archived(path) | Self::KeptExisting(path) => path,
        }
    }
}

/// Copies the PDF at `source` to `dir/<key>.pdf`.
///
/// An existing archive is never replaced.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the source cannot be read or the archive
/// cannot be written.
pub fn archive_pdf(source: &Path, dir: &Path, key: &OutputKey) -> Result<ArchiveOutcome, StoreError> {
    let dest = pdf_path(dir, key);
    if dest.exists() {
        log::warn!("Archive {} already exists; not replacing it", dest.display());
        return Ok(ArchiveOutcome::KeptExisting(dest));
    }

    let bytes = std::fs::read(source).map_err(StoreError::io(source))?;
    write_atomic(&dest, &bytes)?;
    log::info!("Archived {} to {}", source.display(), dest.display());
    Ok(ArchiveOutcome::Archived(dest))
}

/// Writes downloaded PDF bytes to `dir/<key>.pdf`.
///
/// An existing archive is never replaced.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the archive cannot be written.
pub fn archive_pdf_bytes(
    bytes: &[u8],
    dir: &Path,
    key: &OutputKey,
) -> Result<ArchiveOutcome, StoreError> {
    let dest = pdf_path(dir, key);
    if dest.exists() {
        log::warn!("Archive {} already exists; not replacing it", dest.display());
        return Ok(ArchiveOutcome::KeptExisting(dest));
    }

    write_atomic(&dest, bytes)?;
    log::info!("Saved {} bytes to {}", bytes.len(), dest.display());
    Ok(ArchiveOutcome::Archived(dest))
}
