//! Moves accepted source files into the processed-files directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::ArchiveError;
use crate::invoice::SourceKind;

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// What happened to the companion file of an archived source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanionStatus {
    /// The source kind has no companion.
    NotApplicable,
    /// The companion was moved to this path.
    Moved(PathBuf),
    /// No companion exists next to the source; the expected path is given.
    Missing(PathBuf),
    /// The companion exists but could not be moved.
    Failed(String),
}

/// Outcome of archiving one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    /// New location of the source file.
    pub archived: PathBuf,
    pub companion: CompanionStatus,
}

/// Moves files from the inbox to the processed directory.
#[derive(Debug, Clone)]
pub struct Archiver {
    processed_dir: PathBuf,
}

impl Archiver {
    pub fn new(processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            processed_dir: processed_dir.into(),
        }
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// Archive `source` and, for kinds that have one, its same-named
    /// companion. The companion is best-effort: its absence or a failure to
    /// move it is reported in the result, not returned as an error.
    pub fn archive(&self, source: &Path, kind: SourceKind) -> Result<ArchiveReport> {
        let archived = self.move_into(source)?;

        let companion = match kind.companion() {
            None => CompanionStatus::NotApplicable,
            Some(companion_kind) => match find_companion(source, companion_kind) {
                Some(path) => match self.move_into(&path) {
                    Ok(moved) => CompanionStatus::Moved(moved),
                    Err(e) => {
                        warn!("Companion {} not archived: {}", path.display(), e);
                        CompanionStatus::Failed(e.to_string())
                    }
                },
                None => {
                    let expected = source.with_extension(companion_kind.extension());
                    warn!("Companion file not found: {}", expected.display());
                    CompanionStatus::Missing(expected)
                }
            },
        };

        Ok(ArchiveReport { archived, companion })
    }

    /// Move one file into the processed directory, keeping its name.
    pub fn move_into(&self, source: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .ok_or_else(|| ArchiveError::NotAFile(source.to_path_buf()))?;

        fs::create_dir_all(&self.processed_dir).map_err(|source| ArchiveError::CreateDir {
            path: self.processed_dir.clone(),
            source,
        })?;

        let destination = self.processed_dir.join(file_name);
        move_file(source, &destination)?;
        info!("Archived {} to {}", source.display(), destination.display());
        Ok(destination)
    }
}

/// Same-stem sibling of `source` with the companion kind's extension, in
/// lower or upper case.
fn find_companion(source: &Path, kind: SourceKind) -> Option<PathBuf> {
    let extension = kind.extension();
    [extension.to_string(), extension.to_uppercase()]
        .into_iter()
        .map(|ext| source.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

/// Move a file, replacing any file already at `to`.
///
/// A rename is tried first. When it fails for any reason other than a
/// missing source (typically because `to` is on another filesystem), the file
/// is copied, the copy's size is checked, and only then is the original
/// removed.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ArchiveError::Move {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        }),
        Err(e) => {
            warn!("Rename of {} failed ({}), copying instead", from.display(), e);
            copy_then_remove(from, to)
        }
    }
}

/// Two-phase move: copy, verify, then delete the original.
///
/// The copy is staged in a temporary file next to `to` and renamed into
/// place only once its size matches, so a failed step leaves both the
/// original and any file already at `to` untouched.
pub fn copy_then_remove(from: &Path, to: &Path) -> Result<()> {
    let move_error = |source: std::io::Error| ArchiveError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    let expected = fs::metadata(from).map_err(move_error)?.len();
    let dir = match to.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let staged = NamedTempFile::new_in(dir).map_err(move_error)?;
    let copied = fs::copy(from, staged.path()).map_err(move_error)?;
    let on_disk = staged.as_file().metadata().map_err(move_error)?.len();
    if copied != expected || on_disk != expected {
        return Err(ArchiveError::Verify {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            copied: on_disk,
            expected,
        });
    }

    staged.persist(to).map_err(|e| move_error(e.error))?;
    if let Err(e) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(move_error(e));
    }
    Ok(())
}
