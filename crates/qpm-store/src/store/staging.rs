//! Staged artifact writes
//!
//! A staged artifact is a temporary file created in the destination
//! directory, so persisting it is a same-filesystem rename.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use qpm_core::error::QpmError;
use tempfile::NamedTempFile;

use crate::StoreResult;

/// Temporary file awaiting integrity verification
///
/// Dropping it without committing removes the file.
#[derive(Debug)]
pub struct StagedArtifact {
    file: NamedTempFile,
    path: Utf8PathBuf,
}

impl StagedArtifact {
    pub(crate) fn create_in(dir: &Utf8Path) -> StoreResult<Self> {
        let file = tempfile::Builder::new()
            .prefix(".staged-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| QpmError::io(format!("Failed to stage file in {}", dir), e))?;

        let path = Utf8PathBuf::from_path_buf(file.path().to_path_buf()).map_err(|p| {
            QpmError::io(
                format!("Staged file path is not UTF-8: {}", p.display()),
                std::io::Error::from(std::io::ErrorKind::InvalidInput),
            )
        })?;

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Async handle onto the staged file
    ///
    /// Flush the handle before committing.
    pub fn async_writer(&self) -> StoreResult<tokio::fs::File> {
        let handle = self
            .file
            .as_file()
            .try_clone()
            .map_err(|e| QpmError::io(format!("Failed to open staged file {}", self.path), e))?;
        Ok(tokio::fs::File::from_std(handle))
    }

    pub(crate) fn persist(self, destination: &Utf8Path) -> StoreResult<()> {
        self.file
            .persist(destination)
            .map_err(|e| QpmError::io(format!("Failed to persist {}", destination), e.error))?;
        Ok(())
    }
}

impl Write for StagedArtifact {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}
