//! Staging files
//!
//! An upload has to live on disk while the external translator reads it.
//! [`StagedFile`] owns that file and removes it when dropped, so every exit
//! path of a request (success, error, timeout, client disconnect) cleans up.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// Uploaded content staged on the local filesystem
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    len: usize,
}

impl StagedFile {
    /// Write `data` to a fresh, uniquely named file inside `dir`.
    ///
    /// The name combines a UUID with the random suffix `tempfile` picks and
    /// the file is created exclusively, so concurrent requests never share
    /// a path.
    pub async fn write(dir: &Path, data: &[u8]) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;

        let prefix = format!("pdf2zh_{}_", uuid::Uuid::new_v4().simple());
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".pdf")
            .tempfile_in(dir)?;

        // Write through a second handle; `file` keeps ownership of deletion
        let mut handle = tokio::fs::File::from_std(file.reopen()?);
        handle.write_all(data).await?;
        handle.flush().await?;
        handle.sync_all().await?;
        drop(handle);

        tracing::debug!(path = %file.path().display(), bytes = data.len(), "Staged upload");

        Ok(Self {
            file,
            len: data.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Delete now instead of on drop, reporting failures
    pub fn remove(self) -> std::io::Result<()> {
        let path: PathBuf = self.file.path().to_path_buf();
        self.file.close()?;
        tracing::debug!(path = %path.display(), "Removed staging file");
        Ok(())
    }
}
