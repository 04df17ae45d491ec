//! Job input files.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::registry::JobId;

/// A job's input file, removed from disk when dropped.
///
/// Owned by exactly one job; the file is removed once, on every exit path.
#[derive(Debug)]
pub struct TempInput {
    path: PathBuf,
}

impl TempInput {
    /// Location of the input file for `job_id` inside `dir`.
    pub fn path_for(dir: &Path, job_id: &JobId) -> PathBuf {
        dir.join(format!("tmp_{job_id}.txt"))
    }

    /// Create a new input file holding `data`.
    ///
    /// Fails if the file already exists. A partially written file is removed.
    pub async fn create(dir: &Path, job_id: &JobId, data: &[u8]) -> io::Result<Self> {
        let path = Self::path_for(dir, job_id);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        let input = Self { path };
        file.write_all(data).await?;
        file.flush().await?;
        Ok(input)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempInput {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::trace!(path = %self.path.display(), "Input file removed"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove input file"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn file_lives_as_long_as_guard() {
        let dir = tempfile::tempdir().unwrap();
        let job = Uuid::new_v4();

        let input = TempInput::create(dir.path(), &job, b"aaa").await.unwrap();
        assert_eq!(input.path(), dir.path().join(format!("tmp_{job}.txt")));
        assert_eq!(std::fs::read(input.path()).unwrap(), b"aaa");

        let path = input.path().to_path_buf();
        drop(input);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let job = Uuid::new_v4();
        std::fs::write(TempInput::path_for(dir.path(), &job), b"existing").unwrap();

        let err = TempInput::create(dir.path(), &job, b"new").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(
            std::fs::read(TempInput::path_for(dir.path(), &job)).unwrap(),
            b"existing"
        );
    }

    #[tokio::test]
    async fn missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(TempInput::create(&missing, &Uuid::new_v4(), b"x").await.is_err());
    }
}
