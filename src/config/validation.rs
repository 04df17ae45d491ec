//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every configured path exists and has the right kind
//! - Validate value ranges (timeouts > 0, limits > 0, host is an IP)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure apart from filesystem metadata lookups
//! - Runs before any socket is opened

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid host string \"{0}\"")]
    InvalidHost(String),

    #[error("Docs location path must be provided")]
    DocsMissing,

    #[error("Docs location path doesn't exist: {0}")]
    DocsNotFound(PathBuf),

    #[error("Docs location path must be a directory: {0}")]
    DocsNotDirectory(PathBuf),

    #[error("Temporary storage path cannot be empty")]
    TmpStorageEmpty,

    #[error("Temporary storage path doesn't exist: {0}")]
    TmpStorageNotFound(PathBuf),

    #[error("Temporary storage path must be a directory: {0}")]
    TmpStorageNotDirectory(PathBuf),

    #[error("Chcount path must be provided")]
    WorkerMissing,

    #[error("Chcount executable doesn't exist: {0}")]
    WorkerNotFound(PathBuf),

    #[error("Chcount executable must be a regular file: {0}")]
    WorkerNotFile(PathBuf),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Absolute, verified filesystem locations shared by every actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Document root.
    pub docs: PathBuf,
    /// Directory for job input files.
    pub tmp_storage: PathBuf,
    /// Worker executable.
    pub worker_executable: PathBuf,
}

#[derive(Clone, Copy)]
enum Expect {
    Directory,
    File,
}

/// Check `path` exists and has the expected kind, returning its absolute form.
fn check_path(
    path: &Path,
    expect: Expect,
    not_found: fn(PathBuf) -> ValidationError,
    wrong_kind: fn(PathBuf) -> ValidationError,
) -> Result<PathBuf, ValidationError> {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let metadata = std::fs::metadata(&absolute).map_err(|_| not_found(absolute.clone()))?;

    let kind_ok = match expect {
        Expect::Directory => metadata.is_dir(),
        Expect::File => metadata.is_file(),
    };
    if !kind_ok {
        return Err(wrong_kind(absolute));
    }
    Ok(absolute)
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &ServerConfig) -> Result<ResolvedPaths, Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.socket_addr().is_err() {
        errors.push(ValidationError::InvalidHost(config.listener.host.clone()));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero("listener.max_connections"));
    }
    if config.http.idle_timeout_secs == 0 {
        errors.push(ValidationError::Zero("http.idle_timeout_secs"));
    }
    if config.http.body_limit_bytes == 0 {
        errors.push(ValidationError::Zero("http.body_limit_bytes"));
    }
    if config.worker.output_limit_bytes == 0 {
        errors.push(ValidationError::Zero("worker.output_limit_bytes"));
    }

    let docs = match &config.paths.docs {
        None => {
            errors.push(ValidationError::DocsMissing);
            None
        }
        Some(docs) => check_path(
            docs,
            Expect::Directory,
            ValidationError::DocsNotFound,
            ValidationError::DocsNotDirectory,
        )
        .map_err(|e| errors.push(e))
        .ok(),
    };

    let tmp_storage = if config.paths.tmp_storage.as_os_str().is_empty() {
        errors.push(ValidationError::TmpStorageEmpty);
        None
    } else {
        check_path(
            &config.paths.tmp_storage,
            Expect::Directory,
            ValidationError::TmpStorageNotFound,
            ValidationError::TmpStorageNotDirectory,
        )
        .map_err(|e| errors.push(e))
        .ok()
    };

    let worker_executable = match &config.paths.worker_executable {
        Some(exe) if !exe.as_os_str().is_empty() => check_path(
            exe,
            Expect::File,
            ValidationError::WorkerNotFound,
            ValidationError::WorkerNotFile,
        )
        .map_err(|e| errors.push(e))
        .ok(),
        _ => {
            errors.push(ValidationError::WorkerMissing);
            None
        }
    };

    match (docs, tmp_storage, worker_executable) {
        (Some(docs), Some(tmp_storage), Some(worker_executable)) if errors.is_empty() => {
            Ok(ResolvedPaths {
                docs,
                tmp_storage,
                worker_executable,
            })
        }
        _ => Err(errors),
    }
}
