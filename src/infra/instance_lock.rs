use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use fs2::FileExt;

use crate::infra::error::AppError;

/// Exclusive advisory lock held for as long as the value lives.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn acquire(path: &Path) -> Result<Self, AppError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|source| AppError::InstanceLock {
                path: path.to_path_buf(),
                source,
            })?;

        FileExt::try_lock_exclusive(&file).map_err(|error| lock_error(path, error))?;

        tracing::debug!(path = %path.display(), "instance lock acquired");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(error) = FileExt::unlock(&self.file) {
            tracing::warn!(
                path = %self.path.display(),
                error = %error,
                "failed to release instance lock"
            );
        }
    }
}

/// Only contention means another instance; other failures keep their cause.
fn lock_error(path: &Path, error: io::Error) -> AppError {
    if error.kind() == fs2::lock_contended_error().kind() {
        AppError::InstanceLocked {
            path: path.to_path_buf(),
        }
    } else {
        AppError::InstanceLock {
            path: path.to_path_buf(),
            source: error,
        }
    }
}
