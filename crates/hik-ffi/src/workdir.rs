//! Scoped override of the process working directory.
//!
//! The SDK loads its sibling resource files (`HCNetSDKCom/`, crypto
//! libraries, ...) by relative path, so its entry points only work while the
//! process working directory is the SDK install directory.
//!
//! The working directory is process-global. Nothing here locks it: callers
//! must not run two guards, or any other relative-path file access, on
//! different threads at the same time.

use crate::error::{HikError, HikResult};
use std::env;
use std::path::{Path, PathBuf};

/// Holds the working directory changed by [`WorkdirGuard::enter`] and puts
/// the previous one back on [`restore`](WorkdirGuard::restore) or drop.
#[derive(Debug)]
pub struct WorkdirGuard {
    previous: PathBuf,
    target: PathBuf,
    restored: bool,
}

impl WorkdirGuard {
    /// Record the current working directory and switch to `dir`.
    pub fn enter(dir: impl AsRef<Path>) -> HikResult<Self> {
        let dir = dir.as_ref();
        let previous = env::current_dir()
            .map_err(|e| HikError::working_directory(".", e))?;

        env::set_current_dir(dir)
            .map_err(|e| HikError::working_directory(dir.display().to_string(), e))?;

        Ok(Self {
            target: previous.join(dir),
            previous,
            restored: false,
        })
    }

    /// Directory that was current before the guard was entered.
    pub fn previous(&self) -> &Path {
        &self.previous
    }

    /// Directory the guard switched to, absolute even when entered through a
    /// relative path.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Switch back to the previous directory, returning it.
    pub fn restore(mut self) -> HikResult<PathBuf> {
        self.restored = true;
        env::set_current_dir(&self.previous).map_err(|e| {
            HikError::working_directory(self.previous.display().to_string(), e)
        })?;
        Ok(self.previous.clone())
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = env::set_current_dir(&self.previous) {
            tracing::warn!(
                previous = %self.previous.display(),
                error = %e,
                "Failed to restore working directory"
            );
        }
    }
}
