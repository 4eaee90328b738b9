use crate::constants::{BACKUP_SUFFIX, ROLLBACK_ATTEMPTS, ROLLBACK_DELAY};
use crate::core::{DownloaderError, Result};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Owns the single `<executable>.old` backup kept during a self-update.
///
/// The backup is made by renaming, not copying: the running executable is moved
/// aside so the new binary can take its path, and moved back if that fails.
/// Because every update first removes the previous backup there is never more
/// than one `.old` file next to the executable.
///
/// # Examples
///
/// ```rust
/// use jnu_exam::upgrade::backup::BackupManager;
/// use std::path::{Path, PathBuf};
///
/// let manager = BackupManager::new(PathBuf::from("/opt/jnu/JNU-EXAM-Downloader"));
/// assert_eq!(manager.backup_path(), Path::new("/opt/jnu/JNU-EXAM-Downloader.old"));
/// ```
#[derive(Debug, Clone)]
pub struct BackupManager {
    executable_path: PathBuf,
    backup_path: PathBuf,
}

impl BackupManager {
    pub fn new(executable_path: PathBuf) -> Self {
        let backup_path = backup_path_for(&executable_path);
        Self {
            executable_path,
            backup_path,
        }
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    pub fn backup_exists(&self) -> bool {
        self.backup_path.exists()
    }

    /// Delete a leftover backup before a new one is made.
    ///
    /// A missing backup is fine. Other failures are logged and swallowed: a
    /// stale backup must not stop an update.
    pub async fn remove_stale(&self) {
        match fs::remove_file(&self.backup_path).await {
            Ok(()) => debug!("Removed previous backup {}", self.backup_path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Could not remove previous backup {}: {}",
                self.backup_path.display(),
                e
            ),
        }
    }

    /// Move the running executable to the backup path.
    pub async fn stash_current(&self) -> Result<()> {
        fs::rename(&self.executable_path, &self.backup_path).await.map_err(|e| {
            DownloaderError::file_system("rename executable to backup", &self.executable_path, e)
        })?;
        debug!(
            "Moved {} to {}",
            self.executable_path.display(),
            self.backup_path.display()
        );
        Ok(())
    }

    /// Move the backup back to the executable path.
    ///
    /// Retried a few times, since Windows can hold the file briefly after the
    /// failed install.
    pub async fn rollback(&self) -> Result<()> {
        self.rollback_with(ROLLBACK_ATTEMPTS, ROLLBACK_DELAY, |from, to| fs::rename(from, to))
            .await
    }

    async fn rollback_with<F, Fut>(&self, attempts: u32, delay: Duration, mut rename: F) -> Result<()>
    where
        F: FnMut(PathBuf, PathBuf) -> Fut,
        Fut: Future<Output = io::Result<()>>,
    {
        warn!("Restoring {} from backup", self.executable_path.display());

        let mut attempt = 1;
        loop {
            match rename(self.backup_path.clone(), self.executable_path.clone()).await {
                Ok(()) => {
                    info!("Restored previous executable");
                    return Ok(());
                }
                Err(e) if attempt < attempts => {
                    warn!("Restore attempt {}/{} failed: {}. Retrying...", attempt, attempts, e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(DownloaderError::file_system("restore backup", &self.backup_path, e));
                }
            }
        }
    }

    /// Delete the backup, retrying while the OS still holds it.
    ///
    /// See [`reap_with`].
    pub async fn reap(&self, attempts: u32, delay: Duration) -> ReapOutcome {
        reap_with(&self.backup_path, attempts, delay, |path| async move {
            fs::remove_file(path).await
        })
        .await
    }
}

/// `<executable>.old`
#[must_use]
pub fn backup_path_for(executable: &Path) -> PathBuf {
    let mut name = executable.file_name().unwrap_or_default().to_os_string();
    name.push(BACKUP_SUFFIX);
    executable.with_file_name(name)
}

/// What the reaper did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapOutcome {
    /// There was no backup.
    NothingToReap,
    /// The backup was deleted on this attempt (1-based).
    Removed { attempt: u32 },
    /// Every attempt failed; the backup is still there.
    GaveUp { attempts: u32 },
}

/// Try up to `attempts` times to delete `path` with `remove`, sleeping `delay`
/// between attempts.
///
/// Right after a restart the previous process may still hold the file open,
/// which on Windows makes deletion fail for a moment. Running out of attempts is
/// logged and reported as [`ReapOutcome::GaveUp`], never as an error; the next
/// start tries again.
pub async fn reap_with<F, Fut>(
    path: &Path,
    attempts: u32,
    delay: Duration,
    mut remove: F,
) -> ReapOutcome
where
    F: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if !fs::try_exists(path).await.unwrap_or(false) {
        return ReapOutcome::NothingToReap;
    }

    info!("Removing leftover backup {}", path.display());
    for attempt in 1..=attempts {
        match remove(path.to_path_buf()).await {
            Ok(()) => {
                info!("Removed leftover backup after {} attempt(s)", attempt);
                return ReapOutcome::Removed { attempt };
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return ReapOutcome::Removed { attempt };
            }
            Err(e) => {
                debug!("Backup removal attempt {}/{} failed: {}", attempt, attempts, e);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    warn!(
        "Giving up on removing {} after {} attempts; it may still be in use",
        path.display(),
        attempts
    );
    ReapOutcome::GaveUp { attempts }
}

/// Reap the backup of `executable` on a background task.
pub fn spawn_reaper(executable: PathBuf, attempts: u32, delay: Duration) -> JoinHandle<ReapOutcome> {
    tokio::spawn(async move { BackupManager::new(executable).reap(attempts, delay).await })
}
