use crate::config::AppConfig;
use crate::constants::UPDATE_TEMP_FILE_NAME;
use crate::core::{DownloaderError, Result};
use crate::download::{DownloadOptions, Downloaded, stream_to_file};
use crate::http;
use crate::progress::{EventSink, ProgressReporter};
use crate::upgrade::backup::{BackupManager, backup_path_for};
use crate::upgrade::verification::{ChecksumVerifier, Verification};
use crate::utils::platform::exe_suffix;
use futures::Stream;
use std::convert::Infallible;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// Every path a self-update touches.
///
/// ```text
/// <install_dir>/<current executable>        moved to the backup path
/// <install_dir>/<current executable>.old    backup, removed by the reaper
/// <install_dir>/update.tmp                  download target
/// <install_dir>/<product_name>[.exe]        where the new binary lands
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePaths {
    pub current_exe: PathBuf,
    pub target: PathBuf,
    pub backup: PathBuf,
    pub temp: PathBuf,
}

impl UpdatePaths {
    /// Paths for an executable at `current_exe`.
    pub fn for_executable(current_exe: PathBuf, product_name: &str) -> Self {
        let install_dir = current_exe.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            target: install_dir.join(format!("{product_name}{}", exe_suffix())),
            backup: backup_path_for(&current_exe),
            temp: install_dir.join(UPDATE_TEMP_FILE_NAME),
            current_exe,
        }
    }

    /// Paths for the running process.
    pub fn resolve(product_name: &str) -> Result<Self> {
        let current_exe = std::env::current_exe().map_err(|e| DownloaderError::Other {
            message: format!("Unable to determine the running executable: {e}"),
        })?;
        Ok(Self::for_executable(current_exe, product_name))
    }
}

/// Downloads, verifies, and swaps in a new executable.
///
/// # Update sequence
///
/// 1. Stream the binary to `update.tmp`, hashing it and emitting
///    `update_progress` when the server sends a content length.
/// 2. If a checksum was published, compare it with the digest. A mismatch
///    deletes `update.tmp` and fails with
///    [`DownloaderError::ChecksumMismatch`]; the executable is untouched. An
///    empty checksum skips this step (see [`ChecksumVerifier`]).
/// 3. Remove any previous `.old` backup. Failure here is only logged.
/// 4. Rename the executable to `.old`. Failure removes `update.tmp` and stops.
/// 5. Rename `update.tmp` to the target. Failure renames `.old` back to the
///    executable, removes `update.tmp`, and reports the error.
/// 6. On Unix, mark the target `0o755`.
/// 7. [`restart`](Self::restart): launch the target detached and exit with 0.
///
/// Any failure in steps 1-5 leaves the old executable runnable at its path. A
/// crash between steps 4 and 5 is the one case that does not: the executable
/// is then only present as `.old` and must be renamed back by hand.
///
/// Concurrent updates of the same installation are not coordinated here.
///
/// # Examples
///
/// ```rust,no_run
/// use jnu_exam::config::AppConfig;
/// use jnu_exam::progress::LogSink;
/// use jnu_exam::upgrade::SelfUpdater;
/// use std::sync::Arc;
///
/// # async fn example(url: &str, checksum: &str) -> jnu_exam::core::Result<()> {
/// let config = AppConfig::default();
/// let client = jnu_exam::http::build_client()?;
/// let updater = SelfUpdater::from_config(&config, client, Arc::new(LogSink))?;
/// let installed = updater.apply_update(url, checksum).await?;
/// SelfUpdater::restart(&installed)?;
/// # Ok(())
/// # }
/// ```
pub struct SelfUpdater {
    client: reqwest::Client,
    paths: UpdatePaths,
    sink: Arc<dyn EventSink>,
    options: DownloadOptions,
}

impl SelfUpdater {
    pub fn new(client: reqwest::Client, paths: UpdatePaths, sink: Arc<dyn EventSink>) -> Self {
        Self {
            client,
            paths,
            sink,
            options: DownloadOptions::default(),
        }
    }

    /// Updater for the running executable, with timeout and throttle from `config`.
    pub fn from_config(
        config: &AppConfig,
        client: reqwest::Client,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let paths = UpdatePaths::resolve(&config.product_name)?;
        Ok(Self::new(client, paths, sink).with_options(DownloadOptions {
            timeout: config.network.download_timeout(),
            throttle: config.upgrade.progress_throttle(),
        }))
    }

    #[must_use]
    pub const fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn paths(&self) -> &UpdatePaths {
        &self.paths
    }

    /// Run the whole sequence, ending the process on success.
    pub async fn perform_self_update(&self, url: &str, checksum: &str) -> Result<Infallible> {
        let installed = self.apply_update(url, checksum).await?;
        Self::restart(&installed)
    }

    /// Download `url` and install it, returning the path of the new executable.
    ///
    /// Does everything except restarting.
    pub async fn apply_update(&self, url: &str, checksum: &str) -> Result<PathBuf> {
        info!("Starting self-update from {}", url);
        let response = http::get(&self.client, url, self.options.timeout, "download update").await?;
        let total = response.content_length();
        self.apply_stream(response.bytes_stream(), total, checksum).await
    }

    /// Install the binary carried by `stream`.
    ///
    /// `total` is the advertised length, used only for progress.
    pub async fn apply_stream<S, B, E>(
        &self,
        stream: S,
        total: Option<u64>,
        checksum: &str,
    ) -> Result<PathBuf>
    where
        S: Stream<Item = std::result::Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: Display,
    {
        let downloaded = self.download(stream, total).await?;
        self.verify(&downloaded, checksum).await?;
        self.swap().await?;
        Ok(self.paths.target.clone())
    }

    async fn download<S, B, E>(&self, stream: S, total: Option<u64>) -> Result<Downloaded>
    where
        S: Stream<Item = std::result::Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: Display,
    {
        let mut reporter = ProgressReporter::for_update(total, Arc::clone(&self.sink))
            .with_throttle(self.options.throttle);
        let downloaded = stream_to_file(stream, &self.paths.temp, &mut reporter).await?;
        debug!("Downloaded {} bytes to {}", downloaded.bytes, self.paths.temp.display());
        Ok(downloaded)
    }

    async fn verify(&self, downloaded: &Downloaded, checksum: &str) -> Result<()> {
        match ChecksumVerifier::verify(checksum, &downloaded.sha256) {
            Ok(Verification::Verified) => Ok(()),
            Ok(Verification::Skipped) => {
                warn!("Installing update without integrity check");
                Ok(())
            }
            Err(e) => {
                self.remove_temp().await;
                Err(e)
            }
        }
    }

    async fn swap(&self) -> Result<()> {
        let backup = BackupManager::new(self.paths.current_exe.clone());

        backup.remove_stale().await;

        if let Err(e) = backup.stash_current().await {
            self.remove_temp().await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&self.paths.temp, &self.paths.target).await {
            let error = DownloaderError::file_system("install new executable", &self.paths.target, e);
            warn!("{}; rolling back", error);
            let rollback = backup.rollback().await;
            self.remove_temp().await;
            return match rollback {
                Ok(()) => Err(error),
                Err(rollback_err) => Err(DownloaderError::Other {
                    message: format!("{error}; rollback also failed: {rollback_err}"),
                }),
            };
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) =
                fs::set_permissions(&self.paths.target, std::fs::Permissions::from_mode(0o755)).await
            {
                warn!("Could not mark {} executable: {}", self.paths.target.display(), e);
            }
        }

        info!("Installed update at {}", self.paths.target.display());
        Ok(())
    }

    async fn remove_temp(&self) {
        if let Err(e) = fs::remove_file(&self.paths.temp).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("Failed to remove {}: {}", self.paths.temp.display(), e);
        }
    }

    /// Launch `executable` detached from this process, then exit with code 0.
    ///
    /// Returns only if the launch fails.
    pub fn restart(executable: &Path) -> Result<Infallible> {
        info!("Restarting into {}", executable.display());

        let mut command = Command::new(executable);
        command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            command.creation_flags(DETACHED_PROCESS);
        }

        command
            .spawn()
            .map_err(|e| DownloaderError::file_system("launch updated executable", executable, e))?;

        std::process::exit(0)
    }
}
