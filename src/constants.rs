//! Global constants used throughout the downloader.
//!
//! Timeouts, retry parameters, file names and other values that are shared
//! between modules. Most of them are only defaults: the user-facing knobs live
//! in [`crate::config::AppConfig`].

use std::time::Duration;

/// Version of the running binary, taken from the crate manifest.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Where the update/notice metadata document is published.
pub const DEFAULT_METADATA_URL: &str = "https://jnuexam.gubaiovo.com/metadata.json";

/// Product name used to derive the executable file name after an update.
pub const DEFAULT_PRODUCT_NAME: &str = "JNU-EXAM-Downloader";

/// Timeout for fetching the update metadata document.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for fetching a source list document.
pub const SOURCE_LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for fetching a directory listing document.
pub const DIRECTORY_TIMEOUT: Duration = Duration::from_secs(15);

/// Buffer size used when writing downloaded bodies to disk.
pub const DOWNLOAD_CHUNK_SIZE: usize = 32 * 1024;

/// File name of the in-progress self-update download, inside the install dir.
pub const UPDATE_TEMP_FILE_NAME: &str = "update.tmp";

/// Suffix appended to the executable path to form the backup binary path.
pub const BACKUP_SUFFIX: &str = ".old";

/// How many times the reaper tries to delete a stale backup binary.
pub const REAPER_ATTEMPTS: u32 = 5;

/// Delay between two reaper attempts.
pub const REAPER_DELAY: Duration = Duration::from_secs(1);

/// Attempts at moving the backup back when installing the new executable fails.
pub const ROLLBACK_ATTEMPTS: u32 = 3;

/// Delay between rollback attempts.
pub const ROLLBACK_DELAY: Duration = Duration::from_secs(1);

/// Environment variable that disables terminal progress bars.
pub const NO_PROGRESS_ENV: &str = "JNU_EXAM_NO_PROGRESS";

/// Environment variable pointing at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "JNU_EXAM_CONFIG";

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("jnu-exam/", env!("CARGO_PKG_VERSION"));
