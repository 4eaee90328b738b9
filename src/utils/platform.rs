//! Platform-specific helpers.
//!
//! The update metadata document keys its download targets by `<os>-<arch>` using
//! the naming of the build pipeline that publishes the binaries (`linux`,
//! `windows`, `darwin`; `amd64`, `arm64`, `386`). Rust reports `macos` and
//! `x86_64`/`aarch64`, so [`platform_key_for`] translates between the two.

use std::path::PathBuf;

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Executable suffix for the running platform (`".exe"` on Windows, empty elsewhere).
#[must_use]
pub const fn exe_suffix() -> &'static str {
    std::env::consts::EXE_SUFFIX
}

/// Platform key of the running process, e.g. `linux-amd64`.
///
/// # Examples
///
/// ```rust
/// use jnu_exam::utils::platform::platform_key;
///
/// let key = platform_key();
/// assert!(key.contains('-'));
/// assert_eq!(key, key.to_lowercase());
/// ```
#[must_use]
pub fn platform_key() -> String {
    platform_key_for(std::env::consts::OS, std::env::consts::ARCH)
}

/// Normalized `<os>-<arch>` key for an OS/architecture pair as Rust names them.
///
/// Both halves are lowercased; known Rust names are mapped to the metadata
/// document's naming and anything else passes through unchanged.
#[must_use]
pub fn platform_key_for(os: &str, arch: &str) -> String {
    let os = os.to_lowercase();
    let arch = arch.to_lowercase();

    let os = match os.as_str() {
        "macos" => "darwin",
        other => other,
    };
    let arch = match arch.as_str() {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    };

    format!("{os}-{arch}")
}

/// Where downloads go when no output path is given.
///
/// Falls back to `~/Downloads`, then to the current directory.
#[must_use]
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Make a listing file name safe to use as a local file name.
///
/// Replaces characters that are reserved on Windows, drops control characters,
/// trims trailing dots and spaces, and caps the length at 200 characters.
///
/// # Examples
///
/// ```rust
/// use jnu_exam::utils::platform::sanitize_filename;
///
/// assert_eq!(sanitize_filename("a/b:c?.pdf"), "a_b_c_.pdf");
/// assert_eq!(sanitize_filename("notes. "), "notes");
/// ```
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches(['.', ' ']);
    trimmed.chars().take(200).collect()
}
