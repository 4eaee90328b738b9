//! Typed directory tree.
//!
//! Listing documents are untyped JSON: every node has `name`, `path` and `size`,
//! directories carry `files`/`dirs` arrays, files carry one `*_url` field per
//! mirror. They are decoded into [`Node`] once, so the rest of the code never
//! pokes at raw JSON.
//!
//! ```json
//! {
//!   "name": "root", "path": "",
//!   "dirs": [{ "name": "math", "path": "math", "files": [
//!       { "name": "final.pdf", "path": "math/final.pdf", "size": 2048,
//!         "cf_url": "https://...", "github_raw_url": "https://..." }
//!   ]}]
//! }
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;

/// A file in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    /// Size in bytes, when the listing publishes one.
    pub size: Option<u64>,
    /// Download URL per mirror key (`cf_url`, `github_raw_url`, ...).
    pub urls: BTreeMap<String, String>,
}

impl FileEntry {
    /// URL published under `file_key`, if present and non-empty.
    #[must_use]
    pub fn url_for(&self, file_key: &str) -> Option<&str> {
        self.urls.get(file_key).map(String::as_str).filter(|url| !url.is_empty())
    }
}

/// A directory in a listing. Sub-directories come before files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub size: Option<u64>,
    pub children: Vec<Node>,
}

/// One node of a decoded listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawNode")]
pub enum Node {
    File(FileEntry),
    Directory(DirectoryEntry),
}

#[derive(Deserialize)]
struct RawNode {
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    size: Option<serde_json::Value>,
    #[serde(default)]
    files: Option<Vec<RawNode>>,
    #[serde(default)]
    dirs: Option<Vec<RawNode>>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

fn parse_size(value: Option<&serde_json::Value>) -> Option<u64> {
    match value? {
        serde_json::Value::Number(n) => {
            n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        }
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl RawNode {
    fn into_file(self) -> FileEntry {
        let urls = self
            .extra
            .into_iter()
            .filter(|(key, _)| key.ends_with("_url"))
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(url) => Some((key, url)),
                _ => None,
            })
            .collect();
        FileEntry {
            size: parse_size(self.size.as_ref()),
            name: self.name,
            path: self.path,
            urls,
        }
    }

    /// Entries under `dirs` are directories and entries under `files` are
    /// files, whatever keys they carry themselves.
    fn into_directory(self) -> DirectoryEntry {
        let dirs = self
            .dirs
            .unwrap_or_default()
            .into_iter()
            .map(|raw| Node::Directory(raw.into_directory()));
        let files = self
            .files
            .unwrap_or_default()
            .into_iter()
            .map(|raw| Node::File(raw.into_file()));

        DirectoryEntry {
            size: parse_size(self.size.as_ref()),
            children: dirs.chain(files).collect(),
            name: self.name,
            path: self.path,
        }
    }
}

/// Only the document root is classified by its own keys: without `files` or
/// `dirs` it is a single file.
impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        if raw.files.is_none() && raw.dirs.is_none() {
            Self::File(raw.into_file())
        } else {
            Self::Directory(raw.into_directory())
        }
    }
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_string()
}

impl Node {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File(file) => &file.name,
            Self::Directory(dir) => &dir.name,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::File(file) => &file.path,
            Self::Directory(dir) => &dir.path,
        }
    }

    #[must_use]
    pub fn size(&self) -> Option<u64> {
        match self {
            Self::File(file) => file.size,
            Self::Directory(dir) => dir.size,
        }
    }

    /// Direct children; empty for files.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::File(_) => &[],
            Self::Directory(dir) => &dir.children,
        }
    }

    /// Every file below this node, depth first.
    #[must_use]
    pub fn files(&self) -> Vec<&FileEntry> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a FileEntry>) {
        match self {
            Self::File(file) => out.push(file),
            Self::Directory(dir) => {
                for child in &dir.children {
                    child.collect_files(out);
                }
            }
        }
    }

    /// Files whose name contains `query`, ignoring case.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&FileEntry> {
        let query = query.to_lowercase();
        self.files()
            .into_iter()
            .filter(|file| file.name.to_lowercase().contains(&query))
            .collect()
    }

    /// Node whose `path` equals `path`; `""` is the node itself.
    ///
    /// Backslashes and leading/trailing slashes are ignored on both sides.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Node> {
        let wanted = normalize_path(path);
        if wanted.is_empty() {
            return Some(self);
        }
        self.find_normalized(&wanted)
    }

    fn find_normalized(&self, wanted: &str) -> Option<&Node> {
        if normalize_path(self.path()) == wanted {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find_normalized(wanted))
    }
}

/// Human-readable size, in the units the listing UI uses.
///
/// # Examples
///
/// ```rust
/// use jnu_exam::listing::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
