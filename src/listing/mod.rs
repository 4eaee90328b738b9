//! Remote exam-material listings.
//!
//! - [`sources`] - which mirrors exist and where their directory documents live
//! - [`node`] - the typed directory tree decoded from those documents
//!
//! Directory documents are fetched through [`crate::cache::DirectoryCache`]
//! by [`crate::app::App::fetch_directory`].

pub mod node;
pub mod sources;

pub use node::{DirectoryEntry, FileEntry, Node, format_size};
pub use sources::{SourceConfig, fetch_source_list, parse_source_list};
