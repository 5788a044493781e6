//! Fetching remote content: git checkouts and HTTP artifacts.

pub mod git;
pub mod http;

pub use git::GitClient;
pub use http::{sha256_hex, Download, Downloader};
