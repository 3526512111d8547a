//! Value types exchanged with an archive.

use arblog_types::{ArchiveAddress, ObjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Location of the archive manifest holding title and description.
pub const MANIFEST_PATH: &str = "/dat.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
}

/// Metadata for one file or directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub kind: FileKind,
    /// Size in bytes; zero for directories.
    pub size: u64,
    pub ctime: DateTime<Utc>,
    pub mtime: DateTime<Utc>,
}

impl Stat {
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// One entry returned by `readdir`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Path relative to the listed directory. Recursive listings use
    /// `/`-separated names such as `2019/post.md`.
    pub name: String,
    /// Present when the listing was requested with `stat: true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<Stat>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReaddirOptions {
    pub recursive: bool,
    pub stat: bool,
}

impl ReaddirOptions {
    /// Every descendant, with stats.
    pub fn recursive_with_stat() -> Self {
        Self {
            recursive: true,
            stat: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RmdirOptions {
    pub recursive: bool,
}

/// How the text handed to `write_file_encoded` maps to bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Utf8,
    Base64,
    Hex,
}

/// Manifest values applied to a new archive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ForkOptions {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
        }
    }
}

/// Contents of `/dat.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<ForkOptions> for Manifest {
    fn from(options: ForkOptions) -> Self {
        Self {
            title: options.title,
            description: options.description,
        }
    }
}

/// Archive-level metadata as reported by `get_info`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveInfo {
    pub key: String,
    pub url: String,
    /// Number of commits published so far. Zero for a fork that was never committed.
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_owner: bool,
    /// Total bytes across all files in the working tree.
    pub size: u64,
    pub file_count: usize,
}

impl ArchiveInfo {
    pub fn address(&self) -> Option<ArchiveAddress> {
        ArchiveAddress::parse(&self.url).ok()
    }
}

/// Result of a successful commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    pub version: u64,
    pub commit: ObjectId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_info_serializes_camel_case() {
        let address = ArchiveAddress::from_key([9; 32]);
        let info = ArchiveInfo {
            key: address.to_hex(),
            url: address.to_url(),
            version: 3,
            title: Some("Blog".into()),
            description: None,
            is_owner: true,
            size: 10,
            file_count: 2,
        };
        let v = serde_json::to_value(&info).unwrap();
        assert_eq!(v["isOwner"], true);
        assert_eq!(v["fileCount"], 2);
        assert!(v.get("description").is_none());
        assert_eq!(info.address(), Some(address));
    }

    #[test]
    fn manifest_from_fork_options() {
        let m = Manifest::from(ForkOptions::new("T", "D"));
        assert_eq!(m.title.as_deref(), Some("T"));
        assert_eq!(m.description.as_deref(), Some("D"));
    }

    #[test]
    fn stat_kind_helpers() {
        let now = Utc::now();
        let stat = Stat {
            kind: FileKind::Directory,
            size: 0,
            ctime: now,
            mtime: now,
        };
        assert!(stat.is_directory());
        assert!(!stat.is_file());
    }
}
