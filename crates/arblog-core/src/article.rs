//! Article loading: list the articles directory, parse every document and
//! order the result by date.

use std::collections::BTreeMap;
use std::sync::Arc;

use arblog_archive::{path, Archive, ArchiveError, DirEntry, ReaddirOptions, Stat};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BlogError, BlogResult};
use crate::parser::{DocumentParser, ParsedDocument};

/// Extensions recognized as article documents, compared case-insensitively.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkd", "mkdn"];

/// Whether `name` looks like an article document.
pub fn is_document(name: &str) -> bool {
    path::extension(name).is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext.as_str()))
}

/// One document file read from the articles directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the articles directory.
    pub name: String,
    pub is_document: bool,
    pub stat: Stat,
    pub raw_body: Vec<u8>,
}

impl FileEntry {
    /// Pair a listed file with its raw bytes.
    pub fn new(name: impl Into<String>, stat: Stat, raw_body: Vec<u8>) -> Self {
        let name = name.into();
        let is_document = stat.is_file() && is_document(&name);
        Self {
            name,
            is_document,
            stat,
            raw_body,
        }
    }

    /// Creation time of the file.
    pub fn ctime(&self) -> DateTime<Utc> {
        self.stat.ctime
    }
}

/// A parsed article.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Article {
    /// Path relative to the articles directory, e.g. `2019/post.md`.
    pub name: String,
    /// Full archive path.
    pub path: String,
    /// Parsed date, or the file's creation time when the document has none.
    pub date: DateTime<Utc>,
    pub title: Option<String>,
    pub body: String,
    /// Remaining header fields.
    pub fields: BTreeMap<String, String>,
    pub ctime: DateTime<Utc>,
    pub mtime: DateTime<Utc>,
    pub size: u64,
}

impl Article {
    /// Build an article from a parsed document. A missing date falls back to
    /// the file's creation time.
    pub fn new(entry: &FileEntry, path: String, doc: ParsedDocument) -> Self {
        Self {
            name: entry.name.clone(),
            path,
            date: doc.date.unwrap_or(entry.stat.ctime),
            title: doc.title,
            body: doc.body,
            fields: doc.fields,
            ctime: entry.stat.ctime,
            mtime: entry.stat.mtime,
            size: entry.stat.size,
        }
    }

    /// Look up a field by name. Header fields shadow file metadata.
    pub fn field(&self, key: &str) -> Option<String> {
        if let Some(value) = self.fields.get(key) {
            return Some(value.clone());
        }
        match key {
            "title" => self.title.clone(),
            "date" => Some(self.date.to_rfc3339()),
            "body" => Some(self.body.clone()),
            "name" => Some(self.name.clone()),
            "path" => Some(self.path.clone()),
            "ctime" => Some(self.ctime.to_rfc3339()),
            "mtime" => Some(self.mtime.to_rfc3339()),
            "size" => Some(self.size.to_string()),
            _ => None,
        }
    }

    /// Flat JSON view: file metadata overlaid with every parsed field.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("name".into(), self.name.clone().into());
        map.insert("path".into(), self.path.clone().into());
        map.insert("ctime".into(), self.ctime.to_rfc3339().into());
        map.insert("mtime".into(), self.mtime.to_rfc3339().into());
        map.insert("size".into(), self.size.into());
        map.insert("date".into(), self.date.to_rfc3339().into());
        if let Some(title) = &self.title {
            map.insert("title".into(), title.clone().into());
        }
        map.insert("body".into(), self.body.clone().into());
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone().into());
        }
        serde_json::Value::Object(map)
    }
}

/// Direction of the date sort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArticleOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl ArticleOrder {
    /// Stable sort by date; equal dates keep their listing order.
    pub fn sort(self, articles: &mut [Article]) {
        match self {
            Self::NewestFirst => articles.sort_by(|a, b| b.date.cmp(&a.date)),
            Self::OldestFirst => articles.sort_by(|a, b| a.date.cmp(&b.date)),
        }
    }
}

/// Loads every article of one directory.
#[derive(Clone)]
pub struct ArticleLoader {
    parser: Arc<dyn DocumentParser>,
    dir: String,
    order: ArticleOrder,
}

impl std::fmt::Debug for ArticleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticleLoader")
            .field("dir", &self.dir)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl ArticleLoader {
    /// Loader for the documents below `dir`, parsed with `parser`.
    pub fn new(parser: Arc<dyn DocumentParser>, dir: impl Into<String>, order: ArticleOrder) -> Self {
        Self {
            parser,
            dir: dir.into(),
            order,
        }
    }

    /// The articles directory this loader reads.
    pub fn dir(&self) -> &str {
        &self.dir
    }

    fn article_path(&self, name: &str) -> String {
        format!("{}/{}", self.dir.trim_end_matches('/'), name)
    }

    /// Every document file below the directory with its stat, in listing
    /// order.
    ///
    /// A missing or unreadable directory is [`BlogError::ArticlesUnavailable`].
    pub async fn list(&self, archive: &dyn Archive) -> BlogResult<Vec<(String, Stat)>> {
        let unavailable = |source: ArchiveError| BlogError::ArticlesUnavailable {
            dir: self.dir.clone(),
            source,
        };
        let listing = archive
            .readdir(&self.dir, ReaddirOptions::recursive_with_stat())
            .await
            .map_err(unavailable)?;

        let mut entries = Vec::with_capacity(listing.len());
        for DirEntry { name, stat } in listing {
            if !is_document(&name) {
                continue;
            }
            let stat = match stat {
                Some(stat) => stat,
                None => archive
                    .stat(&self.article_path(&name))
                    .await
                    .map_err(|source| BlogError::ArticleRead {
                        name: name.clone(),
                        source,
                    })?,
            };
            if stat.is_file() {
                entries.push((name, stat));
            }
        }
        Ok(entries)
    }

    async fn load_entry(&self, archive: &dyn Archive, name: &str, stat: &Stat) -> BlogResult<Article> {
        let path = self.article_path(name);
        let raw_body = archive
            .read_file(&path)
            .await
            .map_err(|source| BlogError::ArticleRead {
                name: name.to_string(),
                source,
            })?;
        let entry = FileEntry::new(name, stat.clone(), raw_body);
        let doc = self
            .parser
            .parse(&entry.raw_body)
            .map_err(|source| BlogError::ArticleParse {
                name: entry.name.clone(),
                source,
            })?;
        Ok(Article::new(&entry, path, doc))
    }

    /// Read and parse every document concurrently, then sort.
    ///
    /// One unreadable or unparsable article fails the whole load.
    pub async fn load(&self, archive: &dyn Archive) -> BlogResult<Vec<Article>> {
        let entries = self.list(archive).await?;
        let mut articles = try_join_all(
            entries
                .iter()
                .map(|(name, stat)| self.load_entry(archive, name, stat)),
        )
        .await?;
        self.order.sort(&mut articles);
        debug!(dir = %self.dir, count = articles.len(), "loaded articles");
        Ok(articles)
    }
}
