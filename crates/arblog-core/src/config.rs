//! The blog configuration file, `/blog.json`.

use arblog_archive::Archive;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BlogError, BlogResult};

/// Author-level settings stored next to the articles.
///
/// The document is kept as the JSON object it was read from, so keys of any
/// shape survive and surface through [`BlogInfo`](crate::BlogInfo). A fork
/// only ever writes `author` and `display`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlogConfig(Map<String, Value>);

impl BlogConfig {
    /// Configuration holding only `author`.
    pub fn with_author(author: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.set("author", author.into());
        config
    }

    /// Parse a configuration document. Anything but a JSON object is
    /// [`BlogError::ConfigInvalid`].
    pub fn from_slice(path: &str, bytes: &[u8]) -> BlogResult<Self> {
        serde_json::from_slice::<Map<String, Value>>(bytes)
            .map(Self)
            .map_err(|source| BlogError::ConfigInvalid {
                path: path.to_string(),
                source,
            })
    }

    /// Pretty-printed JSON, as written to the archive.
    pub fn to_json_bytes(&self) -> BlogResult<Vec<u8>> {
        serde_json::to_vec(&self.0).map_err(|e| BlogError::Serialization(e.to_string()))
    }

    /// Raw value of `key`, whatever its JSON type.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert or replace `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// The author's name, when it is a plain string.
    pub fn author(&self) -> Option<&str> {
        self.get_str("author")
    }

    /// Archive path of the author photo.
    pub fn display(&self) -> Option<&str> {
        self.get_str("display")
    }

    /// Every key, as read.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Read and parse the configuration at `path`.
pub async fn read_config(archive: &dyn Archive, path: &str) -> BlogResult<BlogConfig> {
    let bytes = archive
        .read_file(path)
        .await
        .map_err(|source| BlogError::ConfigUnavailable {
            path: path.to_string(),
            source,
        })?;
    BlogConfig::from_slice(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_serializes_author_only() {
        let bytes = BlogConfig::with_author("Ada").to_json_bytes().unwrap();
        assert_eq!(
            serde_json::from_slice::<Value>(&bytes).unwrap(),
            serde_json::json!({ "author": "Ada" })
        );
    }

    #[test]
    fn unknown_keys_are_kept() {
        let config = BlogConfig::from_slice(
            "/blog.json",
            br#"{"author":"Ada","display":"/author.png","theme":"dark","links":[1,2]}"#,
        )
        .unwrap();
        assert_eq!(config.display(), Some("/author.png"));
        assert_eq!(config.get("theme"), Some(&Value::from("dark")));
        assert_eq!(config.get("links"), Some(&serde_json::json!([1, 2])));
    }

    #[test]
    fn non_string_known_keys_do_not_invalidate() {
        let config = BlogConfig::from_slice(
            "/blog.json",
            br#"{"author":{"name":"Ada"},"display":"/author.png","theme":"dark"}"#,
        )
        .unwrap();
        assert_eq!(config.author(), None);
        assert_eq!(config.get("author"), Some(&serde_json::json!({ "name": "Ada" })));
        assert_eq!(config.display(), Some("/author.png"));
    }

    #[test]
    fn invalid_json() {
        let err = BlogConfig::from_slice("/blog.json", b"{ nope").unwrap_err();
        assert!(matches!(err, BlogError::ConfigInvalid { .. }));
        let err = BlogConfig::from_slice("/blog.json", b"[1, 2]").unwrap_err();
        assert!(matches!(err, BlogError::ConfigInvalid { .. }));
        assert!(err.is_recoverable());
    }
}
