//! Blog metadata: archive info overlaid with the blog configuration.

use arblog_archive::ArchiveInfo;
use arblog_types::ArchiveAddress;
use serde_json::{Map, Value};

use crate::config::BlogConfig;
use crate::error::{BlogError, BlogResult};

#[derive(Clone, Debug, PartialEq)]
pub struct BlogInfo {
    pub archive: ArchiveInfo,
    pub config: Option<BlogConfig>,
    merged: Map<String, Value>,
}

impl BlogInfo {
    /// Shallow merge: every top-level configuration key replaces the archive
    /// key of the same name.
    pub fn new(archive: ArchiveInfo, config: Option<BlogConfig>) -> BlogResult<Self> {
        let mut merged = match serde_json::to_value(&archive) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(BlogError::Serialization(format!(
                    "archive info serialized to {other}"
                )))
            }
            Err(e) => return Err(BlogError::Serialization(e.to_string())),
        };
        if let Some(config) = &config {
            merged.extend(
                config
                    .as_map()
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone())),
            );
        }
        Ok(Self {
            archive,
            config,
            merged,
        })
    }

    /// Address of the archive the info was read from.
    pub fn address(&self) -> Option<ArchiveAddress> {
        self.archive.address()
    }

    /// A merged value; configuration keys shadow archive keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.merged.get(key)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Blog title, falling back to the archive manifest title.
    pub fn title(&self) -> Option<&str> {
        self.get_str("title")
    }

    /// Blog description, falling back to the archive manifest description.
    pub fn description(&self) -> Option<&str> {
        self.get_str("description")
    }

    /// The configured author, when it is a plain string.
    pub fn author(&self) -> Option<&str> {
        self.get_str("author")
    }

    /// Path of the author photo as configured by the blog.
    pub fn display(&self) -> Option<&str> {
        self.config.as_ref().and_then(BlogConfig::display)
    }

    /// The merged view as a JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.merged
    }

    /// The merged map as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.merged.clone())
    }
}
