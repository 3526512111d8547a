//! Blog layout settings.
//!
//! The defaults describe the layout every arblog archive uses:
//!
//! ```toml
//! articles_dir = "/articles"
//! config_path = "/blog.json"
//! style_path = "/style.css"
//! article_order = "newest-first"
//!
//! [seed_article]
//! name = "hello.md"
//! title = "First Post"
//! body = "This is my first post."
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::article::ArticleOrder;
use crate::error::{BlogError, BlogResult};

/// The article written into every fresh fork.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedArticle {
    /// File name inside the articles directory.
    pub name: String,
    pub title: String,
    pub body: String,
}

impl Default for SeedArticle {
    fn default() -> Self {
        Self {
            name: "hello.md".into(),
            title: "First Post".into(),
            body: "This is my first post.".into(),
        }
    }
}

/// Where a blog keeps its files, how articles are ordered, and what a fresh
/// fork starts with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogSettings {
    pub articles_dir: String,
    pub config_path: String,
    pub style_path: String,
    pub article_order: ArticleOrder,
    pub seed_article: SeedArticle,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            articles_dir: "/articles".into(),
            config_path: "/blog.json".into(),
            style_path: "/style.css".into(),
            article_order: ArticleOrder::default(),
            seed_article: SeedArticle::default(),
        }
    }
}

impl BlogSettings {
    /// Parse and validate settings from TOML text. Missing keys keep their
    /// defaults.
    pub fn from_toml_str(text: &str) -> BlogResult<Self> {
        let settings: Self = toml::from_str(text).map_err(|e| BlogError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a TOML file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> BlogResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BlogError::Settings(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Render the settings as TOML.
    pub fn to_toml_string(&self) -> BlogResult<String> {
        toml::to_string_pretty(self).map_err(|e| BlogError::Serialization(e.to_string()))
    }

    /// Archive path of the seed article.
    pub fn seed_path(&self) -> String {
        format!(
            "{}/{}",
            self.articles_dir.trim_end_matches('/'),
            self.seed_article.name
        )
    }

    fn validate(&self) -> BlogResult<()> {
        for (field, value) in [
            ("articles_dir", &self.articles_dir),
            ("config_path", &self.config_path),
            ("style_path", &self.style_path),
        ] {
            if value.trim_matches('/').is_empty() {
                return Err(BlogError::Settings(format!("{field} must name a path below the root")));
            }
        }
        let name = &self.seed_article.name;
        if name.is_empty() || name.contains('/') {
            return Err(BlogError::Settings(format!(
                "seed_article.name must be a plain file name, got {name:?}"
            )));
        }
        if !crate::article::is_document(name) {
            return Err(BlogError::Settings(format!(
                "seed_article.name {name:?} is not a document file"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_layout() {
        let s = BlogSettings::default();
        assert_eq!(s.articles_dir, "/articles");
        assert_eq!(s.config_path, "/blog.json");
        assert_eq!(s.style_path, "/style.css");
        assert_eq!(s.article_order, ArticleOrder::NewestFirst);
        assert_eq!(s.seed_path(), "/articles/hello.md");
        assert_eq!(s.seed_article.title, "First Post");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let s = BlogSettings::from_toml_str(
            "article_order = \"oldest-first\"\n[seed_article]\ntitle = \"Hi\"\n",
        )
        .unwrap();
        assert_eq!(s.article_order, ArticleOrder::OldestFirst);
        assert_eq!(s.seed_article.title, "Hi");
        assert_eq!(s.seed_article.name, "hello.md");
        assert_eq!(s.articles_dir, "/articles");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            BlogSettings::from_toml_str("articles_dir = \"/\""),
            Err(BlogError::Settings(_))
        ));
        assert!(matches!(
            BlogSettings::from_toml_str("[seed_article]\nname = \"hello.txt\""),
            Err(BlogError::Settings(_))
        ));
        assert!(matches!(
            BlogSettings::from_toml_str("article_order = \"sideways\""),
            Err(BlogError::Settings(_))
        ));
    }

    #[test]
    fn toml_roundtrip() {
        let s = BlogSettings::default();
        let text = s.to_toml_string().unwrap();
        assert_eq!(BlogSettings::from_toml_str(&text).unwrap(), s);
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "style_path = \"/theme/main.css\"").unwrap();
        let s = BlogSettings::from_file(file.path()).unwrap();
        assert_eq!(s.style_path, "/theme/main.css");

        let missing = file.path().with_extension("missing");
        assert!(BlogSettings::from_file(missing).is_err());
    }
}
