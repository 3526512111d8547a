//! Path normalization.
//!
//! Archive paths are `/`-separated and rooted at the archive. Callers may
//! write `articles`, `/articles` or `/articles/`; all normalize to
//! `articles`. The root normalizes to the empty string.

use crate::error::{ArchiveError, ArchiveResult};

/// Normalize a caller-supplied path to its canonical, root-relative form.
pub fn normalize(path: &str) -> ArchiveResult<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(ArchiveError::InvalidPath {
                    path: path.to_string(),
                    reason: "parent segments are not allowed".into(),
                })
            }
            s if s.contains('\0') => {
                return Err(ArchiveError::InvalidPath {
                    path: path.to_string(),
                    reason: "NUL byte in path".into(),
                })
            }
            s => parts.push(s),
        }
    }
    Ok(parts.join("/"))
}

/// Parent of a normalized path; `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(path.rsplit_once('/').map(|(p, _)| p).unwrap_or(""))
}

/// Final segment of a normalized path.
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, n)| n).unwrap_or(path)
}

/// Join a normalized directory and a relative name.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Lower-cased extension of the final segment, if any.
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_ascii_lowercase()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_slashes() {
        assert_eq!(normalize("/articles").unwrap(), "articles");
        assert_eq!(normalize("articles/").unwrap(), "articles");
        assert_eq!(normalize("//articles//hello.md").unwrap(), "articles/hello.md");
        assert_eq!(normalize("./blog.json").unwrap(), "blog.json");
        assert_eq!(normalize("/").unwrap(), "");
        assert_eq!(normalize("").unwrap(), "");
    }

    #[test]
    fn normalize_rejects_parent_segments() {
        assert!(matches!(
            normalize("/articles/../../etc"),
            Err(ArchiveError::InvalidPath { .. })
        ));
    }

    #[test]
    fn parent_and_name() {
        assert_eq!(parent("articles/2019/post.md"), Some("articles/2019"));
        assert_eq!(parent("blog.json"), Some(""));
        assert_eq!(parent(""), None);
        assert_eq!(file_name("articles/hello.md"), "hello.md");
        assert_eq!(file_name("blog.json"), "blog.json");
    }

    #[test]
    fn join_paths() {
        assert_eq!(join("", "articles"), "articles");
        assert_eq!(join("articles", "hello.md"), "articles/hello.md");
    }

    #[test]
    fn extensions() {
        assert_eq!(extension("articles/Hello.MD").as_deref(), Some("md"));
        assert_eq!(extension("author.png").as_deref(), Some("png"));
        assert_eq!(extension("README"), None);
        assert_eq!(extension(".hidden"), None);
        assert_eq!(extension("trailing."), None);
    }
}
