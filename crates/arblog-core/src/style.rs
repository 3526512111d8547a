//! Stylesheet loading.

use arblog_archive::Archive;

use crate::error::{BlogError, BlogResult};

/// Receives the blog's stylesheet, e.g. to inject it into a page.
pub trait StyleSink: Send + Sync {
    fn inject(&self, css: &str);
}

impl<F> StyleSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn inject(&self, css: &str) {
        self(css)
    }
}

/// Read the stylesheet at `path` as text.
pub async fn read_style(archive: &dyn Archive, path: &str) -> BlogResult<String> {
    archive
        .read_text(path)
        .await
        .map_err(|source| BlogError::StyleUnavailable {
            path: path.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closures_are_sinks() {
        let seen = Mutex::new(Vec::new());
        let sink = |css: &str| seen.lock().unwrap().push(css.to_string());
        sink.inject("body { color: red }");
        assert_eq!(seen.lock().unwrap().as_slice(), ["body { color: red }"]);
    }
}
