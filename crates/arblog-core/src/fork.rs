//! Forking a blog into a fresh archive owned by a new author.
//!
//! The fork keeps everything the source archive carries except its
//! articles and author photo, and starts out with a minimal `blog.json`
//! and a single seed article.

use std::fmt;

use arblog_archive::{
    Archive, ArchiveNetwork, ArchiveResult, Encoding, ForkOptions, RmdirOptions,
};
use arblog_types::ArchiveAddress;
use base64::Engine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BlogConfig;
use crate::error::{BlogError, BlogResult};
use crate::info::BlogInfo;
use crate::settings::BlogSettings;

/// Author photo carried by a fork request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    /// File extension, e.g. `png`. A leading dot is ignored; case is kept.
    pub ext: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl Photo {
    /// A photo whose `data` is already base64.
    pub fn new(ext: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            ext: ext.into(),
            data: data.into(),
        }
    }

    /// Encode raw image bytes.
    pub fn from_bytes(ext: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(ext, base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    fn validated_ext(&self) -> BlogResult<String> {
        let ext = self.ext.trim().trim_start_matches('.');
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(BlogError::InvalidRequest(format!(
                "photo extension {:?} is not a plain file extension",
                self.ext
            )));
        }
        Ok(ext.to_string())
    }

    /// Archive path the photo is written to.
    pub fn display_path(&self) -> BlogResult<String> {
        Ok(format!("/author.{}", self.validated_ext()?))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkRequest {
    pub author: String,
    /// Manifest title of the new archive.
    pub title: String,
    /// Manifest description of the new archive.
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Photo>,
}

impl ForkRequest {
    /// A request without a photo.
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            title: title.into(),
            description: description.into(),
            photo: None,
        }
    }

    /// Attach an author photo.
    pub fn with_photo(mut self, photo: Photo) -> Self {
        self.photo = Some(photo);
        self
    }
}

/// The steps of a fork, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForkStep {
    Fork,
    RemovePhoto,
    ClearArticles,
    CreateArticles,
    WritePhoto,
    WriteConfig,
    WriteSeed,
    Commit,
}

impl fmt::Display for ForkStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fork => "fork",
            Self::RemovePhoto => "remove photo",
            Self::ClearArticles => "clear articles",
            Self::CreateArticles => "create articles",
            Self::WritePhoto => "write photo",
            Self::WriteConfig => "write config",
            Self::WriteSeed => "write seed article",
            Self::Commit => "commit",
        };
        f.write_str(name)
    }
}

trait StepExt<T> {
    fn at(self, step: ForkStep) -> BlogResult<T>;
}

impl<T> StepExt<T> for ArchiveResult<T> {
    fn at(self, step: ForkStep) -> BlogResult<T> {
        self.map_err(|source| BlogError::Fork { step, source })
    }
}

fn tolerate_missing(result: ArchiveResult<()>) -> ArchiveResult<()> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

/// Contents of the seed article.
pub fn seed_document(settings: &BlogSettings, today: NaiveDate) -> String {
    format!(
        "date: {}\ntitle: {}\n\n{}",
        today.format("%Y-%m-%d"),
        settings.seed_article.title,
        settings.seed_article.body
    )
}

/// Fork `source_address` and reset the copy to a fresh blog.
///
/// Nothing is retried or rolled back: the first failing step aborts, and an
/// uncommitted fork stays unreachable.
pub(crate) async fn run(
    network: &dyn ArchiveNetwork,
    source_address: &ArchiveAddress,
    source: &BlogInfo,
    request: &ForkRequest,
    settings: &BlogSettings,
    today: NaiveDate,
) -> BlogResult<ArchiveAddress> {
    let display = request.photo.as_ref().map(Photo::display_path).transpose()?;

    let fork: std::sync::Arc<dyn Archive> = network
        .fork(
            source_address,
            ForkOptions::new(&request.title, &request.description),
        )
        .await
        .at(ForkStep::Fork)?;
    debug!(source = %source_address.short_id(), fork = %fork.address().short_id(), "fork created");

    if let Some(inherited) = source.display() {
        tolerate_missing(fork.unlink(inherited).await).at(ForkStep::RemovePhoto)?;
    }

    tolerate_missing(
        fork.rmdir(&settings.articles_dir, RmdirOptions { recursive: true })
            .await,
    )
    .at(ForkStep::ClearArticles)?;
    fork.mkdir(&settings.articles_dir)
        .await
        .at(ForkStep::CreateArticles)?;

    let mut config = BlogConfig::with_author(&request.author);
    if let (Some(photo), Some(path)) = (&request.photo, display) {
        fork.write_file_encoded(&path, &photo.data, Encoding::Base64)
            .await
            .at(ForkStep::WritePhoto)?;
        config.set("display", path);
    }

    let config_bytes = config.to_json_bytes()?;
    fork.write_file(&settings.config_path, &config_bytes)
        .await
        .at(ForkStep::WriteConfig)?;

    fork.write_file(&settings.seed_path(), seed_document(settings, today).as_bytes())
        .await
        .at(ForkStep::WriteSeed)?;

    let receipt = fork.commit().await.at(ForkStep::Commit)?;
    let address = *fork.address();
    info!(
        source = %source_address.short_id(),
        fork = %address,
        version = receipt.version,
        author = %request.author,
        "blog forked"
    );
    Ok(address)
}
