//! [`ArchiveBlog`]: one archive presented as a blog.

use std::fmt;
use std::sync::Arc;

use arblog_archive::{Archive, ArchiveNetwork, Clock, SystemClock};
use arblog_types::ArchiveAddress;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::article::{Article, ArticleLoader};
use crate::config::{self, BlogConfig};
use crate::error::{BlogError, BlogResult};
use crate::fork::{self, ForkRequest};
use crate::info::BlogInfo;
use crate::parser::{DocumentParser, HeaderParser};
use crate::settings::BlogSettings;
use crate::style::{self, StyleSink};

/// Everything an [`ArchiveBlog`] depends on.
#[derive(Clone)]
pub struct BlogContext {
    pub network: Arc<dyn ArchiveNetwork>,
    pub address: ArchiveAddress,
    pub parser: Arc<dyn DocumentParser>,
    pub settings: BlogSettings,
    /// Source of "today" for seed articles.
    pub clock: Arc<dyn Clock>,
}

impl BlogContext {
    /// Context with the header parser, default settings and the system clock.
    pub fn new(network: Arc<dyn ArchiveNetwork>, address: ArchiveAddress) -> Self {
        Self {
            network,
            address,
            parser: Arc::new(HeaderParser),
            settings: BlogSettings::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_settings(mut self, settings: BlogSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl fmt::Debug for BlogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlogContext")
            .field("address", &self.address)
            .field("settings", &self.settings)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// A blog backed by one archive.
///
/// The archive is opened on first use and the handle is kept for the life
/// of the blog.
pub struct ArchiveBlog {
    context: BlogContext,
    archive: OnceCell<Arc<dyn Archive>>,
}

impl ArchiveBlog {
    /// A blog over `context.address`. Nothing is opened until first use.
    pub fn new(context: BlogContext) -> Self {
        Self {
            context,
            archive: OnceCell::new(),
        }
    }

    /// Address of the blog's archive.
    pub fn address(&self) -> &ArchiveAddress {
        &self.context.address
    }

    /// Settings this blog was created with.
    pub fn settings(&self) -> &BlogSettings {
        &self.context.settings
    }

    /// The archive handle, opening it if needed.
    pub async fn archive(&self) -> BlogResult<Arc<dyn Archive>> {
        let address = self.context.address;
        let handle = self
            .archive
            .get_or_try_init(|| async {
                let archive = self
                    .context
                    .network
                    .open(&address)
                    .await
                    .map_err(|source| BlogError::Open { address, source })?;
                debug!(archive = %address.short_id(), "blog archive opened");
                Ok::<_, BlogError>(archive)
            })
            .await?;
        Ok(Arc::clone(handle))
    }

    /// Loader configured from the blog's settings and parser.
    pub fn article_loader(&self) -> ArticleLoader {
        ArticleLoader::new(
            Arc::clone(&self.context.parser),
            self.context.settings.articles_dir.clone(),
            self.context.settings.article_order,
        )
    }

    /// All articles, failing if the articles directory is unavailable.
    pub async fn list_articles(&self) -> BlogResult<Vec<Article>> {
        let archive = self.archive().await?;
        self.article_loader().load(archive.as_ref()).await
    }

    /// All articles; a missing articles directory yields none.
    pub async fn preload_articles(&self) -> BlogResult<Vec<Article>> {
        recover(self.list_articles().await, "no articles", Vec::new)
    }

    /// The blog configuration, failing if it is missing or not a JSON object.
    pub async fn read_config(&self) -> BlogResult<BlogConfig> {
        let archive = self.archive().await?;
        config::read_config(archive.as_ref(), &self.context.settings.config_path).await
    }

    /// Archive info merged with the blog configuration. A missing or
    /// invalid configuration leaves the archive info as is.
    pub async fn load_info(&self) -> BlogResult<BlogInfo> {
        let archive = self.archive().await?;
        let info = archive.get_info().await.map_err(BlogError::Info)?;
        let config = recover(
            self.read_config().await.map(Some),
            "configuration not found",
            || None,
        )?;
        BlogInfo::new(info, config)
    }

    /// The stylesheet text, failing if it is missing or unreadable.
    pub async fn read_style(&self) -> BlogResult<String> {
        let archive = self.archive().await?;
        style::read_style(archive.as_ref(), &self.context.settings.style_path).await
    }

    /// Hand the stylesheet to `sink`. Returns whether there was one.
    pub async fn load_style(&self, sink: &dyn StyleSink) -> BlogResult<bool> {
        let css = recover(self.read_style().await.map(Some), "stylesheet not found", || None)?;
        match css {
            Some(css) => {
                sink.inject(&css);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Fork this blog for a new author and return the new archive's address.
    ///
    /// `source` is this blog's info as returned by [`load_info`](Self::load_info);
    /// its configured photo is removed from the fork.
    pub async fn fork(&self, request: &ForkRequest, source: &BlogInfo) -> BlogResult<ArchiveAddress> {
        let today = self.context.clock.now().date_naive();
        fork::run(
            self.context.network.as_ref(),
            &self.context.address,
            source,
            request,
            &self.context.settings,
            today,
        )
        .await
    }
}

impl fmt::Debug for ArchiveBlog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveBlog")
            .field("address", &self.context.address)
            .field("opened", &self.archive.initialized())
            .finish()
    }
}

fn recover<T>(result: BlogResult<T>, what: &str, fallback: impl FnOnce() -> T) -> BlogResult<T> {
    match result {
        Err(err) if err.is_recoverable() => {
            warn!(error = %err, "{what}");
            Ok(fallback())
        }
        other => other,
    }
}
