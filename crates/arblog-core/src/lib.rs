//! The blog layer of arblog.
//!
//! An [`ArchiveBlog`] presents one archive as a blog:
//!
//! - **articles** -- every document file below `/articles`, parsed and
//!   ordered by date ([`ArchiveBlog::preload_articles`])
//! - **info** -- archive metadata merged with `/blog.json`
//!   ([`ArchiveBlog::load_info`])
//! - **style** -- `/style.css`, handed to a [`StyleSink`]
//!   ([`ArchiveBlog::load_style`])
//! - **fork** -- clone the blog into a new archive holding a single starter
//!   article ([`ArchiveBlog::fork`])
//!
//! Each load boundary also has a strict variant (`list_articles`,
//! `read_config`, `read_style`) returning the raw [`BlogError`]; the
//! `preload_*`/`load_*` entry points substitute defaults for the
//! [recoverable](BlogError::is_recoverable) kinds and log them.

pub mod article;
pub mod blog;
pub mod config;
pub mod error;
pub mod fork;
pub mod info;
pub mod parser;
pub mod settings;
pub mod style;

pub use article::{is_document, Article, ArticleLoader, ArticleOrder, FileEntry};
pub use blog::{ArchiveBlog, BlogContext};
pub use config::BlogConfig;
pub use error::{BlogError, BlogResult};
pub use fork::{ForkRequest, ForkStep, Photo};
pub use info::BlogInfo;
pub use parser::{DocumentParser, HeaderParser, ParseError, ParsedDocument};
pub use settings::{BlogSettings, SeedArticle};
pub use style::StyleSink;

pub use arblog_archive::{ArchiveInfo, ArchiveNetwork, MemoryNetwork};
pub use arblog_types::ArchiveAddress;
