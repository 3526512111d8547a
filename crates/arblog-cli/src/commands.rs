use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use arblog_archive::{Archive, ArchiveNetwork, ForkOptions, MemoryNetwork, ReaddirOptions};
use arblog_core::{ArchiveBlog, BlogContext, BlogSettings, ForkRequest, Photo};
use colored::Colorize;
use tracing::debug;
use walkdir::WalkDir;

use crate::cli::*;

/// Archives are held by a per-invocation [`MemoryNetwork`].
const EPHEMERAL_NOTE: &str = "(in-process; gone when this command exits)";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let settings = match &cli.config {
        Some(path) => BlogSettings::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => BlogSettings::default(),
    };
    let network = MemoryNetwork::new();
    let format = cli.format;
    match cli.command {
        Command::Import(args) => cmd_import(&network, args, format).await,
        Command::Articles(args) => cmd_articles(&open_blog(&network, &args.dir, settings).await?, format).await,
        Command::Info(args) => cmd_info(&open_blog(&network, &args.dir, settings).await?, format).await,
        Command::Style(args) => cmd_style(&open_blog(&network, &args.dir, settings).await?, format).await,
        Command::Fork(args) => cmd_fork(&network, args, settings, format).await,
    }
}

fn dir_title(dir: &Path) -> String {
    dir.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| dir.display().to_string())
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Copy a directory tree into a new archive and commit it.
pub async fn import_dir(
    network: &MemoryNetwork,
    dir: &Path,
    options: ForkOptions,
) -> anyhow::Result<Arc<dyn Archive>> {
    anyhow::ensure!(dir.is_dir(), "{} is not a directory", dir.display());
    let archive = network.create(options).await?;
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));
    let mut files = 0usize;
    for entry in walker {
        let entry = entry?;
        let relative = entry.path().strip_prefix(dir)?;
        let target = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let target = format!("/{target}");
        if entry.file_type().is_dir() {
            archive
                .mkdir(&target)
                .await
                .with_context(|| format!("creating {target}"))?;
        } else if entry.file_type().is_file() {
            let data = std::fs::read(entry.path())
                .with_context(|| format!("reading {}", entry.path().display()))?;
            archive
                .write_file(&target, &data)
                .await
                .with_context(|| format!("writing {target}"))?;
            files += 1;
        }
    }
    let receipt = archive.commit().await?;
    debug!(archive = %archive.address(), files, version = receipt.version, "imported directory");
    Ok(archive)
}

async fn open_blog(
    network: &MemoryNetwork,
    dir: &Path,
    settings: BlogSettings,
) -> anyhow::Result<ArchiveBlog> {
    let archive = import_dir(network, dir, ForkOptions::new(dir_title(dir), "")).await?;
    let context = BlogContext::new(Arc::new(network.clone()), *archive.address())
        .with_settings(settings);
    Ok(ArchiveBlog::new(context))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_import(
    network: &MemoryNetwork,
    args: ImportArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let title = args.title.unwrap_or_else(|| dir_title(&args.dir));
    let archive = import_dir(network, &args.dir, ForkOptions::new(title, args.description)).await?;
    let info = archive.get_info().await?;
    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(&info)?),
        OutputFormat::Text => {
            println!("{} Imported {}", "✓".green().bold(), args.dir.display());
            println!("  Archive: {} {}", info.url.cyan(), EPHEMERAL_NOTE.dimmed());
            println!("  Files: {} ({} bytes)", info.file_count, info.size);
            Ok(())
        }
    }
}

async fn cmd_articles(blog: &ArchiveBlog, format: OutputFormat) -> anyhow::Result<()> {
    let articles = blog.preload_articles().await?;
    match format {
        OutputFormat::Json => {
            print_json(&serde_json::Value::Array(articles.iter().map(|a| a.to_json()).collect()))
        }
        OutputFormat::Text => {
            if articles.is_empty() {
                println!("No articles.");
            }
            for article in &articles {
                let title = article.title.as_deref().unwrap_or(&article.name);
                println!(
                    "{}  {}  {}",
                    article.date.format("%Y-%m-%d").to_string().yellow(),
                    title.bold(),
                    article.name.dimmed()
                );
            }
            Ok(())
        }
    }
}

async fn cmd_info(blog: &ArchiveBlog, format: OutputFormat) -> anyhow::Result<()> {
    let info = blog.load_info().await?;
    match format {
        OutputFormat::Json => print_json(&info.to_json()),
        OutputFormat::Text => {
            for (key, value) in info.as_map() {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                println!("{}: {}", key.bold(), value);
            }
            if info.config.is_none() {
                println!("{}", "(no blog configuration)".dimmed());
            }
            Ok(())
        }
    }
}

async fn cmd_style(blog: &ArchiveBlog, format: OutputFormat) -> anyhow::Result<()> {
    let captured = Mutex::new(None);
    let found = blog
        .load_style(&|text: &str| {
            if let Ok(mut slot) = captured.lock() {
                *slot = Some(text.to_string());
            }
        })
        .await?;
    let css: Option<String> = captured.into_inner().ok().flatten();
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "style": css })),
        OutputFormat::Text => {
            match css {
                Some(css) if found => println!("{css}"),
                _ => eprintln!("{}", "No stylesheet.".dimmed()),
            }
            Ok(())
        }
    }
}

fn read_photo(path: &Path) -> anyhow::Result<Photo> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file extension", path.display()))?;
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(Photo::from_bytes(ext, &bytes))
}

async fn cmd_fork(
    network: &MemoryNetwork,
    args: ForkArgs,
    settings: BlogSettings,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut request = ForkRequest::new(args.author, args.title, args.description);
    if let Some(path) = &args.photo {
        request = request.with_photo(read_photo(path)?);
    }
    let blog = open_blog(network, &args.dir, settings).await?;
    let info = blog.load_info().await?;
    let address = blog.fork(&request, &info).await?;

    let fork = network.open(&address).await?;
    let files: Vec<_> = fork
        .readdir("/", ReaddirOptions::recursive_with_stat())
        .await?
        .into_iter()
        .filter(|e| e.stat.as_ref().is_some_and(|s| s.is_file()))
        .collect();
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "source": blog.address().to_url(),
            "address": address.to_url(),
            "files": files,
        })),
        OutputFormat::Text => {
            println!("{} Forked {}", "✓".green().bold(), blog.address().short_id().dimmed());
            println!("  Archive: {} {}", address.to_url().cyan(), EPHEMERAL_NOTE.dimmed());
            for entry in &files {
                let size = entry.stat.as_ref().map_or(0, |s| s.size);
                println!("  {} {}", format!("/{}", entry.name).yellow(), format!("({size} bytes)").dimmed());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("articles/2019")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join(".git/HEAD"), "ref").unwrap();
        std::fs::write(root.join("articles/a.md"), "date: 2019-01-01\ntitle: A\n\na").unwrap();
        std::fs::write(root.join("articles/2019/b.md"), "date: 2019-02-01\ntitle: B\n\nb").unwrap();
        std::fs::write(root.join("blog.json"), r#"{"author":"Ada"}"#).unwrap();
        std::fs::write(root.join("style.css"), "h1 {}").unwrap();
        dir
    }

    #[tokio::test]
    async fn import_copies_visible_files() {
        let dir = blog_dir();
        let network = MemoryNetwork::new();
        let archive = import_dir(&network, dir.path(), ForkOptions::new("T", ""))
            .await
            .unwrap();
        let reopened = network.open(archive.address()).await.unwrap();
        assert_eq!(
            reopened.read_file("/articles/2019/b.md").await.unwrap(),
            b"date: 2019-02-01\ntitle: B\n\nb".to_vec()
        );
        assert!(reopened.read_file("/.git/HEAD").await.is_err());
    }

    #[tokio::test]
    async fn imported_blog_loads() {
        let dir = blog_dir();
        let network = MemoryNetwork::new();
        let blog = open_blog(&network, dir.path(), BlogSettings::default())
            .await
            .unwrap();
        let articles = blog.preload_articles().await.unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title.as_deref(), Some("B"));
        assert_eq!(blog.load_info().await.unwrap().author(), Some("Ada"));
        assert_eq!(blog.read_style().await.unwrap(), "h1 {}");
    }

    #[tokio::test]
    async fn import_rejects_files() {
        let dir = blog_dir();
        let network = MemoryNetwork::new();
        let result = import_dir(&network, &dir.path().join("style.css"), ForkOptions::default()).await;
        assert!(result.is_err());
    }

    #[test]
    fn photo_extension_required() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo");
        std::fs::write(&path, [1, 2, 3]).unwrap();
        assert!(read_photo(&path).is_err());
        let png = dir.path().join("me.png");
        std::fs::write(&png, [1, 2, 3]).unwrap();
        assert_eq!(read_photo(&png).unwrap().ext, "png");
    }
}
