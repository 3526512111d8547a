use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arblog",
    about = "arblog: a blog kept in a versioned peer-to-peer archive",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Blog layout settings (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import a directory into a new archive and print its address
    ///
    /// Archives live in an in-process network that is discarded when the
    /// command exits, so the printed address only names the archive within
    /// this run.
    Import(ImportArgs),
    /// List a blog's articles, newest first
    Articles(SourceArgs),
    /// Show a blog's metadata
    Info(SourceArgs),
    /// Print a blog's stylesheet
    Style(SourceArgs),
    /// Fork a blog for a new author
    ///
    /// The directory is imported and forked inside an in-process network that
    /// is discarded when the command exits. The fork's files are listed; its
    /// address cannot be opened by a later invocation.
    Fork(ForkArgs),
}

#[derive(Args)]
pub struct SourceArgs {
    /// Directory holding the blog files
    pub dir: PathBuf,
}

#[derive(Args)]
pub struct ImportArgs {
    pub dir: PathBuf,
    /// Archive title (defaults to the directory name)
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Args)]
pub struct ForkArgs {
    pub dir: PathBuf,
    #[arg(long)]
    pub author: String,
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Author photo; its extension names the stored file
    #[arg(long)]
    pub photo: Option<PathBuf>,
}
