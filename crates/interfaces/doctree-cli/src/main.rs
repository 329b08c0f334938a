use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use doctree_cli::{commands, CliFileType};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream rows of a tree as JSON lines
    List {
        tree: Utf8PathBuf,
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,
        #[arg(short, long)]
        recursive: bool,
    },
    /// Print URIs of files matching a type
    Matching {
        tree: Utf8PathBuf,
        #[arg(long = "type", value_enum, default_value_t = CliFileType::Any)]
        file_type: CliFileType,
    },
    /// Make the cache a by-name mirror of the tree
    Mirror {
        tree: Utf8PathBuf,
        #[arg(long, env = "DOCTREE_CACHE")]
        cache: Option<String>,
    },
    /// Copy files of one type into the cache without evicting
    Pull {
        tree: Utf8PathBuf,
        #[arg(long = "type", value_enum)]
        file_type: CliFileType,
        #[arg(long, env = "DOCTREE_CACHE")]
        cache: Option<String>,
    },
    #[command(name = "cache-one")]
    CacheOne {
        tree: Utf8PathBuf,
        path: String,
        #[arg(long, env = "DOCTREE_CACHE")]
        cache: Option<String>,
    },
    /// List every cached file
    Cached {
        #[arg(long, env = "DOCTREE_CACHE")]
        cache: Option<String>,
    },
    /// Delete the cache directory
    Clear {
        #[arg(long, env = "DOCTREE_CACHE")]
        cache: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("default subscriber")?;

    match cli.command {
        Commands::List {
            tree,
            columns,
            recursive,
        } => {
            commands::cmd_list(tree, columns, recursive).await?;
        }
        Commands::Matching { tree, file_type } => {
            commands::cmd_matching(tree, file_type).await?;
        }
        Commands::Mirror { tree, cache } => {
            let cache = commands::resolve_cache(cache)?;
            commands::cmd_mirror(tree, cache).await?;
        }
        Commands::Pull {
            tree,
            file_type,
            cache,
        } => {
            let cache = commands::resolve_cache(cache)?;
            commands::cmd_pull(tree, cache, file_type).await?;
        }
        Commands::CacheOne { tree, path, cache } => {
            let cache = commands::resolve_cache(cache)?;
            commands::cmd_cache_one(tree, path, cache).await?;
        }
        Commands::Cached { cache } => {
            commands::cmd_cached(commands::resolve_cache(cache)?)?;
        }
        Commands::Clear { cache } => {
            commands::cmd_clear(commands::resolve_cache(cache)?)?;
        }
    }

    Ok(())
}
