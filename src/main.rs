//! Verselight - Bible verse search from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use verselight_lib::{get_data_dir, AppState, Config};

#[derive(Parser)]
#[command(name = "verselight", version, about = "Search and read Bible corpora")]
struct Cli {
    /// Data directory (defaults to VERSELIGHT_DATA_DIR or the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available Bibles
    List,
    /// Print a chapter
    Show {
        bible: String,
        book: String,
        chapter: String,
    },
    /// Search a Bible for a literal phrase
    Search {
        bible: String,
        query: String,
        #[arg(long)]
        book: Option<String>,
        #[arg(long, requires = "book")]
        chapter: Option<String>,
        /// Maximum number of results (0 for unlimited)
        #[arg(long)]
        max: Option<i64>,
        #[arg(long)]
        case_sensitive: bool,
        /// Print plain verse text without <mark> tags
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(get_data_dir);
    tracing::debug!("Using data directory: {:?}", data_dir);

    let config = Config::load(&data_dir)?;
    let state = AppState::new(config).context("Failed to initialize application state")?;

    match cli.command {
        Command::List => {
            for bible in state.get_all_bibles().await? {
                println!("{}\t{}\t{} ({})", bible.id, bible.name, bible.version, bible.language);
            }
        }
        Command::Show { bible, book, chapter } => {
            let chapter = state.get_chapter(&bible, &book, &chapter).await?;
            for verse in &chapter.verses {
                println!("{:>3}  {}", verse.number, verse.text);
            }
        }
        Command::Search { bible, query, book, chapter, max, case_sensitive, plain } => {
            let mut options = state.config.default_search_options();
            options.book_filter = book;
            options.chapter_filter = chapter;
            options.case_sensitive |= case_sensitive;
            options.highlight_results &= !plain;
            if let Some(max) = max {
                options.max_results = max;
            }

            let results = state.search(&bible, &query, Some(options.clone())).await?;
            for result in &results {
                let label = if result.verse.reference.is_empty() {
                    &result.verse.id
                } else {
                    &result.verse.reference
                };
                println!("{}\t{}", label, state.render_result(result, &options));
            }
            eprintln!("{} result(s)", results.len());
        }
    }

    Ok(())
}
