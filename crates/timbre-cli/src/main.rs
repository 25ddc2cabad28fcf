use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod commands;
mod logging;
mod tui;

use commands::Overrides;

#[derive(Debug, Parser)]
#[command(name = "timbre", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the song catalog CSV (default: ~/.local/share/timbre/metadata.csv)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Vector backend base URL (default: http://localhost:6333)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Collection holding the song vectors
    #[arg(long, global = true)]
    collection: Option<String>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// List catalog songs, optionally filtered by a substring
    Songs {
        /// Case-insensitive text to match against "Artist - Song" labels
        filter: Option<String>,
    },
    /// List the genres available as search filters
    Genres,
    /// Find songs similar to a catalog song
    ///
    /// The song is chosen by its "Artist - Song" label, by its name alone
    /// (no " - ") when that is unique, or by index as "#42". Its stored embedding is
    /// compared against every other song in the vector backend.
    ///
    /// A catalog song always matches itself with the highest score; it is
    /// dropped from the results unless --keep-self is given, so at most
    /// LIMIT - 1 neighbours are shown.
    Similar {
        /// Song label, name, or #index
        label: String,

        /// Number of results to request (1-30)
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=30))]
        limit: Option<u16>,

        /// Only return songs of this genre ("none" for all)
        #[arg(short, long)]
        genre: Option<String>,

        /// Include the song itself in the results
        #[arg(long)]
        keep_self: bool,

        /// Skip resolving playable audio for the results
        #[arg(long)]
        no_audio: bool,
    },
    /// Find catalog songs similar to an audio file
    ///
    /// The file is decoded, embedded with the configured model server, and
    /// its genre is predicted. Requires model_endpoint to be configured.
    Upload {
        /// Audio file (mp3, wav, flac, ogg, m4a)
        file: PathBuf,

        /// Number of results to request (1-30)
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=30))]
        limit: Option<u16>,

        /// Only return songs of this genre ("none" for all)
        #[arg(short, long)]
        genre: Option<String>,

        /// Skip resolving playable audio for the results
        #[arg(long)]
        no_audio: bool,
    },
    /// Browse the catalog and search interactively
    Explore,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Print one value, or the whole config file
    Get {
        /// Config key (e.g. backend_url, logging.level)
        key: Option<String>,
    },
    /// Set a value in the config file
    Set {
        key: String,
        value: String,
    },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // These work even when the config file does not parse.
    if let Commands::Config { command } = &cli.command {
        match command {
            ConfigCommand::Set { key, value } => return commands::config::set_config(key, value),
            ConfigCommand::Path => return commands::config::show_path(),
            ConfigCommand::Example => return commands::config::show_example(),
            ConfigCommand::Init => return commands::config::init_config(),
            ConfigCommand::Show | ConfigCommand::Get { .. } => {}
        }
    }

    let overrides = Overrides {
        catalog: cli.catalog,
        backend_url: cli.backend_url,
        collection: cli.collection,
    };
    let config = overrides.load_config()?;
    logging::init(&config.logging)?;

    match cli.command {
        Commands::Songs { filter } => {
            commands::list_songs(&config, filter.as_deref())?;
        }
        Commands::Genres => {
            commands::list_genres(&config)?;
        }
        Commands::Similar {
            label,
            limit,
            genre,
            keep_self,
            no_audio,
        } => {
            let options = commands::SearchOptions {
                limit: limit.map(usize::from),
                genre,
                keep_self,
                audio: !no_audio,
            };
            commands::run_similar(&config, label, options).await?;
        }
        Commands::Upload {
            file,
            limit,
            genre,
            no_audio,
        } => {
            let options = commands::SearchOptions {
                limit: limit.map(usize::from),
                genre,
                keep_self: false,
                audio: !no_audio,
            };
            commands::run_upload(&config, &file, options).await?;
        }
        Commands::Explore => {
            tui::run_explore(&config)?;
        }
        Commands::Config { command } => match command {
            ConfigCommand::Get { key } => commands::config::get_config(&config, key.as_deref())?,
            _ => commands::config::show_config(&config)?,
        },
    }

    Ok(())
}
