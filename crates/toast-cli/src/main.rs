//! Toast Write CLI
//!
//! Command-line interface and terminal editor for Toast Write essays.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use toast_core::Config;

mod commands;
mod editor;
mod output;
mod tui;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "toast")]
#[command(about = "Toast Write - a local essay writer")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the terminal editor (default)
    Edit,
    /// Show title, statistics and storage location
    Status,
    /// Print the document title and text
    Show,
    /// Append a paragraph (opens $EDITOR when no text is given)
    Write {
        /// Text to append
        text: Option<String>,
    },
    /// Show or set the document title
    Title {
        /// New title (empty resets to the default)
        text: Option<String>,
    },
    /// List blocks with their ids
    Blocks,
    /// Move or remove a block
    Block {
        #[command(subcommand)]
        command: BlockCommands,
    },
    /// Append an empty table
    Table {
        rows: usize,
        cols: usize,
    },
    /// Set the text of a table cell
    Cell {
        /// Table id (full UUID or prefix)
        id: String,
        row: usize,
        col: usize,
        text: String,
    },
    /// Append an image from a file or a data: URL
    Image {
        path: PathBuf,
    },
    /// Append a citation template (apa, mla, chicago, harvard)
    Cite {
        format: String,
    },
    /// Append the bibliography built from the source list
    Bib,
    /// Manage citation sources
    Source {
        #[command(subcommand)]
        command: Option<SourceCommands>,
    },
    /// Show or change typography settings
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommands>,
    },
    /// Show or switch the theme (dark, light, sepia, contrast)
    Theme {
        name: Option<String>,
    },
    /// List completions for a word prefix
    Complete {
        token: String,
    },
    /// Export the document as a standalone HTML page
    Export {
        /// Directory to write into (defaults to the configured export_dir)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Open the exported file afterwards
        #[arg(long)]
        open: bool,
    },
    /// Print the document as plain text
    Print,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Remove all saved data and start over
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum BlockCommands {
    /// Swap a block with the one above it
    Up { id: String },
    /// Swap a block with the one below it
    Down { id: String },
    /// Delete a block
    #[command(alias = "delete")]
    Rm { id: String },
}

#[derive(Subcommand)]
enum SourceCommands {
    /// Add a source
    Add { text: String },
    /// Remove a source by its number in `source ls`
    #[command(alias = "delete")]
    Rm { number: usize },
    /// List sources
    Ls,
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show current settings
    Show,
    /// Set a value (font_size, font_family, line_spacing, text_align)
    Set { key: String, value: String },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, log_file, dictionary_path, export_dir)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    run(Cli::parse()).map_err(output::with_recovery)
}

fn run(cli: Cli) -> Result<()> {
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Commands that don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    // The terminal editor logs to a file; everything else logs to stderr
    let Some(command) = cli.command else {
        return tui::run(config);
    };
    if matches!(command, Commands::Edit) {
        return tui::run(config);
    }
    init_cli_logging();

    let mut session = commands::open_session(&config)?;

    match command {
        Commands::Edit | Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Status => commands::status::show(&session, &config, &output),
        Commands::Show => commands::document::show(&session, &output),
        Commands::Write { text } => commands::document::write(&mut session, text, &output),
        Commands::Title { text } => commands::document::title(&mut session, text, &output),
        Commands::Blocks => commands::blocks::list(&session, &output),
        Commands::Block { command } => match command {
            BlockCommands::Up { id } => commands::blocks::move_up(&mut session, &id, &output),
            BlockCommands::Down { id } => commands::blocks::move_down(&mut session, &id, &output),
            BlockCommands::Rm { id } => commands::blocks::remove(&mut session, &id, &output),
        },
        Commands::Table { rows, cols } => {
            commands::blocks::table(&mut session, rows, cols, &output)
        }
        Commands::Cell { id, row, col, text } => {
            commands::blocks::cell(&mut session, &id, row, col, text, &output)
        }
        Commands::Image { path } => commands::blocks::image(&mut session, &path, &output),
        Commands::Cite { format } => commands::sources::cite(&mut session, &format, &output),
        Commands::Bib => commands::sources::bibliography(&mut session, &output),
        Commands::Source { command } => match command {
            Some(SourceCommands::Add { text }) => {
                commands::sources::add(&mut session, text, &output)
            }
            Some(SourceCommands::Rm { number }) => {
                commands::sources::remove(&mut session, number, &output)
            }
            Some(SourceCommands::Ls) | None => commands::sources::list(&session, &output),
        },
        Commands::Settings { command } => match command {
            Some(SettingsCommands::Set { key, value }) => {
                commands::settings::set(&mut session, &key, &value, &output)
            }
            Some(SettingsCommands::Show) | None => commands::settings::show(&session, &output),
        },
        Commands::Theme { name } => commands::settings::theme(&mut session, name, &output),
        Commands::Complete { token } => commands::document::complete(&session, &token, &output),
        Commands::Export { dir, open } => {
            let dir = dir.unwrap_or_else(|| config.export_path());
            commands::export::export(&session, &dir, open, &output)
        }
        Commands::Print => commands::export::print(&session),
        Commands::Reset { yes } => commands::status::reset(&mut session, yes, &output),
    }
}

/// Initialize stderr logging for one-shot commands
///
/// Level comes from TOAST_LOG (default: warn).
fn init_cli_logging() {
    let level = std::env::var("TOAST_LOG").unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::new(format!("toast_core={},toast_cli={}", level, level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
