//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use toast_core::content::render;
use toast_core::{Block, Settings, SourceList, Statistics, StorageError, Suggestion};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the block list
    pub fn print_blocks(&self, blocks: &[Block]) {
        match self.format {
            OutputFormat::Human => {
                for (i, block) in blocks.iter().enumerate() {
                    println!(
                        "{:>3}  {} | {:<9} | {}",
                        i + 1,
                        short_id(block),
                        block.kind(),
                        truncate_line(&render::block_text(block), 50)
                    );
                }
                println!("\n{} block(s)", blocks.len());
            }
            OutputFormat::Json => {
                println!("{}", to_json(&blocks));
            }
            OutputFormat::Quiet => {
                for block in blocks {
                    println!("{}", block.id());
                }
            }
        }
    }

    /// Print the numbered source list
    pub fn print_sources(&self, sources: &SourceList) {
        match self.format {
            OutputFormat::Human => {
                if sources.is_empty() {
                    println!("No sources yet. Add one with: toast source add <text>");
                    return;
                }
                for (i, source) in sources.iter().enumerate() {
                    println!("{:>3}. {}", i + 1, source);
                }
                println!("\n{} source(s)", sources.len());
            }
            OutputFormat::Json => {
                println!("{}", to_json(sources));
            }
            OutputFormat::Quiet => {
                for source in sources.iter() {
                    println!("{}", source);
                }
            }
        }
    }

    pub fn print_settings(&self, settings: &Settings) {
        match self.format {
            OutputFormat::Human => {
                println!("Settings:");
                println!("  font_size:    {}px", settings.font_size_px);
                println!("  font_family:  {}", settings.font_family);
                println!("  line_spacing: {}", settings.line_spacing);
                println!("  text_align:   {}", settings.text_align);
            }
            OutputFormat::Json => {
                println!("{}", to_json(settings));
            }
            OutputFormat::Quiet => {
                println!(
                    "{} {} {} {}",
                    settings.font_size_px,
                    settings.line_spacing,
                    settings.text_align,
                    settings.font_family
                );
            }
        }
    }

    /// Print completions, marking the typed part
    pub fn print_suggestions(&self, suggestions: &[Suggestion]) {
        match self.format {
            OutputFormat::Human => {
                if suggestions.is_empty() {
                    println!("No suggestions.");
                    return;
                }
                for suggestion in suggestions {
                    println!("{}[{}]", suggestion.typed(), suggestion.remainder());
                }
            }
            OutputFormat::Json => {
                let words: Vec<_> = suggestions.iter().map(|s| &s.word).collect();
                println!("{}", to_json(&words));
            }
            OutputFormat::Quiet => {
                for suggestion in suggestions {
                    println!("{}", suggestion.word);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a user-facing warning (not an error: exit status stays 0)
    pub fn warning(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("⚠ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "warning", "message": message})
                );
            }
            OutputFormat::Quiet => eprintln!("{}", message),
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// One-line statistics summary
pub fn stats_line(stats: &Statistics) -> String {
    format!(
        "{} words · {} characters · {} min read",
        stats.words, stats.characters, stats.reading_minutes
    )
}

/// First 8 characters of a block id
pub fn short_id(block: &Block) -> String {
    block.id().to_string().chars().take(8).collect()
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

/// Truncate a string to max characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

/// Error chain on one line, followed by the storage recovery suggestion
/// when a `StorageError` is among the causes
pub fn describe_error(err: &anyhow::Error) -> String {
    let suggestion = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<StorageError>())
        .and_then(StorageError::recovery_suggestion);
    match suggestion {
        Some(suggestion) => format!("{:#}. {}", err, suggestion),
        None => format!("{:#}", err),
    }
}

/// Fold the recovery suggestion into the error so `main` prints it
pub fn with_recovery(err: anyhow::Error) -> anyhow::Error {
    let has_storage_cause = err
        .chain()
        .any(|cause| cause.downcast_ref::<StorageError>().is_some());
    if has_storage_cause {
        anyhow::anyhow!(describe_error(&err))
    } else {
        err
    }
}
