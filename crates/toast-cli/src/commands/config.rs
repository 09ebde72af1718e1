//! Config command handlers

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use toast_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "log_file": config.log_file,
                    "dictionary_path": config.dictionary_path,
                    "export_dir": config.export_dir,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:        {}", config.data_dir.display());
            println!("  log_file:        {}", display_or_default(config.log_file.as_deref(), &config.log_path()));
            println!(
                "  dictionary_path: {}",
                config
                    .dictionary_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(built-in)".to_string())
            );
            println!("  export_dir:      {}", display_or_default(config.export_dir.as_deref(), &config.export_path()));
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

fn display_or_default(value: Option<&Path>, fallback: &Path) -> String {
    match value {
        Some(path) => path.display().to_string(),
        None => format!("{} (default)", fallback.display()),
    }
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    let optional_path = |value: &str| -> Option<PathBuf> {
        if value.is_empty() || value == "none" {
            None
        } else {
            Some(value.into())
        }
    };

    match key.as_str() {
        "data_dir" => {
            config.data_dir = value.clone().into();
        }
        "log_file" => {
            config.log_file = optional_path(&value);
        }
        "dictionary_path" => {
            let path = optional_path(&value);
            if let Some(path) = &path {
                if !path.exists() {
                    bail!("Dictionary file not found: {}", path.display());
                }
            }
            config.dictionary_path = path;
        }
        "export_dir" => {
            config.export_dir = optional_path(&value);
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, log_file, dictionary_path, export_dir",
                key
            );
        }
    }

    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}
