//! Status and reset handlers

use anyhow::{bail, Result};

use toast_core::Config;

use super::Session;
use crate::editor;
use crate::output::{stats_line, Output, OutputFormat};

/// Show status information
pub fn show(session: &Session, config: &Config, output: &Output) -> Result<()> {
    let stats = session.stats();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "title": session.title().as_str(),
                    "stats": stats,
                    "blocks": session.content().len(),
                    "sources": session.sources().len(),
                    "theme": session.theme().name(),
                    "database": config.sqlite_path(),
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", session.title());
        }
        OutputFormat::Human => {
            println!("Toast Write Status");
            println!("==================");
            println!();
            println!("Document:");
            println!("  Title:   {}", session.title());
            println!("  Blocks:  {}", session.content().len());
            println!("  Sources: {}", session.sources().len());
            println!("  {}", stats_line(&stats));
            println!();
            println!("Appearance:");
            println!("  Theme: {}", session.theme().label());
            println!(
                "  Font:  {}px {}",
                session.settings().font_size_px,
                session.settings().font_family
            );
            println!();
            println!("Storage:");
            println!("  Database: {}", config.sqlite_path().display());
        }
    }

    Ok(())
}

/// Remove every slot after confirmation
pub fn reset(session: &mut Session, yes: bool, output: &Output) -> Result<()> {
    if !yes {
        if !output.should_prompt() {
            bail!("Refusing to reset without --yes");
        }
        if !editor::confirm("Delete the essay, sources and settings?")? {
            output.message("Reset cancelled.");
            return Ok(());
        }
    }

    session.reset()?;
    output.success("All saved data removed");
    Ok(())
}
