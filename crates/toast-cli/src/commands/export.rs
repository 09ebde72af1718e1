//! Export and print handlers

use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use toast_core::HtmlRenderer;

use super::Session;
use crate::output::{Output, OutputFormat};

/// Export to a standalone HTML page
pub fn export(session: &Session, dir: &Path, open_after: bool, output: &Output) -> Result<()> {
    let path = session.export(&HtmlRenderer, dir)?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({"path": path, "config": session.export_config()})
            );
        }
        OutputFormat::Quiet => println!("{}", path.display()),
        OutputFormat::Human => output.success(&format!("Exported to {}", path.display())),
    }

    if open_after {
        open::that(&path).with_context(|| format!("Failed to open {:?}", path))?;
    }
    Ok(())
}

/// Print plain text to stdout
pub fn print(session: &Session) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    session.print(&HtmlRenderer, &mut out)
}
