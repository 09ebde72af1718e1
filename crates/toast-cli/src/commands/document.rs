//! Document command handlers

use anyhow::{bail, Result};

use toast_core::Command;

use super::Session;
use crate::editor;
use crate::output::{Output, OutputFormat};

const WRITE_TEMPLATE: &str = "# Write your paragraph below. Lines starting with # are ignored.\n\n";

/// Print title and text
pub fn show(session: &Session, output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "title": session.title().as_str(),
                    "blocks": session.content().blocks(),
                    "stats": session.stats(),
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", session.content().plain_text());
        }
        OutputFormat::Human => {
            println!("{}", session.title());
            println!();
            if session.content().is_placeholder() {
                println!("(empty - add text with: toast write <text>)");
            } else {
                println!("{}", session.content().plain_text());
            }
        }
    }
    Ok(())
}

/// Append text as new paragraphs, one per line
pub fn write(session: &mut Session, text: Option<String>, output: &Output) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => editor::edit_text(WRITE_TEMPLATE)?,
    };
    let lines: Vec<&str> = text.lines().collect();
    if text.trim().is_empty() {
        bail!("Nothing to write");
    }

    // Start a fresh paragraph unless the document is still empty
    if !session.content().is_placeholder() {
        session.dispatch(Command::SplitParagraph);
    }
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            session.dispatch(Command::SplitParagraph);
        }
        session.dispatch(Command::InsertText((*line).to_string()));
    }

    output.success(&format!(
        "Added {} paragraph(s), {} words total",
        lines.len(),
        session.stats().words
    ));
    Ok(())
}

/// Show or set the title
pub fn title(session: &mut Session, text: Option<String>, output: &Output) -> Result<()> {
    match text {
        Some(text) => {
            session.dispatch(Command::SetTitle(text));
            output.success(&format!("Title: {}", session.title()));
        }
        None => match output.format {
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"title": session.title().as_str()}))
            }
            _ => println!("{}", session.title()),
        },
    }
    Ok(())
}

/// List completions for a token
pub fn complete(session: &Session, token: &str, output: &Output) -> Result<()> {
    output.print_suggestions(&session.suggest(token));
    Ok(())
}
