//! Source and citation handlers

use anyhow::{anyhow, bail, Result};

use toast_core::{CitationFormat, Command};

use super::Session;
use crate::output::Output;

pub fn add(session: &mut Session, text: String, output: &Output) -> Result<()> {
    if !session.dispatch(Command::AddSource(text)).changed {
        bail!("Source text is empty");
    }
    output.success(&format!("Added source #{}", session.sources().len()));
    Ok(())
}

/// Remove by the 1-based number shown in `source ls`
pub fn remove(session: &mut Session, number: usize, output: &Output) -> Result<()> {
    let removed = number
        .checked_sub(1)
        .and_then(|index| session.sources().get(index).map(|s| (index, s.to_string())));
    let Some((index, text)) = removed else {
        bail!(
            "No source #{} ({} source(s) saved)",
            number,
            session.sources().len()
        );
    };

    session.dispatch(Command::RemoveSource(index));
    output.success(&format!("Removed source: {}", text));
    Ok(())
}

pub fn list(session: &Session, output: &Output) -> Result<()> {
    output.print_sources(session.sources());
    Ok(())
}

/// Append a citation template
pub fn cite(session: &mut Session, format: &str, output: &Output) -> Result<()> {
    let format: CitationFormat = format.parse().map_err(|e: String| anyhow!(e))?;
    session.dispatch(Command::InsertCitation(format));
    output.success(&format!("Added {} citation template", format));
    Ok(())
}

/// Append the bibliography; an empty source list is a warning, not an error
pub fn bibliography(session: &mut Session, output: &Output) -> Result<()> {
    let outcome = session.dispatch(Command::InsertBibliography);
    match outcome.warning {
        Some(warning) => output.warning(&warning),
        None => output.success(&format!(
            "Inserted bibliography with {} source(s)",
            session.sources().len()
        )),
    }
    Ok(())
}
