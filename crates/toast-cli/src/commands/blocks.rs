//! Block command handlers

use std::path::Path;

use anyhow::{Context, Result};

use toast_core::content::ImageBlock;
use toast_core::{Command, Direction};

use super::{resolve_block, Session};
use crate::output::Output;

/// List blocks
pub fn list(session: &Session, output: &Output) -> Result<()> {
    output.print_blocks(session.content().blocks());
    Ok(())
}

pub fn move_up(session: &mut Session, id: &str, output: &Output) -> Result<()> {
    move_block(session, id, Direction::Up, output)
}

pub fn move_down(session: &mut Session, id: &str, output: &Output) -> Result<()> {
    move_block(session, id, Direction::Down, output)
}

fn move_block(session: &mut Session, id: &str, direction: Direction, output: &Output) -> Result<()> {
    let block = resolve_block(session, id)?;
    if session.dispatch(Command::MoveBlock(block, direction)).changed {
        output.success("Block moved");
    } else {
        output.message("Block is already at the edge; nothing moved.");
    }
    Ok(())
}

/// Delete a block
pub fn remove(session: &mut Session, id: &str, output: &Output) -> Result<()> {
    let block = resolve_block(session, id)?;
    session.dispatch(Command::DeleteBlock(block));
    output.success("Block deleted");
    Ok(())
}

/// Append an empty table
pub fn table(session: &mut Session, rows: usize, cols: usize, output: &Output) -> Result<()> {
    let outcome = session.dispatch(Command::InsertTable { rows, cols });
    if let Some(warning) = outcome.warning {
        output.warning(&warning);
    } else {
        output.success(&format!("Added {}x{} table", rows, cols));
    }
    Ok(())
}

/// Set one table cell
pub fn cell(
    session: &mut Session,
    id: &str,
    row: usize,
    col: usize,
    text: String,
    output: &Output,
) -> Result<()> {
    let block = resolve_block(session, id)?;
    let outcome = session.dispatch(Command::SetCell {
        block,
        row,
        col,
        text,
    });
    if outcome.changed {
        output.success(&format!("Cell ({}, {}) updated", row, col));
    } else {
        output.warning("Not a table cell; check the block id and row/column (counted from 0)");
    }
    Ok(())
}

/// Append an image from a file or a `data:` URL
pub fn image(session: &mut Session, path: &Path, output: &Output) -> Result<()> {
    let image = match path.to_str().filter(|s| s.starts_with("data:")) {
        Some(url) => ImageBlock::from_data_url(url)?,
        None => {
            let data =
                std::fs::read(path).with_context(|| format!("Failed to read image {:?}", path))?;
            ImageBlock::from_file_bytes(path, data)?
        }
    };
    let size = image.data.len();
    session.dispatch(Command::InsertImage(image));
    output.success(&format!("Added image ({} KB)", size.div_ceil(1024)));
    Ok(())
}
