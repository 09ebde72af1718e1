//! Printing and export
//!
//! The editor hands a [`PrintCopy`] (title, print-safe blocks, typography) and
//! an [`ExportConfig`] to a [`DocumentRenderer`]. [`HtmlRenderer`] prints plain
//! text and exports a standalone HTML page sized for paper.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use html_escape::encode_text;
use serde::Serialize;
use tracing::info;

use crate::content::{render, Block};
use crate::document::Title;
use crate::settings::Settings;
use crate::storage::atomic_write;

pub const DEFAULT_MARGIN_MM: u32 = 10;
pub const DEFAULT_IMAGE_QUALITY: f32 = 0.98;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::A4 => f.write_str("A4"),
            PageSize::Letter => f.write_str("letter"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => f.write_str("portrait"),
            Orientation::Landscape => f.write_str("landscape"),
        }
    }
}

/// Options passed to the renderer when exporting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    pub margin_mm: u32,
    pub filename_base: String,
    pub image_quality: f32,
    pub page_size: PageSize,
    pub orientation: Orientation,
}

impl ExportConfig {
    pub fn for_title(title: &Title) -> Self {
        Self {
            margin_mm: DEFAULT_MARGIN_MM,
            filename_base: title.filename_base(),
            image_quality: DEFAULT_IMAGE_QUALITY,
            page_size: PageSize::default(),
            orientation: Orientation::default(),
        }
    }

    /// File name with path separators and other unsafe characters replaced
    pub fn file_name(&self, extension: &str) -> String {
        let stem: String = self
            .filename_base
            .trim()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        let stem = if stem.is_empty() { "essay" } else { stem.as_str() };
        format!("{}.{}", stem, extension)
    }
}

/// Detached copy of the document for a renderer
#[derive(Debug, Clone, PartialEq)]
pub struct PrintCopy {
    pub title: Title,
    /// Empty when the document only holds the placeholder
    pub blocks: Vec<Block>,
    pub settings: Settings,
}

/// External printing/export surface
pub trait DocumentRenderer {
    /// Print the document
    fn print(&self, copy: &PrintCopy, out: &mut dyn Write) -> Result<()>;

    /// Export to a file in `dir`, returning its path
    fn export_to_file(&self, copy: &PrintCopy, config: &ExportConfig, dir: &Path)
        -> Result<PathBuf>;
}

/// Plain-text printing and standalone HTML export
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    /// Full HTML page for the copy
    pub fn page(&self, copy: &PrintCopy, config: &ExportConfig) -> String {
        let settings = &copy.settings;
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="image-quality" content="{quality}">
<title>{title}</title>
<style>
@page {{ size: {size} {orientation}; margin: {margin}mm; }}
body {{ font-family: {family}; font-size: {font_size}px; line-height: {spacing}; text-align: {align}; }}
img {{ max-width: 100%; }}
table {{ border-collapse: collapse; }}
td {{ border: 1px solid #888; padding: 4px 8px; }}
.citation {{ font-style: italic; }}
</style>
</head>
<body>
<h1>{title}</h1>
{body}
</body>
</html>
"#,
            quality = config.image_quality,
            title = encode_text(copy.title.as_str()),
            size = config.page_size,
            orientation = config.orientation,
            margin = config.margin_mm,
            family = encode_text(&settings.font_family),
            font_size = settings.font_size_px,
            spacing = settings.line_spacing,
            align = settings.text_align,
            body = render::to_html(&copy.blocks),
        )
    }
}

impl DocumentRenderer for HtmlRenderer {
    fn print(&self, copy: &PrintCopy, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", copy.title)?;
        writeln!(out)?;
        let body = render::plain_text(&copy.blocks);
        if !body.is_empty() {
            writeln!(out, "{}", body)?;
        }
        Ok(())
    }

    fn export_to_file(
        &self,
        copy: &PrintCopy,
        config: &ExportConfig,
        dir: &Path,
    ) -> Result<PathBuf> {
        let path = dir.join(config.file_name("html"));
        let html = self.page(copy, config);
        atomic_write(&path, html.as_bytes())
            .with_context(|| format!("Failed to export to {:?}", path))?;
        info!("Exported '{}' to {:?}", copy.title, path);
        Ok(path)
    }
}
