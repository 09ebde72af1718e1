//! Block types of the content tree

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ContentError;

/// Unique identifier for a block.
/// UUID v4, stable across serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a full UUID string
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Check whether the textual form starts with `prefix`
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.0.to_string().starts_with(&prefix.to_lowercase())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Character formatting for an inline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFormat {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
}

impl RunFormat {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }
}

/// A span of text sharing one format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineRun {
    pub text: String,
    #[serde(default)]
    pub format: RunFormat,
}

impl InlineRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: RunFormat::default(),
        }
    }

    pub fn formatted(text: impl Into<String>, format: RunFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A paragraph of inline runs. Offsets are in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: BlockId,
    #[serde(default)]
    pub runs: Vec<InlineRun>,
}

impl Paragraph {
    /// Create an empty paragraph
    pub fn new() -> Self {
        Self {
            id: BlockId::new(),
            runs: Vec::new(),
        }
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self::with_runs(vec![InlineRun::plain(text)])
    }

    pub fn with_runs(runs: Vec<InlineRun>) -> Self {
        let mut paragraph = Self {
            id: BlockId::new(),
            runs,
        };
        paragraph.normalize();
        paragraph
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.runs.iter().map(InlineRun::char_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }

    /// Insert text at `offset`, inheriting the format of the text before it
    pub fn insert_text(&mut self, offset: usize, text: &str) {
        let format = self.format_at(offset);
        self.insert_run(offset, InlineRun::formatted(text, format));
    }

    /// Insert a run at `offset`. Offsets past the end append.
    pub fn insert_run(&mut self, offset: usize, run: InlineRun) {
        let (mut head, tail) = split_runs(std::mem::take(&mut self.runs), offset);
        head.push(run);
        head.extend(tail);
        self.runs = head;
        self.normalize();
    }

    /// Remove the characters in `start..end`
    pub fn delete_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let (head, tail) = split_runs(std::mem::take(&mut self.runs), end);
        let (mut head, _removed) = split_runs(head, start);
        head.extend(tail);
        self.runs = head;
        self.normalize();
    }

    /// Split at `offset`; the returned paragraph (new id) holds the tail
    pub fn split_off(&mut self, offset: usize) -> Paragraph {
        let (head, tail) = split_runs(std::mem::take(&mut self.runs), offset);
        self.runs = head;
        self.normalize();
        Paragraph::with_runs(tail)
    }

    /// Append another paragraph's runs to this one
    pub fn append(&mut self, other: Paragraph) {
        self.runs.extend(other.runs);
        self.normalize();
    }

    /// Format in effect just before `offset`
    fn format_at(&self, offset: usize) -> RunFormat {
        let mut pos = 0;
        for run in &self.runs {
            let len = run.char_len();
            if offset > pos && offset <= pos + len {
                return run.format;
            }
            pos += len;
        }
        self.runs.first().map(|r| r.format).unwrap_or_default()
    }

    /// Drop empty runs and merge neighbours with equal formatting
    fn normalize(&mut self) {
        let mut merged: Vec<InlineRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.format == run.format => last.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Split runs at a character offset into (before, after)
fn split_runs(runs: Vec<InlineRun>, offset: usize) -> (Vec<InlineRun>, Vec<InlineRun>) {
    let mut head = Vec::new();
    let mut tail = Vec::new();
    let mut pos = 0;

    for run in runs {
        let len = run.char_len();
        if pos + len <= offset {
            head.push(run);
        } else if pos >= offset {
            tail.push(run);
        } else {
            let at = byte_index(&run.text, offset - pos);
            let (left, right) = run.text.split_at(at);
            head.push(InlineRun::formatted(left, run.format));
            tail.push(InlineRun::formatted(right, run.format));
        }
        pos += len;
    }

    (head, tail)
}

/// Byte index of the `chars`-th character (clamped to the string length)
pub(crate) fn byte_index(s: &str, chars: usize) -> usize {
    s.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// An embedded image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub id: BlockId,
    pub mime_type: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl ImageBlock {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: BlockId::new(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Build from a `data:<mime>;base64,<payload>` URL
    pub fn from_data_url(url: &str) -> Result<Self, ContentError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ContentError::InvalidImage("not a data: URL".to_string()))?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| ContentError::InvalidImage("data URL is not base64".to_string()))?;
        if !mime.starts_with("image/") {
            return Err(ContentError::InvalidImage(format!(
                "unsupported media type '{}'",
                mime
            )));
        }
        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| ContentError::InvalidImage(e.to_string()))?;
        Ok(Self::new(mime, data))
    }

    /// Build from raw bytes, deriving the MIME type from the file extension
    pub fn from_file_bytes(path: &Path, data: Vec<u8>) -> Result<Self, ContentError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let mime = match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            _ => {
                return Err(ContentError::InvalidImage(format!(
                    "unsupported image extension '{}'",
                    ext
                )))
            }
        };
        Ok(Self::new(mime, data))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// A grid of plain-text cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBlock {
    pub id: BlockId,
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    /// Create a table of empty cells
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            id: BlockId::new(),
            rows: vec![vec![String::new(); cols.max(1)]; rows.max(1)],
        }
    }

    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            id: BlockId::new(),
            rows,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    pub fn set_cell(&mut self, row: usize, col: usize, text: &str) -> Result<(), ContentError> {
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(ContentError::CellOutOfRange { row, col })?;
        *cell = text.to_string();
        Ok(())
    }
}

/// Supported citation styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CitationFormat {
    #[serde(rename = "APA")]
    Apa,
    #[serde(rename = "MLA")]
    Mla,
    Chicago,
    Harvard,
}

impl CitationFormat {
    pub const ALL: [CitationFormat; 4] = [
        CitationFormat::Apa,
        CitationFormat::Mla,
        CitationFormat::Chicago,
        CitationFormat::Harvard,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CitationFormat::Apa => "APA",
            CitationFormat::Mla => "MLA",
            CitationFormat::Chicago => "Chicago",
            CitationFormat::Harvard => "Harvard",
        }
    }

    /// Fill-in template for this style
    pub fn template(self) -> &'static str {
        match self {
            CitationFormat::Apa => "[Author]. ([Year]). [Title]. Retrieved from [URL]",
            CitationFormat::Mla => "[Author]. \"[Title].\" [Website], [Year], [URL].",
            CitationFormat::Chicago => "[Author]. [Title]. Accessed [Date]. [URL].",
            CitationFormat::Harvard => "[Author], [Year]. [Title]. Available at: [URL].",
        }
    }
}

impl fmt::Display for CitationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CitationFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CitationFormat::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown citation format '{}'. Use APA, MLA, Chicago or Harvard.",
                    s
                )
            })
    }
}

/// A templated citation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationBlock {
    pub id: BlockId,
    pub format: CitationFormat,
    pub rendered_text: String,
}

impl CitationBlock {
    /// Citation filled with the style's template, tagged with its name
    pub fn from_template(format: CitationFormat) -> Self {
        Self {
            id: BlockId::new(),
            format,
            rendered_text: format!("[{}] {}", format.name(), format.template()),
        }
    }
}

/// A numbered or bulleted list of plain-text items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBlock {
    pub id: BlockId,
    pub ordered: bool,
    pub items: Vec<String>,
}

impl ListBlock {
    pub fn ordered(items: Vec<String>) -> Self {
        Self {
            id: BlockId::new(),
            ordered: true,
            items,
        }
    }
}

/// One structural unit of the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Image(ImageBlock),
    Table(TableBlock),
    Citation(CitationBlock),
    List(ListBlock),
}

impl Block {
    pub fn id(&self) -> BlockId {
        match self {
            Block::Paragraph(p) => p.id,
            Block::Image(i) => i.id,
            Block::Table(t) => t.id,
            Block::Citation(c) => c.id,
            Block::List(l) => l.id,
        }
    }

    /// Short name of the block kind
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Image(_) => "image",
            Block::Table(_) => "table",
            Block::Citation(_) => "citation",
            Block::List(_) => "list",
        }
    }

    /// Largest valid caret offset inside this block.
    /// Non-text blocks accept 0 (before) and 1 (after).
    pub fn caret_len(&self) -> usize {
        match self {
            Block::Paragraph(p) => p.len(),
            _ => 1,
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }
}

impl From<Paragraph> for Block {
    fn from(p: Paragraph) -> Self {
        Block::Paragraph(p)
    }
}

impl From<ImageBlock> for Block {
    fn from(i: ImageBlock) -> Self {
        Block::Image(i)
    }
}

impl From<TableBlock> for Block {
    fn from(t: TableBlock) -> Self {
        Block::Table(t)
    }
}

impl From<CitationBlock> for Block {
    fn from(c: CitationBlock) -> Self {
        Block::Citation(c)
    }
}

impl From<ListBlock> for Block {
    fn from(l: ListBlock) -> Self {
        Block::List(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled(text: &str, bold: bool) -> InlineRun {
        InlineRun::formatted(
            text,
            RunFormat {
                bold,
                ..RunFormat::default()
            },
        )
    }

    #[test]
    fn test_paragraph_insert_text_mid_run() {
        let mut p = Paragraph::with_text("helo");
        p.insert_text(3, "l");
        assert_eq!(p.text(), "hello");
        assert_eq!(p.runs.len(), 1);
    }

    #[test]
    fn test_insert_text_inherits_preceding_format() {
        let mut p = Paragraph::with_runs(vec![styled("bold", true), styled(" plain", false)]);
        p.insert_text(4, "er");
        assert_eq!(p.runs[0].text, "bolder");
        assert!(p.runs[0].format.bold);
        assert_eq!(p.runs[1].text, " plain");
    }

    #[test]
    fn test_insert_formatted_run_splits() {
        let mut p = Paragraph::with_text("ab");
        p.insert_run(1, styled("X", true));
        let texts: Vec<_> = p.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "X", "b"]);
    }

    #[test]
    fn test_delete_range_across_runs() {
        let mut p = Paragraph::with_runs(vec![
            styled("one ", false),
            styled("two", true),
            styled(" three", false),
        ]);
        p.delete_range(2, 9);
        assert_eq!(p.text(), "onhree");
        // The bold run vanished, so the plain neighbours merge
        assert_eq!(p.runs.len(), 1);
    }

    #[test]
    fn test_split_and_append_multibyte() {
        let mut p = Paragraph::with_text("café au lait");
        let tail = p.split_off(4);
        assert_eq!(p.text(), "café");
        assert_eq!(tail.text(), " au lait");
        assert_ne!(p.id, tail.id);

        p.append(tail);
        assert_eq!(p.text(), "café au lait");
        assert_eq!(p.len(), 12);
    }

    #[test]
    fn test_table_cells() {
        let mut t = TableBlock::new(2, 3);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0].len(), 3);

        t.set_cell(1, 2, "x").unwrap();
        assert_eq!(t.cell(1, 2), Some("x"));
        assert!(matches!(
            t.set_cell(2, 0, "y"),
            Err(ContentError::CellOutOfRange { row: 2, col: 0 })
        ));
    }

    #[test]
    fn test_image_data_url() {
        let image = ImageBlock::from_data_url("data:image/png;base64,iVBORw==").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.to_data_url(), "data:image/png;base64,iVBORw==");

        assert!(ImageBlock::from_data_url("https://example.com/a.png").is_err());
        assert!(ImageBlock::from_data_url("data:text/plain;base64,aGk=").is_err());
    }

    #[test]
    fn test_image_mime_from_extension() {
        let image = ImageBlock::from_file_bytes(Path::new("fig.JPG"), vec![1, 2]).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert!(ImageBlock::from_file_bytes(Path::new("notes.txt"), vec![]).is_err());
    }

    #[test]
    fn test_citation_template() {
        let c = CitationBlock::from_template(CitationFormat::Apa);
        assert_eq!(
            c.rendered_text,
            "[APA] [Author]. ([Year]). [Title]. Retrieved from [URL]"
        );
    }

    #[test]
    fn test_citation_format_parse() {
        assert_eq!("mla".parse::<CitationFormat>(), Ok(CitationFormat::Mla));
        assert_eq!(" Chicago ".parse::<CitationFormat>(), Ok(CitationFormat::Chicago));
        assert!("ieee".parse::<CitationFormat>().is_err());
    }

    #[test]
    fn test_block_id_prefix() {
        let id = BlockId::new();
        let text = id.to_string();
        assert!(id.matches_prefix(&text[..6]));
        assert!(id.matches_prefix(&text[..6].to_uppercase()));
        assert_eq!(BlockId::parse(&text), Some(id));
    }
}
