//! Import of content saved as raw HTML
//!
//! The browser version stored the editor's `innerHTML` under the same
//! content key. That markup is read back into blocks: paragraphs keep
//! bold/italic/underline, lists, tables and `data:` images become their own
//! blocks, and the placeholder paragraph is dropped.

use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use super::block::{
    Block, CitationBlock, CitationFormat, ImageBlock, InlineRun, ListBlock, Paragraph, RunFormat,
    TableBlock,
};

/// Convert stored HTML into blocks, in document order
pub fn import_html(raw: &str) -> Vec<Block> {
    let fragment = Html::parse_fragment(raw);
    let mut importer = Importer::default();
    importer.inline(fragment.root_element(), RunFormat::default());
    importer.flush();
    importer.blocks
}

#[derive(Default)]
struct Importer {
    blocks: Vec<Block>,
    /// Runs of the paragraph being collected
    pending: Vec<InlineRun>,
}

impl Importer {
    fn inline(&mut self, element: ElementRef, format: RunFormat) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.pending.push(InlineRun::formatted(&**text, format)),
                Node::Element(_) => {
                    if let Some(inner) = ElementRef::wrap(child) {
                        self.element(inner, format);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, element: ElementRef, format: RunFormat) {
        let name = element.value().name();
        match name {
            "br" => self.flush(),
            "img" => {
                self.flush();
                self.image(element);
            }
            "ol" | "ul" => {
                self.flush();
                self.list(element, name == "ol");
            }
            "table" => {
                self.flush();
                self.table(element);
            }
            "p" | "div" | "blockquote" | "pre" | "section" | "article" | "li" | "h1" | "h2"
            | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                if !is_placeholder(element) {
                    self.inline(element, format_for(name, format));
                }
                self.flush();
            }
            "script" | "style" => {}
            _ => self.inline(element, format_for(name, format)),
        }
    }

    /// Close the pending paragraph; whitespace-only text is dropped
    fn flush(&mut self) {
        let runs = std::mem::take(&mut self.pending);
        let text: String = runs.iter().map(|run| run.text.as_str()).collect();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }

        let citation = CitationFormat::ALL
            .into_iter()
            .find(|format| trimmed.starts_with(&format!("[{}] ", format.name())));
        let block = match citation {
            Some(format) => Block::Citation(CitationBlock {
                rendered_text: trimmed.to_string(),
                ..CitationBlock::from_template(format)
            }),
            None => Block::Paragraph(Paragraph::with_runs(runs)),
        };
        self.blocks.push(block);
    }

    fn image(&mut self, element: ElementRef) {
        let Some(src) = element.value().attr("src") else {
            return;
        };
        match ImageBlock::from_data_url(src) {
            Ok(image) => self.blocks.push(image.into()),
            Err(e) => debug!("Skipping image: {}", e),
        }
    }

    fn list(&mut self, element: ElementRef, ordered: bool) {
        let items: Vec<String> = element
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "li")
            .map(|item| collapse(&item.text().collect::<String>()))
            .filter(|item| !item.is_empty())
            .collect();
        if items.is_empty() {
            return;
        }
        let mut list = ListBlock::ordered(items);
        list.ordered = ordered;
        self.blocks.push(list.into());
    }

    fn table(&mut self, element: ElementRef) {
        let (Ok(rows), Ok(cells)) = (Selector::parse("tr"), Selector::parse("td, th")) else {
            return;
        };
        let mut grid: Vec<Vec<String>> = element
            .select(&rows)
            .map(|row| {
                row.select(&cells)
                    .map(|cell| collapse(&cell.text().collect::<String>()))
                    .collect()
            })
            .filter(|row: &Vec<String>| !row.is_empty())
            .collect();
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return;
        }
        for row in &mut grid {
            row.resize(width, String::new());
        }
        self.blocks.push(TableBlock::from_rows(grid).into());
    }
}

fn format_for(tag: &str, mut format: RunFormat) -> RunFormat {
    match tag {
        "b" | "strong" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => format.bold = true,
        "i" | "em" => format.italic = true,
        "u" => format.underline = true,
        _ => {}
    }
    format
}

fn is_placeholder(element: ElementRef) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|class| class.split_whitespace().any(|c| c == "placeholder"))
}

/// Trim and squeeze runs of whitespace, keeping non-breaking spaces
fn collapse(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() && c != '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::render;

    #[test]
    fn test_paragraphs_and_formatting() {
        let blocks = import_html("<p>Toast is <strong>bread</strong></p><p>Second</p>");
        assert_eq!(blocks.len(), 2);

        let first = blocks[0].as_paragraph().unwrap();
        assert_eq!(first.text(), "Toast is bread");
        assert!(first.runs.last().unwrap().format.bold);
        assert_eq!(blocks[1].as_paragraph().unwrap().text(), "Second");
    }

    #[test]
    fn test_loose_text_and_line_breaks() {
        let blocks = import_html("first line<br>second line<div>third</div>");
        let texts: Vec<_> = blocks
            .iter()
            .map(|b| b.as_paragraph().unwrap().text())
            .collect();
        assert_eq!(texts, vec!["first line", "second line", "third"]);
    }

    #[test]
    fn test_placeholder_dropped() {
        let raw = "<p class=\"placeholder\">Start writing your essay…</p>";
        assert!(import_html(raw).is_empty());
    }

    #[test]
    fn test_bibliography_markup() {
        let raw = "<p><strong>Sources:</strong></p><ol><li>A</li><li>B</li></ol>";
        let blocks = import_html(raw);
        assert_eq!(blocks.len(), 2);
        let Block::List(list) = &blocks[1] else {
            panic!("expected list, got {}", blocks[1].kind());
        };
        assert_eq!(render::list_lines(list), vec!["1. A", "2. B"]);
    }

    #[test]
    fn test_citation_paragraph() {
        let raw = "<p>[MLA] Orwell. \"Essays.\" Penguin, 1946, url.</p>";
        let blocks = import_html(raw);
        let Block::Citation(citation) = &blocks[0] else {
            panic!("expected citation, got {}", blocks[0].kind());
        };
        assert_eq!(citation.format, CitationFormat::Mla);
        assert!(citation.rendered_text.starts_with("[MLA] Orwell"));
    }

    #[test]
    fn test_table_rows_padded() {
        let raw = "<table><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></table>";
        let blocks = import_html(raw);
        let Block::Table(table) = &blocks[0] else {
            panic!("expected table, got {}", blocks[0].kind());
        };
        assert_eq!(table.rows, vec![vec!["a", "b"], vec!["c", ""]]);
    }

    #[test]
    fn test_indent_entities_kept() {
        let blocks = import_html("<p>&nbsp;&nbsp;Indented</p>");
        assert_eq!(
            blocks[0].as_paragraph().unwrap().text(),
            "\u{a0}\u{a0}Indented"
        );
    }
}
