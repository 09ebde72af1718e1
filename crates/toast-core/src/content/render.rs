//! Plain-text and HTML renderings of blocks

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::block::{Block, InlineRun, ListBlock, TableBlock};

/// Hint shown in place of an empty document
pub const PLACEHOLDER_TEXT: &str = "Start writing your essay…";

/// Visible text: blocks joined by newlines, table cells by tabs
pub fn plain_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(block_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Visible text of one block
pub fn block_text(block: &Block) -> String {
    match block {
        Block::Paragraph(p) => p.text(),
        Block::Image(_) => String::new(),
        Block::Table(t) => table_text(t),
        Block::Citation(c) => c.rendered_text.clone(),
        Block::List(l) => list_lines(l).join("\n"),
    }
}

fn table_text(table: &TableBlock) -> String {
    table
        .rows
        .iter()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Items with their markers (`1. A`, `2. B`, or `• A`)
pub fn list_lines(list: &ListBlock) -> Vec<String> {
    list.items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if list.ordered {
                format!("{}. {}", i + 1, item)
            } else {
                format!("• {}", item)
            }
        })
        .collect()
}

/// HTML fragment for a block sequence. An empty sequence renders the
/// placeholder hint.
pub fn to_html(blocks: &[Block]) -> String {
    if blocks.is_empty() {
        return format!("<p class=\"placeholder\">{}</p>", PLACEHOLDER_TEXT);
    }
    blocks.iter().map(block_html).collect::<Vec<_>>().join("\n")
}

fn block_html(block: &Block) -> String {
    match block {
        Block::Paragraph(p) => {
            let inner: String = p.runs.iter().map(run_html).collect();
            format!("<p>{}</p>", inner)
        }
        Block::Image(image) => format!(
            "<img id=\"img-{}\" src=\"{}\" alt=\"\">",
            image.id,
            encode_double_quoted_attribute(&image.to_data_url())
        ),
        Block::Table(table) => {
            let rows: String = table
                .rows
                .iter()
                .map(|row| {
                    let cells: String = row
                        .iter()
                        .map(|cell| format!("<td>{}</td>", encode_text(cell)))
                        .collect();
                    format!("<tr>{}</tr>", cells)
                })
                .collect();
            format!("<table>{}</table>", rows)
        }
        Block::Citation(c) => format!(
            "<p class=\"citation\" data-format=\"{}\">{}</p>",
            c.format.name(),
            encode_text(&c.rendered_text)
        ),
        Block::List(list) => {
            let tag = if list.ordered { "ol" } else { "ul" };
            let items: String = list
                .items
                .iter()
                .map(|item| format!("<li>{}</li>", encode_text(item)))
                .collect();
            format!("<{tag}>{items}</{tag}>")
        }
    }
}

fn run_html(run: &InlineRun) -> String {
    let mut html = encode_text(&run.text).into_owned();
    if run.format.underline {
        html = format!("<u>{}</u>", html);
    }
    if run.format.italic {
        html = format!("<em>{}</em>", html);
    }
    if run.format.bold {
        html = format!("<strong>{}</strong>", html);
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::block::{
        CitationBlock, CitationFormat, ImageBlock, Paragraph, RunFormat,
    };

    #[test]
    fn test_plain_text_joins_blocks() {
        let blocks = vec![
            Block::Paragraph(Paragraph::with_text("one two")),
            Block::Table(TableBlock::from_rows(vec![
                vec!["a".into(), "b".into()],
                vec!["c".into(), "d".into()],
            ])),
            Block::List(ListBlock::ordered(vec!["A".into(), "B".into()])),
        ];

        assert_eq!(plain_text(&blocks), "one two\na\tb\nc\td\n1. A\n2. B");
    }

    #[test]
    fn test_html_escapes_text() {
        let blocks = vec![Block::Paragraph(Paragraph::with_text("<b>x</b> & y"))];
        assert_eq!(to_html(&blocks), "<p>&lt;b&gt;x&lt;/b&gt; &amp; y</p>");
    }

    #[test]
    fn test_html_formats_runs() {
        let blocks = vec![Block::Paragraph(Paragraph::with_runs(vec![
            InlineRun::formatted("Sources:", RunFormat::bold()),
            InlineRun::plain(" list"),
        ]))];
        assert_eq!(to_html(&blocks), "<p><strong>Sources:</strong> list</p>");
    }

    #[test]
    fn test_html_blocks() {
        let citation = CitationBlock::from_template(CitationFormat::Mla);
        let html = to_html(&[Block::Citation(citation)]);
        assert!(html.starts_with("<p class=\"citation\" data-format=\"MLA\">[MLA]"));
        assert!(html.contains("\"[Title].\""));

        let image = ImageBlock::new("image/png", vec![1, 2, 3]);
        let html = to_html(&[Block::Image(image)]);
        assert!(html.contains("src=\"data:image/png;base64,AQID\""));

        let list = ListBlock::ordered(vec!["A & B".into()]);
        assert_eq!(to_html(&[Block::List(list)]), "<ol><li>A &amp; B</li></ol>");
    }

    #[test]
    fn test_empty_renders_placeholder() {
        assert_eq!(
            to_html(&[]),
            "<p class=\"placeholder\">Start writing your essay…</p>"
        );
    }
}
