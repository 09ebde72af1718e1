//! UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block as Panel, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};
use toast_core::content::{render, RunFormat, PLACEHOLDER_TEXT};
use toast_core::{
    Block, BlockId, CaretPosition, ContentTree, SelectionBridge, Settings, TextAlign, Theme,
};

use super::app::{App, InputMode};
use crate::output::stats_line;

const MAX_POPUP_ITEMS: usize = 8;

/// Colors for one theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    pub accent: Color,
}

pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            fg: Color::White,
            bg: Color::Black,
            accent: Color::Cyan,
        },
        Theme::Light => Palette {
            fg: Color::Black,
            bg: Color::White,
            accent: Color::Blue,
        },
        Theme::Sepia => Palette {
            fg: Color::Rgb(91, 70, 54),
            bg: Color::Rgb(244, 236, 216),
            accent: Color::Rgb(160, 82, 45),
        },
        Theme::Contrast => Palette {
            fg: Color::Yellow,
            bg: Color::Black,
            accent: Color::White,
        },
    }
}

/// The document laid out for the next frame
#[derive(Debug)]
pub struct DocumentView {
    pub lines: Vec<Line<'static>>,
    pub screen: ScreenMap,
}

/// Title bar, document and status line regions of the frame
fn regions(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Lay the document out for a frame of `area`, scrolled to keep the caret visible
pub fn document_view(app: &App, area: Rect) -> DocumentView {
    let text_area = Panel::default().borders(Borders::ALL).inner(regions(area)[1]);
    let layout = layout_document(
        app.editor.content(),
        app.editor.settings(),
        text_area.width,
    );

    let caret_line = layout
        .map
        .locate(app.editor.caret())
        .map_or(0, |(_, line)| to_u16(line));
    let scroll = caret_line.saturating_sub(text_area.height.saturating_sub(1));

    DocumentView {
        lines: layout.lines,
        screen: ScreenMap {
            map: layout.map,
            area: text_area,
            scroll,
        },
    }
}

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App, view: &DocumentView) {
    let colors = palette(app.editor.theme());
    let [title_area, document_area, status_area] = regions(frame.area());

    draw_title_bar(frame, app, colors, title_area);
    draw_document(frame, view, colors, document_area);
    draw_suggestions(frame, app, colors, document_area);

    match app.input_mode {
        InputMode::Editing => {
            draw_status_bar(frame, app, status_area);
            if let Some(anchor) = app.editor.selection().anchor_rect() {
                frame.set_cursor_position((clamp_u16(anchor.x), clamp_u16(anchor.y)));
            }
        }
        InputMode::Command => draw_command_input(frame, app, status_area),
    }

    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn draw_title_bar(frame: &mut Frame, app: &App, colors: Palette, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            " Toast Write ",
            Style::default()
                .fg(colors.bg)
                .bg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            app.editor.title().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  [{}]", app.editor.theme().label()),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_document(frame: &mut Frame, view: &DocumentView, colors: Palette, area: Rect) {
    let block = Panel::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.accent))
        .style(Style::default().fg(colors.fg).bg(colors.bg));
    frame.render_widget(block, area);
    if view.screen.area.width == 0 || view.screen.area.height == 0 {
        return;
    }

    frame.render_widget(
        Paragraph::new(view.lines.clone()).scroll((view.screen.scroll, 0)),
        view.screen.area,
    );
}

/// Completion popup just below its anchor, or above it when there is no room
fn draw_suggestions(frame: &mut Frame, app: &App, colors: Palette, area: Rect) {
    let Some(state) = app.editor.autocomplete() else {
        return;
    };
    let Some(anchor) = state.anchor else {
        return;
    };
    if state.suggestions.is_empty() {
        return;
    }

    let shown = state.suggestions.len().min(MAX_POPUP_ITEMS);
    let widest = state
        .suggestions
        .iter()
        .take(shown)
        .map(|s| s.word.chars().count())
        .max()
        .unwrap_or(0);
    let width = (widest as u16 + 4).min(area.width);
    let height = (shown as u16 + 2).min(area.height);

    let below = clamp_u16(anchor.bottom());
    let y = if below.saturating_add(height) <= area.y + area.height {
        below
    } else {
        clamp_u16(anchor.y).saturating_sub(height).max(area.y)
    };
    let x = clamp_u16(anchor.x).min((area.x + area.width).saturating_sub(width));
    let popup = Rect::new(x, y, width, height);

    let typed = Style::default().add_modifier(Modifier::BOLD);
    let rest = Style::default().add_modifier(Modifier::DIM);
    let items: Vec<ListItem> = state
        .suggestions
        .iter()
        .take(shown)
        .enumerate()
        .map(|(i, s)| {
            let line = Line::from(vec![
                Span::styled(s.typed().to_string(), typed),
                Span::styled(s.remainder().to_string(), rest),
            ]);
            let item = ListItem::new(line);
            if i == state.selected {
                item.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                item
            }
        })
        .collect();

    let list = List::new(items).block(
        Panel::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.accent))
            .style(Style::default().fg(colors.fg).bg(colors.bg)),
    );
    frame.render_widget(Clear, popup);
    frame.render_widget(list, popup);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let stats = stats_line(&app.editor.stats());
    let left = match app.status_message() {
        Some(message) => message.to_string(),
        None => "Ctrl+P:command  Ctrl+T:theme  F1:help  Ctrl+Q:quit".to_string(),
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(stats.chars().count() as u16 + 1),
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new(left).style(Style::default().add_modifier(Modifier::DIM)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(stats).style(Style::default().add_modifier(Modifier::DIM)),
        chunks[1],
    );
}

fn draw_command_input(frame: &mut Frame, app: &App, area: Rect) {
    let prefix = ":";
    let line = Line::from(vec![
        Span::styled(prefix, Style::default().fg(Color::Yellow)),
        Span::raw(app.command_input.as_str()),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let cursor_x = area.x + prefix.len() as u16 + app.command_cursor as u16;
    frame.set_cursor_position((cursor_x, area.y));
}

fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    let popup_width = 56.min(area.width.saturating_sub(4));
    let popup_height = 26.min(area.height.saturating_sub(2));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(Span::styled("Keyboard Shortcuts", bold)),
        Line::from(""),
        Line::from("  Tab / Enter   Accept suggestion"),
        Line::from("  ↑/↓, Esc      Choose / dismiss suggestion"),
        Line::from("  Tab           Indent"),
        Line::from("  Ctrl+↑/↓      Move block"),
        Line::from("  Ctrl+D        Delete block"),
        Line::from("  Ctrl+B        Insert bibliography"),
        Line::from("  Ctrl+T        Next theme"),
        Line::from("  Ctrl+E        Export"),
        Line::from("  Ctrl+P        Command mode"),
        Line::from("  Ctrl+Q        Quit"),
        Line::from(""),
        Line::from(Span::styled("Commands", bold)),
        Line::from("  title <text>          theme [name]"),
        Line::from("  cite <format>         bib"),
        Line::from("  source <text>         unsource <n>"),
        Line::from("  table <rows> <cols>   cell <row> <col> <text>"),
        Line::from("  image <path>          export"),
        Line::from("  size <px>             font <family>"),
        Line::from("  spacing <n>           align <left|center|...>"),
        Line::from("  up | down | delete    quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Panel::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(bold);

    frame.render_widget(Paragraph::new(help_text).block(block), popup_area);
}

/// A laid-out document: wrapped lines plus where each block's rows went
#[derive(Debug)]
pub struct DocLayout {
    pub lines: Vec<Line<'static>>,
    pub map: CaretMap,
}

/// Rows of one laid-out block
#[derive(Debug, Clone, PartialEq, Eq)]
struct BlockRows {
    id: BlockId,
    text: bool,
    first_line: usize,
    /// Start offset, length and alignment shift of each row
    rows: Vec<(usize, usize, usize)>,
}

/// Caret-to-cell lookup for a laid-out document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaretMap {
    blocks: Vec<BlockRows>,
    width: usize,
}

impl CaretMap {
    /// Column and line of a caret in the unscrolled text
    ///
    /// Offsets past the end of a row extend it, so a caret moved by typing
    /// still lands on the right cell until the next layout.
    pub fn locate(&self, caret: CaretPosition) -> Option<(usize, usize)> {
        let block = self.blocks.iter().find(|b| b.id == caret.block)?;
        let last = block.rows.len().checked_sub(1)?;
        let (row, col) = if block.text {
            let row = block
                .rows
                .iter()
                .rposition(|(start, _, _)| *start <= caret.offset)
                .unwrap_or(0);
            (row, caret.offset.saturating_sub(block.rows[row].0))
        } else if caret.offset == 0 {
            (0, 0)
        } else {
            (last, block.rows[last].1)
        };
        let col = (col + block.rows[row].2).min(self.width.saturating_sub(1));
        Some((col, block.first_line + row))
    }
}

/// Where the document text sits on screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenMap {
    pub map: CaretMap,
    /// Text area inside the document border
    pub area: Rect,
    /// Lines scrolled off the top
    pub scroll: u16,
}

impl ScreenMap {
    /// Screen cell of a caret, if it is inside the visible text area
    pub fn cell(&self, caret: CaretPosition) -> Option<(u16, u16)> {
        let (col, line) = self.map.locate(caret)?;
        let line = to_u16(line).checked_sub(self.scroll)?;
        if line >= self.area.height {
            return None;
        }
        Some((self.area.x + to_u16(col), self.area.y + line))
    }
}

type Cell = (char, Style);

/// A wrapped row and the character offset it starts at
type Row = (usize, Vec<Cell>);

/// Wrap the tree to `width` columns
pub fn layout_document(tree: &ContentTree, settings: &Settings, width: u16) -> DocLayout {
    let width = usize::from(width.max(1));

    if tree.is_placeholder() {
        let hint = Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC);
        let placeholder = BlockRows {
            id: tree.start_caret().block,
            text: true,
            first_line: 0,
            rows: vec![(0, 0, 0)],
        };
        return DocLayout {
            lines: vec![Line::from(Span::styled(PLACEHOLDER_TEXT, hint))],
            map: CaretMap {
                blocks: vec![placeholder],
                width,
            },
        };
    }

    let gap = (settings.line_spacing - 1.0).round().max(0.0) as usize;
    let mut lines = Vec::new();
    let mut blocks = Vec::with_capacity(tree.len());

    for (i, block) in tree.blocks().iter().enumerate() {
        if i > 0 {
            lines.extend(std::iter::repeat_with(Line::default).take(gap));
        }

        let (rows, align, text) = match block {
            Block::Paragraph(p) => {
                let cells = p
                    .runs
                    .iter()
                    .flat_map(|run| {
                        let style = run_style(run.format);
                        run.text.chars().map(move |c| (c, style))
                    })
                    .collect();
                (wrap(cells, width), settings.text_align, true)
            }
            other => (object_rows(other, width), TextAlign::Left, false),
        };

        let mut placed = BlockRows {
            id: block.id(),
            text,
            first_line: lines.len(),
            rows: Vec::with_capacity(rows.len()),
        };
        for (start, cells) in rows {
            let shift = row_shift(cells.len(), width, align);
            placed.rows.push((start, cells.len(), shift));
            lines.push(row_line(cells, shift));
        }
        blocks.push(placed);
    }

    DocLayout {
        lines,
        map: CaretMap { blocks, width },
    }
}

fn run_style(format: RunFormat) -> Style {
    let mut style = Style::default();
    if format.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if format.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if format.underline {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    style
}

/// Break cells into rows of at most `width`, preferring to break after a space
fn wrap(cells: Vec<Cell>, width: usize) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut start = 0;
    while cells.len() - start > width {
        let window = &cells[start..start + width];
        let take = window
            .iter()
            .rposition(|(c, _)| c.is_whitespace())
            .map_or(width, |i| i + 1);
        rows.push((start, window[..take].to_vec()));
        start += take;
    }
    rows.push((start, cells[start..].to_vec()));
    rows
}

/// Rows for images, tables, citations and lists
fn object_rows(block: &Block, width: usize) -> Vec<Row> {
    let (text_lines, style) = match block {
        Block::Image(image) => (
            vec![format!(
                "[image {} · {}]",
                image.mime_type,
                human_size(image.data.len())
            )],
            Style::default().fg(Color::Magenta),
        ),
        Block::Table(table) => (table_lines(&table.rows), Style::default().fg(Color::Cyan)),
        Block::Citation(citation) => (
            vec![citation.rendered_text.clone()],
            Style::default().add_modifier(Modifier::ITALIC),
        ),
        Block::List(list) => (render::list_lines(list), Style::default()),
        Block::Paragraph(p) => (vec![p.text()], Style::default()),
    };

    text_lines
        .iter()
        .flat_map(|line| wrap(line.chars().map(|c| (c, style)).collect(), width))
        .collect()
}

fn table_lines(rows: &[Vec<String>]) -> Vec<String> {
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..cols)
        .map(|c| {
            rows.iter()
                .filter_map(|row| row.get(c))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
                .max(1)
        })
        .collect();

    rows.iter()
        .map(|row| {
            let cells: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(c, w)| {
                    let text = row.get(c).map(String::as_str).unwrap_or("");
                    format!(" {:<w$} ", text, w = w)
                })
                .collect();
            format!("│{}│", cells.join("│"))
        })
        .collect()
}

fn row_shift(len: usize, width: usize, align: TextAlign) -> usize {
    let free = width.saturating_sub(len);
    match align {
        TextAlign::Center => free / 2,
        TextAlign::Right => free,
        TextAlign::Left | TextAlign::Justify => 0,
    }
}

/// Group cells into styled spans
fn row_line(cells: Vec<Cell>, shift: usize) -> Line<'static> {
    let mut spans = Vec::new();
    if shift > 0 {
        spans.push(Span::raw(" ".repeat(shift)));
    }

    let mut text = String::new();
    let mut style = None;
    for (c, cell_style) in cells {
        if style.is_some_and(|s| s != cell_style) {
            spans.push(Span::styled(std::mem::take(&mut text), style.unwrap_or_default()));
        }
        style = Some(cell_style);
        text.push(c);
    }
    if !text.is_empty() {
        spans.push(Span::styled(text, style.unwrap_or_default()));
    }
    Line::from(spans)
}

fn human_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{} KB", bytes / 1024)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

fn clamp_u16(n: i32) -> u16 {
    u16::try_from(n.max(0)).unwrap_or(u16::MAX)
}
