use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Text},
    widgets::{Block, Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget},
};
use tracing::trace;

use crate::cell::display_text;
use crate::sort::SortDirection;
use crate::table::{DataTable, ViewState};

pub const LOADING_TEXT: &str = "Loading data...";
pub const EMPTY_TEXT: &str = "No data available";

pub const UNSORTED_ICON: &str = "↕";
pub const UP_ARROW: &str = "↑";
pub const DOWN_ARROW: &str = "↓";
pub const CHECKED: &str = "[x]";
pub const UNCHECKED: &str = "[ ]";

pub const CHECKBOX_WIDTH: u16 = 3;
pub const COLUMN_WIDTH_MARGIN: usize = 1;
pub const COLUMN_SPACING: u16 = 1;
pub const TABLE_HEADER_HEIGHT: u16 = 1;

/// Header element that has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFocus {
    SelectAll,
    Column(usize),
}

/// What a pointer position lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    SelectAll,
    Header(usize),
    RowCheckbox(usize),
    Row(usize),
}

/// Screen regions of the last populated render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitMap {
    area: Rect,
    checkbox: Option<Rect>,
    columns: Vec<Rect>,
    offset: usize,
    nrows: usize,
}

impl HitMap {
    pub fn hit_test(&self, x: u16, y: u16) -> Option<HitTarget> {
        if self.area.is_empty() || x < self.area.x || x >= self.area.right() {
            return None;
        }
        if y < self.area.y || y >= self.area.bottom() {
            return None;
        }
        let in_x = |r: &Rect| x >= r.x && x < r.right();

        if y == self.area.y {
            if self.checkbox.as_ref().is_some_and(in_x) {
                return Some(HitTarget::SelectAll);
            }
            return self.columns.iter().position(in_x).map(HitTarget::Header);
        }

        let row = self.offset + (y - self.area.y - TABLE_HEADER_HEIGHT) as usize;
        if row >= self.nrows {
            return None;
        }
        if self.checkbox.as_ref().is_some_and(in_x) {
            Some(HitTarget::RowCheckbox(row))
        } else {
            Some(HitTarget::Row(row))
        }
    }
}

#[derive(Debug, Default)]
pub struct TableViewState {
    pub table_state: TableState,
    pub header_focus: Option<HeaderFocus>,
    hit_map: HitMap,
}

impl TableViewState {
    pub fn hit_map(&self) -> &HitMap {
        &self.hit_map
    }

    pub fn cursor(&self) -> Option<usize> {
        self.table_state.selected()
    }
}

pub struct TableView<'a, R> {
    table: &'a DataTable<R>,
    block: Option<Block<'a>>,
    max_column_width: usize,
}

impl<'a, R: Clone> TableView<'a, R> {
    pub fn new(table: &'a DataTable<R>) -> Self {
        Self {
            table,
            block: None,
            max_column_width: usize::MAX,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn max_column_width(mut self, width: usize) -> Self {
        self.max_column_width = width;
        self
    }
}

pub fn sort_icon(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => UP_ARROW,
        SortDirection::Descending => DOWN_ARROW,
        SortDirection::None => UNSORTED_ICON,
    }
}

fn checkbox(checked: bool) -> &'static str {
    if checked { CHECKED } else { UNCHECKED }
}

fn text_width(s: &str) -> usize {
    Line::from(s).width()
}

/// Width of a column: the wider of header and cells plus a margin, capped.
pub fn column_width(header: &str, cells: &[String], max_column_width: usize) -> usize {
    let widest = cells.iter().map(|c| text_width(c)).max().unwrap_or(0);
    let width = std::cmp::max(text_width(header), widest) + COLUMN_WIDTH_MARGIN;
    std::cmp::min(width, max_column_width)
}

/// Length constraint for a column; widths past `u16::MAX` saturate.
pub fn column_constraint(width: usize) -> Constraint {
    Constraint::Length(u16::try_from(width).unwrap_or(u16::MAX))
}

/// First row to draw so the cursor stays inside a body of `height` rows.
fn scroll_offset(offset: usize, cursor: Option<usize>, height: usize, nrows: usize) -> usize {
    let offset = offset.min(nrows.saturating_sub(1));
    match cursor {
        Some(cursor) if cursor < offset => cursor,
        Some(cursor) if height > 0 && cursor >= offset + height => cursor + 1 - height,
        _ => offset,
    }
}

impl<R: Clone> TableView<'_, R> {
    fn render_message(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let text = Text::from(vec![Line::from(""), Line::from(message.italic())]);
        let paragraph = Paragraph::new(text).centered();
        match &self.block {
            Some(block) => paragraph.block(block.clone()).render(area, buf),
            None => paragraph.render(area, buf),
        }
    }

    fn render_table(&self, area: Rect, buf: &mut Buffer, state: &mut TableViewState) {
        let inner = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        let table = self.table;
        let selectable = table.options().selectable;
        let sort = table.sort_state();

        // Only the rows that fit are formatted. The sort order is a list of
        // positions, so no row is copied.
        let nrows = table.len();
        let body_height = usize::from(inner.height.saturating_sub(TABLE_HEADER_HEIGHT));
        let cursor = state.table_state.selected().filter(|&c| c < nrows);
        let offset = scroll_offset(state.table_state.offset(), cursor, body_height, nrows);
        let visible = offset..nrows.min(offset + body_height);
        let order = table.view_order();
        let window: Vec<&R> = visible
            .clone()
            .map(|pos| &table.rows()[order.as_ref().map_or(pos, |o| o[pos])])
            .collect();

        // Columns of display strings, one Vec per column.
        let data: Vec<Vec<String>> = table
            .columns()
            .iter()
            .map(|c| window.iter().map(|row| display_text(c.value(row).as_ref())).collect())
            .collect();

        let headers: Vec<String> = table
            .columns()
            .iter()
            .map(|c| {
                if c.sortable {
                    format!("{} {}", c.title, sort_icon(sort.direction_for(&c.key)))
                } else {
                    c.title.clone()
                }
            })
            .collect();

        let mut widths = Vec::with_capacity(headers.len() + 1);
        if selectable {
            widths.push(Constraint::Length(CHECKBOX_WIDTH));
        }
        for (header, cells) in headers.iter().zip(data.iter()) {
            widths.push(column_constraint(column_width(header, cells, self.max_column_width)));
        }

        let focus_style = Style::default().add_modifier(Modifier::REVERSED);
        let mut header_cells = Vec::with_capacity(widths.len());
        if selectable {
            let mut cell = Cell::from(checkbox(table.all_selected()));
            if state.header_focus == Some(HeaderFocus::SelectAll) {
                cell = cell.style(focus_style);
            }
            header_cells.push(cell);
        }
        for (idx, header) in headers.into_iter().enumerate() {
            let mut cell = Cell::from(header);
            if state.header_focus == Some(HeaderFocus::Column(idx)) {
                cell = cell.style(focus_style);
            }
            header_cells.push(cell);
        }
        let header = Row::new(header_cells)
            .style(Style::default().bold())
            .height(TABLE_HEADER_HEIGHT);

        let rows = visible.enumerate().map(|(widx, pos)| {
            let selected = table.is_row_selected(pos);
            let mut cells = Vec::with_capacity(widths.len());
            if selectable {
                cells.push(Cell::from(checkbox(selected)));
            }
            cells.extend(data.iter().map(|column| Cell::from(column[widx].as_str())));
            let row = Row::new(cells);
            if selected {
                row.style(Style::default().fg(Color::Yellow))
            } else {
                row
            }
        });

        let row_highlight = if state.header_focus.is_some() {
            Style::default().add_modifier(Modifier::UNDERLINED)
        } else {
            focus_style
        };
        let widget = Table::new(rows, widths.clone())
            .header(header)
            .column_spacing(COLUMN_SPACING)
            .row_highlight_style(row_highlight);
        let mut window_state = TableState::default().with_selected(cursor.map(|c| c - offset));
        StatefulWidget::render(widget, inner, buf, &mut window_state);
        *state.table_state.offset_mut() = offset;

        // Same split the table performs, so clicks map to what was drawn.
        let header_area = Rect { height: 1, ..inner };
        let rects = Layout::horizontal(widths)
            .flex(Flex::Start)
            .spacing(COLUMN_SPACING)
            .split(header_area);
        let (checkbox, columns) = if selectable {
            (rects.first().copied(), rects.iter().skip(1).copied().collect())
        } else {
            (None, rects.to_vec())
        };
        state.hit_map = HitMap {
            area: inner,
            checkbox,
            columns,
            offset,
            nrows,
        };
        trace!("Rendered table: {:?}", state.hit_map);
    }
}

impl<R: Clone> StatefulWidget for TableView<'_, R> {
    type State = TableViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        match self.table.view_state() {
            ViewState::Loading => {
                state.hit_map = HitMap::default();
                self.render_message(LOADING_TEXT, area, buf);
            }
            ViewState::Empty => {
                state.hit_map = HitMap::default();
                self.render_message(EMPTY_TEXT, area, buf);
            }
            ViewState::Populated => self.render_table(area, buf, state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use crate::column::ColumnDescriptor;
    use crate::table::TableOptions;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct Item {
        name: &'static str,
        stock: Option<i64>,
    }

    fn table(rows: Vec<Item>, selectable: bool) -> DataTable<Item> {
        let columns = vec![
            ColumnDescriptor::new("name", "Name", |i: &Item| Some(CellValue::from(i.name))).sortable(true),
            ColumnDescriptor::new("stock", "Stock", |i: &Item| i.stock.map(CellValue::Int)),
        ];
        DataTable::new(Arc::new(rows), columns)
            .with_options(TableOptions::default().with_selectable(selectable))
    }

    fn items() -> Vec<Item> {
        vec![
            Item { name: "Mouse", stock: Some(50) },
            Item { name: "Laptop", stock: None },
        ]
    }

    fn render(table: &DataTable<Item>, state: &mut TableViewState, width: u16, height: u16) -> Vec<String> {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        TableView::new(table).render(area, &mut buf, state);
        (0..height)
            .map(|y| (0..width).map(|x| buf[(x, y)].symbol()).collect::<String>())
            .collect()
    }

    #[test]
    fn loading_wins_over_empty_and_data() {
        let mut t = table(items(), false);
        t.set_loading(true);
        let lines = render(&t, &mut TableViewState::default(), 30, 4);
        assert!(lines.iter().any(|l| l.contains(LOADING_TEXT)));
        assert!(!lines.iter().any(|l| l.contains("Mouse")));

        let mut empty = table(Vec::new(), false);
        empty.set_loading(true);
        let lines = render(&empty, &mut TableViewState::default(), 30, 4);
        assert!(lines.iter().any(|l| l.contains(LOADING_TEXT)));
    }

    #[test]
    fn empty_table_shows_message() {
        let mut state = TableViewState::default();
        let lines = render(&table(Vec::new(), true), &mut state, 30, 4);
        assert!(lines.iter().any(|l| l.contains(EMPTY_TEXT)));
        assert_eq!(state.hit_map().hit_test(1, 1), None);
    }

    #[test]
    fn populated_table_shows_headers_icons_and_blank_missing() {
        let lines = render(&table(items(), false), &mut TableViewState::default(), 30, 3);
        assert_eq!(lines[0].trim_end(), "Name ↕  Stock");
        assert_eq!(lines[1].trim_end(), "Mouse   50");
        assert_eq!(lines[2].trim_end(), "Laptop");
    }

    #[test]
    fn header_icon_follows_sort_state() {
        let mut t = table(items(), false);
        t.activate_column("name");
        let lines = render(&t, &mut TableViewState::default(), 30, 3);
        assert!(lines[0].starts_with("Name ↑"));
        assert!(lines[1].starts_with("Laptop"));
        t.activate_column("name");
        let lines = render(&t, &mut TableViewState::default(), 30, 3);
        assert!(lines[0].starts_with("Name ↓"));
        assert!(lines[1].starts_with("Mouse"));
    }

    #[test]
    fn checkboxes_reflect_selection() {
        let mut t = table(items(), true);
        t.toggle_row(1, true);
        let lines = render(&t, &mut TableViewState::default(), 30, 3);
        assert!(lines[0].starts_with(UNCHECKED));
        assert!(lines[1].starts_with(UNCHECKED));
        assert!(lines[2].starts_with(CHECKED));
        t.toggle_all(true);
        let lines = render(&t, &mut TableViewState::default(), 30, 3);
        assert!(lines[0].starts_with(CHECKED));
    }

    #[test]
    fn hit_map_resolves_header_and_rows() {
        let t = table(items(), true);
        let mut state = TableViewState::default();
        render(&t, &mut state, 30, 3);
        let hits = state.hit_map();
        // "[ ]" occupies x 0..3, "Name ↕" x 4..11, "Stock" after that.
        assert_eq!(hits.hit_test(1, 0), Some(HitTarget::SelectAll));
        assert_eq!(hits.hit_test(5, 0), Some(HitTarget::Header(0)));
        assert_eq!(hits.hit_test(13, 0), Some(HitTarget::Header(1)));
        assert_eq!(hits.hit_test(0, 1), Some(HitTarget::RowCheckbox(0)));
        assert_eq!(hits.hit_test(6, 2), Some(HitTarget::Row(1)));
        assert_eq!(hits.hit_test(6, 3), None);
        assert_eq!(hits.hit_test(29, 0), None);
    }

    fn numbered(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| Item { name: format!("item{i:02}").leak(), stock: Some(i as i64) })
            .collect()
    }

    #[test]
    fn cursor_below_the_fold_scrolls_the_window() {
        let t = table(numbered(20), true);
        let mut state = TableViewState::default();
        state.table_state.select(Some(12));
        // One header line and four body lines.
        let lines = render(&t, &mut state, 30, 5);
        assert_eq!(state.table_state.offset(), 9);
        assert!(lines[1].contains("item09"));
        assert!(lines[4].contains("item12"));
        assert_eq!(state.hit_map().hit_test(5, 1), Some(HitTarget::Row(9)));
        assert_eq!(state.hit_map().hit_test(1, 4), Some(HitTarget::RowCheckbox(12)));

        state.table_state.select(Some(2));
        let lines = render(&t, &mut state, 30, 5);
        assert_eq!(state.table_state.offset(), 2);
        assert!(lines[1].contains("item02"));
    }

    #[test]
    fn scrolled_window_follows_sort_order() {
        let mut t = table(numbered(20), false);
        t.activate_column("name");
        t.activate_column("name");
        let mut state = TableViewState::default();
        state.table_state.select(Some(19));
        let lines = render(&t, &mut state, 30, 3);
        assert_eq!(state.table_state.offset(), 18);
        assert!(lines[1].starts_with("item01"));
        assert!(lines[2].starts_with("item00"));
    }

    #[test]
    fn very_wide_cells_keep_their_column() {
        assert_eq!(column_constraint(12), Constraint::Length(12));
        assert_eq!(column_constraint(70_000), Constraint::Length(u16::MAX));

        // Name plus margin is 65536 cells wide, one past what a u16 holds.
        let wide = Item { name: "w".repeat(65_535).leak(), stock: Some(1) };
        let lines = render(&table(vec![wide], false), &mut TableViewState::default(), 30, 2);
        assert!(lines[1].starts_with("wwwww"));
    }

    #[test]
    fn column_width_is_capped() {
        let cells = vec!["a".repeat(50)];
        assert_eq!(column_width("Name", &cells, 20), 20);
        assert_eq!(column_width("Name", &["ab".to_string()], 20), 5);
    }
}
