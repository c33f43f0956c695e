use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::Stylize,
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph},
};

use datatable::cell::display_text;
use datatable::domain::{DTConfig, Focus, HELP_TEXT};
use datatable::view::{TABLE_HEADER_HEIGHT, TableView};

use crate::model::Model;

pub const CMDLINE_HEIGHT: u16 = 1;
pub const SELECTION_PANEL_HEIGHT: u16 = 6;
// Rows of the screen not available for table rows.
pub const CHROME_HEIGHT: u16 = 2 + TABLE_HEADER_HEIGHT + SELECTION_PANEL_HEIGHT + CMDLINE_HEIGHT;
const STATUS_MESSAGE_FADE: Duration = Duration::from_secs(5);
const SUMMARY_COLUMNS: usize = 3;

#[derive(Debug)]
pub struct TableUI {
    max_column_width: usize,
}

impl TableUI {
    pub fn new(config: &DTConfig) -> Self {
        Self {
            max_column_width: config.max_column_width,
        }
    }

    pub fn draw(&self, model: &mut Model, frame: &mut Frame) {
        let [table_area, selection_area, status_area] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(SELECTION_PANEL_HEIGHT),
            Constraint::Length(CMDLINE_HEIGHT),
        ])
        .areas(frame.area());

        let title = Line::from(Span::from(format!(" {} ", model.name())).bold());
        let instructions = Line::from(vec![
            " Sort/Select ".into(),
            "<Enter>".blue().bold(),
            " Focus ".into(),
            "<Tab>".blue().bold(),
            " Help ".into(),
            "<?>".blue().bold(),
            " Quit ".into(),
            "<Q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);

        let (table, state) = model.table_and_state();
        let view = TableView::new(table)
            .block(block)
            .max_column_width(self.max_column_width);
        frame.render_stateful_widget(view, table_area, state);

        self.draw_selection(model, frame, selection_area);
        self.draw_statusline(model, frame, status_area);

        if model.show_help() {
            self.draw_help(frame);
        }
    }

    fn draw_selection(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let selected = model.selected_rows();
        let columns = model.table().columns();
        let lines: Vec<Line> = selected
            .iter()
            .map(|row| {
                let summary = columns
                    .iter()
                    .take(SUMMARY_COLUMNS)
                    .map(|c| display_text(c.value(row).as_ref()))
                    .collect::<Vec<String>>()
                    .join(" | ");
                Line::from(summary)
            })
            .collect();

        let block = Block::bordered().title(format!(" Selected Rows ({}) ", selected.len()));
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
    }

    fn draw_statusline(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let sort = model.table().sort_state();
        let sort_text = match sort.active_column_key() {
            Some(key) => format!("{key} {}", sort.direction().label()),
            None => "unsorted".to_string(),
        };
        let focus = match model.focus() {
            Focus::Header => "header",
            Focus::Body => "rows",
        };
        let right = format!("focus: {focus} | sort: {sort_text} ");

        let message = Span::from(format!(" {}", model.status_message()));
        let message = if model.last_status_message_update().elapsed() > STATUS_MESSAGE_FADE {
            message.dim()
        } else {
            message
        };

        let right_width = right.chars().count() as u16;
        let [left_area, right_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(right_width)]).areas(area);
        frame.render_widget(Paragraph::new(Line::from(message)), left_area);
        frame.render_widget(Paragraph::new(Line::from(Span::from(right).yellow())).right_aligned(), right_area);
    }

    fn draw_help(&self, frame: &mut Frame) {
        let width = HELP_TEXT.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
        let height = HELP_TEXT.lines().count() as u16 + 2;
        let [area] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(frame.area());
        let [area] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);

        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(HELP_TEXT).block(block), area);
    }
}
