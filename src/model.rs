use arboard::Clipboard;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};

use datatable::cell::display_text;
use datatable::column::ColumnDescriptor;
use datatable::domain::{DTConfig, DTError, Focus, Message};
use datatable::loader::FileRow;
use datatable::table::{DataTable, TableOptions, ViewState};
use datatable::view::{HeaderFocus, HitTarget, TableViewState};

use crate::ui::CHROME_HEIGHT;

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

pub struct Model {
    pub status: Status,
    name: String,
    source: Arc<Vec<FileRow>>,
    table: DataTable<FileRow>,
    view_state: TableViewState,
    focus: Focus,
    header_cursor: usize,
    selected: Rc<RefCell<Vec<FileRow>>>,
    show_empty: bool,
    show_help: bool,
    clipboard: Option<Clipboard>,
    page_height: usize,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(
        config: &DTConfig,
        name: String,
        columns: Vec<ColumnDescriptor<FileRow>>,
        rows: Vec<FileRow>,
        ui_height: u16,
    ) -> Self {
        let source = Arc::new(rows);
        // The table reports every user driven change; the panel mirrors it.
        let selected = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&selected);
        let table = DataTable::new(Arc::clone(&source), columns)
            .with_options(TableOptions::default().with_selectable(config.selectable))
            .on_selection_change(move |rows: &[FileRow]| *sink.borrow_mut() = rows.to_vec());

        let mut model = Self {
            status: Status::Ready,
            name,
            source,
            table,
            view_state: TableViewState::default(),
            focus: Focus::Body,
            header_cursor: 0,
            selected,
            show_empty: false,
            show_help: false,
            clipboard: None,
            page_height: 0,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        model.ui_resize(ui_height);
        model.sync_view_state();
        model.set_status_message(format!("Showing {} rows", model.table.len()));
        model
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &DataTable<FileRow> {
        &self.table
    }

    /// Table and its render state, borrowed together for drawing.
    pub fn table_and_state(&mut self) -> (&DataTable<FileRow>, &mut TableViewState) {
        (&self.table, &mut self.view_state)
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn selected_rows(&self) -> Vec<FileRow> {
        self.selected.borrow().clone()
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn last_status_message_update(&self) -> Instant {
        self.last_status_message_update
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), DTError> {
        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: {msg:?}");

        if self.show_help {
            match msg {
                Message::Quit => self.quit(),
                Message::Resize(_, height) => self.ui_resize(height),
                Message::Exit | Message::Help => self.show_help = false,
                _ => (),
            }
            return Ok(());
        }

        match msg {
            Message::Quit => self.quit(),
            Message::Exit => self.focus = Focus::Body,
            Message::Help => self.show_help = true,
            Message::SwitchFocus => self.switch_focus(),
            Message::MoveUp => self.move_cursor_up(1),
            Message::MoveDown => self.move_cursor_down(1),
            Message::MovePageUp => self.move_cursor_up(self.page_height),
            Message::MovePageDown => self.move_cursor_down(self.page_height),
            Message::MoveBeginning => self.move_cursor_up(usize::MAX),
            Message::MoveEnd => self.move_cursor_down(usize::MAX),
            Message::MoveLeft => self.move_header_cursor(-1),
            Message::MoveRight => self.move_header_cursor(1),
            Message::Activate => self.activate(),
            Message::Click(x, y) => self.click(x, y),
            Message::ToggleSelectAll => {
                self.table.flip_all();
            }
            Message::ToggleLoading => self.toggle_loading(),
            Message::ToggleEmpty => self.toggle_empty(),
            Message::ResetData => self.reset_data(),
            Message::CopySelection => self.copy_selection(),
            Message::Resize(_, height) => self.ui_resize(height),
        }
        self.sync_view_state();
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn header_slots(&self) -> usize {
        let checkbox = usize::from(self.table.options().selectable);
        self.table.columns().len() + checkbox
    }

    fn header_focus(&self) -> Option<HeaderFocus> {
        if self.focus != Focus::Header {
            return None;
        }
        if self.table.options().selectable {
            match self.header_cursor {
                0 => Some(HeaderFocus::SelectAll),
                n => Some(HeaderFocus::Column(n - 1)),
            }
        } else {
            Some(HeaderFocus::Column(self.header_cursor))
        }
    }

    fn sync_view_state(&mut self) {
        self.header_cursor = std::cmp::min(self.header_cursor, self.header_slots().saturating_sub(1));
        self.view_state.header_focus = self.header_focus();
        let nrows = self.table.len();
        let cursor = match self.view_state.cursor() {
            _ if nrows == 0 => None,
            Some(row) => Some(std::cmp::min(row, nrows - 1)),
            None => Some(0),
        };
        self.view_state.table_state.select(cursor);
    }

    fn switch_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Header => Focus::Body,
            Focus::Body => Focus::Header,
        };
    }

    fn move_cursor_up(&mut self, size: usize) {
        if let Some(row) = self.view_state.cursor() {
            self.view_state.table_state.select(Some(row.saturating_sub(size)));
        }
    }

    fn move_cursor_down(&mut self, size: usize) {
        if let Some(row) = self.view_state.cursor() {
            let last = self.table.len().saturating_sub(1);
            self.view_state.table_state.select(Some(std::cmp::min(row.saturating_add(size), last)));
        }
    }

    fn move_header_cursor(&mut self, step: isize) {
        self.focus = Focus::Header;
        let last = self.header_slots().saturating_sub(1);
        self.header_cursor = self.header_cursor.saturating_add_signed(step).min(last);
    }

    fn activate(&mut self) {
        if self.table.view_state() != ViewState::Populated {
            return;
        }
        match self.focus {
            Focus::Header => match self.header_focus() {
                Some(HeaderFocus::SelectAll) => {
                    self.table.flip_all();
                }
                Some(HeaderFocus::Column(idx)) => self.activate_column(idx),
                None => (),
            },
            Focus::Body => {
                if let Some(row) = self.view_state.cursor() {
                    self.table.flip_row(row);
                }
            }
        }
    }

    fn activate_column(&mut self, idx: usize) {
        let Some(key) = self.table.columns().get(idx).map(|c| c.key.clone()) else {
            return;
        };
        if self.table.activate_column(&key) {
            // Selection is positional, so the same positions now hold other rows.
            *self.selected.borrow_mut() = self.table.selected_rows();
            let direction = self.table.sort_state().direction_for(&key).label();
            self.set_status_message(format!("Sort {key}: {direction}"));
        }
    }

    fn click(&mut self, x: u16, y: u16) {
        let Some(target) = self.view_state.hit_map().hit_test(x, y) else {
            return;
        };
        debug!("Click at {x}:{y} => {target:?}");
        let offset = usize::from(self.table.options().selectable);
        match target {
            HitTarget::SelectAll => {
                self.focus = Focus::Header;
                self.header_cursor = 0;
                self.table.flip_all();
            }
            HitTarget::Header(idx) => {
                self.focus = Focus::Header;
                self.header_cursor = idx + offset;
                self.activate_column(idx);
            }
            HitTarget::RowCheckbox(row) => {
                self.focus = Focus::Body;
                self.view_state.table_state.select(Some(row));
                self.table.flip_row(row);
            }
            HitTarget::Row(row) => {
                self.focus = Focus::Body;
                self.view_state.table_state.select(Some(row));
            }
        }
    }

    fn toggle_loading(&mut self) {
        let loading = !self.table.options().loading;
        self.table.set_loading(loading);
        self.set_status_message(if loading { "Loading ..." } else { "Loaded" });
    }

    // A new collection clears the table selection without a callback, so the
    // mirrored panel is cleared here. The same collection keeps both.
    fn replace_rows(&mut self, rows: Arc<Vec<FileRow>>) {
        if Arc::ptr_eq(self.table.rows(), &rows) {
            return;
        }
        self.table.set_rows(rows);
        self.selected.borrow_mut().clear();
    }

    fn toggle_empty(&mut self) {
        self.show_empty = !self.show_empty;
        if self.show_empty {
            self.replace_rows(Arc::new(Vec::new()));
            self.set_status_message("Showing empty data");
        } else {
            self.replace_rows(Arc::clone(&self.source));
            self.set_status_message(format!("Showing {} rows", self.source.len()));
        }
    }

    fn reset_data(&mut self) {
        self.show_empty = false;
        self.replace_rows(Arc::clone(&self.source));
        info!("Data reset to {} rows", self.source.len());
        self.set_status_message("Data reset");
    }

    fn selection_as_text(&self) -> String {
        let header = self
            .table
            .columns()
            .iter()
            .map(|c| c.title.as_str())
            .collect::<Vec<&str>>()
            .join("\t");
        let mut lines = vec![header];
        for row in self.table.selected_rows().iter() {
            let line = self
                .table
                .columns()
                .iter()
                .map(|c| display_text(c.value(row).as_ref()))
                .collect::<Vec<String>>()
                .join("\t");
            lines.push(line);
        }
        lines.join("\n")
    }

    fn copy_selection(&mut self) {
        let count = self.table.selection().len();
        if count == 0 {
            self.set_status_message("Nothing selected");
            return;
        }
        let text = self.selection_as_text();
        match self.write_clipboard(text) {
            Ok(()) => self.set_status_message(format!("Copied {count} rows")),
            Err(e) => self.set_status_message(format!("Copy failed: {e:?}")),
        }
    }

    fn write_clipboard(&mut self, text: String) -> Result<(), DTError> {
        if self.clipboard.is_none() {
            let clipboard = Clipboard::new().map_err(|e| DTError::Clipboard(e.to_string()))?;
            self.clipboard = Some(clipboard);
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            clipboard
                .set_text(text)
                .map_err(|e| DTError::Clipboard(e.to_string()))?;
        }
        Ok(())
    }

    fn ui_resize(&mut self, height: u16) {
        self.page_height = usize::from(height.saturating_sub(CHROME_HEIGHT)).max(1);
        trace!("UI was resized! h:{height}, page: {}", self.page_height);
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;
    use datatable::cell::CellValue;
    use datatable::sort::SortDirection;

    fn model(selectable: bool) -> Model {
        let config = DTConfig {
            selectable,
            ..DTConfig::default()
        };
        let users = sample::users();
        let columns = sample::user_columns(&users);
        Model::init(&config, users.name, columns, users.rows, 30)
    }

    fn send(model: &mut Model, messages: &[Message]) {
        for m in messages {
            model.update(Some(m.clone())).unwrap();
        }
    }

    #[test]
    fn keyboard_sorts_focused_header() {
        let mut m = model(true);
        // Slot 0 is the select-all box, slot 1 the first column.
        send(&mut m, &[Message::SwitchFocus, Message::MoveRight, Message::Activate]);
        assert_eq!(m.table().sort_state().active_column_key(), Some("id"));
        assert_eq!(m.table().sort_state().direction(), SortDirection::Ascending);
        send(&mut m, &[Message::Activate, Message::Activate]);
        assert_eq!(m.table().sort_state().direction(), SortDirection::None);
    }

    #[test]
    fn body_activation_toggles_cursor_row() {
        let mut m = model(true);
        send(&mut m, &[Message::MoveDown, Message::Activate]);
        assert!(m.table().is_row_selected(1));
        assert_eq!(m.selected_rows().len(), 1);
        send(&mut m, &[Message::ToggleSelectAll]);
        assert_eq!(m.selected_rows().len(), 5);
    }

    #[test]
    fn cursor_is_clamped() {
        let mut m = model(true);
        send(&mut m, &[Message::MoveEnd, Message::MoveDown]);
        assert_eq!(m.view_state.cursor(), Some(4));
        send(&mut m, &[Message::MoveBeginning, Message::MoveUp]);
        assert_eq!(m.view_state.cursor(), Some(0));
    }

    #[test]
    fn empty_data_clears_the_panel() {
        let mut m = model(true);
        send(&mut m, &[Message::Activate]);
        assert_eq!(m.selected_rows().len(), 1);
        send(&mut m, &[Message::ToggleEmpty]);
        assert_eq!(m.table().view_state(), ViewState::Empty);
        assert!(m.selected_rows().is_empty());
        assert_eq!(m.view_state.cursor(), None);
        send(&mut m, &[Message::ToggleEmpty]);
        assert_eq!(m.table().len(), 5);
        assert!(m.table().selection().is_empty());
    }

    #[test]
    fn reset_keeps_selection_of_the_shown_data() {
        let mut m = model(true);
        send(&mut m, &[Message::Activate, Message::ResetData]);
        assert!(m.table().is_row_selected(0));
        assert_eq!(m.selected_rows().len(), 1);

        send(&mut m, &[Message::ToggleEmpty, Message::ResetData]);
        assert_eq!(m.table().len(), 5);
        assert!(m.table().selection().is_empty());
        assert!(m.selected_rows().is_empty());
    }

    #[test]
    fn panel_follows_selection_after_sort() {
        let mut m = model(true);
        // Row 0 holds John Doe until the name sort moves Alice Brown there.
        send(&mut m, &[Message::Activate]);
        send(&mut m, &[Message::SwitchFocus, Message::MoveRight, Message::MoveRight, Message::Activate]);
        assert_eq!(m.table().sort_state().active_column_key(), Some("name"));
        assert_eq!(m.selected_rows(), m.table().selected_rows());
        assert_eq!(m.selected_rows()[0][1], Some(CellValue::from("Alice Brown")));
    }

    #[test]
    fn loading_blocks_activation() {
        let mut m = model(true);
        send(&mut m, &[Message::ToggleLoading, Message::Activate]);
        assert_eq!(m.table().view_state(), ViewState::Loading);
        assert!(m.table().selection().is_empty());
        send(&mut m, &[Message::ToggleLoading]);
        assert_eq!(m.table().view_state(), ViewState::Populated);
    }

    #[test]
    fn help_swallows_other_messages() {
        let mut m = model(true);
        send(&mut m, &[Message::Help, Message::Activate]);
        assert!(m.show_help());
        assert!(m.table().selection().is_empty());
        send(&mut m, &[Message::Exit]);
        assert!(!m.show_help());
        send(&mut m, &[Message::Quit]);
        assert_eq!(m.status, Status::Quitting);
    }

    #[test]
    fn copy_without_selection_is_reported() {
        let mut m = model(true);
        send(&mut m, &[Message::CopySelection]);
        assert_eq!(m.status_message(), "Nothing selected");
    }

    #[test]
    fn selection_text_is_tab_separated() {
        let mut m = model(true);
        send(&mut m, &[Message::Activate]);
        let text = m.selection_as_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID\tName\tEmail\tRole\tStatus\tLast Login");
        assert_eq!(lines[1], "1\tJohn Doe\tjohn@example.com\tAdmin\tactive\t2024-01-15");
    }

    #[test]
    fn without_checkboxes_header_starts_at_first_column() {
        let mut m = model(false);
        send(&mut m, &[Message::SwitchFocus, Message::Activate]);
        assert_eq!(m.table().sort_state().active_column_key(), Some("id"));
        send(&mut m, &[Message::SwitchFocus, Message::Activate]);
        assert!(m.table().selection().is_empty());
    }
}
