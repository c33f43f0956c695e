use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use derive_setters::Setters;
use tracing::{debug, trace};

use crate::column::{ColumnDescriptor, find_column};
use crate::selection::{self, SelectionSet};
use crate::sort::{self, SortState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Setters)]
#[setters(prefix = "with_")]
pub struct TableOptions {
    pub loading: bool,
    pub selectable: bool,
}

/// What the presentation shell shows, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Empty,
    Populated,
}

type SelectionCallback<R> = Box<dyn FnMut(&[R])>;

/// Table controller: owns sort and selection state over a shared row
/// collection.
///
/// Row identity is the position in the sorted view. Supplying a different
/// `Arc` through [`DataTable::set_rows`] clears the selection without
/// notifying the callback.
pub struct DataTable<R> {
    rows: Arc<Vec<R>>,
    columns: Vec<ColumnDescriptor<R>>,
    options: TableOptions,
    sort: SortState,
    selection: SelectionSet,
    on_selection_change: Option<SelectionCallback<R>>,
}

impl<R: Clone> DataTable<R> {
    pub fn new(rows: Arc<Vec<R>>, columns: Vec<ColumnDescriptor<R>>) -> Self {
        Self {
            rows,
            columns,
            options: TableOptions::default(),
            sort: SortState::unsorted(),
            selection: SelectionSet::new(),
            on_selection_change: None,
        }
    }

    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers the callback fired after every user driven selection change.
    pub fn on_selection_change(mut self, callback: impl FnMut(&[R]) + 'static) -> Self {
        self.on_selection_change = Some(Box::new(callback));
        self
    }

    pub fn rows(&self) -> &Arc<Vec<R>> {
        &self.rows
    }

    pub fn columns(&self) -> &[ColumnDescriptor<R>] {
        &self.columns
    }

    pub fn options(&self) -> TableOptions {
        self.options
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn set_rows(&mut self, rows: Arc<Vec<R>>) {
        if !Arc::ptr_eq(&self.rows, &rows) {
            debug!(
                "Row collection replaced ({} -> {} rows), clearing {} selected",
                self.rows.len(),
                rows.len(),
                self.selection.len()
            );
            self.selection = SelectionSet::new();
        }
        self.rows = rows;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.options.loading = loading;
    }

    pub fn set_selectable(&mut self, selectable: bool) {
        self.options.selectable = selectable;
    }

    pub fn view_state(&self) -> ViewState {
        if self.options.loading {
            ViewState::Loading
        } else if self.rows.is_empty() {
            ViewState::Empty
        } else {
            ViewState::Populated
        }
    }

    pub fn sorted_view(&self) -> Cow<'_, [R]> {
        sort::compute_sorted_view(&self.rows, &self.columns, &self.sort)
    }

    /// Positions into [`rows`](Self::rows) in view order, `None` while unsorted.
    pub fn view_order(&self) -> Option<Vec<usize>> {
        sort::sorted_indices(&self.rows, &self.columns, &self.sort)
    }

    /// Header activation from any input channel.
    ///
    /// Unknown keys and columns that are not sortable leave the state as it
    /// is. Returns whether the sort state changed.
    pub fn activate_column(&mut self, key: &str) -> bool {
        match find_column(&self.columns, key) {
            Some(column) if column.sortable => {
                self.sort = sort::advance_sort(&self.sort, key);
                debug!("Sort by {:?} {}", self.sort.active_column_key(), self.sort.direction().label());
                true
            }
            Some(_) => {
                trace!("Ignoring activation of unsortable column {key:?}");
                false
            }
            None => {
                trace!("Ignoring activation of unknown column {key:?}");
                false
            }
        }
    }

    pub fn is_row_selected(&self, index: usize) -> bool {
        self.selection.contains(index)
    }

    pub fn all_selected(&self) -> bool {
        selection::all_selected(&self.selection, self.rows.len())
    }

    pub fn selected_rows(&self) -> Vec<R> {
        selection::derive_selected_rows(&self.sorted_view(), &self.selection)
    }

    /// Checks or unchecks the row at `index` of the sorted view.
    ///
    /// Out of range indices and tables that are not selectable are ignored.
    /// Returns whether the toggle was applied.
    pub fn toggle_row(&mut self, index: usize, included: bool) -> bool {
        if !self.options.selectable || index >= self.rows.len() {
            trace!("Ignoring toggle of row {index} (selectable: {})", self.options.selectable);
            return false;
        }
        self.selection = selection::toggle_row(&self.selection, index, included);
        self.notify();
        true
    }

    /// Flips the checkbox of the row at `index`.
    pub fn flip_row(&mut self, index: usize) -> bool {
        let included = !self.is_row_selected(index);
        self.toggle_row(index, included)
    }

    pub fn toggle_all(&mut self, included: bool) -> bool {
        if !self.options.selectable {
            return false;
        }
        self.selection = selection::toggle_all(self.rows.len(), included);
        self.notify();
        true
    }

    /// Flips the select-all box.
    pub fn flip_all(&mut self) -> bool {
        let included = !self.all_selected();
        self.toggle_all(included)
    }

    fn notify(&mut self) {
        if self.on_selection_change.is_none() {
            return;
        }
        let selected = self.selected_rows();
        trace!("Selection changed: {} rows", selected.len());
        if let Some(callback) = self.on_selection_change.as_mut() {
            callback(&selected);
        }
    }
}

impl<R> fmt::Debug for DataTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTable")
            .field("rows", &self.rows.len())
            .field("columns", &self.columns)
            .field("options", &self.options)
            .field("sort", &self.sort)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use crate::sort::SortDirection;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct User {
        id: i64,
        name: &'static str,
        email: &'static str,
    }

    fn user(id: i64, name: &'static str) -> User {
        User { id, name, email: "x@example.com" }
    }

    fn columns() -> Vec<ColumnDescriptor<User>> {
        vec![
            ColumnDescriptor::new("id", "ID", |u: &User| Some(CellValue::Int(u.id))).sortable(true),
            ColumnDescriptor::new("name", "Name", |u: &User| Some(CellValue::from(u.name))).sortable(true),
            ColumnDescriptor::new("email", "Email", |u: &User| Some(CellValue::from(u.email))),
        ]
    }

    fn recording_table(rows: Vec<User>) -> (DataTable<User>, Rc<RefCell<Vec<Vec<User>>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let table = DataTable::new(Arc::new(rows), columns())
            .with_options(TableOptions::default().with_selectable(true))
            .on_selection_change(move |rows: &[User]| sink.borrow_mut().push(rows.to_vec()));
        (table, calls)
    }

    fn names(rows: &[User]) -> Vec<&'static str> {
        rows.iter().map(|u| u.name).collect()
    }

    #[test]
    fn view_state_priority() {
        let mut table = DataTable::new(Arc::new(Vec::<User>::new()), columns());
        assert_eq!(table.view_state(), ViewState::Empty);
        table.set_loading(true);
        assert_eq!(table.view_state(), ViewState::Loading);
        table.set_rows(Arc::new(vec![user(1, "a")]));
        assert_eq!(table.view_state(), ViewState::Loading);
        table.set_loading(false);
        assert_eq!(table.view_state(), ViewState::Populated);
    }

    #[test]
    fn three_activations_cycle_the_view() {
        let mut table = DataTable::new(Arc::new(vec![user(1, "Bob"), user(2, "Alice")]), columns());
        assert!(table.activate_column("name"));
        assert_eq!(names(&table.sorted_view()), vec!["Alice", "Bob"]);
        assert!(table.activate_column("name"));
        assert_eq!(names(&table.sorted_view()), vec!["Bob", "Alice"]);
        assert!(table.activate_column("name"));
        assert_eq!(table.sort_state().direction(), SortDirection::None);
        assert_eq!(names(&table.sorted_view()), vec!["Bob", "Alice"]);
    }

    #[test]
    fn view_order_matches_sorted_view() {
        let mut table = DataTable::new(Arc::new(vec![user(1, "Bob"), user(2, "Alice"), user(3, "Carol")]), columns());
        assert_eq!(table.view_order(), None);
        table.activate_column("name");
        table.activate_column("name");
        let order = table.view_order().unwrap();
        let by_index: Vec<User> = order.iter().map(|&idx| table.rows()[idx].clone()).collect();
        assert_eq!(by_index, table.sorted_view().to_vec());
        assert_eq!(names(&by_index), vec!["Carol", "Bob", "Alice"]);
    }

    #[test]
    fn unsortable_and_unknown_columns_are_ignored() {
        let mut table = DataTable::new(Arc::new(vec![user(2, "Bob"), user(1, "Alice")]), columns());
        assert!(table.activate_column("id"));
        let before = table.sort_state().clone();
        assert!(!table.activate_column("email"));
        assert!(!table.activate_column("missing"));
        assert_eq!(table.sort_state(), &before);
        assert_eq!(names(&table.sorted_view()), vec!["Alice", "Bob"]);
    }

    #[test]
    fn toggles_report_rows_in_view_order() {
        let (mut table, calls) = recording_table(vec![user(1, "A"), user(2, "B"), user(3, "C")]);
        assert!(table.toggle_row(2, true));
        assert!(table.toggle_row(0, true));
        let calls = calls.borrow();
        assert_eq!(names(&calls[0]), vec!["C"]);
        assert_eq!(names(&calls[1]), vec!["A", "C"]);
    }

    #[test]
    fn out_of_range_toggle_is_ignored() {
        let (mut table, calls) = recording_table(vec![user(1, "A")]);
        assert!(!table.toggle_row(1, true));
        assert!(table.selection().is_empty());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn not_selectable_ignores_toggles() {
        let mut table = DataTable::new(Arc::new(vec![user(1, "A")]), columns());
        assert!(!table.toggle_row(0, true));
        assert!(!table.toggle_all(true));
        assert!(table.selection().is_empty());
    }

    #[test]
    fn flip_helpers_invert_state() {
        let (mut table, calls) = recording_table(vec![user(1, "A"), user(2, "B")]);
        table.flip_row(1);
        assert!(table.is_row_selected(1));
        table.flip_all();
        assert!(table.all_selected());
        table.flip_all();
        assert!(table.selection().is_empty());
        table.flip_row(1);
        table.flip_row(1);
        assert!(!table.is_row_selected(1));
        assert_eq!(calls.borrow().len(), 5);
    }

    #[test]
    fn selection_is_positional_across_sorts() {
        let (mut table, _) = recording_table(vec![user(1, "Bob"), user(2, "Alice")]);
        table.toggle_row(0, true);
        assert_eq!(names(&table.selected_rows()), vec!["Bob"]);
        table.activate_column("name");
        assert!(table.is_row_selected(0));
        assert_eq!(names(&table.selected_rows()), vec!["Alice"]);
    }

    #[test]
    fn replacing_rows_clears_selection_silently() {
        let rows = vec![user(1, "A"), user(2, "B")];
        let (mut table, calls) = recording_table(rows.clone());
        table.toggle_row(0, true);
        assert_eq!(calls.borrow().len(), 1);

        // Same Arc keeps the selection.
        let same = Arc::clone(table.rows());
        table.set_rows(same);
        assert!(table.is_row_selected(0));

        table.set_rows(Arc::new(rows));
        assert!(table.selection().is_empty());
        assert!(!table.is_row_selected(0));
        assert_eq!(calls.borrow().len(), 1);
    }
}
