use std::borrow::Cow;
use std::cmp::Ordering;

use tracing::{trace, warn};

use crate::cell::CellValue;
use crate::column::{ColumnDescriptor, find_column};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    Descending,
    #[default]
    None,
}

impl SortDirection {
    pub fn label(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ascending",
            SortDirection::Descending => "descending",
            SortDirection::None => "none",
        }
    }
}

/// Which column, if any, orders the rows.
///
/// Fields are private so that a key is present exactly when the direction is
/// not [`SortDirection::None`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    active_column_key: Option<String>,
    direction: SortDirection,
}

impl SortState {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn ascending(key: impl Into<String>) -> Self {
        Self {
            active_column_key: Some(key.into()),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(key: impl Into<String>) -> Self {
        Self {
            active_column_key: Some(key.into()),
            direction: SortDirection::Descending,
        }
    }

    pub fn active_column_key(&self) -> Option<&str> {
        self.active_column_key.as_deref()
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Direction as seen from one column: `None` unless it is the active one.
    pub fn direction_for(&self, key: &str) -> SortDirection {
        match self.active_column_key() {
            Some(active) if active == key => self.direction,
            _ => SortDirection::None,
        }
    }
}

/// One activation of the header `clicked_key`: none -> asc -> desc -> none.
pub fn advance_sort(current: &SortState, clicked_key: &str) -> SortState {
    let next = match (current.active_column_key(), current.direction) {
        (Some(key), SortDirection::Ascending) if key == clicked_key => SortState::descending(clicked_key),
        (Some(key), SortDirection::Descending) if key == clicked_key => SortState::unsorted(),
        _ => SortState::ascending(clicked_key),
    };
    trace!("Sort {current:?} + {clicked_key:?} => {next:?}");
    next
}

/// Orders two possibly missing values.
///
/// Missing values always sink to the bottom; only the comparison of present
/// values is flipped for descending order.
pub fn compare_cells(a: Option<&CellValue>, b: Option<&CellValue>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = a.native_cmp(b);
            match direction {
                SortDirection::Descending => ordering.reverse(),
                _ => ordering,
            }
        }
    }
}

/// Positions into `rows` in the order given by `state`, or `None` when the
/// rows are shown as given (unsorted, or the active key names no column).
pub fn sorted_indices<R>(rows: &[R], columns: &[ColumnDescriptor<R>], state: &SortState) -> Option<Vec<usize>> {
    let key = state.active_column_key()?;
    let Some(column) = find_column(columns, key) else {
        warn!("Sort key {key:?} does not match any column, showing unsorted rows");
        return None;
    };

    // Read every value once, then sort the (value, row index) pairs.
    // `sort_by` is stable, so ties keep their input order.
    let mut keyed: Vec<(Option<CellValue>, usize)> =
        rows.iter().enumerate().map(|(idx, row)| (column.value(row), idx)).collect();
    keyed.sort_by(|(a, _), (b, _)| compare_cells(a.as_ref(), b.as_ref(), state.direction));

    Some(keyed.into_iter().map(|(_, idx)| idx).collect())
}

/// The rows ordered by `state`. Borrows `rows` untouched when unsorted or when
/// the active key names no column.
pub fn compute_sorted_view<'a, R: Clone>(
    rows: &'a [R],
    columns: &[ColumnDescriptor<R>],
    state: &SortState,
) -> Cow<'a, [R]> {
    match sorted_indices(rows, columns, state) {
        Some(order) => Cow::Owned(order.into_iter().map(|idx| rows[idx].clone()).collect()),
        None => Cow::Borrowed(rows),
    }
}
