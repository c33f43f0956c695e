//! A generic data table for ratatui with client side column sorting, row
//! selection, and loading and empty states.
//!
//! [`DataTable`] is the controller holding sort and selection state,
//! [`TableView`] draws it.

pub mod cell;
pub mod column;
pub mod domain;
pub mod loader;
pub mod selection;
pub mod sort;
pub mod table;
pub mod view;

pub use cell::{CellValue, Record};
pub use column::ColumnDescriptor;
pub use domain::DTError;
pub use selection::SelectionSet;
pub use sort::{SortDirection, SortState};
pub use table::{DataTable, TableOptions, ViewState};
pub use view::{HeaderFocus, HitTarget, TableView, TableViewState};
