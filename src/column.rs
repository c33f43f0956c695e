use std::fmt;
use std::sync::Arc;

use crate::cell::{CellValue, Record};

pub type Accessor<R> = Arc<dyn Fn(&R) -> Option<CellValue>>;

/// Describes how to label, read and optionally sort one displayed column.
pub struct ColumnDescriptor<R> {
    pub key: String,
    pub title: String,
    pub sortable: bool,
    accessor: Accessor<R>,
}

impl<R> ColumnDescriptor<R> {
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        accessor: impl Fn(&R) -> Option<CellValue> + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            sortable: false,
            accessor: Arc::new(accessor),
        }
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn value(&self, row: &R) -> Option<CellValue> {
        (self.accessor)(row)
    }
}

impl<R: Record> ColumnDescriptor<R> {
    /// Column reading the named field of a [`Record`] row.
    pub fn field(key: impl Into<String>, title: impl Into<String>, field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(key, title, move |row: &R| row.field(&field))
    }
}

impl<R> Clone for ColumnDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            title: self.title.clone(),
            sortable: self.sortable,
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<R> fmt::Debug for ColumnDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("sortable", &self.sortable)
            .finish_non_exhaustive()
    }
}

pub fn find_column<'a, R>(columns: &'a [ColumnDescriptor<R>], key: &str) -> Option<&'a ColumnDescriptor<R>> {
    columns.iter().find(|c| c.key == key)
}
