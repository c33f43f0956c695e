use std::collections::BTreeSet;

/// Checked positions in the sorted view.
///
/// Positions are not remapped when the sort order changes; the set is only
/// cleared when a new row collection arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    indices: BTreeSet<usize>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

impl FromIterator<usize> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self {
            indices: iter.into_iter().collect(),
        }
    }
}

pub fn toggle_row(selection: &SelectionSet, index: usize, included: bool) -> SelectionSet {
    let mut next = selection.clone();
    if included {
        next.indices.insert(index);
    } else {
        next.indices.remove(&index);
    }
    next
}

pub fn toggle_all(view_len: usize, included: bool) -> SelectionSet {
    if included {
        (0..view_len).collect()
    } else {
        SelectionSet::new()
    }
}

/// The selected rows in view order, whatever order they were checked in.
pub fn derive_selected_rows<R: Clone>(view: &[R], selection: &SelectionSet) -> Vec<R> {
    view.iter()
        .enumerate()
        .filter(|(idx, _)| selection.contains(*idx))
        .map(|(_, row)| row.clone())
        .collect()
}

/// State of the select-all box. There is no partial state.
pub fn all_selected(selection: &SelectionSet, view_len: usize) -> bool {
    view_len > 0 && selection.len() == view_len
}
