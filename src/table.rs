//! Client side table state: filtering, sorting, paging, column visibility and
//! row selection over a fetched dataset.
//!
//! [`TableState`] is plain data and only changes through
//! [`TableState::apply`]. [`Table`] binds a state to the records and columns
//! it describes and keeps the derived row mapping up to date.

use std::collections::BTreeSet;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::trace;

use crate::columns::{ColumnSpec, Columns};
use crate::domain::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    SetFilterText(String),
    SetSorting(Option<SortSpec>),
    ToggleSort(String),
    SetColumnVisibility { column: String, visible: bool },
    ToggleColumn(String),
    SetRowSelection(BTreeSet<i64>),
    ToggleRowSelection(i64),
    ClearSelection,
    SetPageSize(usize),
    NextPage,
    PreviousPage,
}

/// Presentation state of the table. Rows are selected by record id and
/// columns hidden by column id, so reordering never changes what they refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    pub filter_text: String,
    pub sorting: Option<SortSpec>,
    pub hidden_columns: BTreeSet<String>,
    pub selected: BTreeSet<i64>,
    pub page_index: usize,
    pub page_size: usize,
}

impl TableState {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter_text: String::new(),
            sorting: None,
            hidden_columns: BTreeSet::new(),
            selected: BTreeSet::new(),
            page_index: 0,
            page_size: page_size.max(1),
        }
    }

    /// Single transition function. `row_count` is the length of the
    /// filtered and sorted row sequence the state currently pages over.
    pub fn apply(mut self, action: TableAction, row_count: usize) -> Self {
        match action {
            TableAction::SetFilterText(text) => {
                self.filter_text = text;
                self.page_index = 0;
            }
            TableAction::SetSorting(sorting) => {
                self.sorting = sorting;
                self.page_index = 0;
            }
            TableAction::ToggleSort(column) => {
                self.sorting = match self.sorting.take() {
                    Some(s) if s.column == column => match s.direction {
                        SortDirection::Ascending => Some(SortSpec {
                            column,
                            direction: SortDirection::Descending,
                        }),
                        SortDirection::Descending => None,
                    },
                    _ => Some(SortSpec {
                        column,
                        direction: SortDirection::Ascending,
                    }),
                };
                self.page_index = 0;
            }
            TableAction::SetColumnVisibility { column, visible } => {
                if visible {
                    self.hidden_columns.remove(&column);
                } else {
                    self.hidden_columns.insert(column);
                }
            }
            TableAction::ToggleColumn(column) => {
                if !self.hidden_columns.remove(&column) {
                    self.hidden_columns.insert(column);
                }
            }
            TableAction::SetRowSelection(selected) => self.selected = selected,
            TableAction::ToggleRowSelection(id) => {
                if !self.selected.remove(&id) {
                    self.selected.insert(id);
                }
            }
            TableAction::ClearSelection => self.selected.clear(),
            TableAction::SetPageSize(size) => {
                self.page_size = size.max(1);
                self.page_index = 0;
            }
            TableAction::NextPage => {
                if self.can_next_page(row_count) {
                    self.page_index += 1;
                }
            }
            TableAction::PreviousPage => {
                if self.can_previous_page() {
                    self.page_index -= 1;
                }
            }
        }
        self
    }

    pub fn page_count(&self, row_count: usize) -> usize {
        row_count.div_ceil(self.page_size)
    }

    pub fn can_previous_page(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next_page(&self, row_count: usize) -> bool {
        self.page_index + 1 < self.page_count(row_count)
    }

    pub fn is_visible(&self, column: &str) -> bool {
        !self.hidden_columns.contains(column)
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selected.contains(&id)
    }

    fn clamp_page(&mut self, row_count: usize) {
        let last = self.page_count(row_count).saturating_sub(1);
        self.page_index = self.page_index.min(last);
    }
}

/// Indices of the records passing `filter_text`, in dataset order.
///
/// An empty filter passes everything, as does a column set without a
/// filterable column. Otherwise the filterable field must contain the filter
/// text, ignoring case. A missing field is treated as empty.
pub fn filter_rows(records: &[Record], columns: &Columns, filter_text: &str) -> Vec<usize> {
    let column = match columns.filter_column() {
        Some(c) if !filter_text.is_empty() => c,
        _ => return (0..records.len()).collect(),
    };
    let needle = filter_text.to_lowercase();

    (0..records.len())
        .into_par_iter()
        .filter(|&idx| {
            column
                .field(&records[idx])
                .unwrap_or_default()
                .to_lowercase()
                .contains(&needle)
        })
        .collect()
}

/// Stable sort of `rows` by the sort column. Unknown or unsortable columns
/// leave the order untouched.
pub fn sort_rows(records: &[Record], columns: &Columns, sorting: &SortSpec, rows: &mut [usize]) {
    let Some(column) = columns.get(&sorting.column).filter(|c| c.is_sortable()) else {
        return;
    };
    rows.sort_by(|&a, &b| {
        let ordering = column.compare(&records[a], &records[b]);
        match sorting.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// A dataset together with its columns, view state and derived rows.
#[derive(Debug, Clone)]
pub struct Table {
    records: Arc<Vec<Record>>,
    columns: Columns,
    state: TableState,
    filtered: Arc<Vec<usize>>, // Indices into records passing the filter
    rows: Arc<Vec<usize>>,     // Filtered indices in sort order
}

impl Table {
    pub fn new(records: Arc<Vec<Record>>, columns: Columns, page_size: usize) -> Self {
        let mut table = Table {
            records,
            columns,
            state: TableState::new(page_size),
            filtered: Arc::new(Vec::new()),
            rows: Arc::new(Vec::new()),
        };
        table.derive_rows();
        table
    }

    /// Apply `action` and return the resulting table. Rows are only
    /// recomputed when the filter or the sorting changed.
    pub fn apply(&self, action: TableAction) -> Table {
        let state = self.state.clone().apply(action, self.rows.len());
        let mut table = Table {
            records: Arc::clone(&self.records),
            columns: self.columns.clone(),
            filtered: Arc::clone(&self.filtered),
            rows: Arc::clone(&self.rows),
            state,
        };
        if table.state.filter_text != self.state.filter_text {
            table.derive_rows();
        } else if table.state.sorting != self.state.sorting {
            table.sort();
        }
        table.state.clamp_page(table.rows.len());
        table
    }

    fn derive_rows(&mut self) {
        self.filtered = Arc::new(filter_rows(
            &self.records,
            &self.columns,
            &self.state.filter_text,
        ));
        self.sort();
    }

    fn sort(&mut self) {
        let mut rows = self.filtered.as_ref().clone();
        if let Some(sorting) = &self.state.sorting {
            sort_rows(&self.records, &self.columns, sorting, &mut rows);
        }
        trace!(
            "Derived {} of {} rows (filter {:?}, sorting {:?})",
            rows.len(),
            self.records.len(),
            self.state.filter_text,
            self.state.sorting
        );
        self.rows = Arc::new(rows);
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Records passing the filter, in dataset order.
    pub fn visible_rows(&self) -> Vec<&Record> {
        self.filtered.iter().map(|&idx| &self.records[idx]).collect()
    }

    /// Filtered records in display order.
    pub fn sorted_rows(&self) -> Vec<&Record> {
        self.rows.iter().map(|&idx| &self.records[idx]).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Records on the current page.
    pub fn page_rows(&self) -> Vec<&Record> {
        let begin = self.state.page_index * self.state.page_size;
        let end = std::cmp::min(begin + self.state.page_size, self.rows.len());
        if begin >= end {
            return Vec::new();
        }
        self.rows[begin..end]
            .iter()
            .map(|&idx| &self.records[idx])
            .collect()
    }

    pub fn page_count(&self) -> usize {
        self.state.page_count(self.rows.len())
    }

    pub fn can_next_page(&self) -> bool {
        self.state.can_next_page(self.rows.len())
    }

    pub fn can_previous_page(&self) -> bool {
        self.state.can_previous_page()
    }

    /// Visible columns in declaration order.
    pub fn visible_columns(&self) -> Vec<&ColumnSpec> {
        self.columns
            .all()
            .iter()
            .filter(|c| self.state.is_visible(c.id))
            .collect()
    }
}
