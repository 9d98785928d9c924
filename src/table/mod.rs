//! Generic tabular projection: rows + column descriptors + sort/page state
//! in, header descriptors + the visible page of sorted rows out.
//!
//! The engine never mutates its inputs. All interactive state (active sort
//! key, page size, current page) lives in [`TableState`], owned by the caller.

pub mod column;
pub mod page;
pub mod sort;

use serde::{Deserialize, Serialize};

pub use column::{CellFn, Column, ColumnKind, Comparator};
pub use page::{PAGE_SIZES, PageSize, PageSizeError, clamp_page, page_range, total_pages};
pub use sort::{SortDirection, SortState};

/// Interactive grid state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableState {
    /// Active sort key. `None` until a sortable header is first clicked.
    #[serde(default)]
    pub sort: Option<SortState>,
    #[serde(default)]
    pub page_size: PageSize,
    /// 1-based
    #[serde(default = "first_page")]
    pub current_page: usize,
}

fn first_page() -> usize {
    1
}

impl Default for TableState {
    fn default() -> Self {
        TableState::new(PageSize::default())
    }
}

impl TableState {
    pub fn new(page_size: PageSize) -> Self {
        TableState {
            sort: None,
            page_size,
            current_page: 1,
        }
    }

    /// Changing the page size always returns to page 1
    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.current_page = 1;
    }

    /// Go to `page`, clamped to `[1, total_pages(row_count)]`
    pub fn set_page(&mut self, page: usize, row_count: usize) {
        let total = total_pages(row_count, self.page_size.get());
        self.current_page = clamp_page(page, total);
    }

    pub fn next_page(&mut self, row_count: usize) {
        self.set_page(self.current_page.saturating_add(1), row_count);
    }

    pub fn prev_page(&mut self, row_count: usize) {
        self.set_page(self.current_page.saturating_sub(1), row_count);
    }

    pub fn sort_direction(&self, column: &str) -> Option<SortDirection> {
        self.sort
            .as_ref()
            .filter(|s| s.column == column)
            .map(|s| s.direction)
    }
}

/// One header cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: String,
    pub kind: ColumnKind,
    pub sortable: bool,
    /// Direction if this column is the active sort key
    pub sorted: Option<SortDirection>,
}

/// One visible row
#[derive(Debug, Clone, PartialEq)]
pub struct Row<'d, T, R> {
    pub original: &'d T,
    /// Position in the full sorted set (not just the page)
    pub index: usize,
    pub cells: Vec<R>,
}

/// Result of a projection
#[derive(Debug, Clone, PartialEq)]
pub struct TableView<'d, T, R> {
    pub headers: Vec<Header>,
    pub rows: Vec<Row<'d, T, R>>,
    /// The page actually shown, clamped into range
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    /// Rows before pagination
    pub total_rows: usize,
}

/// A column set plus the projection over it
pub struct TableEngine<T, R> {
    columns: Vec<Column<T, R>>,
}

impl<T, R> TableEngine<T, R> {
    pub fn new(columns: Vec<Column<T, R>>) -> Self {
        TableEngine { columns }
    }

    pub fn columns(&self) -> &[Column<T, R>] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&Column<T, R>> {
        self.columns.iter().find(|c| c.id() == id)
    }

    pub fn headers(&self, state: &TableState) -> Vec<Header> {
        self.columns
            .iter()
            .map(|c| Header {
                id: c.id().to_string(),
                kind: c.kind(),
                sortable: c.is_sortable(),
                sorted: if c.is_sortable() {
                    state.sort_direction(c.id())
                } else {
                    None
                },
            })
            .collect()
    }

    /// Header click. Returns `false` (and leaves `state` alone) when the
    /// column is unknown or not sortable.
    pub fn click_header(&self, state: &mut TableState, column_id: &str) -> bool {
        match self.column(column_id) {
            Some(column) if column.is_sortable() => {
                state.sort = Some(SortState::clicked(state.sort.as_ref(), column_id));
                true
            }
            _ => false,
        }
    }

    /// Sort the full row set by the active key (if it names a sortable column)
    /// and slice out the current page.
    pub fn project<'d, I>(&self, rows: I, state: &TableState) -> TableView<'d, T, R>
    where
        I: IntoIterator<Item = &'d T>,
        T: 'd,
    {
        let mut ordered: Vec<&'d T> = rows.into_iter().collect();

        if let Some(sort) = &state.sort
            && let Some(cmp) = self.column(&sort.column).and_then(Column::comparator)
        {
            ordered.sort_by(|a, b| sort.direction.apply(cmp(*a, *b)));
        }

        let total_rows = ordered.len();
        let page_size = state.page_size.get();
        let total_pages = total_pages(total_rows, page_size);
        let current_page = clamp_page(state.current_page, total_pages);
        let range = page_range(current_page, page_size, total_rows);

        let rows = ordered[range.clone()]
            .iter()
            .zip(range)
            .map(|(row, index)| Row {
                original: *row,
                index,
                cells: self.columns.iter().map(|c| c.cell(*row)).collect(),
            })
            .collect();

        TableView {
            headers: self.headers(state),
            rows,
            current_page,
            total_pages,
            page_size,
            total_rows,
        }
    }
}
