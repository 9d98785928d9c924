use std::cmp::Ordering;
use std::fmt;

/// Orders two rows. Ascending order is the comparator's natural order.
pub type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering>;

/// Produces the cell for one row
pub type CellFn<T, R> = Box<dyn Fn(&T) -> R>;

/// Which payload shape a column carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Accessor,
    Display,
}

/// A grid column over rows of `T`, producing renderable cells of `R`.
///
/// Only columns with a comparator are sortable.
pub enum Column<T, R> {
    /// Bound to a single attribute of the row
    Accessor {
        id: String,
        extract: CellFn<T, R>,
        comparator: Option<Comparator<T>>,
    },
    /// Cell computed by arbitrary logic (actions, badges, ...)
    Display {
        id: String,
        render: CellFn<T, R>,
        comparator: Option<Comparator<T>>,
    },
}

impl<T, R> Column<T, R> {
    pub fn accessor(id: impl Into<String>, extract: impl Fn(&T) -> R + 'static) -> Self {
        Column::Accessor {
            id: id.into(),
            extract: Box::new(extract),
            comparator: None,
        }
    }

    pub fn display(id: impl Into<String>, render: impl Fn(&T) -> R + 'static) -> Self {
        Column::Display {
            id: id.into(),
            render: Box::new(render),
            comparator: None,
        }
    }

    /// Attach a comparator, making the column sortable
    pub fn sorted_by(mut self, cmp: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        match &mut self {
            Column::Accessor { comparator, .. } | Column::Display { comparator, .. } => {
                *comparator = Some(Box::new(cmp));
            }
        }
        self
    }

    pub fn id(&self) -> &str {
        match self {
            Column::Accessor { id, .. } | Column::Display { id, .. } => id,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Accessor { .. } => ColumnKind::Accessor,
            Column::Display { .. } => ColumnKind::Display,
        }
    }

    pub fn comparator(&self) -> Option<&Comparator<T>> {
        match self {
            Column::Accessor { comparator, .. } | Column::Display { comparator, .. } => {
                comparator.as_ref()
            }
        }
    }

    pub fn is_sortable(&self) -> bool {
        self.comparator().is_some()
    }

    /// Produce this column's cell for `row`
    pub fn cell(&self, row: &T) -> R {
        match self {
            Column::Accessor { extract, .. } => extract(row),
            Column::Display { render, .. } => render(row),
        }
    }
}

impl<T, R> fmt::Debug for Column<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("sortable", &self.is_sortable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_and_display_cells() {
        let name: Column<(u32, &'static str), String> = Column::accessor("name", |r: &(u32, &'static str)| r.1.to_string());
        let doubled: Column<(u32, &'static str), String> =
            Column::display("double", |r: &(u32, &'static str)| (r.0 * 2).to_string());
        assert_eq!(name.cell(&(3, "a")), "a");
        assert_eq!(doubled.cell(&(3, "a")), "6");
        assert_eq!(name.kind(), ColumnKind::Accessor);
        assert_eq!(doubled.kind(), ColumnKind::Display);
    }

    #[test]
    fn test_sortable_only_with_comparator() {
        let plain: Column<u32, u32> = Column::accessor("n", |n| *n);
        assert!(!plain.is_sortable());
        let sorted = plain.sorted_by(|a, b| a.cmp(b));
        assert!(sorted.is_sortable());
        let cmp = sorted.comparator().unwrap();
        assert_eq!(cmp(&1, &2), Ordering::Less);
        assert_eq!(sorted.id(), "n");
    }

    #[test]
    fn test_display_column_may_sort() {
        let col: Column<i32, String> =
            Column::display("abs", |n: &i32| n.abs().to_string()).sorted_by(|a: &i32, b: &i32| a.abs().cmp(&b.abs()));
        assert!(col.is_sortable());
        assert_eq!(format!("{:?}", col), r#"Column { id: "abs", kind: Display, sortable: true }"#);
    }
}
