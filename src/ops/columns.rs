use std::cmp::Ordering;
use std::fmt;

use crate::model::field::{FieldValue, compare_text};
use crate::model::registry::CustomFieldRegistry;
use crate::model::task::Task;
use crate::table::{Column, TableEngine};

pub const COL_TITLE: &str = "title";
pub const COL_STATUS: &str = "status";
pub const COL_PRIORITY: &str = "priority";
pub const COL_ACTIONS: &str = "actions";

/// Column ids a custom field may not take
pub const RESERVED_COLUMNS: [&str; 4] = [COL_TITLE, COL_STATUS, COL_PRIORITY, COL_ACTIONS];

/// What a task grid cell shows
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Check(bool),
    /// Custom field with no value (or empty text)
    Missing,
    /// Per-row edit/delete controls
    Actions,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Check(true) => f.write_str("[x]"),
            Cell::Check(false) => f.write_str("[ ]"),
            Cell::Missing => f.write_str("?"),
            Cell::Actions => f.write_str("edit delete"),
        }
    }
}

impl From<&FieldValue> for Cell {
    fn from(value: &FieldValue) -> Self {
        match value {
            blank if blank.is_blank() => Cell::Missing,
            FieldValue::Text(s) => Cell::Text(s.clone()),
            FieldValue::Number(n) => Cell::Number(*n),
            FieldValue::Checkbox(b) => Cell::Check(*b),
        }
    }
}

/// The task grid's columns: title, status, priority, one per registered
/// custom field in registry order, then actions. Every column but actions
/// is sortable.
pub fn task_columns(fields: &CustomFieldRegistry) -> Vec<Column<Task, Cell>> {
    let mut columns = vec![
        Column::accessor(COL_TITLE, |t: &Task| Cell::Text(t.title.clone()))
            .sorted_by(|a: &Task, b: &Task| compare_text(&a.title, &b.title)),
        Column::accessor(COL_STATUS, |t: &Task| Cell::Text(t.status.label().to_string()))
            .sorted_by(|a: &Task, b: &Task| a.status.rank().cmp(&b.status.rank())),
        Column::accessor(COL_PRIORITY, |t: &Task| {
            Cell::Text(t.priority.label().to_string())
        })
        .sorted_by(|a: &Task, b: &Task| a.priority.rank().cmp(&b.priority.rank())),
    ];

    for name in fields.names() {
        let cell_name = name.to_string();
        let sort_name = name.to_string();
        columns.push(
            Column::accessor(name, move |t: &Task| {
                t.field(&cell_name)
                    .map_or(Cell::Missing, |v| Cell::from(&v.value))
            })
            .sorted_by(move |a: &Task, b: &Task| {
                compare_field(
                    a.field(&sort_name).map(|v| &v.value),
                    b.field(&sort_name).map(|v| &v.value),
                )
            }),
        );
    }

    columns.push(Column::display(COL_ACTIONS, |_: &Task| Cell::Actions));
    columns
}

/// Tasks without the field sort before tasks with it
fn compare_field(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.compare(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Table engine over the task grid columns for the given registry
pub fn task_table(fields: &CustomFieldRegistry) -> TableEngine<Task, Cell> {
    TableEngine::new(task_columns(fields))
}
