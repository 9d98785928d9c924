use indexmap::IndexMap;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::io::recovery::RecoveryEntry;
use crate::model::field::{CustomFieldDefinition, FieldType, FieldValue};
use crate::model::task::{Priority, Status, Task, TaskId};
use crate::ops::columns::Cell;
use crate::table::{ColumnKind, Header, SortDirection, TableView};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: TaskId,
    pub title: String,
    pub priority: Priority,
    pub status: Status,
    /// Field name to value, in registry order
    pub fields: IndexMap<String, FieldValue>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub editing: bool,
}

#[derive(Serialize)]
pub struct HeaderJson {
    pub id: String,
    pub sortable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorted: Option<SortDirection>,
}

#[derive(Serialize)]
pub struct GridJson {
    pub headers: Vec<HeaderJson>,
    pub tasks: Vec<TaskJson>,
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_rows: usize,
    /// Filter state as a query string, empty when no filter is active
    pub query: String,
}

#[derive(Serialize)]
pub struct FieldJson {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub default: FieldValue,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task, editing: Option<TaskId>) -> TaskJson {
    TaskJson {
        id: task.id,
        title: task.title.clone(),
        priority: task.priority,
        status: task.status,
        fields: task
            .custom_fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect(),
        editing: editing == Some(task.id),
    }
}

pub fn header_to_json(header: &Header) -> HeaderJson {
    HeaderJson {
        id: header.id.clone(),
        sortable: header.sortable,
        sorted: header.sorted,
    }
}

pub fn grid_to_json(
    view: &TableView<'_, Task, Cell>,
    editing: Option<TaskId>,
    query: String,
) -> GridJson {
    GridJson {
        headers: view.headers.iter().map(header_to_json).collect(),
        tasks: view
            .rows
            .iter()
            .map(|row| task_to_json(row.original, editing))
            .collect(),
        page: view.current_page,
        total_pages: view.total_pages,
        page_size: view.page_size,
        total_rows: view.total_rows,
        query,
    }
}

pub fn field_to_json(def: &CustomFieldDefinition) -> FieldJson {
    FieldJson {
        name: def.name.clone(),
        field_type: def.field_type,
        default: def.default_value.clone(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

fn header_label(header: &Header) -> String {
    match header.sorted {
        Some(SortDirection::Asc) => format!("{} ^", header.id),
        Some(SortDirection::Desc) => format!("{} v", header.id),
        None => header.id.clone(),
    }
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

/// Render the visible page as an aligned text table followed by a
/// `Page x of y` footer. The editing task is marked with `>`.
pub fn format_grid(view: &TableView<'_, Task, Cell>, editing: Option<TaskId>) -> String {
    // Display columns hold row controls; there is nothing to print for them
    let shown: Vec<usize> = view
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.kind == ColumnKind::Accessor)
        .map(|(i, _)| i)
        .collect();

    let mut lines: Vec<Vec<String>> = Vec::with_capacity(view.rows.len() + 1);
    let mut head = vec!["id".to_string()];
    head.extend(shown.iter().map(|&i| header_label(&view.headers[i])));
    lines.push(head);

    for row in &view.rows {
        let marker = if editing == Some(row.original.id) { '>' } else { ' ' };
        let mut line = vec![format!("{}{}", marker, row.original.id)];
        line.extend(shown.iter().map(|&i| row.cells[i].to_string()));
        lines.push(line);
    }

    let columns = lines[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|c| lines.iter().map(|l| l[c].width()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for line in &lines {
        let cells: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| pad(cell, w))
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    if view.rows.is_empty() {
        out.push_str("(no tasks)\n");
    }
    out.push_str(&format!(
        "Page {} of {} ({} {})",
        view.current_page,
        view.total_pages,
        view.total_rows,
        if view.total_rows == 1 { "task" } else { "tasks" }
    ));
    out
}

pub fn format_field(def: &CustomFieldDefinition) -> String {
    let default = match &def.default_value {
        FieldValue::Text(s) => format!("{:?}", s),
        other => Cell::from(other).to_string(),
    };
    format!("{}  {}  default {}", def.name, def.field_type, default)
}

pub fn format_recovery_entry(entry: &RecoveryEntry) -> String {
    let mut out = format!(
        "{}  {}: {}",
        entry
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        entry.category,
        entry.description
    );
    for (key, value) in &entry.fields {
        out.push_str(&format!("\n  {}: {}", key, value));
    }
    for line in entry.body.lines() {
        out.push_str(&format!("\n    {}", line));
    }
    out
}
