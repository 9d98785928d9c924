use serde::{Deserialize, Serialize};
use url::form_urlencoded;

pub use crate::model::config::FilterMode;
use crate::model::task::{Priority, Status, Task};

/// Query parameter names written to and read from the address bar
pub const PARAM_SEARCH: &str = "searchText";
pub const PARAM_STATUS: &str = "status";
pub const PARAM_PRIORITY: &str = "priority";

/// Value meaning "no filter" for status and priority
pub const ALL: &str = "all";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid {param} filter: {message}")]
    InvalidValue { param: &'static str, message: String },
}

/// The three task filters. Defaults (empty text, `None`) are inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(default)]
    pub search_text: String,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl TaskFilter {
    pub fn is_active(&self) -> bool {
        !self.search_text.is_empty() || self.status.is_some() || self.priority.is_some()
    }

    fn text_matches(&self, task: &Task) -> bool {
        task.title
            .to_lowercase()
            .contains(&self.search_text.to_lowercase())
    }

    /// Whether `task` passes the filter under `mode`
    pub fn matches(&self, task: &Task, mode: FilterMode) -> bool {
        match mode {
            FilterMode::All => {
                (self.search_text.is_empty() || self.text_matches(task))
                    && self.status.is_none_or(|s| task.status == s)
                    && self.priority.is_none_or(|p| task.priority == p)
            }
            FilterMode::First => {
                if !self.search_text.is_empty() {
                    self.text_matches(task)
                } else if let Some(status) = self.status {
                    task.status == status
                } else if let Some(priority) = self.priority {
                    task.priority == priority
                } else {
                    true
                }
            }
        }
    }

    /// Filter a task slice, preserving order
    pub fn apply<'a>(&self, tasks: &'a [Task], mode: FilterMode) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t, mode)).collect()
    }

    /// Encode as a query string (without the leading `?`). Inactive filters are
    /// omitted entirely, so the default filter encodes to `""`.
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if !self.search_text.is_empty() {
            query.append_pair(PARAM_SEARCH, &self.search_text);
        }
        if let Some(status) = self.status {
            query.append_pair(PARAM_STATUS, status.as_str());
        }
        if let Some(priority) = self.priority {
            query.append_pair(PARAM_PRIORITY, priority.as_str());
        }
        query.finish()
    }

    /// Decode from a query string, with or without a leading `?`.
    ///
    /// Unknown parameters are ignored; `all` and empty values mean inactive.
    pub fn from_query(query: &str) -> Result<Self, FilterError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut filter = TaskFilter::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                PARAM_SEARCH => filter.search_text = value.into_owned(),
                PARAM_STATUS => filter.status = parse_status_filter(&value)?,
                PARAM_PRIORITY => filter.priority = parse_priority_filter(&value)?,
                _ => {}
            }
        }
        Ok(filter)
    }
}

/// Parse a status filter value; `all` or empty clears it
pub fn parse_status_filter(value: &str) -> Result<Option<Status>, FilterError> {
    if value.is_empty() || value == ALL {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|message| FilterError::InvalidValue {
            param: PARAM_STATUS,
            message,
        })
}

/// Parse a priority filter value; `all` or empty clears it
pub fn parse_priority_filter(value: &str) -> Result<Option<Priority>, FilterError> {
    if value.is_empty() || value == ALL {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|message| FilterError::InvalidValue {
            param: PARAM_PRIORITY,
            message,
        })
}
