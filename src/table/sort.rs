use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Apply the direction to a comparator result
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// The single active sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn ascending(column: impl Into<String>) -> Self {
        SortState {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Header click: same column flips direction, another column starts ascending
    pub fn clicked(current: Option<&SortState>, column: &str) -> SortState {
        match current {
            Some(state) if state.column == column => SortState {
                column: state.column.clone(),
                direction: state.direction.toggled(),
            },
            _ => SortState::ascending(column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_apply() {
        assert_eq!(SortDirection::Asc.apply(Ordering::Less), Ordering::Less);
        assert_eq!(SortDirection::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(SortDirection::Desc.apply(Ordering::Equal), Ordering::Equal);
    }

    #[test]
    fn test_click_same_column_toggles() {
        let first = SortState::clicked(None, "title");
        assert_eq!(first.direction, SortDirection::Asc);
        let second = SortState::clicked(Some(&first), "title");
        assert_eq!(second.direction, SortDirection::Desc);
        let third = SortState::clicked(Some(&second), "title");
        assert_eq!(third.direction, SortDirection::Asc);
    }

    #[test]
    fn test_click_other_column_resets_ascending() {
        let desc = SortState {
            column: "title".into(),
            direction: SortDirection::Desc,
        };
        let next = SortState::clicked(Some(&desc), "status");
        assert_eq!(next, SortState::ascending("status"));
    }
}
