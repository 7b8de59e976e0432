//! Task entity and title validation.
//!
//! # Responsibility
//! - Define the `{id, title, completed}` record persisted in the `todos` table.
//! - Normalize user-entered titles before persistence.
//!
//! # Invariants
//! - `title` is never empty after normalization.
//! - Title text is stored verbatim apart from whitespace folding; quotes and
//!   SQL-looking fragments are ordinary characters.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const MAX_TITLE_CHARS: usize = 500;

/// Identifier of one task, stored in the `id BIGINT PRIMARY KEY` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TaskId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Validation failures for task input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
    TitleTooLong { chars: usize, max: usize },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title cannot be empty"),
            Self::TitleTooLong { chars, max } => {
                write!(f, "task title has {chars} characters; maximum is {max}")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// One to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub completed: bool,
}

impl Task {
    pub fn is_remaining(&self) -> bool {
        !self.completed
    }
}

/// Trims the title and folds internal whitespace runs into single spaces.
///
/// # Errors
/// - `EmptyTitle` when nothing but whitespace was supplied.
/// - `TitleTooLong` when the folded title exceeds the length cap.
pub fn normalize_title(raw: &str) -> Result<String, TaskValidationError> {
    let folded = WHITESPACE_RUN_RE.replace_all(raw.trim(), " ").into_owned();
    if folded.is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    let chars = folded.chars().count();
    if chars > MAX_TITLE_CHARS {
        return Err(TaskValidationError::TitleTooLong {
            chars,
            max: MAX_TITLE_CHARS,
        });
    }
    Ok(folded)
}

#[cfg(test)]
mod tests {
    use super::{normalize_title, Task, TaskId, TaskValidationError};

    #[test]
    fn normalize_title_folds_whitespace() {
        assert_eq!(
            normalize_title("  buy \t milk\n now ").unwrap(),
            "buy milk now"
        );
    }

    #[test]
    fn normalize_title_rejects_blank_input() {
        assert_eq!(
            normalize_title(" \n\t ").unwrap_err(),
            TaskValidationError::EmptyTitle
        );
    }

    #[test]
    fn normalize_title_keeps_quotes_verbatim() {
        assert_eq!(
            normalize_title("it's a \"test\"'); drop table todos; --").unwrap(),
            "it's a \"test\"'); drop table todos; --"
        );
    }

    #[test]
    fn normalize_title_rejects_oversized_input() {
        let err = normalize_title(&"x".repeat(501)).unwrap_err();
        assert!(matches!(err, TaskValidationError::TitleTooLong { chars: 501, .. }));
    }

    #[test]
    fn task_serializes_id_as_plain_integer() {
        let task = Task {
            id: TaskId(7),
            title: "x".to_string(),
            completed: false,
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["title"], "x");
        assert_eq!(json["completed"], false);
    }
}
