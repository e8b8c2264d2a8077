use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Calendar date string (`YYYY-MM-DD`) used as the outer key of the board.
pub type DayKey = String;
pub type TaskId = u64;
pub type LabelId = u64;

/// Tasks of a single day keyed by id. Iteration is ascending by id, which is
/// also creation order since ids are allocated monotonically.
pub type DayTasks = BTreeMap<TaskId, Task>;

/// Text written in place of an empty task on commit; tasks are never removed.
pub const EMPTY_TASK_TEXT: &str = "empty";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub is_editable: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub labels: Vec<LabelRef>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: LabelId,
    pub color: String,
    pub text: String,
}

/// Copy of a [`Label`] taken at attach time. Later registry changes do not
/// reach it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LabelRef {
    pub id: LabelId,
    pub color: String,
    pub text: String,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("day not found: {0}")]
    DayNotFound(DayKey),
    #[error("task {task} not found on {day}")]
    TaskNotFound { day: DayKey, task: TaskId },
    #[error("label not found: {0}")]
    LabelNotFound(LabelId),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl BoardError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BoardError::DayNotFound(_)
                | BoardError::TaskNotFound { .. }
                | BoardError::LabelNotFound(_)
        )
    }

    pub(crate) fn task_not_found(day: &str, task: TaskId) -> Self {
        BoardError::TaskNotFound {
            day: day.to_string(),
            task,
        }
    }
}

impl Task {
    /// A freshly created task: empty, under text entry, no labels.
    pub fn empty(id: TaskId, order: i64) -> Self {
        Task {
            id,
            text: String::new(),
            is_editable: true,
            order,
            labels: Vec::new(),
        }
    }

    pub fn has_label(&self, id: LabelId) -> bool {
        self.labels.iter().any(|l| l.id == id)
    }
}

impl Label {
    pub fn new(id: LabelId, color: impl Into<String>, text: impl Into<String>) -> Self {
        Label {
            id,
            color: color.into(),
            text: text.into(),
        }
    }
}

impl LabelRef {
    pub fn new(id: LabelId, color: impl Into<String>, text: impl Into<String>) -> Self {
        LabelRef {
            id,
            color: color.into(),
            text: text.into(),
        }
    }
}

impl From<&Label> for LabelRef {
    fn from(label: &Label) -> Self {
        LabelRef::new(label.id, label.color.clone(), label.text.clone())
    }
}
