use crate::model::{BoardError, DayKey, DayTasks, LabelId, LabelRef, Task, TaskId, EMPTY_TASK_TEXT};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-day task records. Operations here are unconditional; the filter gate
/// lives on [`crate::board::Board`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    days: BTreeMap<DayKey, DayTasks>,
    next_id: TaskId,
}

impl TaskStore {
    /// One empty mapping per supplied day key.
    pub fn with_days<I, K>(days: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<DayKey>,
    {
        TaskStore {
            days: days.into_iter().map(|d| (d.into(), DayTasks::new())).collect(),
            next_id: 0,
        }
    }

    pub fn day(&self, day: &str) -> Option<&DayTasks> {
        self.days.get(day)
    }

    pub fn contains_day(&self, day: &str) -> bool {
        self.days.contains_key(day)
    }

    pub fn task(&self, day: &str, id: TaskId) -> Option<&Task> {
        self.days.get(day).and_then(|tasks| tasks.get(&id))
    }

    pub fn days(&self) -> impl Iterator<Item = (&DayKey, &DayTasks)> {
        self.days.iter()
    }

    pub fn next_id(&self) -> TaskId {
        self.next_id
    }

    pub fn calendar(&self) -> &BTreeMap<DayKey, DayTasks> {
        &self.days
    }

    pub fn create_empty_task(&mut self, day: &str) -> Result<TaskId, BoardError> {
        let id = self.next_id;
        let tasks = self.day_mut(day)?;
        let order = tasks.len() as i64;
        tasks.insert(id, Task::empty(id, order));
        self.next_id += 1;
        debug!(day, task = id, "empty task created");
        Ok(id)
    }

    /// Writes text and edit state, ranks the task at `count - 1` and keeps its
    /// labels. Empty text is replaced by [`EMPTY_TASK_TEXT`] and closes editing.
    pub fn commit_task(
        &mut self,
        id: TaskId,
        day: &str,
        text: &str,
        is_editable: bool,
    ) -> Result<(), BoardError> {
        let tasks = self.day_mut(day)?;
        let count = tasks.len() as i64;
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| BoardError::task_not_found(day, id))?;
        if text.is_empty() {
            task.text = EMPTY_TASK_TEXT.to_string();
            task.is_editable = false;
        } else {
            task.text = text.to_string();
            task.is_editable = is_editable;
        }
        task.order = count - 1;
        debug!(day, task = id, order = task.order, editable = task.is_editable, "task committed");
        Ok(())
    }

    /// Moves a task under the same id and appends it after the tasks already
    /// on `to_day`.
    pub fn move_task(&mut self, from_day: &str, id: TaskId, to_day: &str) -> Result<(), BoardError> {
        if from_day == to_day {
            return Err(BoardError::InvalidOperation(format!(
                "task {} is already on {}",
                id, to_day
            )));
        }
        let order = self.day_mut(to_day)?.len() as i64;
        let mut task = self
            .day_mut(from_day)?
            .remove(&id)
            .ok_or_else(|| BoardError::task_not_found(from_day, id))?;
        task.order = order;
        self.day_mut(to_day)?.insert(id, task);
        debug!(from = from_day, to = to_day, task = id, order, "task moved");
        Ok(())
    }

    /// Swaps ranks: the dragged task takes `hover_order`, the hovered task takes
    /// `drag_order`. Nothing else on the day is re-ranked.
    pub fn reorder_task(
        &mut self,
        drag_order: Option<i64>,
        hover_order: i64,
        drag_id: TaskId,
        hover_id: TaskId,
        day: &str,
    ) -> Result<(), BoardError> {
        let drag_order = drag_order.ok_or_else(|| {
            BoardError::InvalidOperation("reorder without a drag position".to_string())
        })?;
        let tasks = self.day_mut(day)?;
        for id in [drag_id, hover_id] {
            if !tasks.contains_key(&id) {
                return Err(BoardError::task_not_found(day, id));
            }
        }
        if let Some(task) = tasks.get_mut(&drag_id) {
            task.order = hover_order;
        }
        if let Some(task) = tasks.get_mut(&hover_id) {
            task.order = drag_order;
        }
        debug!(day, drag = drag_id, hover = hover_id, drag_order, hover_order, "tasks reordered");
        Ok(())
    }

    /// Appends a label copy. Ids already present are not deduplicated here.
    pub fn attach_label(
        &mut self,
        day: &str,
        task_id: TaskId,
        label_id: LabelId,
        color: &str,
        text: &str,
    ) -> Result<(), BoardError> {
        let task = self
            .day_mut(day)?
            .get_mut(&task_id)
            .ok_or_else(|| BoardError::task_not_found(day, task_id))?;
        task.labels.push(LabelRef::new(label_id, color, text));
        debug!(day, task = task_id, label = label_id, "label attached");
        Ok(())
    }

    /// Replaces every day wholesale, adding empty mappings for `mounted` days
    /// the new calendar lacks.
    pub(crate) fn replace<'a>(
        &mut self,
        calendar: BTreeMap<DayKey, DayTasks>,
        mounted: impl IntoIterator<Item = &'a DayKey>,
    ) {
        let after_max = calendar
            .values()
            .flat_map(|tasks| tasks.keys())
            .map(|id| id + 1)
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(after_max);
        self.days = calendar;
        for day in mounted {
            self.days.entry(day.clone()).or_default();
        }
    }

    fn day_mut(&mut self, day: &str) -> Result<&mut DayTasks, BoardError> {
        self.days
            .get_mut(day)
            .ok_or_else(|| BoardError::DayNotFound(day.to_string()))
    }
}
