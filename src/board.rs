use crate::calendar::CalendarDay;
use crate::filter::{FilterEngine, FilterMode};
use crate::labels::LabelRegistry;
use crate::model::{BoardError, DayKey, Label, LabelId, Task, TaskId};
use crate::snapshot::Snapshot;
use crate::store::TaskStore;
use crate::view::{self, DayProjection};
use tracing::{debug, warn};

/// The whole session state: mounted days, tasks, labels and the filter.
///
/// Editing operations are refused while a filter is active. Label operations
/// and snapshots are not gated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    days: Vec<DayKey>,
    tasks: TaskStore,
    labels: LabelRegistry,
    filter: FilterEngine,
}

impl Board {
    pub fn new<I, K>(days: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<DayKey>,
    {
        let days: Vec<DayKey> = days.into_iter().map(Into::into).collect();
        Board {
            tasks: TaskStore::with_days(days.iter().cloned()),
            days,
            labels: LabelRegistry::new(),
            filter: FilterEngine::new(),
        }
    }

    pub fn from_calendar(days: &[CalendarDay]) -> Self {
        Board::new(days.iter().map(|d| d.date.clone()))
    }

    /// Mounted day keys in display order.
    pub fn day_keys(&self) -> &[DayKey] {
        &self.days
    }

    pub fn store(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    pub fn task(&self, day: &str, id: TaskId) -> Option<&Task> {
        self.tasks.task(day, id)
    }

    pub fn create_empty_task(&mut self, day: &str) -> Result<TaskId, BoardError> {
        self.ensure_editable("creating tasks")?;
        self.tasks.create_empty_task(day)
    }

    pub fn commit_task(
        &mut self,
        task_id: TaskId,
        day: &str,
        text: &str,
        is_editable: bool,
    ) -> Result<(), BoardError> {
        self.ensure_editable("editing tasks")?;
        self.tasks.commit_task(task_id, day, text, is_editable)
    }

    /// Reopens a committed task for text entry without changing its text.
    pub fn begin_edit(&mut self, day: &str, task_id: TaskId) -> Result<(), BoardError> {
        let text = self
            .tasks
            .task(day, task_id)
            .map(|t| t.text.clone())
            .ok_or_else(|| BoardError::task_not_found(day, task_id))?;
        self.commit_task(task_id, day, &text, true)
    }

    pub fn move_task(&mut self, from_day: &str, task_id: TaskId, to_day: &str) -> Result<(), BoardError> {
        self.ensure_editable("moving tasks")?;
        self.tasks.move_task(from_day, task_id, to_day)
    }

    pub fn reorder_task(
        &mut self,
        drag_order: Option<i64>,
        hover_order: i64,
        drag_id: TaskId,
        hover_id: TaskId,
        day: &str,
    ) -> Result<(), BoardError> {
        self.ensure_editable("reordering tasks")?;
        self.tasks
            .reorder_task(drag_order, hover_order, drag_id, hover_id, day)
    }

    /// Attaches a label copy with the given fields. The id must be registered.
    pub fn attach_label(
        &mut self,
        day: &str,
        task_id: TaskId,
        label_id: LabelId,
        color: &str,
        text: &str,
    ) -> Result<(), BoardError> {
        if !self.labels.contains(label_id) {
            return Err(BoardError::LabelNotFound(label_id));
        }
        self.tasks.attach_label(day, task_id, label_id, color, text)
    }

    pub fn attach_existing_label(
        &mut self,
        day: &str,
        task_id: TaskId,
        label_id: LabelId,
    ) -> Result<(), BoardError> {
        let label = self
            .labels
            .get(label_id)
            .cloned()
            .ok_or(BoardError::LabelNotFound(label_id))?;
        self.tasks
            .attach_label(day, task_id, label.id, &label.color, &label.text)
    }

    pub fn create_label(&mut self, color: &str, text: &str) -> Result<LabelId, BoardError> {
        if color.is_empty() || text.is_empty() {
            return Err(BoardError::InvalidOperation(
                "a label needs both a colour and a text".to_string(),
            ));
        }
        Ok(self.labels.create_label(color, text))
    }

    /// Registers a new label and attaches it to the task. Nothing is registered
    /// when the task does not exist.
    pub fn create_label_for_task(
        &mut self,
        day: &str,
        task_id: TaskId,
        color: &str,
        text: &str,
    ) -> Result<LabelId, BoardError> {
        if self.tasks.task(day, task_id).is_none() {
            return Err(if self.tasks.contains_day(day) {
                BoardError::task_not_found(day, task_id)
            } else {
                BoardError::DayNotFound(day.to_string())
            });
        }
        let id = self.create_label(color, text)?;
        self.tasks.attach_label(day, task_id, id, color, text)?;
        Ok(id)
    }

    /// Registry labels not yet attached to the task.
    pub fn available_labels(&self, day: &str, task_id: TaskId) -> Result<Vec<&Label>, BoardError> {
        let task = self
            .tasks
            .task(day, task_id)
            .ok_or_else(|| BoardError::task_not_found(day, task_id))?;
        Ok(self.labels.iter().filter(|l| !task.has_label(l.id)).collect())
    }

    pub fn set_search_text(&mut self, text: &str) {
        self.filter.set_search_text(text, &self.days, &self.tasks);
    }

    pub fn select_label(&mut self, id: Option<LabelId>) {
        self.filter.select_label(id, &self.days, &self.tasks);
    }

    pub fn clear_filter(&mut self) {
        self.filter.reset();
    }

    pub fn filter_mode(&self) -> &FilterMode {
        self.filter.mode()
    }

    pub fn is_filtering(&self) -> bool {
        self.filter.is_active()
    }

    pub fn search_text(&self) -> &str {
        self.filter.search_text()
    }

    pub fn selected_label(&self) -> Option<LabelId> {
        self.filter.selected_label()
    }

    /// Ordered tasks for `day` from the filtered view when a filter is active,
    /// otherwise from the store.
    pub fn project(&self, day: &str) -> DayProjection<'_> {
        if self.filter.is_active() {
            view::project(self.filter.view_day(day))
        } else {
            view::project(self.tasks.day(day))
        }
    }

    pub fn export(&self) -> Snapshot {
        Snapshot {
            calendar: self.tasks.calendar().clone(),
            labels: self.labels.as_slice().to_vec(),
        }
    }

    /// Replaces tasks and labels. Validation happens first, so a rejected
    /// snapshot leaves the board untouched.
    pub fn import(&mut self, snapshot: Snapshot) -> Result<(), BoardError> {
        if let Err(err) = snapshot.validate() {
            warn!(error = %err, "snapshot rejected");
            return Err(err);
        }
        let Snapshot { calendar, labels } = snapshot;
        debug!(days = calendar.len(), labels = labels.len(), "snapshot imported");
        self.tasks.replace(calendar, &self.days);
        self.labels.replace(labels);
        self.filter.reset();
        Ok(())
    }

    fn ensure_editable(&self, action: &str) -> Result<(), BoardError> {
        if self.filter.is_active() {
            debug!(action, mode = ?self.filter.mode(), "edit rejected while filtering");
            return Err(BoardError::InvalidOperation(format!(
                "{} is disabled while a filter is active",
                action
            )));
        }
        Ok(())
    }
}
