//! Derived, filtered copies of the task store.
//!
//! Two inputs are tracked independently of the active mode: the search text
//! and the selected label chip. Either can hold a stale value while the other
//! predicate is the one applied.

use crate::model::{DayKey, DayTasks, LabelId, Task};
use crate::store::TaskStore;
use std::collections::BTreeMap;
use tracing::debug;

pub type FilteredView = BTreeMap<DayKey, DayTasks>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    Idle,
    TextSearch(String),
    LabelFilter(LabelId),
}

impl FilterMode {
    pub fn is_active(&self) -> bool {
        !matches!(self, FilterMode::Idle)
    }

    /// Text search is a case-insensitive prefix match on the task text.
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            FilterMode::Idle => true,
            FilterMode::TextSearch(query) => task
                .text
                .to_lowercase()
                .starts_with(&query.to_lowercase()),
            FilterMode::LabelFilter(id) => task.has_label(*id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterEngine {
    mode: FilterMode,
    search_text: String,
    selected_label: Option<LabelId>,
    view: FilteredView,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &FilterMode {
        &self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode.is_active()
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn selected_label(&self) -> Option<LabelId> {
        self.selected_label
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    pub fn view_day(&self, day: &str) -> Option<&DayTasks> {
        self.view.get(day)
    }

    /// Non-empty text switches to text search and drops the label chip
    /// selection; empty text returns to idle whatever mode was active.
    pub fn set_search_text(&mut self, text: &str, baseline: &[DayKey], store: &TaskStore) {
        self.search_text = text.to_string();
        if text.is_empty() {
            self.clear_view();
            return;
        }
        self.selected_label = None;
        self.apply(FilterMode::TextSearch(text.to_string()), baseline, store);
    }

    /// Selecting the chip that is already selected, or `None`, returns to idle.
    /// The search text is left untouched.
    pub fn select_label(&mut self, id: Option<LabelId>, baseline: &[DayKey], store: &TaskStore) {
        let next = match id {
            Some(id) if self.selected_label != Some(id) => Some(id),
            _ => None,
        };
        self.selected_label = next;
        match next {
            Some(id) => self.apply(FilterMode::LabelFilter(id), baseline, store),
            None => self.clear_view(),
        }
    }

    /// Back to idle with both inputs cleared.
    pub fn reset(&mut self) {
        self.search_text.clear();
        self.selected_label = None;
        self.clear_view();
    }

    fn apply(&mut self, mode: FilterMode, baseline: &[DayKey], store: &TaskStore) {
        let mut view: FilteredView = baseline
            .iter()
            .map(|day| (day.clone(), DayTasks::new()))
            .collect();
        let mut matched = 0usize;
        for (day, tasks) in store.days() {
            for task in tasks.values().filter(|t| mode.matches(t)) {
                view.entry(day.clone())
                    .or_default()
                    .insert(task.id, task.clone());
                matched += 1;
            }
        }
        debug!(?mode, matched, "filtered view rebuilt");
        self.view = view;
        self.mode = mode;
    }

    fn clear_view(&mut self) {
        self.mode = FilterMode::Idle;
        self.view.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: &str = "2023-06-01";
    const NEXT: &str = "2023-06-02";

    fn fixture() -> (Vec<DayKey>, TaskStore) {
        let days = vec![DAY.to_string(), NEXT.to_string()];
        let mut store = TaskStore::with_days(days.clone());
        let a = store.create_empty_task(DAY).expect("create");
        store.commit_task(a, DAY, "Meeting", false).expect("commit");
        let b = store.create_empty_task(DAY).expect("create");
        store.commit_task(b, DAY, "Team meeting", false).expect("commit");
        let c = store.create_empty_task(NEXT).expect("create");
        store.commit_task(c, NEXT, "memo", false).expect("commit");
        store.attach_label(NEXT, c, 3, "#eb5a46", "bug").expect("attach");
        (days, store)
    }

    fn texts(engine: &FilterEngine, day: &str) -> Vec<String> {
        engine
            .view_day(day)
            .map(|tasks| tasks.values().map(|t| t.text.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn text_search_is_case_insensitive_prefix() {
        let (days, store) = fixture();
        let mut engine = FilterEngine::new();
        engine.set_search_text("mee", &days, &store);
        assert_eq!(engine.mode(), &FilterMode::TextSearch("mee".into()));
        assert_eq!(texts(&engine, DAY), vec!["Meeting".to_string()]);
        assert!(texts(&engine, NEXT).is_empty());
    }

    #[test]
    fn baseline_days_present_without_matches() {
        let (days, store) = fixture();
        let mut engine = FilterEngine::new();
        engine.set_search_text("zzz", &days, &store);
        assert_eq!(engine.view().len(), 2);
        assert!(engine.view().values().all(|tasks| tasks.is_empty()));
    }

    #[test]
    fn empty_text_returns_to_idle() {
        let (days, store) = fixture();
        let mut engine = FilterEngine::new();
        engine.set_search_text("m", &days, &store);
        engine.set_search_text("", &days, &store);
        assert_eq!(engine.mode(), &FilterMode::Idle);
        assert!(engine.view().is_empty());
    }

    #[test]
    fn label_selection_toggles() {
        let (days, store) = fixture();
        let mut engine = FilterEngine::new();
        engine.select_label(Some(3), &days, &store);
        assert_eq!(engine.mode(), &FilterMode::LabelFilter(3));
        assert_eq!(texts(&engine, NEXT), vec!["memo".to_string()]);
        assert!(texts(&engine, DAY).is_empty());
        engine.select_label(Some(3), &days, &store);
        assert_eq!(engine.mode(), &FilterMode::Idle);
        assert_eq!(engine.selected_label(), None);
    }

    #[test]
    fn label_filter_keeps_search_text() {
        let (days, store) = fixture();
        let mut engine = FilterEngine::new();
        engine.set_search_text("mee", &days, &store);
        engine.select_label(Some(3), &days, &store);
        assert_eq!(engine.search_text(), "mee");
        assert_eq!(engine.mode(), &FilterMode::LabelFilter(3));
    }

    #[test]
    fn typing_drops_label_selection() {
        let (days, store) = fixture();
        let mut engine = FilterEngine::new();
        engine.select_label(Some(3), &days, &store);
        engine.set_search_text("t", &days, &store);
        assert_eq!(engine.selected_label(), None);
        assert_eq!(engine.mode(), &FilterMode::TextSearch("t".into()));
    }

    #[test]
    fn clearing_text_leaves_label_filter_idle() {
        let (days, store) = fixture();
        let mut engine = FilterEngine::new();
        engine.select_label(Some(3), &days, &store);
        engine.set_search_text("", &days, &store);
        assert_eq!(engine.mode(), &FilterMode::Idle);
        assert_eq!(engine.selected_label(), Some(3));
    }
}
