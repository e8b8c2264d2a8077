use crate::model::{DayTasks, Task, TaskId};

/// Render-ready tasks of one day, ascending by `order`. Equal ranks keep id
/// order. Built fresh on every query.
#[derive(Debug, Clone, Default)]
pub struct DayProjection<'a> {
    tasks: Vec<&'a Task>,
}

pub fn project(tasks: Option<&DayTasks>) -> DayProjection<'_> {
    let mut tasks: Vec<&Task> = tasks.map(|t| t.values().collect()).unwrap_or_default();
    tasks.sort_by_key(|t| t.order);
    DayProjection { tasks }
}

impl<'a> DayProjection<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.tasks.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Task> {
        self.tasks.get(index).copied()
    }

    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id).collect()
    }
}

impl<'a> IntoIterator for DayProjection<'a> {
    type Item = &'a Task;
    type IntoIter = std::vec::IntoIter<&'a Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: TaskId, order: i64) -> Task {
        let mut t = Task::empty(id, order);
        t.text = format!("task {}", id);
        t
    }

    #[test]
    fn sorts_by_order_with_id_fallback() {
        let mut tasks = DayTasks::new();
        for (id, order) in [(5, 1), (2, 0), (9, 1), (1, 3)] {
            tasks.insert(id, task(id, order));
        }
        let view = project(Some(&tasks));
        assert_eq!(view.ids(), vec![2, 5, 9, 1]);
        assert_eq!(view.position(9), Some(2));
    }

    #[test]
    fn missing_day_is_empty() {
        let view = project(None);
        assert!(view.is_empty());
        assert_eq!(view.iter().count(), 0);
    }

    #[test]
    fn iteration_is_restartable() {
        let mut tasks = DayTasks::new();
        tasks.insert(0, task(0, 0));
        tasks.insert(1, task(1, 1));
        let view = project(Some(&tasks));
        let first: Vec<_> = view.iter().map(|t| t.id).collect();
        let second: Vec<_> = view.iter().map(|t| t.id).collect();
        assert_eq!(first, second);
    }
}
