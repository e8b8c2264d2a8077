use crate::model::{Label, LabelId};
use tracing::debug;

/// Append-only set of labels with its own id counter, independent of task ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelRegistry {
    labels: Vec<Label>,
    next_id: LabelId,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a label and returns its id. Identical colour/text pairs are
    /// allowed and get distinct ids.
    pub fn create_label(&mut self, color: impl Into<String>, text: impl Into<String>) -> LabelId {
        let id = self.next_id;
        let label = Label::new(id, color, text);
        debug!(label = id, color = %label.color, text = %label.text, "label created");
        self.labels.push(label);
        self.next_id += 1;
        id
    }

    pub fn get(&self, id: LabelId) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == id)
    }

    pub fn contains(&self, id: LabelId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn as_slice(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn next_id(&self) -> LabelId {
        self.next_id
    }

    /// Replaces the contents wholesale. The counter never moves backwards so
    /// ids stay unique for the lifetime of the board.
    pub(crate) fn replace(&mut self, labels: Vec<Label>) {
        let after_max = labels.iter().map(|l| l.id + 1).max().unwrap_or(0);
        self.next_id = self.next_id.max(after_max);
        self.labels = labels;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_duplicates_allowed() {
        let mut reg = LabelRegistry::new();
        let a = reg.create_label("#eb5a46", "urgent");
        let b = reg.create_label("#eb5a46", "urgent");
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get(b).map(|l| l.text.as_str()), Some("urgent"));
    }

    #[test]
    fn replace_advances_counter_past_imported_ids() {
        let mut reg = LabelRegistry::new();
        reg.create_label("#0079bf", "home");
        reg.replace(vec![Label::new(7, "#f2d600", "later")]);
        assert!(!reg.contains(0));
        assert_eq!(reg.create_label("#c377e0", "next"), 8);
    }

    #[test]
    fn replace_with_fewer_labels_keeps_counter() {
        let mut reg = LabelRegistry::new();
        for _ in 0..4 {
            reg.create_label("#61bd4f", "x");
        }
        reg.replace(Vec::new());
        assert!(reg.is_empty());
        assert_eq!(reg.next_id(), 4);
    }
}
