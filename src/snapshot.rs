use crate::model::{BoardError, DayKey, DayTasks, Label};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Exchange format for export and import. Task ids are map keys, written as
/// strings in JSON.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub calendar: BTreeMap<DayKey, DayTasks>,
    pub labels: Vec<Label>,
}

impl Snapshot {
    pub fn from_json(data: &str) -> Result<Snapshot, BoardError> {
        let snapshot: Snapshot = serde_json::from_str(data)
            .map_err(|err| BoardError::InvalidSnapshot(err.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, BoardError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| BoardError::InvalidSnapshot(err.to_string()))
    }

    /// Structural checks run before any board state is replaced.
    pub fn validate(&self) -> Result<(), BoardError> {
        let mut label_ids = HashSet::new();
        for label in &self.labels {
            if !label_ids.insert(label.id) {
                return Err(BoardError::InvalidSnapshot(format!(
                    "duplicate label id {}",
                    label.id
                )));
            }
        }

        let mut task_ids = HashSet::new();
        for (day, tasks) in &self.calendar {
            for (key, task) in tasks {
                if *key != task.id {
                    return Err(BoardError::InvalidSnapshot(format!(
                        "task keyed {} on {} carries id {}",
                        key, day, task.id
                    )));
                }
                if !task_ids.insert(task.id) {
                    return Err(BoardError::InvalidSnapshot(format!(
                        "duplicate task id {}",
                        task.id
                    )));
                }
                if let Some(label) = task.labels.iter().find(|l| !label_ids.contains(&l.id)) {
                    return Err(BoardError::InvalidSnapshot(format!(
                        "task {} on {} references unknown label {}",
                        task.id, day, label.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LabelRef, Task};

    const FILE: &str = r##"{
        "calendar": {
            "2023-06-01": {
                "0": {"id": 0, "text": "Meeting", "isEditable": false, "order": 0,
                      "labels": [{"id": 0, "color": "#61bd4f", "text": "work"}]},
                "2": {"id": 2, "text": "", "isEditable": true}
            },
            "2023-06-02": {}
        },
        "labels": [{"id": 0, "color": "#61bd4f", "text": "work"}]
    }"##;

    #[test]
    fn parses_file_shape() {
        let snapshot = Snapshot::from_json(FILE).expect("parse");
        let day = &snapshot.calendar["2023-06-01"];
        assert_eq!(day.len(), 2);
        assert_eq!(day[&0].labels, vec![LabelRef::new(0, "#61bd4f", "work")]);
        assert!(day[&2].is_editable);
        assert!(snapshot.calendar["2023-06-02"].is_empty());
    }

    #[test]
    fn task_keys_written_as_strings() {
        let mut snapshot = Snapshot::default();
        let mut tasks = DayTasks::new();
        tasks.insert(7, Task::empty(7, 0));
        snapshot.calendar.insert("2023-06-01".into(), tasks);
        let json = snapshot.to_json().expect("json");
        assert!(json.contains("\"7\": {"));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Snapshot::from_json(r#"{"calendar": 5}"#).unwrap_err();
        assert!(matches!(err, BoardError::InvalidSnapshot(_)));
    }

    #[test]
    fn rejects_missing_labels_field() {
        assert!(Snapshot::from_json(r#"{"calendar": {}}"#).is_err());
    }

    #[test]
    fn rejects_duplicate_task_ids_across_days() {
        let data = r#"{
            "calendar": {
                "2023-06-01": {"1": {"id": 1, "text": "a", "isEditable": false}},
                "2023-06-02": {"1": {"id": 1, "text": "b", "isEditable": false}}
            },
            "labels": []
        }"#;
        let err = Snapshot::from_json(data).unwrap_err();
        assert_eq!(err, BoardError::InvalidSnapshot("duplicate task id 1".into()));
    }

    #[test]
    fn rejects_mismatched_key() {
        let data = r#"{
            "calendar": {"2023-06-01": {"4": {"id": 5, "text": "a", "isEditable": false}}},
            "labels": []
        }"#;
        assert!(Snapshot::from_json(data).is_err());
    }

    #[test]
    fn rejects_unknown_label_reference() {
        let data = r##"{
            "calendar": {"2023-06-01": {"0": {"id": 0, "text": "a", "isEditable": false,
                "labels": [{"id": 9, "color": "#000", "text": "ghost"}]}}},
            "labels": []
        }"##;
        assert!(Snapshot::from_json(data).is_err());
    }

    #[test]
    fn rejects_duplicate_label_ids() {
        let data = r##"{
            "calendar": {},
            "labels": [{"id": 1, "color": "#000", "text": "a"}, {"id": 1, "color": "#fff", "text": "b"}]
        }"##;
        assert!(Snapshot::from_json(data).is_err());
    }
}
