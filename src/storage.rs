use crate::snapshot::Snapshot;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let snapshot = Snapshot::from_json(&data).with_context(|| format!("importing {:?}", path))?;
    info!(path = %path.display(), days = snapshot.calendar.len(), "snapshot loaded");
    Ok(snapshot)
}

/// Like [`load_snapshot`], but a missing file is an empty snapshot.
pub fn load_snapshot_or_default(path: &Path) -> Result<Snapshot> {
    if path.exists() {
        load_snapshot(path)
    } else {
        Ok(Snapshot::default())
    }
}

pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    ensure_parent(path)?;
    let serialized = snapshot.to_json().context("serializing board")?;
    fs::write(path, serialized).with_context(|| format!("writing {:?}", path))?;
    info!(path = %path.display(), "snapshot saved");
    Ok(())
}

pub fn screenshot_path(dir: &Path, at: DateTime<Local>) -> PathBuf {
    dir.join(format!("calendar-{}.txt", at.format("%Y%m%d-%H%M%S")))
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, text).with_context(|| format!("writing {:?}", path))?;
    info!(path = %path.display(), "screenshot written");
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Label;
    use chrono::TimeZone;

    #[test]
    fn save_then_load_creates_directories() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested/calendar.json");
        let mut snapshot = Snapshot::default();
        snapshot.labels.push(Label::new(0, "#61bd4f", "work"));
        save_snapshot(&path, &snapshot)?;
        assert_eq!(load_snapshot(&path)?, snapshot);
        Ok(())
    }

    #[test]
    fn missing_file_is_default_only_when_asked() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("absent.json");
        assert!(load_snapshot(&path).is_err());
        assert_eq!(load_snapshot_or_default(&path)?, Snapshot::default());
        Ok(())
    }

    #[test]
    fn invalid_file_is_reported() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"calendar\": []}")?;
        let err = load_snapshot(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid snapshot"));
        Ok(())
    }

    #[test]
    fn screenshot_name_uses_timestamp() {
        let at = Local
            .with_ymd_and_hms(2023, 6, 1, 9, 30, 5)
            .single()
            .expect("local time");
        let path = screenshot_path(Path::new("shots"), at);
        assert_eq!(path, PathBuf::from("shots/calendar-20230601-093005.txt"));
    }
}
