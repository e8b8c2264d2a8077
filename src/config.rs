use crate::calendar::WeekStart;
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_BOARD_FILE: &str = "calendar.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub board_file: PathBuf,
    pub holidays_file: Option<PathBuf>,
    pub week_start: WeekStart,
    pub label_palette: Vec<String>,
    pub screenshot_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            board_file: PathBuf::from(DEFAULT_BOARD_FILE),
            holidays_file: None,
            week_start: WeekStart::Sunday,
            label_palette: default_palette(),
            screenshot_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Loads `explicit` when given (it must exist), otherwise the per-user
    /// config file if there is one, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("config file {:?} does not exist", path);
            }
            return Self::load_from(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Config> {
        let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        let mut config: Config = serde_yaml::from_str(&data).context("parsing config file")?;
        if config.label_palette.is_empty() {
            config.label_palette = default_palette();
        }
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn random_label_color(&self) -> String {
        self.label_palette
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| "#61bd4f".to_string())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "calboard").map(|dirs| dirs.config_dir().join("config.yml"))
}

fn default_palette() -> Vec<String> {
    ["#61bd4f", "#f2d600", "#ff9f1a", "#eb5a46", "#c377e0", "#0079bf"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_file() {
        let config = Config::default();
        assert_eq!(config.board_file, PathBuf::from("calendar.json"));
        assert_eq!(config.week_start, WeekStart::Sunday);
        assert_eq!(config.label_palette.len(), 6);
    }

    #[test]
    fn overrides_from_yaml() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.yml");
        fs::write(
            &path,
            "board_file: /tmp/board.json\nweek_start: monday\nlabel_palette: ['#123456']\n",
        )?;
        let config = Config::load(Some(&path))?;
        assert_eq!(config.board_file, PathBuf::from("/tmp/board.json"));
        assert_eq!(config.week_start, WeekStart::Monday);
        assert_eq!(config.random_label_color(), "#123456");
        assert_eq!(config.screenshot_dir, PathBuf::from("."));
        Ok(())
    }

    #[test]
    fn empty_palette_falls_back() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.yml");
        fs::write(&path, "label_palette: []\n")?;
        let config = Config::load_from(&path)?;
        assert!(!config.label_palette.is_empty());
        Ok(())
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(Config::load(Some(&dir.path().join("nope.yml"))).is_err());
    }

    #[test]
    fn rejects_unknown_week_start() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yml");
        fs::write(&path, "week_start: friday\n").expect("write");
        assert!(Config::load_from(&path).is_err());
    }
}
