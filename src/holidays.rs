use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Date string to holiday name. Dates that are absent have no holiday.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayMap {
    names: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct PublicHoliday {
    date: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HolidayFile {
    List(Vec<PublicHoliday>),
    Map(BTreeMap<String, String>),
}

impl HolidayMap {
    /// Accepts a public-holiday API list (`[{"date", "name", ..}]`) or a plain
    /// `{"date": "name"}` object.
    pub fn from_json(data: &str) -> Result<Self> {
        let parsed: HolidayFile = serde_json::from_str(data).context("parsing holiday list")?;
        let names = match parsed {
            HolidayFile::List(items) => items.into_iter().map(|h| (h.date, h.name)).collect(),
            HolidayFile::Map(map) => map,
        };
        Ok(HolidayMap { names })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        Self::from_json(&data).with_context(|| format!("loading holidays from {:?}", path))
    }

    pub fn name_for(&self, date: &str) -> Option<&str> {
        self.names.get(date).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
