use crate::error::{Result, VocabularyError};

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use serde::{Serialize, Deserialize};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::debug;


/// A typed sequence stored under one key of a [`Group`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Dataset {
    Strings(Vec<String>),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
}

impl Dataset {

    pub fn len(&self) -> usize {
        match self {
            Dataset::Strings(values) => values.len(),
            Dataset::Ints(values) => values.len(),
            Dataset::Floats(values) => values.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Dataset::Strings(_) => "strings",
            Dataset::Ints(_) => "ints",
            Dataset::Floats(_) => "floats"
        }
    }

    fn describe(&self) -> String {
        format!("{} {}", self.len(), self.kind())
    }

}


/// Named datasets inside one group of a [`NetworkState`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    datasets: BTreeMap<String, Dataset>,
}

impl Group {

    pub fn contains(&self, key: &str) -> bool {
        self.datasets.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Dataset> {
        self.datasets.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    /// Checks that `data` may be written under `key`: either the key is free,
    /// or the existing dataset has the same element type and length.
    pub fn check_write(&self, key: &str, data: &Dataset) -> Result<()> {
        match self.datasets.get(key) {
            Some(existing) if existing.kind() != data.kind() || existing.len() != data.len() => {
                Err(VocabularyError::ShapeMismatch {
                    key: key.to_string(),
                    expected: existing.describe(),
                    found: data.describe()
                })
            },
            _ => Ok(())
        }
    }

    /// Creates the dataset if absent, otherwise overwrites it in place.
    pub fn write(&mut self, key: &str, data: Dataset) -> Result<()> {
        self.check_write(key, &data)?;
        self.datasets.insert(key.to_string(), data);
        Ok(())
    }

}


/// Keyed hierarchical store for network state: groups of typed datasets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkState {
    groups: BTreeMap<String, Group>,
}

impl NetworkState {

    pub fn new() -> NetworkState {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Returns the named group, creating an empty one if needed.
    pub fn require_group(&mut self, name: &str) -> &mut Group {
        self.groups.entry(name.to_string()).or_default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let f = BufWriter::new(File::create(path)?);
        let mut writer = GzEncoder::new(f, Compression::default());
        bincode::serialize_into(&mut writer, self)?;
        writer.finish()?.flush()?;

        debug!("saved network state with {} groups to {}", self.groups.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<NetworkState> {

        let f = BufReader::new(File::open(path)?);
        let reader = GzDecoder::new(f);
        let state: NetworkState = bincode::deserialize_from(reader)?;

        debug!("loaded network state with {} groups from {}", state.groups.len(), path.display());
        Ok(state)
    }

}
