//! Game-level progress that outlives individual maps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Collected item counts plus free-form flags set by pickups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub counts: BTreeMap<String, u32>,
    #[serde(default)]
    pub flags: Map<String, Value>,
}

impl Inventory {
    pub fn add(&mut self, kind: &str) {
        *self.counts.entry(kind.to_owned()).or_insert(0) += 1;
    }

    pub fn count(&self, kind: &str) -> u32 {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    /// Overwrite flags with the given attributes, key by key.
    pub fn merge_flags(&mut self, atts: &Map<String, Value>) {
        for (key, value) in atts {
            self.flags.insert(key.clone(), value.clone());
        }
    }

    pub fn flag(&self, key: &str) -> Option<&Value> {
        self.flags.get(key)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.flags.clear();
    }
}
