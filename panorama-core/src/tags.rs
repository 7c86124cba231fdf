//! Tags - Resource tags and the delta between two tag sets

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Convert model tags into the map shape the service takes
pub fn to_map(tags: &[Tag]) -> HashMap<String, String> {
    tags.iter()
        .map(|t| (t.key.clone(), t.value.clone()))
        .collect()
}

/// Convert a service tag map into model tags, sorted by key.
///
/// Returns None for an empty map so an untagged resource reads back without a
/// Tags property.
pub fn from_map(map: HashMap<String, String>) -> Option<Vec<Tag>> {
    if map.is_empty() {
        return None;
    }
    let mut tags: Vec<Tag> = map.into_iter().map(|(k, v)| Tag::new(k, v)).collect();
    tags.sort();
    Some(tags)
}

/// Tag calls needed to move a resource from `previous` tags to `desired` ones
///
/// Pairs are compared whole, so a key whose value changed shows up in both
/// sets. Callers issue the remove call before the add call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDelta {
    /// Pairs in desired but not in previous
    pub to_add: BTreeMap<String, String>,
    /// Keys of pairs in previous but not in desired
    pub to_remove: BTreeSet<String>,
}

impl TagDelta {
    pub fn between(desired: &[Tag], previous: &[Tag]) -> Self {
        let desired: BTreeSet<&Tag> = desired.iter().collect();
        let previous: BTreeSet<&Tag> = previous.iter().collect();

        let to_add = desired
            .difference(&previous)
            .map(|t| (t.key.clone(), t.value.clone()))
            .collect();
        let to_remove = previous
            .difference(&desired)
            .map(|t| t.key.clone())
            .collect();

        Self { to_add, to_remove }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
