use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::placement::PlacedItem;

/// Container keys of the `week` layout, in display order
pub const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Container keys of the `kanban` layout, in display order
pub const KANBAN_STATUSES: [&str; 3] = ["todo", "in-progress", "done"];

/// Preset set of container keys a board is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Week,
    Kanban,
    /// Keys listed explicitly in the config
    Custom,
}

impl Layout {
    /// Keys the layout provides when the config does not override them.
    /// `Custom` has none.
    pub fn default_keys(self) -> &'static [&'static str] {
        match self {
            Layout::Week => &WEEKDAYS,
            Layout::Kanban => &KANBAN_STATUSES,
            Layout::Custom => &[],
        }
    }

    pub fn parse(s: &str) -> Option<Layout> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Some(Layout::Week),
            "kanban" => Some(Layout::Kanban),
            "custom" => Some(Layout::Custom),
            _ => None,
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::Week => write!(f, "week"),
            Layout::Kanban => write!(f, "kanban"),
            Layout::Custom => write!(f, "custom"),
        }
    }
}

/// Mapping from container key to the ordered placements it holds.
///
/// Keys form a closed set fixed at construction; every key is present even
/// when its sequence is empty. Order of keys and of placements is
/// significant, so equality compares both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerMap {
    containers: IndexMap<String, Vec<PlacedItem>>,
}

impl ContainerMap {
    /// A map with an empty sequence for each key. Duplicate keys collapse.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ContainerMap {
            containers: keys.into_iter().map(|k| (k.into(), Vec::new())).collect(),
        }
    }

    /// Build a map over `keys` from previously persisted contents.
    ///
    /// Keys missing from `persisted` start empty. Persisted keys outside the
    /// configured set are dropped and returned so the caller can report them.
    pub fn from_persisted<S: AsRef<str>>(
        keys: &[S],
        mut persisted: IndexMap<String, Vec<PlacedItem>>,
    ) -> (Self, Vec<String>) {
        let mut map = ContainerMap::new(keys.iter().map(|k| k.as_ref().to_string()));
        for (key, items) in map.containers.iter_mut() {
            if let Some(saved) = persisted.shift_remove(key) {
                *items = saved;
            }
        }
        let dropped = persisted.into_keys().collect();
        (map, dropped)
    }

    /// Container keys in display order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.containers.keys().map(|k| k.as_str())
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.containers.contains_key(key)
    }

    /// Placements held by `key`, empty for an unknown key
    pub fn items(&self, key: &str) -> &[PlacedItem] {
        self.containers.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub(crate) fn items_mut(&mut self, key: &str) -> Option<&mut Vec<PlacedItem>> {
        self.containers.get_mut(key)
    }

    pub(crate) fn all_items_mut(&mut self) -> impl Iterator<Item = &mut Vec<PlacedItem>> {
        self.containers.values_mut()
    }

    /// `(key, placements)` pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PlacedItem])> {
        self.containers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Container key and index of the placement with `placement_id`.
    /// First match in key order.
    pub fn locate(&self, placement_id: &str) -> Option<(&str, usize)> {
        self.containers.iter().find_map(|(key, items)| {
            items
                .iter()
                .position(|i| i.placement_id == placement_id)
                .map(|idx| (key.as_str(), idx))
        })
    }

    pub fn find(&self, placement_id: &str) -> Option<&PlacedItem> {
        self.locate(placement_id)
            .map(|(key, idx)| &self.items(key)[idx])
    }

    /// Number of placements across all containers
    pub fn len(&self) -> usize {
        self.containers.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.values().all(|v| v.is_empty())
    }

    /// Number of placements made from `template_id`
    pub fn count_template(&self, template_id: &str) -> usize {
        self.containers
            .values()
            .flatten()
            .filter(|i| i.is_from(template_id))
            .count()
    }
}

impl PartialEq for ContainerMap {
    fn eq(&self, other: &Self) -> bool {
        self.containers.iter().eq(other.containers.iter())
    }
}

impl Eq for ContainerMap {}
