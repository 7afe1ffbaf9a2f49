use crate::model::board::ContainerMap;
use crate::model::config::{DragConfig, default_deletion_key, default_library_prefix};

/// Reserved drag ids that do not name a placement or container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinels {
    /// Prefix carried by ids of templates dragged out of the library
    pub library_prefix: String,
    /// Id of the deletion drop zone
    pub deletion_key: String,
}

impl Default for Sentinels {
    fn default() -> Self {
        Sentinels {
            library_prefix: default_library_prefix(),
            deletion_key: default_deletion_key(),
        }
    }
}

impl From<&DragConfig> for Sentinels {
    fn from(drag: &DragConfig) -> Self {
        Sentinels {
            library_prefix: drag.library_prefix.clone(),
            deletion_key: drag.deletion_key.clone(),
        }
    }
}

impl Sentinels {
    /// Catalog id carried by a library drag id, if it is one
    pub fn template_id<'a>(&self, id: &'a str) -> Option<&'a str> {
        id.strip_prefix(self.library_prefix.as_str())
    }
}

/// Where an id lives on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location<'a> {
    /// The template library (virtual, holds templates rather than placements)
    Library,
    /// The deletion drop zone
    Deletion,
    /// A real container, by key
    Container(&'a str),
}

impl std::fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Library => write!(f, "library"),
            Location::Deletion => write!(f, "deletion"),
            Location::Container(key) => write!(f, "{}", key),
        }
    }
}

/// Classify `id` against the board.
///
/// Checked in order: library prefix, deletion key, placement ids (first
/// container in key order wins), container keys. `None` when nothing
/// matches. A drop onto an empty container reports the container key
/// itself as the target id, which is why keys are checked last.
pub fn resolve<'a>(id: &str, map: &'a ContainerMap, sentinels: &Sentinels) -> Option<Location<'a>> {
    if id.starts_with(sentinels.library_prefix.as_str()) {
        return Some(Location::Library);
    }
    if id == sentinels.deletion_key {
        return Some(Location::Deletion);
    }
    if let Some((key, _)) = map.locate(id) {
        return Some(Location::Container(key));
    }
    map.keys().find(|k| *k == id).map(Location::Container)
}
