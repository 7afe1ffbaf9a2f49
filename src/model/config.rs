use serde::{Deserialize, Serialize};

use super::board::Layout;
use super::template::Template;

/// Configuration from board.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub board: BoardInfo,
    #[serde(default)]
    pub drag: DragConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// The template library, in display order
    #[serde(default)]
    pub templates: Vec<Template>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardInfo {
    pub name: String,
    #[serde(default = "default_layout")]
    pub layout: Layout,
    /// Explicit container keys. Required for the custom layout, and
    /// overrides the preset keys for the others.
    #[serde(default)]
    pub containers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragConfig {
    /// Marks ids of templates dragged out of the library
    #[serde(default = "default_library_prefix")]
    pub library_prefix: String,
    /// Id of the drop zone that deletes placements
    #[serde(default = "default_deletion_key")]
    pub deletion_key: String,
}

impl Default for DragConfig {
    fn default() -> Self {
        DragConfig {
            library_prefix: default_library_prefix(),
            deletion_key: default_deletion_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

fn default_layout() -> Layout {
    Layout::Week
}

pub fn default_library_prefix() -> String {
    "lib-".to_string()
}

pub fn default_deletion_key() -> String {
    "delete-zone".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl BoardConfig {
    /// The closed set of container keys this board uses
    pub fn container_keys(&self) -> Vec<String> {
        match &self.board.containers {
            Some(keys) => keys.clone(),
            None => self
                .board
                .layout
                .default_keys()
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }
}
