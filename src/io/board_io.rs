use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, warn};

use crate::io::config_io;
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::board::{ContainerMap, Layout};
use crate::model::config::BoardConfig;
use crate::model::placement::PlacedItem;
use crate::ops::factory::{self, PLACEMENT_PREFIX};
use crate::ops::resolve::Sentinels;
use crate::ops::session::Persist;

/// Directory holding a board, under the board root
pub const BOARD_DIR: &str = "planboard";
/// Persisted container map, inside the board directory
pub const STATE_FILE: &str = "board.json";

/// Error type for board I/O operations
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("not a planboard board: no planboard/board.toml found")]
    NotABoard,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse board.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit board.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("could not encode board state: {0}")]
    StateEncodeError(#[from] serde_json::Error),
    #[error("invalid board config: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A board loaded from disk
#[derive(Debug)]
pub struct Board {
    /// Directory containing `planboard/`
    pub root: PathBuf,
    /// The `planboard/` directory itself
    pub dir: PathBuf,
    pub config: BoardConfig,
    /// Raw config document, for format-preserving catalog edits
    pub doc: toml_edit::DocumentMut,
    pub map: ContainerMap,
}

impl Board {
    pub fn sentinels(&self) -> Sentinels {
        Sentinels::from(&self.config.drag)
    }
}

/// Discover the board by walking up from `start`, looking for a
/// `planboard/board.toml`.
pub fn discover_board(start: &Path) -> Result<PathBuf, BoardError> {
    let mut current = start.to_path_buf();
    loop {
        let dir = current.join(BOARD_DIR);
        if dir.is_dir() && dir.join(config_io::CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(BoardError::NotABoard);
        }
    }
}

/// Load config and persisted state of the board rooted at `root`.
pub fn load_board(root: &Path) -> Result<Board, BoardError> {
    let dir = root.join(BOARD_DIR);
    if !dir.is_dir() {
        return Err(BoardError::NotABoard);
    }

    let (config, doc) = config_io::read_config(&dir)?;
    validate_config(&config)?;
    let map = read_state(&dir, &config.container_keys())?;
    factory::observe_ids(config.templates.iter().map(|t| t.id.as_str()));

    debug!(
        "event=board_loaded dir={} containers={} placements={}",
        dir.display(),
        map.keys().count(),
        map.len()
    );

    Ok(Board {
        root: root.to_path_buf(),
        dir,
        config,
        doc,
        map,
    })
}

/// Check a config for keys and sentinels the board cannot work with.
pub fn validate_config(config: &BoardConfig) -> Result<(), BoardError> {
    let sentinels = Sentinels::from(&config.drag);
    if sentinels.library_prefix.is_empty() {
        return Err(BoardError::InvalidConfig("drag.library_prefix must not be empty".into()));
    }
    if sentinels.deletion_key.is_empty() {
        return Err(BoardError::InvalidConfig("drag.deletion_key must not be empty".into()));
    }
    // Placement ids are `item-<n>`; a prefix overlapping that would claim
    // every placement for the library.
    if PLACEMENT_PREFIX.starts_with(sentinels.library_prefix.as_str())
        || sentinels.library_prefix.starts_with(PLACEMENT_PREFIX)
    {
        return Err(BoardError::InvalidConfig(format!(
            "drag.library_prefix \"{}\" overlaps placement ids ({}<n>)",
            sentinels.library_prefix, PLACEMENT_PREFIX
        )));
    }
    if sentinels.deletion_key.starts_with(PLACEMENT_PREFIX)
        || sentinels.deletion_key.starts_with(sentinels.library_prefix.as_str())
    {
        return Err(BoardError::InvalidConfig(format!(
            "drag.deletion_key \"{}\" could be mistaken for a placement or library id",
            sentinels.deletion_key
        )));
    }
    if config.board.layout == Layout::Custom && config.board.containers.is_none() {
        return Err(BoardError::InvalidConfig(
            "the custom layout needs board.containers".into(),
        ));
    }
    validate_container_keys(&config.container_keys(), &sentinels).map_err(BoardError::InvalidConfig)?;

    let mut seen = HashSet::new();
    for template in &config.templates {
        if !seen.insert(template.id.as_str()) {
            return Err(BoardError::InvalidConfig(format!(
                "duplicate template id \"{}\"",
                template.id
            )));
        }
    }
    Ok(())
}

/// Container keys must be non-empty, unique, and distinct from the drag
/// sentinels so the resolver can tell them apart.
pub fn validate_container_keys(keys: &[String], sentinels: &Sentinels) -> Result<(), String> {
    if keys.is_empty() {
        return Err("a board needs at least one container".to_string());
    }
    let mut seen = HashSet::new();
    for key in keys {
        if key.trim().is_empty() {
            return Err("container keys cannot be blank".to_string());
        }
        if key.starts_with(sentinels.library_prefix.as_str()) {
            return Err(format!(
                "container \"{}\" starts with the library prefix \"{}\"",
                key, sentinels.library_prefix
            ));
        }
        if *key == sentinels.deletion_key {
            return Err(format!("container \"{}\" is the deletion key", key));
        }
        if !seen.insert(key.as_str()) {
            return Err(format!("duplicate container \"{}\"", key));
        }
    }
    Ok(())
}

/// Read `board.json`, normalized to `keys`.
///
/// A missing file gives an empty board. Malformed JSON and containers
/// outside `keys` are copied to the recovery log before being discarded.
/// A file that exists but cannot be read as text is an error, so that no
/// write command replaces it with an empty board.
pub fn read_state(board_dir: &Path, keys: &[String]) -> Result<ContainerMap, BoardError> {
    let path = board_dir.join(STATE_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(ContainerMap::new(keys.iter().cloned()));
        }
        Err(e) => {
            warn!("event=state_read_failed file={} error=\"{}\"", path.display(), e);
            return Err(BoardError::ReadError { path, source: e });
        }
    };

    let persisted: IndexMap<String, Vec<PlacedItem>> = match serde_json::from_str(&content) {
        Ok(p) => p,
        Err(e) => {
            warn!("event=state_unreadable file={} error=\"{}\"", path.display(), e);
            recovery::log_recovery(
                board_dir,
                RecoveryEntry::new(RecoveryCategory::Load, "unreadable board state replaced")
                    .field("Source", STATE_FILE)
                    .field("Error", e.to_string())
                    .body(content),
            );
            return Ok(ContainerMap::new(keys.iter().cloned()));
        }
    };

    let orphans: IndexMap<String, Vec<PlacedItem>> = persisted
        .iter()
        .filter(|(k, _)| !keys.contains(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let (map, dropped) = ContainerMap::from_persisted(keys, persisted);
    if !dropped.is_empty() {
        warn!("event=containers_dropped keys={}", dropped.join(","));
        let body = serde_json::to_string_pretty(&orphans).unwrap_or_default();
        recovery::log_recovery(
            board_dir,
            RecoveryEntry::new(RecoveryCategory::Load, "unknown containers dropped")
                .field("Source", STATE_FILE)
                .field("Containers", dropped.join(", "))
                .body(body),
        );
    }
    factory::observe_ids(
        map.iter()
            .flat_map(|(_, items)| items.iter().map(|i| i.placement_id.as_str())),
    );
    Ok(map)
}

/// Write `board.json` atomically. On failure the payload goes to the
/// recovery log and the error is returned.
pub fn save_state(board_dir: &Path, map: &ContainerMap) -> Result<(), BoardError> {
    let path = board_dir.join(STATE_FILE);
    let mut content = serde_json::to_string_pretty(map)?;
    content.push('\n');
    if let Err(e) = recovery::atomic_write(&path, content.as_bytes()) {
        recovery::log_recovery(
            board_dir,
            RecoveryEntry::new(RecoveryCategory::Write, "board write failed")
                .field("Target", STATE_FILE)
                .field("Error", e.to_string())
                .body(content),
        );
        return Err(BoardError::WriteError { path, source: e });
    }
    debug!("event=state_saved placements={}", map.len());
    Ok(())
}

/// Persists snapshots to `board.json` in a board directory
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(board_dir: impl Into<PathBuf>) -> Self {
        JsonStore {
            dir: board_dir.into(),
        }
    }
}

impl Persist for JsonStore {
    type Error = BoardError;

    fn persist(&mut self, map: &ContainerMap) -> Result<(), BoardError> {
        save_state(&self.dir, map)
    }
}
