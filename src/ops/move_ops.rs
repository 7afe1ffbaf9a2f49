use crate::model::board::ContainerMap;
use crate::model::placement::PlacedItem;
use crate::model::template::Template;
use crate::ops::factory;
use crate::ops::resolve::{Location, Sentinels, resolve};

/// What a drag session picked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSource {
    /// A template pulled out of the library. Dropping it materializes a new
    /// placement.
    Library(Template),
    /// An existing placement, by id
    Placed { placement_id: String },
}

impl DragSource {
    pub fn placed(placement_id: impl Into<String>) -> Self {
        DragSource::Placed {
            placement_id: placement_id.into(),
        }
    }

    /// The id the drag reports for this source
    pub fn drag_id(&self, sentinels: &Sentinels) -> String {
        match self {
            DragSource::Library(template) => template.drag_id(&sentinels.library_prefix),
            DragSource::Placed { placement_id } => placement_id.clone(),
        }
    }

    pub fn is_from_library(&self) -> bool {
        matches!(self, DragSource::Library(_))
    }
}

/// Why a move left the board as it was
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoopReason {
    /// No drop target, or one that resolves to nothing
    NoTarget,
    /// The dragged id is not on the board
    UnresolvedSource,
    /// Dropped onto itself
    SameTarget,
    /// Library templates are not deleted by dropping
    LibraryDelete,
    /// The library is not a drop destination
    LibraryTarget,
    /// Dropped onto its own container rather than onto a placement
    SameContainer,
}

impl std::fmt::Display for NoopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoopReason::NoTarget => write!(f, "no drop target"),
            NoopReason::UnresolvedSource => write!(f, "dragged item is not on the board"),
            NoopReason::SameTarget => write!(f, "dropped onto itself"),
            NoopReason::LibraryDelete => write!(f, "library templates cannot be deleted by dropping"),
            NoopReason::LibraryTarget => write!(f, "the library is not a drop target"),
            NoopReason::SameContainer => write!(f, "already in that container"),
        }
    }
}

/// The rule a move applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Unchanged(NoopReason),
    /// Moved within one container
    Reordered {
        container: String,
        placement_id: String,
        from: usize,
        to: usize,
    },
    /// Moved into another container. `from` is `None` for a placement
    /// materialized out of the library.
    Transferred {
        placement_id: String,
        from: Option<String>,
        to: String,
        index: usize,
    },
    Deleted {
        placement_id: String,
        container: String,
    },
}

impl MoveOutcome {
    pub fn is_change(&self) -> bool {
        !matches!(self, MoveOutcome::Unchanged(_))
    }

    /// Short label for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            MoveOutcome::Unchanged(_) => "noop",
            MoveOutcome::Reordered { .. } => "reorder",
            MoveOutcome::Transferred { .. } => "transfer",
            MoveOutcome::Deleted { .. } => "delete",
        }
    }
}

impl std::fmt::Display for MoveOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveOutcome::Unchanged(reason) => write!(f, "unchanged: {}", reason),
            MoveOutcome::Reordered {
                container,
                placement_id,
                from,
                to,
            } => write!(f, "{} moved in {} from #{} to #{}", placement_id, container, from + 1, to + 1),
            MoveOutcome::Transferred {
                placement_id,
                from,
                to,
                index,
            } => write!(
                f,
                "{} moved from {} to {} at #{}",
                placement_id,
                from.as_deref().unwrap_or("library"),
                to,
                index + 1
            ),
            MoveOutcome::Deleted {
                placement_id,
                container,
            } => write!(f, "{} deleted from {}", placement_id, container),
        }
    }
}

// ---------------------------------------------------------------------------
// Drag release
// ---------------------------------------------------------------------------

/// Board after releasing `source` over `drop_target`.
pub fn apply_move(
    map: &ContainerMap,
    source: &DragSource,
    drop_target: Option<&str>,
    sentinels: &Sentinels,
) -> ContainerMap {
    apply_move_detailed(map, source, drop_target, sentinels).0
}

/// Board after releasing `source` over `drop_target`, plus the rule applied.
///
/// Rules, first match wins:
/// 1. no target, unresolvable target, or a drop onto itself: unchanged
/// 2. deletion zone: the placement is removed (library templates: unchanged)
/// 3. same container: the placement moves to the target's index
/// 4. other container: the placement (or a fresh one, for a library
///    template) is inserted before the target placement, or appended when
///    dropped on the container itself
///
/// Anything stale or inconsistent leaves the board unchanged. The returned
/// map never shares storage with `map`.
pub fn apply_move_detailed(
    map: &ContainerMap,
    source: &DragSource,
    drop_target: Option<&str>,
    sentinels: &Sentinels,
) -> (ContainerMap, MoveOutcome) {
    let unchanged = |reason| (map.clone(), MoveOutcome::Unchanged(reason));

    let Some(target_id) = drop_target else {
        return unchanged(NoopReason::NoTarget);
    };
    let Some(target) = resolve(target_id, map, sentinels) else {
        return unchanged(NoopReason::NoTarget);
    };
    let source_id = source.drag_id(sentinels);
    if source_id == target_id {
        return unchanged(NoopReason::SameTarget);
    }

    if target == Location::Deletion {
        return match source {
            DragSource::Library(_) => unchanged(NoopReason::LibraryDelete),
            DragSource::Placed { placement_id } => {
                let mut next = map.clone();
                match take_placement(&mut next, placement_id) {
                    Some((container, _, _)) => (
                        next,
                        MoveOutcome::Deleted {
                            placement_id: placement_id.clone(),
                            container,
                        },
                    ),
                    None => unchanged(NoopReason::UnresolvedSource),
                }
            }
        };
    }

    let Location::Container(target_key) = target else {
        return unchanged(NoopReason::LibraryTarget);
    };

    let source_key = match (source, resolve(&source_id, map, sentinels)) {
        (DragSource::Library(_), Some(Location::Library)) => None,
        (DragSource::Placed { .. }, Some(Location::Container(key))) => Some(key),
        _ => return unchanged(NoopReason::UnresolvedSource),
    };

    if source_key == Some(target_key) {
        let items = map.items(target_key);
        let Some(from) = items.iter().position(|i| i.placement_id == source_id) else {
            return unchanged(NoopReason::UnresolvedSource);
        };
        let Some(to) = items.iter().position(|i| i.placement_id == target_id) else {
            return unchanged(NoopReason::SameContainer);
        };
        let mut next = map.clone();
        if let Some(items) = next.items_mut(target_key) {
            let item = items.remove(from);
            items.insert(to, item);
        }
        return (
            next,
            MoveOutcome::Reordered {
                container: target_key.to_string(),
                placement_id: source_id,
                from,
                to,
            },
        );
    }

    let mut next = map.clone();
    let item = match (source, source_key) {
        (DragSource::Library(template), _) => factory::materialize(template),
        (DragSource::Placed { placement_id }, Some(key)) => {
            let Some(items) = next.items_mut(key) else {
                return unchanged(NoopReason::UnresolvedSource);
            };
            let Some(idx) = items.iter().position(|i| &i.placement_id == placement_id) else {
                return unchanged(NoopReason::UnresolvedSource);
            };
            items.remove(idx)
        }
        (DragSource::Placed { .. }, None) => return unchanged(NoopReason::UnresolvedSource),
    };

    let placement_id = item.placement_id.clone();
    let Some(dest) = next.items_mut(target_key) else {
        return unchanged(NoopReason::NoTarget);
    };
    let index = dest
        .iter()
        .position(|i| i.placement_id == target_id)
        .unwrap_or(dest.len());
    dest.insert(index, item);

    (
        next,
        MoveOutcome::Transferred {
            placement_id,
            from: source_key.map(|k| k.to_string()),
            to: target_key.to_string(),
            index,
        },
    )
}

// ---------------------------------------------------------------------------
// Board maintenance
// ---------------------------------------------------------------------------

/// Board without any placement made from `template_id`. Call after the
/// template leaves the catalog.
pub fn remove_template_everywhere(map: &ContainerMap, template_id: &str) -> ContainerMap {
    let mut next = map.clone();
    for items in next.all_items_mut() {
        items.retain(|i| !i.is_from(template_id));
    }
    next
}

/// Board with every placement of `template` showing its current name and
/// color. Placement ids, order and notes are kept.
pub fn update_template_everywhere(map: &ContainerMap, template: &Template) -> ContainerMap {
    let mut next = map.clone();
    for item in next.all_items_mut().flatten() {
        if item.is_from(&template.id) {
            item.name = template.name.clone();
            item.color = template.color.clone();
        }
    }
    next
}

/// Board with the notes of `placement_id` replaced. Blank text clears them.
pub fn set_notes(map: &ContainerMap, placement_id: &str, notes: &str) -> ContainerMap {
    let trimmed = notes.trim();
    let mut next = map.clone();
    for item in next.all_items_mut().flatten() {
        if item.placement_id == placement_id {
            item.notes = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }
    }
    next
}

/// Board with every container emptied. The key set is kept.
pub fn clear(map: &ContainerMap) -> ContainerMap {
    ContainerMap::new(map.keys().map(str::to_string))
}

/// Remove the first placement with `placement_id`, returning its container
/// key, index and value.
fn take_placement(map: &mut ContainerMap, placement_id: &str) -> Option<(String, usize, PlacedItem)> {
    let (key, idx) = map
        .locate(placement_id)
        .map(|(key, idx)| (key.to_string(), idx))?;
    let item = map.items_mut(&key)?.remove(idx);
    Some((key, idx, item))
}
