//! Drag-session coordinator.
//!
//! Owns the current board snapshot and the template catalog, turns
//! drag-start/drag-end events into Move Engine calls, and hands every new
//! snapshot to a [`Persist`] implementation. A failed hand-off is logged and
//! remembered but never rolls the in-memory board back.

use log::{debug, info, warn};

use crate::model::board::ContainerMap;
use crate::model::template::Template;
use crate::ops::catalog_ops::{self, CatalogError, NewTemplate, TemplatePatch};
use crate::ops::move_ops::{self, DragSource, MoveOutcome, NoopReason};
use crate::ops::resolve::{Location, Sentinels, resolve};

/// Destination for board snapshots
pub trait Persist {
    type Error: std::fmt::Display;

    fn persist(&mut self, map: &ContainerMap) -> Result<(), Self::Error>;
}

/// Keeps snapshots in memory; for callers that persist elsewhere, and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub snapshots: Vec<ContainerMap>,
}

impl Persist for MemoryStore {
    type Error = std::convert::Infallible;

    fn persist(&mut self, map: &ContainerMap) -> Result<(), Self::Error> {
        self.snapshots.push(map.clone());
        Ok(())
    }
}

pub struct BoardSession<P: Persist> {
    map: ContainerMap,
    catalog: Vec<Template>,
    sentinels: Sentinels,
    active: Option<DragSource>,
    store: P,
    persist_error: Option<String>,
}

impl<P: Persist> BoardSession<P> {
    pub fn new(map: ContainerMap, catalog: Vec<Template>, sentinels: Sentinels, store: P) -> Self {
        BoardSession {
            map,
            catalog,
            sentinels,
            active: None,
            store,
            persist_error: None,
        }
    }

    pub fn map(&self) -> &ContainerMap {
        &self.map
    }

    pub fn catalog(&self) -> &[Template] {
        &self.catalog
    }

    pub fn sentinels(&self) -> &Sentinels {
        &self.sentinels
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    /// The source picked up by the last `drag_start`, if still held
    pub fn active(&self) -> Option<&DragSource> {
        self.active.as_ref()
    }

    /// The most recent persistence failure, cleared on read
    pub fn take_persist_error(&mut self) -> Option<String> {
        self.persist_error.take()
    }

    /// Where `id` lives on the current board
    pub fn locate(&self, id: &str) -> Option<Location<'_>> {
        resolve(id, &self.map, &self.sentinels)
    }

    /// Build the drag payload for a raw drag id: a library template for a
    /// prefixed catalog id, a placement for a placement id.
    pub fn source_for(&self, id: &str) -> Option<DragSource> {
        match self.locate(id)? {
            Location::Library => {
                let template_id = self.sentinels.template_id(id)?;
                catalog_ops::find_template(&self.catalog, template_id)
                    .cloned()
                    .map(DragSource::Library)
            }
            Location::Container(_) if self.map.locate(id).is_some() => {
                Some(DragSource::placed(id))
            }
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Drag events
    // -----------------------------------------------------------------------

    /// Pick up `source`. Replaces any drag still in progress.
    pub fn drag_start(&mut self, source: DragSource) {
        debug!(
            "event=drag_start source={} from_library={}",
            source.drag_id(&self.sentinels),
            source.is_from_library()
        );
        self.active = Some(source);
    }

    /// Release the held source over `drop_target` (`None`: released over
    /// nothing). An end event for a source that is not held is ignored.
    pub fn drag_end(&mut self, source_id: &str, drop_target: Option<&str>) -> MoveOutcome {
        let Some(source) = self.active.take() else {
            debug!("event=drag_end status=ignored reason=no_active_drag source={}", source_id);
            return MoveOutcome::Unchanged(NoopReason::UnresolvedSource);
        };
        if source.drag_id(&self.sentinels) != source_id {
            debug!("event=drag_end status=ignored reason=source_mismatch source={}", source_id);
            return MoveOutcome::Unchanged(NoopReason::UnresolvedSource);
        }

        let (next, outcome) =
            move_ops::apply_move_detailed(&self.map, &source, drop_target, &self.sentinels);
        if outcome.is_change() {
            info!(
                "event=move_applied kind={} source={} target={}",
                outcome.kind(),
                source_id,
                drop_target.unwrap_or("-")
            );
            self.commit(next);
        } else {
            debug!(
                "event=move_skipped source={} target={} outcome=\"{}\"",
                source_id,
                drop_target.unwrap_or("-"),
                outcome
            );
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Catalog and board maintenance
    // -----------------------------------------------------------------------

    pub fn add_template(&mut self, new: NewTemplate) -> Result<Template, CatalogError> {
        let template = catalog_ops::add_template(&mut self.catalog, new)?;
        info!("event=template_added id={}", template.id);
        Ok(template)
    }

    /// Edit a template and refresh every placement made from it.
    pub fn update_template(&mut self, id: &str, patch: TemplatePatch) -> Result<Template, CatalogError> {
        let template = catalog_ops::update_template(&mut self.catalog, id, patch)?;
        let placements = self.map.count_template(id);
        info!("event=template_updated id={} placements={}", id, placements);
        if placements > 0 {
            let next = move_ops::update_template_everywhere(&self.map, &template);
            self.commit(next);
        }
        Ok(template)
    }

    /// Remove a template and every placement made from it.
    pub fn remove_template(&mut self, id: &str) -> Result<Template, CatalogError> {
        let template = catalog_ops::remove_template(&mut self.catalog, id)?;
        let placements = self.map.count_template(id);
        info!("event=template_removed id={} placements={}", id, placements);
        if placements > 0 {
            let next = move_ops::remove_template_everywhere(&self.map, id);
            self.commit(next);
        }
        if matches!(&self.active, Some(DragSource::Library(t)) if t.id == id) {
            self.active = None;
        }
        Ok(template)
    }

    /// Replace the notes on one placement. Returns false if it is not on
    /// the board.
    pub fn set_notes(&mut self, placement_id: &str, notes: &str) -> bool {
        if self.map.find(placement_id).is_none() {
            debug!("event=notes_skipped reason=not_found placement={}", placement_id);
            return false;
        }
        let next = move_ops::set_notes(&self.map, placement_id, notes);
        self.commit(next);
        true
    }

    /// Empty every container.
    pub fn clear(&mut self) {
        info!("event=board_cleared placements={}", self.map.len());
        let next = move_ops::clear(&self.map);
        self.active = None;
        self.commit(next);
    }

    /// Install `next` as the current board, then hand it to the store.
    fn commit(&mut self, next: ContainerMap) {
        self.map = next;
        if let Err(e) = self.store.persist(&self.map) {
            warn!("event=persist_failed error=\"{}\"", e);
            self.persist_error = Some(e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::placement::PlacedItem;

    struct FailingStore;

    impl Persist for FailingStore {
        type Error = String;

        fn persist(&mut self, _map: &ContainerMap) -> Result<(), String> {
            Err("disk full".to_string())
        }
    }

    fn catalog() -> Vec<Template> {
        vec![
            Template::new("math", "Matemática", "#3b82f6"),
            Template::new("bio", "Biologia", "#22c55e"),
        ]
    }

    fn session() -> BoardSession<MemoryStore> {
        BoardSession::new(
            ContainerMap::new(["Monday", "Tuesday"]),
            catalog(),
            Sentinels::default(),
            MemoryStore::default(),
        )
    }

    fn release(session: &mut BoardSession<impl Persist>, source: &str, target: Option<&str>) -> MoveOutcome {
        let payload = session.source_for(source).expect("source is on the board");
        session.drag_start(payload);
        session.drag_end(source, target)
    }

    fn first_placement(session: &BoardSession<impl Persist>, key: &str) -> PlacedItem {
        session.map().items(key)[0].clone()
    }

    #[test]
    fn library_drop_persists_snapshot() {
        let mut s = session();
        let outcome = release(&mut s, "lib-math", Some("Monday"));
        assert!(outcome.is_change());
        assert_eq!(s.map().items("Monday").len(), 1);
        assert_eq!(s.store().snapshots.len(), 1);
        assert_eq!(&s.store().snapshots[0], s.map());
        assert!(s.active().is_none());
    }

    #[test]
    fn noop_drop_does_not_persist() {
        let mut s = session();
        let outcome = release(&mut s, "lib-math", Some("delete-zone"));
        assert_eq!(outcome, MoveOutcome::Unchanged(NoopReason::LibraryDelete));
        assert!(s.store().snapshots.is_empty());
    }

    #[test]
    fn end_without_start_is_ignored() {
        let mut s = session();
        let outcome = s.drag_end("lib-math", Some("Monday"));
        assert_eq!(outcome, MoveOutcome::Unchanged(NoopReason::UnresolvedSource));
        assert!(s.map().is_empty());
    }

    #[test]
    fn mismatched_end_is_ignored() {
        let mut s = session();
        s.drag_start(DragSource::Library(catalog()[0].clone()));
        let outcome = s.drag_end("lib-bio", Some("Monday"));
        assert!(!outcome.is_change());
        assert!(s.map().is_empty());
    }

    #[test]
    fn source_for_unknown_ids() {
        let s = session();
        assert!(s.source_for("lib-chem").is_none());
        assert!(s.source_for("Monday").is_none());
        assert!(s.source_for("item-1").is_none());
        assert!(s.source_for("delete-zone").is_none());
    }

    #[test]
    fn update_template_cascades_to_placements() {
        let mut s = session();
        release(&mut s, "lib-math", Some("Monday"));
        s.update_template(
            "math",
            TemplatePatch {
                name: Some("Álgebra".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(first_placement(&s, "Monday").name, "Álgebra");
        assert_eq!(s.store().snapshots.len(), 2);
    }

    #[test]
    fn remove_template_cascades_to_placements() {
        let mut s = session();
        release(&mut s, "lib-math", Some("Monday"));
        release(&mut s, "lib-bio", Some("Tuesday"));
        release(&mut s, "lib-math", Some("Tuesday"));

        s.remove_template("math").unwrap();
        assert_eq!(s.map().len(), 1);
        assert_eq!(first_placement(&s, "Tuesday").template_id, "bio");
        assert_eq!(s.catalog().len(), 1);
    }

    #[test]
    fn notes_and_clear() {
        let mut s = session();
        release(&mut s, "lib-bio", Some("Tuesday"));
        let id = first_placement(&s, "Tuesday").placement_id;
        assert!(s.set_notes(&id, "lab report"));
        assert_eq!(first_placement(&s, "Tuesday").notes.as_deref(), Some("lab report"));
        assert!(!s.set_notes("item-0", "nothing"));

        s.clear();
        assert!(s.map().is_empty());
        assert_eq!(s.map().keys().count(), 2);
    }

    #[test]
    fn persist_failure_keeps_in_memory_board() {
        let mut s = BoardSession::new(
            ContainerMap::new(["Monday"]),
            catalog(),
            Sentinels::default(),
            FailingStore,
        );
        let outcome = release(&mut s, "lib-math", Some("Monday"));
        assert!(outcome.is_change());
        assert_eq!(s.map().items("Monday").len(), 1);
        assert_eq!(s.take_persist_error().as_deref(), Some("disk full"));
        assert!(s.take_persist_error().is_none());
    }
}
