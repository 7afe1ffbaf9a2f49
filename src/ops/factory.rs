use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use crate::model::placement::PlacedItem;
use crate::model::template::Template;

/// Prefix of every placement id
pub const PLACEMENT_PREFIX: &str = "item-";
/// Prefix of generated catalog ids
pub const TEMPLATE_PREFIX: &str = "subject-";

/// Last stamp handed out or seen on disk (milliseconds since the epoch)
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Next placement stamp: the current time in milliseconds, bumped past the
/// previous stamp when the clock has not advanced. Strictly increasing for
/// the life of the process.
fn next_stamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(seen) => last = seen,
        }
    }
}

/// Raise the stamp floor past any generated id in `ids`.
///
/// Each `pb` command is a fresh process, so the floor is seeded from the
/// ids already stored on the board. New ids then stay unique even when the
/// clock has moved backwards since they were written.
pub fn observe_ids<'a>(ids: impl IntoIterator<Item = &'a str>) {
    let highest = ids
        .into_iter()
        .filter_map(|id| {
            id.strip_prefix(PLACEMENT_PREFIX)
                .or_else(|| id.strip_prefix(TEMPLATE_PREFIX))
        })
        .filter_map(|n| n.parse::<i64>().ok())
        .max();
    if let Some(highest) = highest {
        LAST_STAMP.fetch_max(highest, Ordering::AcqRel);
    }
}

/// A fresh placement id. Never equal to a previously issued or observed
/// one, and never a catalog id.
pub fn next_placement_id() -> String {
    format!("{}{}", PLACEMENT_PREFIX, next_stamp())
}

/// A fresh catalog id for a template created without one
pub fn next_template_id() -> String {
    format!("{}{}", TEMPLATE_PREFIX, next_stamp())
}

/// Materialize a new placement from `template`, copying its visible fields.
pub fn materialize(template: &Template) -> PlacedItem {
    PlacedItem::from_template(template, next_placement_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn materialize_copies_fields_but_not_identity() {
        let t = Template::new("math", "Matemática", "#3b82f6");
        let item = materialize(&t);
        assert_eq!(item.template_id, "math");
        assert_eq!(item.name, "Matemática");
        assert_eq!(item.color, "#3b82f6");
        assert_ne!(item.placement_id, t.id);
        assert!(item.placement_id.starts_with("item-"));
        assert!(item.notes.is_none());
    }

    #[test]
    fn rapid_materializations_never_collide() {
        let t = Template::new("math", "Matemática", "#3b82f6");
        let ids: HashSet<String> = (0..2000).map(|_| materialize(&t).placement_id).collect();
        assert_eq!(ids.len(), 2000);
    }

    #[test]
    fn ids_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..500).map(|_| next_placement_id()).collect::<Vec<_>>()))
            .collect();
        let mut all = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(all.insert(id));
            }
        }
        assert_eq!(all.len(), 2000);
    }

    #[test]
    fn observed_ids_raise_the_floor() {
        let ahead = Utc::now().timestamp_millis() + 600_000;
        observe_ids([
            "item-12".to_string(),
            format!("subject-{}", ahead),
            "math".to_string(),
            "item-not-a-number".to_string(),
        ]
        .iter()
        .map(String::as_str));
        let stamp: i64 = next_placement_id()
            .trim_start_matches(PLACEMENT_PREFIX)
            .parse()
            .unwrap();
        assert!(stamp > ahead);
    }

    #[test]
    fn template_ids_use_their_own_prefix() {
        assert!(next_template_id().starts_with("subject-"));
    }
}
