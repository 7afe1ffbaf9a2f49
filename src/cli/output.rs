use serde::Serialize;

use crate::model::board::ContainerMap;
use crate::model::placement::PlacedItem;
use crate::model::template::Template;
use crate::ops::move_ops::MoveOutcome;
use crate::ops::resolve::{Location, Sentinels};
use crate::util::unicode::{display_width, fit_to_width, pad_to_width};

/// Cells reserved for a name column
const NAME_WIDTH: usize = 20;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct BoardJson<'a> {
    pub name: &'a str,
    pub layout: String,
    pub containers: Vec<ContainerJson<'a>>,
}

#[derive(Serialize)]
pub struct ContainerJson<'a> {
    pub key: &'a str,
    pub items: &'a [PlacedItem],
}

#[derive(Serialize)]
pub struct TemplateJson<'a> {
    pub id: &'a str,
    pub drag_id: String,
    pub name: &'a str,
    pub color: &'a str,
    pub placements: usize,
}

#[derive(Serialize)]
pub struct MoveJson {
    pub kind: &'static str,
    pub changed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

#[derive(Serialize)]
pub struct WhereJson<'a> {
    pub id: &'a str,
    /// `library`, `deletion`, `container`, or null when unresolved
    pub location: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn board_to_json<'a>(name: &'a str, layout: String, map: &'a ContainerMap) -> BoardJson<'a> {
    BoardJson {
        name,
        layout,
        containers: map
            .iter()
            .map(|(key, items)| ContainerJson { key, items })
            .collect(),
    }
}

pub fn template_to_json<'a>(
    template: &'a Template,
    sentinels: &Sentinels,
    map: &ContainerMap,
) -> TemplateJson<'a> {
    TemplateJson {
        id: &template.id,
        drag_id: template.drag_id(&sentinels.library_prefix),
        name: &template.name,
        color: &template.color,
        placements: map.count_template(&template.id),
    }
}

pub fn move_to_json(outcome: &MoveOutcome) -> MoveJson {
    let mut json = MoveJson {
        kind: outcome.kind(),
        changed: outcome.is_change(),
        message: outcome.to_string(),
        placement_id: None,
        from: None,
        to: None,
        index: None,
    };
    match outcome {
        MoveOutcome::Unchanged(_) => {}
        MoveOutcome::Reordered {
            container,
            placement_id,
            to,
            ..
        } => {
            json.placement_id = Some(placement_id.clone());
            json.from = Some(container.clone());
            json.to = Some(container.clone());
            json.index = Some(*to);
        }
        MoveOutcome::Transferred {
            placement_id,
            from,
            to,
            index,
        } => {
            json.placement_id = Some(placement_id.clone());
            json.from = Some(from.clone().unwrap_or_else(|| "library".to_string()));
            json.to = Some(to.clone());
            json.index = Some(*index);
        }
        MoveOutcome::Deleted {
            placement_id,
            container,
        } => {
            json.placement_id = Some(placement_id.clone());
            json.from = Some(container.clone());
        }
    }
    json
}

pub fn where_to_json<'a>(id: &'a str, location: Option<Location<'a>>) -> WhereJson<'a> {
    let (location, container) = match location {
        None => (None, None),
        Some(Location::Library) => (Some("library"), None),
        Some(Location::Deletion) => (Some("deletion"), None),
        Some(Location::Container(key)) => (Some("container"), Some(key)),
    };
    WhereJson {
        id,
        location,
        container,
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// Header plus one line per placement (and one per note)
pub fn format_container(key: &str, items: &[PlacedItem]) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", key, items.len())];
    if items.is_empty() {
        lines.push("  (empty)".to_string());
        return lines;
    }
    let id_width = items
        .iter()
        .map(|i| display_width(&i.placement_id))
        .max()
        .unwrap_or(0);
    for item in items {
        let line = format!(
            "  {}  {}  {}",
            pad_to_width(&item.placement_id, id_width),
            fit_to_width(&item.name, NAME_WIDTH),
            item.template_id
        );
        lines.push(line.trim_end().to_string());
        if let Some(notes) = &item.notes {
            lines.push(format!("  {}  note: {}", " ".repeat(id_width), notes));
        }
    }
    lines
}

pub fn format_board(name: &str, layout: &str, map: &ContainerMap) -> Vec<String> {
    let mut lines = vec![format!("{} [{}]", name, layout)];
    for (key, items) in map.iter() {
        lines.push(String::new());
        lines.extend(format_container(key, items));
    }
    lines
}

pub fn format_library(catalog: &[Template], sentinels: &Sentinels, map: &ContainerMap) -> Vec<String> {
    if catalog.is_empty() {
        return vec!["library is empty (add one with: pb template add NAME)".to_string()];
    }
    let drag_ids: Vec<String> = catalog
        .iter()
        .map(|t| t.drag_id(&sentinels.library_prefix))
        .collect();
    let id_width = drag_ids.iter().map(|d| display_width(d)).max().unwrap_or(0);
    catalog
        .iter()
        .zip(&drag_ids)
        .map(|(t, drag_id)| {
            format!(
                "{}  {}  {}  {} placed",
                pad_to_width(drag_id, id_width),
                fit_to_width(&t.name, NAME_WIDTH),
                t.color,
                map.count_template(&t.id)
            )
        })
        .collect()
}

pub fn format_where(id: &str, location: Option<Location<'_>>) -> String {
    match location {
        None => format!("{}: not on the board", id),
        Some(Location::Library) => format!("{}: library", id),
        Some(Location::Deletion) => format!("{}: deletion zone", id),
        Some(Location::Container(key)) if key == id => format!("{}: container", id),
        Some(Location::Container(key)) => format!("{}: in {}", id, key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(template_id: &str, name: &str, placement_id: &str) -> PlacedItem {
        PlacedItem {
            template_id: template_id.into(),
            name: name.into(),
            color: "#3b82f6".into(),
            placement_id: placement_id.into(),
            notes: None,
        }
    }

    fn board() -> ContainerMap {
        let mut map = ContainerMap::new(["Monday", "Tuesday"]);
        let monday = map.items_mut("Monday").unwrap();
        monday.push(item("math", "Matemática", "item-1"));
        monday.push(PlacedItem {
            notes: Some("chapter 4".into()),
            ..item("bio", "Biologia", "item-22")
        });
        map
    }

    #[test]
    fn board_text() {
        let text = format_board("Study week", "week", &board()).join("\n");
        insta::assert_snapshot!(text, @r"
        Study week [week]

        Monday (2)
          item-1   Matemática            math
          item-22  Biologia              bio
                   note: chapter 4

        Tuesday (0)
          (empty)
        ");
    }

    #[test]
    fn library_text() {
        let catalog = vec![
            Template::new("math", "Matemática", "#3b82f6"),
            Template::new("hist", "História da Arte Contemporânea", "#f97316"),
        ];
        let text = format_library(&catalog, &Sentinels::default(), &board()).join("\n");
        insta::assert_snapshot!(text, @r"
        lib-math  Matemática            #3b82f6  1 placed
        lib-hist  História da Arte Co…  #f97316  0 placed
        ");
    }

    #[test]
    fn where_text() {
        let map = board();
        assert_eq!(format_where("item-1", Some(Location::Container("Monday"))), "item-1: in Monday");
        assert_eq!(format_where("Monday", Some(Location::Container("Monday"))), "Monday: container");
        assert_eq!(format_where("lib-x", Some(Location::Library)), "lib-x: library");
        assert_eq!(format_where("nope", None), "nope: not on the board");
        assert!(map.has_key("Monday"));
    }

    #[test]
    fn move_json_for_library_transfer() {
        let outcome = MoveOutcome::Transferred {
            placement_id: "item-9".into(),
            from: None,
            to: "Tuesday".into(),
            index: 0,
        };
        let json = serde_json::to_value(move_to_json(&outcome)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "transfer",
                "changed": true,
                "message": "item-9 moved from library to Tuesday at #1",
                "placement_id": "item-9",
                "from": "library",
                "to": "Tuesday",
                "index": 0
            })
        );
    }

    #[test]
    fn board_json_keeps_persisted_field_names() {
        let map = board();
        let json = serde_json::to_value(board_to_json("Study week", "week".into(), &map)).unwrap();
        assert_eq!(json["containers"][0]["key"], "Monday");
        assert_eq!(json["containers"][0]["items"][1]["uniqueId"], "item-22");
        assert_eq!(json["containers"][1]["items"], serde_json::json!([]));
    }
}
