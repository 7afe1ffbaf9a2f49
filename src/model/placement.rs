use serde::{Deserialize, Serialize};

use super::template::Template;

/// A template placed into a container at a specific position.
///
/// The template's visible attributes are copied at placement time. The
/// `template_id` backlink lets catalog edits and removals find every copy,
/// while `placement_id` addresses this one instance for reorder and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedItem {
    /// Catalog id of the originating template
    #[serde(rename = "id")]
    pub template_id: String,
    pub name: String,
    pub color: String,
    /// Unique per placement, disjoint from catalog ids
    #[serde(rename = "uniqueId")]
    pub placement_id: String,
    /// Free-text notes attached to this placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PlacedItem {
    /// Build a placement of `template` under the given placement id
    pub fn from_template(template: &Template, placement_id: String) -> Self {
        PlacedItem {
            template_id: template.id.clone(),
            name: template.name.clone(),
            color: template.color.clone(),
            placement_id,
            notes: None,
        }
    }

    /// Whether this placement was made from the given template
    pub fn is_from(&self, template_id: &str) -> bool {
        self.template_id == template_id
    }
}
