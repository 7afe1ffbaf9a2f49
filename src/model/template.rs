use serde::{Deserialize, Serialize};

/// Color given to templates created without one
pub const DEFAULT_COLOR: &str = "#3b82f6";

/// A reusable catalog entry (a subject in the planner, a task kind on a
/// kanban board). Owned by the library, never by a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Stable catalog-scoped identifier
    pub id: String,
    pub name: String,
    /// `#rrggbb` hex color
    pub color: String,
}

impl Template {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Template {
            id: id.into(),
            name: name.into(),
            color: color.into(),
        }
    }

    /// The id this template carries while being dragged out of the library
    pub fn drag_id(&self, library_prefix: &str) -> String {
        format!("{}{}", library_prefix, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_id_prepends_library_prefix() {
        let t = Template::new("math", "Matemática", "#3b82f6");
        assert_eq!(t.drag_id("lib-"), "lib-math");
    }
}
