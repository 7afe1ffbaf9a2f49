use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::template::{DEFAULT_COLOR, Template};
use crate::ops::factory;

/// Error type for catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("template not found: {0}")]
    NotFound(String),
    #[error("template id already exists: {0}")]
    DuplicateId(String),
    #[error("invalid template id \"{0}\": ids must be non-empty and contain no whitespace")]
    InvalidId(String),
    #[error("template name must not be blank")]
    BlankName,
    #[error("invalid color \"{0}\": expected #rrggbb")]
    InvalidColor(String),
}

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("hex color pattern is valid"));

/// Fields for a new template
#[derive(Debug, Clone, Default)]
pub struct NewTemplate {
    pub name: String,
    pub color: Option<String>,
    pub id: Option<String>,
}

/// Field changes for an existing template. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Add a template to the end of the catalog. Returns the stored template.
pub fn add_template(catalog: &mut Vec<Template>, new: NewTemplate) -> Result<Template, CatalogError> {
    let name = normalize_name(&new.name)?;
    let color = match new.color {
        Some(c) => validate_color(&c)?,
        None => DEFAULT_COLOR.to_string(),
    };
    let id = match new.id {
        Some(id) => validate_id(&id)?,
        None => factory::next_template_id(),
    };
    if catalog.iter().any(|t| t.id == id) {
        return Err(CatalogError::DuplicateId(id));
    }

    let template = Template { id, name, color };
    catalog.push(template.clone());
    Ok(template)
}

/// Apply `patch` to the template `id`. Returns the updated template.
pub fn update_template(
    catalog: &mut [Template],
    id: &str,
    patch: TemplatePatch,
) -> Result<Template, CatalogError> {
    let name = patch.name.as_deref().map(normalize_name).transpose()?;
    let color = patch.color.as_deref().map(validate_color).transpose()?;

    let template = catalog
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
    if let Some(name) = name {
        template.name = name;
    }
    if let Some(color) = color {
        template.color = color;
    }
    Ok(template.clone())
}

/// Remove the template `id` from the catalog. Placements made from it are
/// left alone; the caller cascades with `remove_template_everywhere`.
pub fn remove_template(catalog: &mut Vec<Template>, id: &str) -> Result<Template, CatalogError> {
    let idx = catalog
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
    Ok(catalog.remove(idx))
}

/// Find a template by catalog id.
pub fn find_template<'a>(catalog: &'a [Template], id: &str) -> Option<&'a Template> {
    catalog.iter().find(|t| t.id == id)
}

fn normalize_name(name: &str) -> Result<String, CatalogError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::BlankName);
    }
    Ok(trimmed.to_string())
}

fn validate_color(color: &str) -> Result<String, CatalogError> {
    let trimmed = color.trim();
    if HEX_COLOR.is_match(trimmed) {
        Ok(trimmed.to_ascii_lowercase())
    } else {
        Err(CatalogError::InvalidColor(color.to_string()))
    }
}

fn validate_id(id: &str) -> Result<String, CatalogError> {
    if id.is_empty() || id.chars().any(char::is_whitespace) {
        return Err(CatalogError::InvalidId(id.to_string()));
    }
    Ok(id.to_string())
}
