use std::fs;
use std::path::Path;

use crate::io::board_io::BoardError;
use crate::io::recovery::atomic_write;
use crate::model::config::BoardConfig;
use crate::model::template::Template;

pub const CONFIG_FILE: &str = "board.toml";

/// Read the board config, returning both the parsed config and the raw
/// toml_edit document for format-preserving edits.
pub fn read_config(board_dir: &Path) -> Result<(BoardConfig, toml_edit::DocumentMut), BoardError> {
    let config_path = board_dir.join(CONFIG_FILE);
    let config_text = fs::read_to_string(&config_path).map_err(|e| BoardError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: BoardConfig = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(board_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), BoardError> {
    let config_path = board_dir.join(CONFIG_FILE);
    atomic_write(&config_path, doc.to_string().as_bytes()).map_err(|e| BoardError::WriteError {
        path: config_path,
        source: e,
    })
}

/// Set the explicit container keys of the board
pub fn set_containers(doc: &mut toml_edit::DocumentMut, keys: &[String]) {
    if !doc.contains_key("board") {
        doc["board"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    let mut array = toml_edit::Array::new();
    for key in keys {
        array.push(key.as_str());
    }
    doc["board"]["containers"] = toml_edit::value(array);
}

/// Append a template to the `[[templates]]` list
pub fn add_template_to_config(doc: &mut toml_edit::DocumentMut, template: &Template) {
    if !doc.contains_key("templates") {
        doc["templates"] = toml_edit::Item::ArrayOfTables(toml_edit::ArrayOfTables::new());
    }

    if let Some(templates) = doc["templates"].as_array_of_tables_mut() {
        let mut table = toml_edit::Table::new();
        table["id"] = toml_edit::value(&template.id);
        table["name"] = toml_edit::value(&template.name);
        table["color"] = toml_edit::value(&template.color);
        templates.push(table);
    }
}

/// Rewrite the name and color of the template with the same id.
/// Returns false if it is not in the document.
pub fn update_template_in_config(doc: &mut toml_edit::DocumentMut, template: &Template) -> bool {
    let Some(templates) = doc
        .get_mut("templates")
        .and_then(|t| t.as_array_of_tables_mut())
    else {
        return false;
    };
    for table in templates.iter_mut() {
        if table.get("id").and_then(|v| v.as_str()) == Some(template.id.as_str()) {
            table["name"] = toml_edit::value(&template.name);
            table["color"] = toml_edit::value(&template.color);
            return true;
        }
    }
    false
}

/// Remove the template `id`. Returns false if it is not in the document.
pub fn remove_template_from_config(doc: &mut toml_edit::DocumentMut, id: &str) -> bool {
    let Some(templates) = doc
        .get_mut("templates")
        .and_then(|t| t.as_array_of_tables_mut())
    else {
        return false;
    };
    let before = templates.len();
    templates.retain(|table| table.get("id").and_then(|v| v.as_str()) != Some(id));
    templates.len() != before
}
