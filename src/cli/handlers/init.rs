use std::fs;
use std::path::Path;

use log::info;

use crate::cli::commands::InitArgs;
use crate::io::board_io::{self, BOARD_DIR};
use crate::io::config_io::{self, CONFIG_FILE};
use crate::model::board::{ContainerMap, Layout};
use crate::model::config::BoardConfig;
use crate::model::template::Template;

const BOARD_TOML_TEMPLATE: &str = r##"[board]
name = {name}
layout = "{layout}"

[drag]
# Drag ids starting with this prefix come from the library
library_prefix = "lib-"
# Dropping a placement on this id deletes it
deletion_key = "delete-zone"

[log]
# off, error, warn, info, debug or trace (PLANBOARD_LOG and -v override)
level = "warn"

# --- Library ---
# Add templates with [[templates]] entries, or use: pb template add NAME
#
# [[templates]]
# id = "example"
# name = "Example"
# color = "#3b82f6"
"##;

/// Sample library for a fresh board
const STARTER_TEMPLATES: [(&str, &str, &str); 3] = [
    ("math", "Matemática", "#3b82f6"),
    ("bio", "Biologia", "#22c55e"),
    ("hist", "História", "#f97316"),
];

/// Infer a board name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + chars.as_str()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote `s` as a TOML basic string.
fn toml_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Build the board.toml document: the commented template, explicit
/// container keys if any, and the starter library unless disabled.
fn render_board_toml(
    name: &str,
    layout: Layout,
    containers: &[String],
    starter: bool,
) -> Result<toml_edit::DocumentMut, toml_edit::TomlError> {
    let mut doc: toml_edit::DocumentMut = BOARD_TOML_TEMPLATE
        .replace("{name}", &toml_string(name))
        .replace("{layout}", &layout.to_string())
        .parse()?;
    if !containers.is_empty() {
        config_io::set_containers(&mut doc, containers);
    }
    if starter {
        for (id, tname, color) in STARTER_TEMPLATES {
            config_io::add_template_to_config(&mut doc, &Template::new(id, tname, color));
        }
    }
    Ok(doc)
}

pub fn cmd_init(args: InitArgs, root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let board_dir = root.join(BOARD_DIR);
    if board_dir.join(CONFIG_FILE).exists() {
        return Err(format!("board already exists in {}", board_dir.display()).into());
    }

    if let Some(parent) = root.parent()
        && let Ok(parent_root) = board_io::discover_board(parent)
    {
        eprintln!(
            "Note: parent board found at {}/",
            parent_root.join(BOARD_DIR).display()
        );
    }

    let layout = Layout::parse(&args.layout).ok_or_else(|| {
        format!(
            "unknown layout \"{}\" (expected week, kanban or custom)",
            args.layout
        )
    })?;
    if layout == Layout::Custom && args.containers.is_empty() {
        return Err("the custom layout needs at least one --container".into());
    }

    let name = args.name.unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Untitled".to_string())
    });

    let doc = render_board_toml(&name, layout, &args.containers, !args.no_starter)?;
    let config: BoardConfig = toml::from_str(&doc.to_string())?;
    board_io::validate_config(&config)?;

    fs::create_dir_all(&board_dir)?;
    config_io::write_config(&board_dir, &doc)?;

    let keys = config.container_keys();
    board_io::save_state(&board_dir, &ContainerMap::new(keys.iter().cloned()))?;
    info!(
        "event=board_init dir={} layout={} containers={}",
        board_dir.display(),
        layout,
        keys.len()
    );

    println!("Initialized board: {} [{}]", name, layout);
    println!("  containers: {}", keys.join(", "));
    if !args.no_starter {
        let ids: Vec<&str> = STARTER_TEMPLATES.iter().map(|(id, _, _)| *id).collect();
        println!("  library: {}", ids.join(", "));
    }
    Ok(())
}
