mod init;
pub use init::cmd_init;

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};

use log::debug;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::board_io::{self, Board, BoardError, JsonStore};
use crate::io::config_io;
use crate::io::lock::BoardLock;
use crate::logging;
use crate::ops::catalog_ops::{self, CatalogError, NewTemplate, TemplatePatch};
use crate::ops::resolve::resolve;
use crate::ops::session::BoardSession;

/// Global override for the board directory (set by -C flag)
static BOARD_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Count of -v flags, consulted once the board config is known
static VERBOSITY: AtomicU8 = AtomicU8::new(0);

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    VERBOSITY.store(cli.verbose, Ordering::Relaxed);

    if let Some(ref dir) = cli.board_dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        set_board_dir_override(abs);
    }

    match cli.command {
        Commands::Init(args) => {
            start_logging(None);
            cmd_init(args, &start_dir()?)
        }

        // Read commands
        Commands::Show(args) => cmd_show(args, json),
        Commands::Library => cmd_library(json),
        Commands::Where(args) => cmd_where(args, json),

        // Write commands
        Commands::Template(cmd) => match cmd.action {
            TemplateAction::Add(args) => cmd_template_add(args, json),
            TemplateAction::Edit(args) => cmd_template_edit(args, json),
            TemplateAction::Rm(args) => cmd_template_rm(args),
        },
        Commands::Drop(args) => cmd_drop(args, json),
        Commands::Note(args) => cmd_note(args),
        Commands::Clear(args) => cmd_clear(args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn set_board_dir_override(dir: PathBuf) {
    let mut guard = BOARD_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.replace(dir);
}

fn start_dir() -> Result<PathBuf, BoardError> {
    let guard = BOARD_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    match guard.as_ref() {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().map_err(BoardError::IoError),
    }
}

fn start_logging(config_level: Option<&str>) {
    let env = std::env::var(logging::LOG_ENV).ok();
    let level = logging::resolve_level(
        VERBOSITY.load(Ordering::Relaxed),
        env.as_deref(),
        config_level,
    );
    if let Err(e) = logging::init_logging(level) {
        eprintln!("warning: {}", e);
    }
}

/// Load the board for a read-only command.
fn load_board_cwd() -> Result<Board, BoardError> {
    let root = board_io::discover_board(&start_dir()?)?;
    let board = board_io::load_board(&root)?;
    start_logging(Some(&board.config.log.level));
    Ok(board)
}

/// Lock the board directory, then load it, so the load-modify-save cycle
/// of a write command sees no interleaved writer.
fn load_board_locked(command: &str) -> Result<(Board, BoardLock), Box<dyn std::error::Error>> {
    let root = board_io::discover_board(&start_dir()?)?;
    let lock = BoardLock::acquire_default(&root.join(board_io::BOARD_DIR), command)?;
    let board = board_io::load_board(&root)?;
    start_logging(Some(&board.config.log.level));
    Ok((board, lock))
}

fn open_session(board: &Board) -> BoardSession<JsonStore> {
    BoardSession::new(
        board.map.clone(),
        board.config.templates.clone(),
        board.sentinels(),
        JsonStore::new(&board.dir),
    )
}

/// Turn a remembered persistence failure into a command error.
fn check_saved(session: &mut BoardSession<JsonStore>) -> Result<(), Box<dyn std::error::Error>> {
    match session.take_persist_error() {
        Some(e) => Err(format!(
            "board changed but was not saved: {} (payload kept in {}/recovery.log)",
            e,
            board_io::BOARD_DIR
        )
        .into()),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_show(args: ShowArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let board = load_board_cwd()?;
    let layout = board.config.board.layout.to_string();

    match args.container {
        Some(key) => {
            if !board.map.has_key(&key) {
                return Err(format!(
                    "unknown container \"{}\" (containers: {})",
                    key,
                    board.map.keys().collect::<Vec<_>>().join(", ")
                )
                .into());
            }
            let items = board.map.items(&key);
            if json {
                let output = ContainerJson { key: &key, items };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                for line in format_container(&key, items) {
                    println!("{}", line);
                }
            }
        }
        None => {
            if json {
                let output = board_to_json(&board.config.board.name, layout, &board.map);
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                for line in format_board(&board.config.board.name, &layout, &board.map) {
                    println!("{}", line);
                }
            }
        }
    }
    Ok(())
}

fn cmd_library(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let board = load_board_cwd()?;
    let sentinels = board.sentinels();
    let templates = &board.config.templates;

    if json {
        let output: Vec<TemplateJson> = templates
            .iter()
            .map(|t| template_to_json(t, &sentinels, &board.map))
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in format_library(templates, &sentinels, &board.map) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_where(args: WhereArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let board = load_board_cwd()?;
    let sentinels = board.sentinels();
    let location = resolve(&args.id, &board.map, &sentinels);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&where_to_json(&args.id, location))?
        );
    } else {
        println!("{}", format_where(&args.id, location));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Template commands
// ---------------------------------------------------------------------------

fn cmd_template_add(args: TemplateAddArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (mut board, _lock) = load_board_locked("template add")?;
    let mut session = open_session(&board);

    let template = session.add_template(NewTemplate {
        name: args.name,
        color: args.color,
        id: args.id,
    })?;
    config_io::add_template_to_config(&mut board.doc, &template);
    config_io::write_config(&board.dir, &board.doc)?;

    if json {
        let output = template_to_json(&template, session.sentinels(), session.map());
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{} added ({})",
            template.id,
            template.drag_id(&session.sentinels().library_prefix)
        );
    }
    Ok(())
}

fn cmd_template_edit(args: TemplateEditArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if args.name.is_none() && args.color.is_none() {
        return Err("nothing to change: pass --name and/or --color".into());
    }
    let (mut board, _lock) = load_board_locked("template edit")?;
    let patch = TemplatePatch {
        name: args.name,
        color: args.color,
    };

    // board.toml first, so a config that cannot take the edit leaves
    // board.json untouched
    let mut catalog = board.config.templates.clone();
    let edited = catalog_ops::update_template(&mut catalog, &args.id, patch.clone())?;
    if !config_io::update_template_in_config(&mut board.doc, &edited) {
        return Err(format!("template {} is not listed in board.toml", edited.id).into());
    }
    config_io::write_config(&board.dir, &board.doc)?;

    let mut session = open_session(&board);
    let template = session.update_template(&args.id, patch)?;
    check_saved(&mut session)?;

    let placements = session.map().count_template(&template.id);
    if json {
        let output = template_to_json(&template, session.sentinels(), session.map());
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} updated ({} placements refreshed)", template.id, placements);
    }
    Ok(())
}

fn cmd_template_rm(args: TemplateRmArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (mut board, _lock) = load_board_locked("template rm")?;
    if board.config.template(&args.id).is_none() {
        return Err(CatalogError::NotFound(args.id).into());
    }
    if !config_io::remove_template_from_config(&mut board.doc, &args.id) {
        return Err(format!("template {} is not listed in board.toml", args.id).into());
    }
    config_io::write_config(&board.dir, &board.doc)?;

    let mut session = open_session(&board);
    let before = session.map().len();
    let template = session.remove_template(&args.id)?;
    check_saved(&mut session)?;

    println!(
        "{} removed ({} placements removed)",
        template.id,
        before - session.map().len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Board commands
// ---------------------------------------------------------------------------

fn cmd_drop(args: DropArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (board, _lock) = load_board_locked("drop")?;
    let mut session = open_session(&board);

    let outcome = match session.source_for(&args.source) {
        Some(source) => {
            session.drag_start(source);
            session.drag_end(&args.source, args.target.as_deref())
        }
        None => {
            debug!("event=drop_unresolved source={}", args.source);
            // an end event with nothing picked up is ignored
            session.drag_end(&args.source, args.target.as_deref())
        }
    };
    check_saved(&mut session)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&move_to_json(&outcome))?);
    } else {
        println!("{}", outcome);
    }
    Ok(())
}

fn cmd_note(args: NoteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (board, _lock) = load_board_locked("note")?;
    let mut session = open_session(&board);

    if !session.set_notes(&args.placement_id, &args.text) {
        return Err(format!("placement not found: {}", args.placement_id).into());
    }
    check_saved(&mut session)?;

    let cleared = session
        .map()
        .find(&args.placement_id)
        .is_some_and(|item| item.notes.is_none());
    if cleared {
        println!("{} note cleared", args.placement_id);
    } else {
        println!("{} note updated", args.placement_id);
    }
    Ok(())
}

fn cmd_clear(args: ClearArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.yes {
        return Err("refusing to clear the board without --yes".into());
    }
    let (board, _lock) = load_board_locked("clear")?;
    let mut session = open_session(&board);

    let removed = session.map().len();
    session.clear();
    check_saved(&mut session)?;

    println!("board cleared ({} placements removed)", removed);
    Ok(())
}
