use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pb", about = concat!("planboard v", env!("CARGO_PKG_VERSION"), " - drag templates onto a plain-file board"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different board directory
    #[arg(short = 'C', long = "board-dir", global = true)]
    pub board_dir: Option<String>,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new board in the current directory
    Init(InitArgs),
    /// Show the board, or one container
    Show(ShowArgs),
    /// List library templates and their drag ids
    Library,
    /// Manage library templates
    Template(TemplateCmd),
    /// Drag SOURCE and release it over TARGET (omit TARGET to drop on nothing)
    Drop(DropArgs),
    /// Report where a drag id lives
    Where(WhereArgs),
    /// Set or clear the notes on a placement
    Note(NoteArgs),
    /// Remove every placement from the board
    Clear(ClearArgs),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Board name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Container preset: week, kanban or custom
    #[arg(long, default_value = "week")]
    pub layout: String,
    /// Container key, in display order (repeatable; required for custom)
    #[arg(long = "container", value_name = "KEY", action = ArgAction::Append)]
    pub containers: Vec<String>,
    /// Start with an empty library instead of the sample templates
    #[arg(long)]
    pub no_starter: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ShowArgs {
    /// Container to show (default: the whole board)
    pub container: Option<String>,
}

#[derive(Args)]
pub struct WhereArgs {
    /// Placement id, container key, library drag id or deletion key
    pub id: String,
}

// ---------------------------------------------------------------------------
// Template args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TemplateCmd {
    #[command(subcommand)]
    pub action: TemplateAction,
}

#[derive(Subcommand)]
pub enum TemplateAction {
    /// Add a template to the library
    Add(TemplateAddArgs),
    /// Rename or recolor a template and every placement made from it
    Edit(TemplateEditArgs),
    /// Remove a template and every placement made from it
    Rm(TemplateRmArgs),
}

#[derive(Args)]
pub struct TemplateAddArgs {
    /// Display name
    pub name: String,
    /// Color as #rrggbb (default #3b82f6)
    #[arg(long)]
    pub color: Option<String>,
    /// Catalog id (default: generated)
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args)]
pub struct TemplateEditArgs {
    /// Catalog id
    pub id: String,
    /// New display name
    #[arg(long)]
    pub name: Option<String>,
    /// New color as #rrggbb
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct TemplateRmArgs {
    /// Catalog id
    pub id: String,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct DropArgs {
    /// Drag id of the source: lib-<template id> or a placement id
    pub source: String,
    /// Drop target: container key, placement id or deletion key
    pub target: Option<String>,
}

#[derive(Args)]
pub struct NoteArgs {
    /// Placement id
    pub placement_id: String,
    /// Note text (empty clears)
    pub text: String,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Confirm removing every placement
    #[arg(long)]
    pub yes: bool,
}
