use clap::{Args, Parser, Subcommand};

use crate::model::field::FieldType;
use crate::model::task::{Priority, Status};

#[derive(Parser)]
#[command(name = "tg", about = concat!("taskgrid v", env!("CARGO_PKG_VERSION"), " - tasks, custom fields, undo"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different project directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize taskgrid/ in the current directory
    Init(InitArgs),
    /// Show the task grid (filters, sort and page are remembered)
    List(ListArgs),
    /// Add a task at the top of the list
    Add(AddArgs),
    /// Change a task's title, priority, status or custom fields
    Edit(EditArgs),
    /// Delete a task
    Delete(DeleteArgs),
    /// Set or clear the task being edited
    Focus(FocusArgs),
    /// Undo the last change
    Undo,
    /// Redo the last undone change
    Redo,
    /// Manage custom fields
    Field(FieldCmd),
    /// Read or change config.toml
    Config(ConfigCmd),
    /// Show the recovery log
    Recovery(RecoveryArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Start with no tasks instead of the sample list
    #[arg(long)]
    pub empty: bool,
    /// Rewrite config.toml if already initialized (task data is kept)
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Replace all filters from a query string such as '?status=completed'
    #[arg(long)]
    pub query: Option<String>,
    /// Case-insensitive title search ("" clears)
    #[arg(long)]
    pub search: Option<String>,
    /// Status filter: not_started, in_progress, completed or all
    #[arg(long)]
    pub status: Option<String>,
    /// Priority filter: none, low, medium, high, urgent or all
    #[arg(long)]
    pub priority: Option<String>,
    /// Click a column header (repeat to flip direction)
    #[arg(long)]
    pub sort: Option<String>,
    /// Go to page N
    #[arg(long)]
    pub page: Option<usize>,
    /// Rows per page: 10, 20 or 50 (returns to page 1)
    #[arg(long)]
    pub page_size: Option<usize>,
    /// Forget all filters
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    #[arg(long, short = 'p', default_value = "medium")]
    pub priority: Priority,
    #[arg(long, short = 's', default_value = "not_started")]
    pub status: Status,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: u64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,
    #[arg(long, short = 's')]
    pub status: Option<Status>,
    /// Set a custom field, as NAME=VALUE (repeatable)
    #[arg(long = "field", short = 'f', value_name = "NAME=VALUE")]
    pub fields: Vec<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Task ID
    pub id: u64,
}

#[derive(Args)]
pub struct FocusArgs {
    /// Task ID
    #[arg(required_unless_present = "clear", conflicts_with = "clear")]
    pub id: Option<u64>,
    /// Clear the editing cursor
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args)]
pub struct FieldCmd {
    #[command(subcommand)]
    pub action: FieldAction,
}

#[derive(Subcommand)]
pub enum FieldAction {
    /// Register a field (re-adding a name replaces its definition)
    Add(FieldAddArgs),
    /// Remove a field from the registry and every task
    Rm(FieldRmArgs),
    /// List registered fields in column order
    List,
}

#[derive(Args)]
pub struct FieldAddArgs {
    /// Field name
    pub name: String,
    /// Field type: text, number or checkbox
    #[arg(long = "type", short = 't', default_value = "text")]
    pub field_type: FieldType,
    /// Default value (empty text, 0 or false if omitted)
    #[arg(long)]
    pub default: Option<String>,
}

#[derive(Args)]
pub struct FieldRmArgs {
    /// Field name
    pub name: String,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a value (e.g. store.id_policy)
    Get(ConfigGetArgs),
    /// Set a value, keeping comments in config.toml
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigGetArgs {
    pub key: String,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Args)]
pub struct RecoveryArgs {
    /// Show at most N entries
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}
