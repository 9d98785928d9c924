mod init;
pub use init::cmd_init;

use std::path::PathBuf;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::DirLock;
use crate::io::recovery;
use crate::io::state::{self, SessionState};
use crate::io::storage::JsonStorage;
use crate::io::workspace;
use crate::model::config::StoreConfig;
use crate::model::field::{CustomFieldDefinition, FieldValue};
use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch};
use crate::ops::columns::{RESERVED_COLUMNS, task_table};
use crate::ops::filter::{TaskFilter, parse_priority_filter, parse_status_filter};
use crate::store::TaskStore;
use crate::table::{PageSize, TableState};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let start = start_dir(cli.project_dir.as_deref())?;

    match cli.command {
        Commands::Init(args) => cmd_init(args, &start),

        // Read commands
        Commands::List(args) => cmd_list(args, &start, json),
        Commands::Field(FieldCmd {
            action: FieldAction::List,
        }) => cmd_field_list(&start, json),
        Commands::Recovery(args) => cmd_recovery(args, &start, json),
        Commands::Config(ConfigCmd {
            action: ConfigAction::Get(args),
        }) => cmd_config_get(args, &start, json),

        // Write commands
        Commands::Add(args) => cmd_add(args, &start),
        Commands::Edit(args) => cmd_edit(args, &start),
        Commands::Delete(args) => cmd_delete(args, &start),
        Commands::Focus(args) => cmd_focus(args, &start),
        Commands::Undo => cmd_undo(&start),
        Commands::Redo => cmd_redo(&start),
        Commands::Field(FieldCmd {
            action: FieldAction::Add(args),
        }) => cmd_field_add(args, &start),
        Commands::Field(FieldCmd {
            action: FieldAction::Rm(args),
        }) => cmd_field_rm(args, &start),
        Commands::Config(ConfigCmd {
            action: ConfigAction::Set(args),
        }) => cmd_config_set(args, &start),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start_dir(project_dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match project_dir {
        Some(dir) => Ok(std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

/// Everything one command works on, loaded under the directory lock
struct Session {
    dir: PathBuf,
    config: StoreConfig,
    store: TaskStore<JsonStorage>,
    state: SessionState,
    _lock: DirLock,
}

impl Session {
    fn open(start: &std::path::Path) -> Result<Session, Box<dyn std::error::Error>> {
        let dir = workspace::discover(start)?;
        let lock = DirLock::acquire(&dir)?;
        let (config, _doc) = config_io::read_config(&dir)?;

        let mut store = TaskStore::open(JsonStorage::new(&dir), config.store.clone())?;
        let state = match state::read_session(&dir) {
            Some(state) => state,
            None => SessionState {
                table: TableState::new(configured_page_size(&config)),
                ..Default::default()
            },
        };
        store.restore_session(state.store_parts());

        Ok(Session {
            dir,
            config,
            store,
            state,
            _lock: lock,
        })
    }

    fn task(&self, id: TaskId) -> Result<&Task, Box<dyn std::error::Error>> {
        Ok(self
            .store
            .task(id)
            .ok_or_else(|| format!("task not found: {}", id))?)
    }

    /// Write session state, then release the store
    fn close(mut self) -> CmdResult {
        self.state.set_store_parts(self.store.session());
        state::write_session(&self.dir, &self.state)?;
        self.store.dispose()?;
        Ok(())
    }
}

fn configured_page_size(config: &StoreConfig) -> PageSize {
    PageSize::new(config.view.page_size).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config view.page_size ignored");
        PageSize::default()
    })
}

fn non_empty(title: &str) -> Result<&str, Box<dyn std::error::Error>> {
    let title = title.trim();
    if title.is_empty() {
        return Err("task title cannot be empty".into());
    }
    Ok(title)
}

/// Parse a `NAME=VALUE` argument
fn split_assignment(arg: &str) -> Result<(&str, &str), Box<dyn std::error::Error>> {
    arg.split_once('=')
        .map(|(name, value)| (name.trim(), value))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", arg).into())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, start: &std::path::Path, json: bool) -> CmdResult {
    let mut session = Session::open(start)?;
    let mode = session.config.view.filter_mode;

    // Filters
    let before = session.state.filter.clone();
    if args.clear {
        session.state.filter = TaskFilter::default();
    }
    if let Some(ref query) = args.query {
        session.state.filter = TaskFilter::from_query(query)?;
    }
    if let Some(text) = args.search {
        session.state.filter.search_text = text;
    }
    if let Some(ref status) = args.status {
        session.state.filter.status = parse_status_filter(status)?;
    }
    if let Some(ref priority) = args.priority {
        session.state.filter.priority = parse_priority_filter(priority)?;
    }
    if session.state.filter != before {
        session.state.table.current_page = 1;
    }

    let output = {
        let table = task_table(session.store.fields());
        let visible = session.state.filter.apply(session.store.tasks(), mode);
        let table_state = &mut session.state.table;

        if let Some(ref column) = args.sort {
            if table.column(column).is_none() {
                return Err(format!("unknown column '{}'", column).into());
            }
            if !table.click_header(table_state, column) {
                tracing::warn!(column = %column, "column is not sortable, sort unchanged");
            }
        }
        if let Some(size) = args.page_size {
            table_state.set_page_size(PageSize::new(size)?);
        }
        if let Some(page) = args.page {
            table_state.set_page(page, visible.len());
        }

        let view = table.project(visible, table_state);
        table_state.current_page = view.current_page;

        let query = session.state.filter.to_query();
        if json {
            serde_json::to_string_pretty(&grid_to_json(&view, session.store.editing(), query))?
        } else {
            let mut text = format_grid(&view, session.store.editing());
            if session.state.filter.is_active() {
                text.push_str(&format!("\n?{}", query));
            }
            text
        }
    };

    session.close()?;
    println!("{}", output);
    Ok(())
}

fn cmd_field_list(start: &std::path::Path, json: bool) -> CmdResult {
    let session = Session::open(start)?;
    let fields = session.store.fields();
    if json {
        let out: Vec<FieldJson> = fields.iter().map(field_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if fields.is_empty() {
        println!("no custom fields");
    } else {
        for def in fields.iter() {
            println!("{}", format_field(def));
        }
    }
    Ok(())
}

fn cmd_recovery(args: RecoveryArgs, start: &std::path::Path, json: bool) -> CmdResult {
    let dir = workspace::discover(start)?;
    let entries = recovery::read_recovery_entries(&dir, Some(args.limit));
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("recovery log is empty");
    } else {
        let blocks: Vec<String> = entries.iter().map(format_recovery_entry).collect();
        println!("{}", blocks.join("\n\n"));
    }
    Ok(())
}

fn cmd_config_get(args: ConfigGetArgs, start: &std::path::Path, json: bool) -> CmdResult {
    let dir = workspace::discover(start)?;
    let (config, _doc) = config_io::read_config(&dir)?;
    let value = config_io::get_config_value(&config, &args.key)?;
    if json {
        println!("{}", serde_json::json!({ "key": args.key, "value": value }));
    } else {
        println!("{}", value);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, start: &std::path::Path) -> CmdResult {
    let title = non_empty(&args.title)?.to_string();
    let mut session = Session::open(start)?;
    let draft = TaskDraft::new(title)
        .with_priority(args.priority)
        .with_status(args.status);
    let id = session.store.add_task(draft)?;
    session.close()?;
    println!("{}", id);
    Ok(())
}

fn cmd_edit(args: EditArgs, start: &std::path::Path) -> CmdResult {
    let mut session = Session::open(start)?;
    let task = session.task(args.id)?;

    let mut patch = TaskPatch {
        title: args
            .title
            .as_deref()
            .map(non_empty)
            .transpose()?
            .map(str::to_string),
        priority: args.priority,
        status: args.status,
        custom_fields: None,
    };

    if !args.fields.is_empty() {
        let mut values = task.custom_fields.clone();
        for arg in &args.fields {
            let (name, raw) = split_assignment(arg)?;
            let def = session
                .store
                .fields()
                .get(name)
                .ok_or_else(|| format!("unknown field '{}'", name))?;
            let value = FieldValue::parse(def.field_type, raw)
                .map_err(|e| format!("field '{}': {}", name, e))?;
            match values.iter_mut().find(|v| v.name == name) {
                Some(slot) => slot.value = value,
                None => {
                    let mut seeded = def.seed_value();
                    seeded.value = value;
                    values.push(seeded);
                }
            }
        }
        patch.custom_fields = Some(values);
    }

    if patch.is_empty() {
        return Err("nothing to change (use --title, --priority, --status or --field)".into());
    }

    session.store.update_task(args.id, patch)?;
    session.close()?;
    println!("{} updated", args.id);
    Ok(())
}

fn cmd_delete(args: DeleteArgs, start: &std::path::Path) -> CmdResult {
    let mut session = Session::open(start)?;
    let task_json = serde_json::to_string_pretty(session.task(args.id)?)?;
    session.store.delete_task(args.id)?;
    recovery::log_task_deletion(&session.dir, args.id, &task_json);
    session.close()?;
    println!("{} deleted", args.id);
    Ok(())
}

fn cmd_focus(args: FocusArgs, start: &std::path::Path) -> CmdResult {
    let mut session = Session::open(start)?;
    let id = match args.id {
        Some(id) if !args.clear => {
            session.task(id)?;
            Some(id)
        }
        _ => None,
    };
    session.store.set_editing(id);
    session.close()?;
    match id {
        Some(id) => println!("editing {}", id),
        None => println!("editing cleared"),
    }
    Ok(())
}

fn cmd_undo(start: &std::path::Path) -> CmdResult {
    let mut session = Session::open(start)?;
    let changed = session.store.undo()?;
    session.close()?;
    println!("{}", if changed { "undone" } else { "nothing to undo" });
    Ok(())
}

fn cmd_redo(start: &std::path::Path) -> CmdResult {
    let mut session = Session::open(start)?;
    let changed = session.store.redo()?;
    session.close()?;
    println!("{}", if changed { "redone" } else { "nothing to redo" });
    Ok(())
}

fn cmd_field_add(args: FieldAddArgs, start: &std::path::Path) -> CmdResult {
    let name = args.name.trim();
    if name.is_empty() {
        return Err("field name cannot be empty".into());
    }
    if RESERVED_COLUMNS.contains(&name) {
        return Err(format!("'{}' is a built-in column name", name).into());
    }
    let default = match args.default {
        Some(ref raw) => FieldValue::parse(args.field_type, raw)
            .map_err(|e| format!("default for '{}': {}", name, e))?,
        None => FieldValue::empty(args.field_type),
    };
    let def = CustomFieldDefinition {
        name: name.to_string(),
        field_type: args.field_type,
        default_value: default,
    };

    let mut session = Session::open(start)?;
    let replaced = session.store.fields().contains(name);
    session.store.add_custom_field(def)?;
    session.close()?;
    println!(
        "field {} {}",
        name,
        if replaced { "replaced" } else { "added" }
    );
    Ok(())
}

fn cmd_field_rm(args: FieldRmArgs, start: &std::path::Path) -> CmdResult {
    let mut session = Session::open(start)?;
    if !session.store.fields().contains(&args.name) {
        return Err(format!("unknown field '{}'", args.name).into());
    }
    session.store.remove_custom_field(&args.name)?;
    session.close()?;
    println!("field {} removed", args.name);
    Ok(())
}

fn cmd_config_set(args: ConfigSetArgs, start: &std::path::Path) -> CmdResult {
    let dir = workspace::discover(start)?;
    let _lock = DirLock::acquire(&dir)?;
    let (_config, mut doc) = config_io::read_config(&dir)?;
    config_io::set_config_value(&mut doc, &args.key, &args.value)?;
    config_io::write_config(&dir, &doc)?;
    println!("{} = {}", args.key, args.value);
    Ok(())
}
