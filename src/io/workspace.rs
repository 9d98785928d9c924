use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::io::config_io::{CONFIG_FILE, config_path};
use crate::io::recovery::atomic_write;
use crate::io::storage::TASKS_FILE;

/// Name of the data directory inside a project root
pub const DATA_DIR: &str = "taskgrid";

const CONFIG_TEMPLATE: &str = include_str!("../templates/config.toml");

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("not a taskgrid project: no {DATA_DIR}/ directory found (run `tg init`)")]
    NotFound,
    #[error("{0} already exists (use --force to reinitialize)")]
    AlreadyInitialized(PathBuf),
    #[error("could not create {path}: {source}")]
    Create { path: PathBuf, source: io::Error },
}

/// Walk up from `start` looking for a `taskgrid/` directory holding a
/// config file. Returns the data directory itself.
pub fn discover(start: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut current = start.to_path_buf();
    loop {
        let dir = current.join(DATA_DIR);
        if dir.is_dir() && dir.join(CONFIG_FILE).exists() {
            return Ok(dir);
        }
        if !current.pop() {
            return Err(WorkspaceError::NotFound);
        }
    }
}

/// Create `root/taskgrid/` with a commented config. With `empty`, also write
/// an empty task list so the built-in defaults are not loaded. `force`
/// rewrites the config of an existing directory; task data is never removed.
pub fn init(root: &Path, empty: bool, force: bool) -> Result<PathBuf, WorkspaceError> {
    let dir = root.join(DATA_DIR);
    let config = config_path(&dir);
    if config.exists() && !force {
        return Err(WorkspaceError::AlreadyInitialized(dir));
    }

    let create = |path: &Path, source: io::Error| WorkspaceError::Create {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(&dir).map_err(|e| create(&dir, e))?;
    atomic_write(&config, CONFIG_TEMPLATE.as_bytes()).map_err(|e| create(&config, e))?;

    let tasks = dir.join(TASKS_FILE);
    if empty && !tasks.exists() {
        atomic_write(&tasks, b"[]\n").map_err(|e| create(&tasks, e))?;
    }

    tracing::info!(dir = %dir.display(), "initialized");
    Ok(dir)
}
