use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::workspace::{self, DATA_DIR};

pub fn cmd_init(args: InitArgs, root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    // Note a project further up, since commands run here will now stop at ours
    if !args.force
        && let Some(parent) = root.parent()
        && let Ok(outer) = workspace::discover(parent)
    {
        tracing::warn!(outer = %outer.display(), "enclosing project found, commands here will use the new one");
    }

    let dir = workspace::init(root, args.empty, args.force)?;

    println!("Initialized {}/ in {}", DATA_DIR, root.display());
    if args.empty {
        println!("  starting with no tasks");
    } else if !dir.join(crate::io::storage::TASKS_FILE).exists() {
        println!("  sample tasks load until the first change");
    }
    Ok(())
}
