use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "docdb";
const HISTORY_FILE: &str = "history";

/// Where the REPL keeps its line history: `$DOCDB_HISTORY`, else the XDG
/// state directory, else `~/.local/state`, else the working directory.
pub fn resolve_history_path() -> PathBuf {
    history_path_from(|name| env::var(name).ok())
}

fn history_path_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(path) = lookup("DOCDB_HISTORY").filter(|path| !path.is_empty()) {
        return PathBuf::from(path);
    }
    let state_dir = lookup("XDG_STATE_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| lookup("HOME").map(|home| PathBuf::from(home).join(".local").join("state")));
    match state_dir {
        Some(dir) => dir.join(APP_DIR).join(HISTORY_FILE),
        None => PathBuf::from(".docdb_history"),
    }
}
