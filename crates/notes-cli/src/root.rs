use std::path::{Path, PathBuf};

/// Resolve the notes root directory.
///
/// Priority:
/// 1. `--root` flag / `NOTES_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.notes/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_notes_root(&cwd).unwrap_or(cwd)
}

fn find_notes_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(notes_core::paths::NOTES_DIR).is_dir())
        .map(Path::to_path_buf)
}
