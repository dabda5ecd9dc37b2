use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const NOTES_DIR: &str = ".notes";
pub const NOTE_FILES_DIR: &str = ".notes/notes";
pub const CONFIG_FILE: &str = ".notes/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn notes_dir(root: &Path) -> PathBuf {
    root.join(NOTES_DIR)
}

pub fn note_files_dir(root: &Path) -> PathBuf {
    root.join(NOTE_FILES_DIR)
}

pub fn note_path(root: &Path, id: u64) -> PathBuf {
    note_files_dir(root).join(format!("{id}.yaml"))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Parse the note ID out of a `<id>.yaml` file name.
pub fn note_id_from_file_name(name: &str) -> Option<u64> {
    name.strip_suffix(".yaml")?.parse().ok()
}
