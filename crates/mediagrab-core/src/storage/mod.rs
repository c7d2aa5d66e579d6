//! Output directory I/O: hidden temp files with atomic finalize, and the
//! store-state snapshot reported at the end of a run.

mod writer;

pub use writer::PartFile;

use std::io;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: hidden sibling of the final path
/// (e.g. `dir/photo.jpg` → `dir/.photo.jpg.part`), so it never counts as stored media.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    if let Some(file_name) = final_path.file_name() {
        name.push(file_name);
    }
    name.push(TEMP_SUFFIX);
    final_path.with_file_name(name)
}

/// Counts regular files in `dir` whose name does not start with `.`.
pub fn count_visible_files(dir: &Path) -> io::Result<usize> {
    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if entry.file_type()?.is_file() {
            count += 1;
        }
    }
    Ok(count)
}
