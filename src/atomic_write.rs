//! Atomic bundle output (§9): write to a temp file in the destination
//! directory, then rename over the target, so a crash or concurrent reader
//! never observes a half-written bundle.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writes `contents` to `path` atomically. The temp file lives alongside
/// `path` (not in a system temp dir) so the final rename stays on one
/// filesystem and is guaranteed atomic by the OS.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let tmp_path = tmp_path_for(path);
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
    }

    let result = fs::rename(&tmp_path, path);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bundle".to_string());
    path.with_file_name(format!(".{file_name}.cribo-tmp"))
}
