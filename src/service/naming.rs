use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

/// First free path for `filename` inside `dir`.
///
/// Returns `dir/filename` when nothing exists there, otherwise
/// `dir/<stem>_<n>.<ext>` for the smallest `n >= 1` not yet taken.
pub fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    (0u64..)
        .map(|n| dir.join(candidate_name(filename, n)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| dir.join(filename))
}

/// Like [`unique_path`], but atomically creates the file as well, so two
/// concurrent callers can never end up with the same path.
pub fn create_unique(dir: &Path, filename: &str) -> io::Result<(PathBuf, File)> {
    let mut n = 0u64;
    loop {
        let candidate = dir.join(candidate_name(filename, n));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e),
        }
    }
}

/// `filename` itself for `n == 0`, `<stem>_<n>.<ext>` otherwise.
fn candidate_name(filename: &str, n: u64) -> String {
    if n == 0 {
        return filename.to_string();
    }

    let name = Path::new(filename);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!("{stem}_{n}{ext}")
}

/// Makes a caller-supplied id safe to embed in a file name.
pub fn file_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "anonymous".to_string()
    } else {
        cleaned
    }
}
