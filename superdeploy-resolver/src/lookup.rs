//! Filesystem-lookup capability used by the resolver.
//!
//! The resolver only ever asks two questions: "what is at this path?" and
//! "what names does this directory contain?". Keeping them behind
//! [`FileLookup`] lets the precedence rules be tested against an in-memory tree.

use std::io;
use std::path::Path;

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File { executable: bool },
    Dir,
}

pub trait FileLookup {
    /// `Ok(None)` when nothing exists at `path`. Any other failure
    /// (permission denied, I/O error) is returned as `Err`.
    fn entry(&self, path: &Path) -> io::Result<Option<EntryKind>>;

    /// File names directly inside `dir`.
    fn children(&self, dir: &Path) -> io::Result<Vec<String>>;
}

/// [`FileLookup`] over the real filesystem. Symlinks are followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLookup;

impl FileLookup for FsLookup {
    fn entry(&self, path: &Path) -> io::Result<Option<EntryKind>> {
        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(err) if is_absent(&err) => return Ok(None),
            Err(err) => return Err(err),
        };
        if meta.is_dir() {
            return Ok(Some(EntryKind::Dir));
        }
        Ok(Some(EntryKind::File {
            executable: is_executable(&meta),
        }))
    }

    fn children(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

/// "Absent" covers a missing leaf and a parent component that is a regular file.
fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}
#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    true
}
