//! Line-oriented project registry.
//!
//! # Storage format
//!
//! ```text
//! alpha is a project
//! beta is a project
//! ```
//!
//! One entry per line, insertion order is list order. The file is meant to be
//! hand-editable: blank lines are ignored and lines that do not match the
//! grammar are skipped with a warning instead of failing the whole listing.
//!
//! # API pattern
//!
//! [`ProjectRegistry`] owns an explicit [`RegistryStore`]; nothing is cached
//! between calls, so every operation re-reads the store. Use [`FileStore`] in
//! production and [`MemoryStore`] in tests.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{io_err, RegistryError};
use crate::paths::registry_path_at;
use crate::types::ProjectName;

/// Fixed suffix of every registry entry.
pub const ENTRY_SUFFIX: &str = " is a project";

// ---------------------------------------------------------------------------
// 1. Stores
// ---------------------------------------------------------------------------

/// Persistence backend for the registry text.
pub trait RegistryStore {
    /// Current contents, or `None` when nothing has been written yet.
    fn load(&self) -> Result<Option<String>, RegistryError>;

    /// Replace the contents.
    fn save(&self, contents: &str) -> Result<(), RegistryError>;
}

/// Registry text file on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<root>/projects.txt`
    pub fn at(root: &Path) -> Self {
        Self::new(registry_path_at(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegistryStore for FileStore {
    fn load(&self) -> Result<Option<String>, RegistryError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_err(&self.path, err)),
        }
    }

    /// Write flow: `.tmp` sibling → `chmod 0600` → `rename`.
    /// `.tmp` lives in the same directory as the target (same filesystem).
    fn save(&self, contents: &str) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
        }
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "projects.txt".to_string());
        let tmp_path = self.path.with_file_name(format!("{file_name}.tmp"));

        std::fs::write(&tmp_path, contents).map_err(|e| io_err(&tmp_path, e))?;
        set_file_permissions(&tmp_path)?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| io_err(&self.path, e))?;
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: RefCell::new(Some(contents.into())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }
}

impl RegistryStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, RegistryError> {
        Ok(self.contents.borrow().clone())
    }

    fn save(&self, contents: &str) -> Result<(), RegistryError> {
        *self.contents.borrow_mut() = Some(contents.to_owned());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 2. Parsing
// ---------------------------------------------------------------------------

/// Classification of a single registry line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    Entry(&'a str),
    Malformed,
}

/// Classify one line. Surrounding whitespace is ignored.
pub fn parse_line(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    match trimmed.strip_suffix(ENTRY_SUFFIX) {
        Some(name) if ProjectName::parse(name).is_ok() => Line::Entry(name),
        _ => Line::Malformed,
    }
}

/// Render the registry line for `name` (without trailing newline).
pub fn format_entry(name: &ProjectName) -> String {
    format!("{name}{ENTRY_SUFFIX}")
}

/// A line skipped during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line_no: usize,
    pub text: String,
}

/// Result of parsing a registry file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRegistry {
    /// Unique names in first-seen order.
    pub names: Vec<ProjectName>,
    /// Lines that did not match `"<name> is a project"`.
    pub malformed: Vec<SkippedLine>,
    /// Repeated entries after the first occurrence.
    pub duplicates: Vec<SkippedLine>,
}

pub fn parse(contents: &str) -> ParsedRegistry {
    let mut parsed = ParsedRegistry::default();
    let mut seen = HashSet::new();
    for (idx, line) in contents.lines().enumerate() {
        match parse_line(line) {
            Line::Blank => {}
            Line::Entry(name) => {
                if seen.insert(name) {
                    parsed.names.push(ProjectName::from(name));
                } else {
                    parsed.duplicates.push(SkippedLine {
                        line_no: idx + 1,
                        text: line.to_owned(),
                    });
                }
            }
            Line::Malformed => parsed.malformed.push(SkippedLine {
                line_no: idx + 1,
                text: line.to_owned(),
            }),
        }
    }
    parsed
}

// ---------------------------------------------------------------------------
// 3. Registry
// ---------------------------------------------------------------------------

/// The set of managed projects, backed by a [`RegistryStore`].
#[derive(Debug)]
pub struct ProjectRegistry<S> {
    store: S,
}

impl<S: RegistryStore> ProjectRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registered names in insertion order. A missing or empty store lists nothing.
    pub fn list(&self) -> Result<Vec<ProjectName>, RegistryError> {
        Ok(self.load_parsed()?.names)
    }

    pub fn contains(&self, name: &ProjectName) -> Result<bool, RegistryError> {
        Ok(self.list()?.contains(name))
    }

    /// Fail with [`RegistryError::NotRegistered`] unless `name` is present.
    pub fn require(&self, name: &ProjectName) -> Result<(), RegistryError> {
        if self.contains(name)? {
            Ok(())
        } else {
            Err(RegistryError::NotRegistered { name: name.clone() })
        }
    }

    /// Append `name`. Fails with `AlreadyExists` if present; the store is untouched.
    pub fn add(&self, name: &ProjectName) -> Result<(), RegistryError> {
        let name = ProjectName::parse(name.as_str())?;
        let contents = self.store.load()?.unwrap_or_default();
        if parse(&contents).names.contains(&name) {
            return Err(RegistryError::AlreadyExists { name });
        }

        let mut updated = contents;
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&format_entry(&name));
        updated.push('\n');
        self.store.save(&updated)?;
        tracing::info!(project = %name, "project registered");
        Ok(())
    }

    /// Delete every line registering `name`, preserving all other lines verbatim.
    /// Fails with `NotFound` if absent; the store is untouched.
    pub fn remove(&self, name: &ProjectName) -> Result<(), RegistryError> {
        let contents = self.store.load()?.unwrap_or_default();
        let mut removed = false;
        let mut updated = String::with_capacity(contents.len());
        // Kept lines are copied with their own terminator (`\n`, `\r\n` or none).
        for line in contents.split_inclusive('\n') {
            if parse_line(line) == Line::Entry(name.as_str()) {
                removed = true;
                continue;
            }
            updated.push_str(line);
        }
        if !removed {
            return Err(RegistryError::NotFound { name: name.clone() });
        }
        self.store.save(&updated)?;
        tracing::info!(project = %name, "project removed");
        Ok(())
    }

    fn load_parsed(&self) -> Result<ParsedRegistry, RegistryError> {
        let Some(contents) = self.store.load()? else {
            return Ok(ParsedRegistry::default());
        };
        let parsed = parse(&contents);
        for skipped in &parsed.malformed {
            tracing::warn!(
                line = skipped.line_no,
                text = %skipped.text,
                "skipping malformed registry line (expected \"<name> is a project\")"
            );
        }
        for dup in &parsed.duplicates {
            tracing::warn!(line = dup.line_no, text = %dup.text, "ignoring duplicate registry entry");
        }
        Ok(parsed)
    }
}

impl ProjectRegistry<FileStore> {
    /// Registry at `<root>/projects.txt`.
    pub fn open_at(root: &Path) -> Self {
        Self::new(FileStore::at(root))
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ProjectName {
        ProjectName::from(s)
    }

    fn registry(contents: &str) -> ProjectRegistry<MemoryStore> {
        ProjectRegistry::new(MemoryStore::with_contents(contents))
    }

    #[test]
    fn empty_store_lists_nothing() {
        let reg = ProjectRegistry::new(MemoryStore::new());
        assert!(reg.list().expect("list").is_empty());
    }

    #[test]
    fn parse_line_classifies() {
        assert_eq!(parse_line(""), Line::Blank);
        assert_eq!(parse_line("   "), Line::Blank);
        assert_eq!(parse_line("alpha is a project"), Line::Entry("alpha"));
        assert_eq!(parse_line("  alpha is a project  "), Line::Entry("alpha"));
        assert_eq!(parse_line("alpha"), Line::Malformed);
        assert_eq!(parse_line("two words is a project"), Line::Malformed);
        assert_eq!(parse_line(" is a project"), Line::Malformed);
    }

    #[test]
    fn list_skips_blank_and_malformed_lines() {
        let reg = registry("alpha is a project\n\n# comment\nbeta is a project\nnot a registry line\n");
        assert_eq!(reg.list().expect("list"), vec![name("alpha"), name("beta")]);
    }

    #[test]
    fn parse_reports_malformed_line_numbers() {
        let parsed = parse("alpha is a project\ngarbage\n\nbeta is a project\n");
        assert_eq!(parsed.malformed.len(), 1);
        assert_eq!(parsed.malformed[0].line_no, 2);
        assert_eq!(parsed.malformed[0].text, "garbage");
    }

    #[test]
    fn duplicates_are_listed_once() {
        let reg = registry("alpha is a project\nalpha is a project\n");
        assert_eq!(reg.list().expect("list"), vec![name("alpha")]);
        assert_eq!(parse("alpha is a project\nalpha is a project\n").duplicates.len(), 1);
    }

    #[test]
    fn add_twice_keeps_one_entry() {
        let reg = ProjectRegistry::new(MemoryStore::new());
        reg.add(&name("alpha")).expect("first add");
        let err = reg.add(&name("alpha")).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyExists { .. }));
        assert_eq!(reg.list().expect("list"), vec![name("alpha")]);
        assert_eq!(reg.store().contents().as_deref(), Some("alpha is a project\n"));
    }

    #[test]
    fn add_preserves_insertion_order() {
        let reg = ProjectRegistry::new(MemoryStore::new());
        for n in ["zeta", "alpha", "mid"] {
            reg.add(&name(n)).expect("add");
        }
        assert_eq!(
            reg.list().expect("list"),
            vec![name("zeta"), name("alpha"), name("mid")]
        );
    }

    #[test]
    fn add_terminates_unterminated_last_line() {
        let reg = registry("alpha is a project");
        reg.add(&name("beta")).expect("add");
        assert_eq!(
            reg.store().contents().as_deref(),
            Some("alpha is a project\nbeta is a project\n")
        );
    }

    #[test]
    fn add_rejects_invalid_name() {
        let reg = ProjectRegistry::new(MemoryStore::new());
        let err = reg.add(&name("bad name")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidName { .. }));
        assert!(reg.store().contents().is_none());
    }

    #[test]
    fn remove_missing_is_not_found_and_unchanged() {
        let original = "alpha is a project\njunk\n";
        let reg = registry(original);
        let err = reg.remove(&name("beta")).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
        assert_eq!(reg.store().contents().as_deref(), Some(original));
    }

    #[test]
    fn remove_preserves_other_lines() {
        let reg = registry("alpha is a project\n\n# keep me\nbeta is a project\n");
        reg.remove(&name("alpha")).expect("remove");
        assert_eq!(
            reg.store().contents().as_deref(),
            Some("\n# keep me\nbeta is a project\n")
        );
        assert!(!reg.contains(&name("alpha")).expect("contains"));
        assert!(reg.contains(&name("beta")).expect("contains"));
    }

    #[test]
    fn remove_keeps_crlf_and_missing_final_newline() {
        let reg = registry("alpha is a project\r\n# keep\r\nbeta is a project");
        reg.remove(&name("alpha")).expect("remove");
        assert_eq!(
            reg.store().contents().as_deref(),
            Some("# keep\r\nbeta is a project")
        );
    }

    #[test]
    fn require_distinguishes_not_registered() {
        let reg = registry("alpha is a project\n");
        reg.require(&name("alpha")).expect("registered");
        let err = reg.require(&name("ghost")).unwrap_err();
        assert!(matches!(err, RegistryError::NotRegistered { .. }));
        assert!(err.to_string().contains("superdeploy add ghost"));
    }
}
