//! In-memory filesystem with failure injection

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use super::fs::FileSystem;

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FsOperation {
    Read,
    Write,
    CreateDir,
    Rename,
    Copy,
    Remove,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    failures: BTreeMap<FsOperation, io::ErrorKind>,
}

/// Filesystem held entirely in memory
///
/// Directories are tracked so that writes into a missing parent fail the
/// same way they do on disk.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    state: RefCell<State>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating its parent directories
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Seed a file, creating its parent directories
    pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<String>) {
        let path = path.as_ref();
        let mut state = self.state.borrow_mut();
        if let Some(parent) = path.parent() {
            add_ancestors(&mut state.dirs, parent);
        }
        state
            .files
            .insert(path.to_path_buf(), contents.into().into_bytes());
    }

    /// Make every subsequent `operation` fail with `kind`
    pub fn fail_on(&self, operation: FsOperation, kind: io::ErrorKind) {
        self.state.borrow_mut().failures.insert(operation, kind);
    }

    /// Clear an injected failure
    pub fn recover(&self, operation: FsOperation) {
        self.state.borrow_mut().failures.remove(&operation);
    }

    /// Contents of a file as UTF-8, if present
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state
            .borrow()
            .files
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// All file paths, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        self.state.borrow().files.keys().cloned().collect()
    }

    fn check(&self, operation: FsOperation) -> io::Result<()> {
        match self.state.borrow().failures.get(&operation) {
            Some(kind) => Err(io::Error::new(
                *kind,
                format!("injected {:?} failure", operation),
            )),
            None => Ok(()),
        }
    }
}

fn add_ancestors(dirs: &mut BTreeSet<PathBuf>, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        dirs.insert(ancestor.to_path_buf());
    }
}

fn parent_exists(state: &State, path: &Path) -> bool {
    match path.parent() {
        None => true,
        Some(parent) if parent.as_os_str().is_empty() => true,
        Some(parent) => parent.parent().is_none() || state.dirs.contains(parent),
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.check(FsOperation::Read)?;
        let state = self.state.borrow();
        let bytes = state.files.get(path).ok_or_else(|| not_found(path))?;
        String::from_utf8(bytes.clone())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    fn write_synced(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.check(FsOperation::Write)?;
        let mut state = self.state.borrow_mut();
        if !parent_exists(&state, path) {
            return Err(not_found(path));
        }
        state.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.borrow();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.check(FsOperation::CreateDir)?;
        add_ancestors(&mut self.state.borrow_mut().dirs, path);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.check(FsOperation::Rename)?;
        let mut state = self.state.borrow_mut();
        if !parent_exists(&state, to) {
            return Err(not_found(to));
        }
        let bytes = state.files.remove(from).ok_or_else(|| not_found(from))?;
        state.files.insert(to.to_path_buf(), bytes);
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.check(FsOperation::Copy)?;
        let mut state = self.state.borrow_mut();
        if !parent_exists(&state, to) {
            return Err(not_found(to));
        }
        let bytes = state.files.get(from).cloned().ok_or_else(|| not_found(from))?;
        state.files.insert(to.to_path_buf(), bytes);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.check(FsOperation::Remove)?;
        self.state
            .borrow_mut()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        self.check(FsOperation::Read)?;
        let state = self.state.borrow();
        if !state.dirs.contains(dir) {
            return Err(not_found(dir));
        }
        let in_dir = |path: &&PathBuf| path.parent() == Some(dir);
        Ok(state
            .dirs
            .iter()
            .filter(in_dir)
            .chain(state.files.keys().filter(in_dir))
            .cloned()
            .collect())
    }
}
