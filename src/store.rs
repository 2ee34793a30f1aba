//! Artifact store: the I/O boundary of the pipeline.
//!
//! Conversion, splitting and verification never touch the filesystem
//! directly. They read the input document and write every artifact through an
//! [`ArtifactStore`], so the same code runs against a real directory tree
//! ([`FsStore`]) or an in-process map ([`MemoryStore`]).

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Read/write access to named artifacts.
///
/// Paths are relative to the store's root; absolute paths are used as-is by
/// [`FsStore`].
pub trait ArtifactStore: Send + Sync {
    /// Read the raw bytes of a file.
    fn read(&self, path: &Path) -> impl Future<Output = io::Result<Vec<u8>>> + Send;

    /// Read a file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> impl Future<Output = io::Result<String>> + Send {
        async move {
            let bytes = self.read(path).await?;
            String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        }
    }

    /// Create or replace a file.
    fn write(&self, path: &Path, contents: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Create a directory and all missing parents. Succeeds if it exists.
    fn create_dir_all(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;

    /// Names of the entries directly inside a directory, in no particular
    /// order.
    fn list_dir(&self, path: &Path) -> impl Future<Output = io::Result<Vec<String>>> + Send;
}

// --- Implementation: local filesystem ---

/// Store backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the process working directory.
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl ArtifactStore for FsStore {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.resolve(path)).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        tokio::fs::write(self.resolve(path), contents).await
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(self.resolve(path)).await
    }

    async fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(self.resolve(path)).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }
}

// --- Implementation: in memory ---

/// Store holding everything in process memory. Useful in tests and for
/// embedding the pipeline without touching disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, e.g. the input document.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.files.insert(path.into(), contents.into());
        }
        self
    }

    /// Snapshot of a file's contents as text.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        let state = self.state.lock().ok()?;
        let bytes = state.files.get(path.as_ref())?;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Delete a file. Returns whether it existed.
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.state
            .lock()
            .map(|mut s| s.files.remove(path.as_ref()).is_some())
            .unwrap_or(false)
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| io::Error::other("memory store lock poisoned"))
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

impl ArtifactStore for MemoryStore {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.lock()?
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.lock()?.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock()?;
        for ancestor in path.ancestors().filter(|a| !a.as_os_str().is_empty()) {
            state.dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    async fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let state = self.lock()?;
        let mut names: BTreeSet<String> = BTreeSet::new();
        let children = state
            .files
            .keys()
            .chain(state.dirs.iter())
            .filter(|p| p.parent() == Some(path));
        for child in children {
            if let Some(name) = child.file_name() {
                names.insert(name.to_string_lossy().into_owned());
            }
        }
        if names.is_empty() && !state.dirs.contains(path) {
            return Err(not_found(path));
        }
        Ok(names.into_iter().collect())
    }
}
