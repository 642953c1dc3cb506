// Archive walker abstraction
//
// One contract over a directory tree, a ZIP archive, and the tar family.
// The tar format's limits set the limits for the whole set: iteration is
// sequential, and an opened entry stream must be dropped before seeking
// the next entry.

use std::io::Read;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::error::{Result, TakeoutError};

pub mod dir;
pub mod tar;
pub mod zip;

pub use dir::DirWalker;
pub use tar::TarWalker;
pub use zip::ZipWalker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Symlink,
}

/// One non-directory entry of an archive. Paths use forward slashes and
/// are relative to the archive root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: String,
    pub kind: EntryKind,
    pub size: u64,
}

pub trait Walker: Send {
    /// Walker's name for logs.
    fn name(&self) -> &str;

    /// Advance to the next non-directory entry. `Ok(None)` at the end of
    /// the archive. Surfaces `Cancelled` once the run's flag is set.
    fn next(&mut self) -> Result<Option<WalkEntry>>;

    /// Open the entry last returned by `next`. The stream borrows the
    /// walker mutably, so `next` cannot run until the stream is dropped.
    fn open(&mut self) -> Result<Box<dyn Read + '_>>;

    /// Reposition before the first entry. Idempotent.
    fn rewind(&mut self) -> Result<()>;

    /// Release the underlying resources. Only `name` remains callable.
    fn close(&mut self) -> Result<()>;
}

/// Open a walker for a path, picking the backend from the case-folded
/// extension: `.zip`, `.tar`, `.tgz`, `.tar.gz`, or a plain directory.
pub fn open_path(
    path: &Path,
    recursive: bool,
    cancel: Arc<AtomicBool>,
) -> Result<Box<dyn Walker>> {
    if path.is_dir() {
        return Ok(Box::new(DirWalker::new(path, recursive, cancel)?));
    }
    let name = path.to_string_lossy().into_owned();
    let lower = name.to_lowercase();
    if lower.ends_with(".zip") {
        Ok(Box::new(ZipWalker::new(path, cancel)?))
    } else if lower.ends_with(".tar") {
        Ok(Box::new(TarWalker::new_tar(path, cancel)?))
    } else if lower.ends_with(".tgz") || lower.ends_with(".tar.gz") {
        Ok(Box::new(TarWalker::new_tgz(path, cancel)?))
    } else {
        Err(TakeoutError::UnknownArchiveFormat(name))
    }
}
