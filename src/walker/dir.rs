// Directory walker

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use walkdir::WalkDir;

use super::{EntryKind, WalkEntry, Walker};
use crate::cancel::is_cancelled;
use crate::error::{Result, TakeoutError};

/// Walks a directory tree. The walk is materialized up front and sorted
/// by path, so two passes over the same filesystem state yield the same
/// sequence.
pub struct DirWalker {
    root: PathBuf,
    name: String,
    recursive: bool,
    entries: Vec<WalkEntry>,
    current: Option<usize>,
    cancel: Arc<AtomicBool>,
    closed: bool,
}

impl DirWalker {
    pub fn new(root: &Path, recursive: bool, cancel: Arc<AtomicBool>) -> Result<Self> {
        let meta = std::fs::metadata(root)?;
        if !meta.is_dir() {
            return Err(TakeoutError::NotADirectory(root.display().to_string()));
        }
        let mut walker = DirWalker {
            root: root.to_path_buf(),
            name: root.display().to_string(),
            recursive,
            entries: Vec::new(),
            current: None,
            cancel,
            closed: false,
        };
        walker.build_index()?;
        Ok(walker)
    }

    fn build_index(&mut self) -> Result<()> {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root)
            .max_depth(max_depth)
            .follow_links(true)
        {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_dir() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| TakeoutError::Other(e.to_string()))?;
            let path = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let kind = if entry.file_type().is_symlink() {
                EntryKind::Symlink
            } else {
                EntryKind::File
            };
            let size = entry.metadata().map_err(io::Error::from)?.len();
            entries.push(WalkEntry { path, kind, size });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        self.entries = entries;
        self.current = None;
        Ok(())
    }
}

impl Walker for DirWalker {
    fn name(&self) -> &str {
        &self.name
    }

    fn next(&mut self) -> Result<Option<WalkEntry>> {
        if self.closed {
            return Err(TakeoutError::WalkerClosed(self.name.clone()));
        }
        if is_cancelled(&self.cancel) {
            return Err(TakeoutError::Cancelled);
        }
        let next = self.current.map_or(0, |c| c + 1);
        if next >= self.entries.len() {
            return Ok(None);
        }
        self.current = Some(next);
        Ok(Some(self.entries[next].clone()))
    }

    fn open(&mut self) -> Result<Box<dyn Read + '_>> {
        if self.closed {
            return Err(TakeoutError::WalkerClosed(self.name.clone()));
        }
        let current = self
            .current
            .ok_or_else(|| TakeoutError::NoCurrentEntry(self.name.clone()))?;
        let file = File::open(self.root.join(&self.entries[current].path))?;
        Ok(Box::new(file))
    }

    fn rewind(&mut self) -> Result<()> {
        if self.closed {
            return Err(TakeoutError::WalkerClosed(self.name.clone()));
        }
        self.build_index()
    }

    fn close(&mut self) -> Result<()> {
        self.entries.clear();
        self.current = None;
        self.closed = true;
        Ok(())
    }
}
