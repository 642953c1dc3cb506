// ZIP archive walker

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use zip::ZipArchive;

use super::{EntryKind, WalkEntry, Walker};
use crate::cancel::is_cancelled;
use crate::error::{Result, TakeoutError};

struct ZipEntryInfo {
    index: usize,
    entry: WalkEntry,
}

/// Iterates the central directory in stored order. Rewind is a cursor
/// reset; any entry can be reopened after positioning on it.
pub struct ZipWalker {
    archive: Option<ZipArchive<BufReader<File>>>,
    entries: Vec<ZipEntryInfo>,
    current: Option<usize>,
    name: String,
    cancel: Arc<AtomicBool>,
}

impl ZipWalker {
    pub fn new(path: &Path, cancel: Arc<AtomicBool>) -> Result<Self> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;
        let mut entries = Vec::new();
        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            entries.push(ZipEntryInfo {
                index,
                entry: WalkEntry {
                    path: entry.name().to_string(),
                    kind: EntryKind::File,
                    size: entry.size(),
                },
            });
        }
        Ok(ZipWalker {
            archive: Some(archive),
            entries,
            current: None,
            name: path.display().to_string(),
            cancel,
        })
    }
}

impl Walker for ZipWalker {
    fn name(&self) -> &str {
        &self.name
    }

    fn next(&mut self) -> Result<Option<WalkEntry>> {
        if self.archive.is_none() {
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
        Ok(Some(self.entries[next].entry.clone()))
    }

    fn open(&mut self) -> Result<Box<dyn Read + '_>> {
        let current = self
            .current
            .ok_or_else(|| TakeoutError::NoCurrentEntry(self.name.clone()))?;
        let index = self.entries[current].index;
        let archive = self
            .archive
            .as_mut()
            .ok_or_else(|| TakeoutError::WalkerClosed(self.name.clone()))?;
        let entry = archive.by_index(index)?;
        Ok(Box::new(entry))
    }

    fn rewind(&mut self) -> Result<()> {
        if self.archive.is_none() {
            return Err(TakeoutError::WalkerClosed(self.name.clone()));
        }
        self.current = None;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.archive = None;
        self.entries.clear();
        self.current = None;
        Ok(())
    }
}
