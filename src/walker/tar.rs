// Tar family walker (.tar, .tgz, .tar.gz)
//
// Tar streams are strictly sequential: reading entry N+1 invalidates the
// reader of entry N, and a gzip layer cannot seek. The walker owns a
// producer thread that drives the tar reader and serves entry headers and
// body chunks over channels; the thread's own sequential loop is what
// enforces the one-open-stream rule. Rewind joins the thread and starts a
// fresh one on a reopened file.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver, Sender};
use flate2::read::GzDecoder;

use super::{EntryKind, WalkEntry, Walker};
use crate::cancel::is_cancelled;
use crate::constants::{TAR_CHUNK_QUEUE, TAR_CHUNK_SIZE};
use crate::error::{Result, TakeoutError};

enum Command {
    Advance,
    Stream(Sender<io::Result<Vec<u8>>>),
    Stop,
}

enum HeaderReply {
    Entry(WalkEntry),
    End,
    Failed(TakeoutError),
}

struct TarWorker {
    cmd_tx: Sender<Command>,
    reply_rx: Receiver<HeaderReply>,
    handle: JoinHandle<()>,
}

pub struct TarWalker {
    path: PathBuf,
    name: String,
    gzipped: bool,
    cancel: Arc<AtomicBool>,
    worker: Option<TarWorker>,
    closed: bool,
}

impl TarWalker {
    /// Open a .tar archive.
    pub fn new_tar(path: &Path, cancel: Arc<AtomicBool>) -> Result<Self> {
        Self::new(path, false, cancel)
    }

    /// Open a .tar.gz or .tgz archive.
    pub fn new_tgz(path: &Path, cancel: Arc<AtomicBool>) -> Result<Self> {
        Self::new(path, true, cancel)
    }

    fn new(path: &Path, gzipped: bool, cancel: Arc<AtomicBool>) -> Result<Self> {
        let mut walker = TarWalker {
            path: path.to_path_buf(),
            name: path.display().to_string(),
            gzipped,
            cancel,
            worker: None,
            closed: false,
        };
        walker.spawn_worker()?;
        Ok(walker)
    }

    fn spawn_worker(&mut self) -> Result<()> {
        let file = File::open(&self.path)?;
        let reader: Box<dyn Read + Send> = if self.gzipped {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let archive = tar::Archive::new(reader);
        let (cmd_tx, cmd_rx) = bounded(0);
        let (reply_tx, reply_rx) = bounded(1);
        let handle = std::thread::spawn(move || run_worker(archive, cmd_rx, reply_tx));
        self.worker = Some(TarWorker {
            cmd_tx,
            reply_rx,
            handle,
        });
        Ok(())
    }

    fn stop_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.cmd_tx.send(Command::Stop);
            drop(worker.cmd_tx);
            let _ = worker.handle.join();
        }
    }

    fn worker_exited_error(&self, worker: &TarWorker) -> TakeoutError {
        // a failing worker stashes its error in the reply slot before exiting
        match worker.reply_rx.try_recv() {
            Ok(HeaderReply::Failed(err)) => err,
            _ => TakeoutError::Other(format!("tar walker stopped: {}", self.name)),
        }
    }
}

impl Walker for TarWalker {
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
        let worker = self
            .worker
            .as_ref()
            .ok_or_else(|| TakeoutError::WalkerClosed(self.name.clone()))?;
        if worker.cmd_tx.send(Command::Advance).is_err() {
            return Err(self.worker_exited_error(worker));
        }
        match worker.reply_rx.recv() {
            Ok(HeaderReply::Entry(entry)) => Ok(Some(entry)),
            Ok(HeaderReply::End) => Ok(None),
            Ok(HeaderReply::Failed(err)) => Err(err),
            Err(_) => Err(TakeoutError::Other(format!(
                "tar walker stopped: {}",
                self.name
            ))),
        }
    }

    fn open(&mut self) -> Result<Box<dyn Read + '_>> {
        if self.closed {
            return Err(TakeoutError::WalkerClosed(self.name.clone()));
        }
        let worker = self
            .worker
            .as_ref()
            .ok_or_else(|| TakeoutError::WalkerClosed(self.name.clone()))?;
        let (data_tx, data_rx) = bounded(TAR_CHUNK_QUEUE);
        if worker.cmd_tx.send(Command::Stream(data_tx)).is_err() {
            return Err(self.worker_exited_error(worker));
        }
        Ok(Box::new(TarStream {
            chunks: data_rx,
            buf: Vec::new(),
            pos: 0,
        }))
    }

    fn rewind(&mut self) -> Result<()> {
        if self.closed {
            return Err(TakeoutError::WalkerClosed(self.name.clone()));
        }
        self.stop_worker();
        self.spawn_worker()
    }

    fn close(&mut self) -> Result<()> {
        self.stop_worker();
        self.closed = true;
        Ok(())
    }
}

impl Drop for TarWalker {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

fn run_worker(
    mut archive: tar::Archive<Box<dyn Read + Send>>,
    cmd_rx: Receiver<Command>,
    reply_tx: Sender<HeaderReply>,
) {
    let mut entries = match archive.entries() {
        Ok(entries) => entries,
        Err(err) => {
            let _ = reply_tx.send(HeaderReply::Failed(err.into()));
            return;
        }
    };
    let mut current = None;
    for cmd in cmd_rx.iter() {
        match cmd {
            Command::Stop => return,
            Command::Advance => {
                current = None;
                loop {
                    match entries.next() {
                        None => {
                            let _ = reply_tx.send(HeaderReply::End);
                            break;
                        }
                        Some(Err(err)) => {
                            let _ = reply_tx.send(HeaderReply::Failed(err.into()));
                            break;
                        }
                        Some(Ok(entry)) => {
                            let entry_type = entry.header().entry_type();
                            if entry_type.is_dir() {
                                continue;
                            }
                            let path =
                                String::from_utf8_lossy(&entry.path_bytes()).into_owned();
                            let kind = if entry_type.is_symlink() {
                                EntryKind::Symlink
                            } else {
                                EntryKind::File
                            };
                            let walk_entry = WalkEntry {
                                path,
                                kind,
                                size: entry.size(),
                            };
                            if reply_tx.send(HeaderReply::Entry(walk_entry)).is_err() {
                                return;
                            }
                            current = Some(entry);
                            break;
                        }
                    }
                }
            }
            Command::Stream(data_tx) => match current.as_mut() {
                None => {
                    let _ = data_tx.send(Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        "no current tar entry",
                    )));
                }
                Some(entry) => {
                    let mut buf = vec![0u8; TAR_CHUNK_SIZE];
                    loop {
                        match entry.read(&mut buf) {
                            Ok(0) => break,
                            Ok(n) => {
                                if data_tx.send(Ok(buf[..n].to_vec())).is_err() {
                                    // consumer hung up; the unread rest is
                                    // skipped on the next advance
                                    break;
                                }
                            }
                            Err(err) => {
                                let _ = data_tx.send(Err(err));
                                break;
                            }
                        }
                    }
                }
            },
        }
    }
}

/// Reader over the body chunks of the current tar entry. Dropping it lets
/// the walker advance; unread bytes are skipped by the tar layer.
struct TarStream {
    chunks: Receiver<io::Result<Vec<u8>>>,
    buf: Vec<u8>,
    pos: usize,
}

impl Read for TarStream {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        while self.pos >= self.buf.len() {
            match self.chunks.recv() {
                Ok(Ok(chunk)) => {
                    self.buf = chunk;
                    self.pos = 0;
                }
                Ok(Err(err)) => return Err(err),
                Err(_) => return Ok(0),
            }
        }
        let n = (self.buf.len() - self.pos).min(out.len());
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
