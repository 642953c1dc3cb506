// Google Photos takeout reconciliation
//
// Sidecar JSON files carry what the export mangled away, notably the
// original file name and the capture date. A sidecar is duplicated
// into every album folder its asset belongs to, while the media file may
// sit next to it or in the per-year bucket. One sidecar can describe
// several files (an original and its edited copies), and the renaming
// rules collide, so the matching rules run from the most specific to the
// broadest and the first binding wins.

pub mod asset;
pub mod matching;
pub mod metadata;


use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{SendTimeoutError, Sender};

use crate::cancel::is_cancelled;
use crate::constants::{FAILED_VIDEOS_MARKER, SIDECAR_EXTENSION, YEAR_BUCKET_PREFIX};
use crate::error::{Result, TakeoutError};
use crate::journal::{Action, Journal};
use crate::mime::{self, MediaKind};
use crate::walker::Walker;

use asset::{AlbumMembership, BrowseMessage, EmittedAsset};
use matching::ext_of;
use metadata::{read_meta, MetaKind, MetaRecord};

/// Handle into the metadata arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MetaId(usize);

/// Key of the metadata index: capture year, then sidecar base name. The
/// ordering doubles as the solver's iteration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct MetaKey {
    year: i32,
    name: String,
}

/// One media file collected during pass one.
#[derive(Debug)]
struct FileEntry {
    size: u64,
    meta: Option<MetaId>,
}

/// All files of one directory, by base name.
#[derive(Debug, Default)]
struct DirCatalog {
    files: BTreeMap<String, FileEntry>,
}

/// All directories seen by one walker.
type WalkerCatalog = BTreeMap<String, DirCatalog>;

/// Key of the emitted set: base name, byte length, capture year.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FileKey {
    base: String,
    size: u64,
    year: i32,
}

/// A takeout spread over one or more archives. Construction scans every
/// walker once and solves the sidecar association puzzle; `browse` then
/// rewinds the walkers and emits each matched file once.
pub struct Takeout {
    walkers: Vec<Box<dyn Walker>>,
    catalogs: Vec<WalkerCatalog>, // same order as walkers
    metas: Vec<MetaRecord>,       // arena; MetaId indexes into it
    json_by_year: BTreeMap<MetaKey, MetaId>,
    albums: BTreeMap<String, String>, // album title by directory
    uploaded: HashSet<FileKey>,
    journal: Arc<Journal>,
}

impl Takeout {
    pub fn new(
        walkers: Vec<Box<dyn Walker>>,
        journal: Arc<Journal>,
        cancel: &AtomicBool,
    ) -> Result<Self> {
        let catalogs = walkers.iter().map(|_| WalkerCatalog::new()).collect();
        let mut takeout = Takeout {
            walkers,
            catalogs,
            metas: Vec::new(),
            json_by_year: BTreeMap::new(),
            albums: BTreeMap::new(),
            uploaded: HashSet::new(),
            journal,
        };
        takeout.pass_one(cancel)?;
        takeout.solve_puzzle();
        Ok(takeout)
    }

    /// Scan all walkers to build the file catalogs. Sidecar JSON files are
    /// read and kept; media payloads are never opened here.
    fn pass_one(&mut self, cancel: &AtomicBool) -> Result<()> {
        for index in 0..self.walkers.len() {
            log::info!("Scanning the takeout: {}", self.walkers[index].name());
            loop {
                if is_cancelled(cancel) {
                    return Err(TakeoutError::Cancelled);
                }
                let entry = match self.walkers[index].next()? {
                    Some(entry) => entry,
                    None => break,
                };
                let (dir, base) = split_dir_base(&entry.path);
                let ext = ext_of(base).to_lowercase();
                let full_name = format!("{}/{}", self.walkers[index].name(), entry.path);
                self.journal.add_entry(&full_name, Action::DiscoveredFile, "");

                if ext == SIDECAR_EXTENSION {
                    let decoded = read_meta(self.walkers[index].open()?);
                    match decoded {
                        Ok(record) => match record.kind() {
                            MetaKind::Asset => {
                                let comment = format!("asset title: {}", record.title);
                                self.add_json(dir, base, record);
                                self.journal.add_entry(&full_name, Action::Metadata, &comment);
                            }
                            MetaKind::Album => {
                                let comment = format!("album title: {}", record.title);
                                self.albums.insert(dir.to_string(), record.title);
                                self.journal.add_entry(&full_name, Action::Metadata, &comment);
                            }
                            MetaKind::Unknown => {
                                self.journal
                                    .add_entry(&full_name, Action::Error, "unknown JSON file");
                            }
                        },
                        Err(_) => {
                            self.journal
                                .add_entry(&full_name, Action::Error, "unknown JSON file");
                        }
                    }
                } else {
                    match mime::media_type_from_ext(&ext) {
                        Err(_) => {
                            self.journal.add_entry(&full_name, Action::Unsupported, "");
                        }
                        Ok((kind, _)) => {
                            if full_name.contains(FAILED_VIDEOS_MARKER) {
                                self.journal.add_entry(&full_name, Action::FailedVideo, "");
                                continue;
                            }
                            self.catalogs[index]
                                .entry(dir.to_string())
                                .or_default()
                                .files
                                .insert(
                                    base.to_string(),
                                    FileEntry {
                                        size: entry.size,
                                        meta: None,
                                    },
                                );
                            let action = match kind {
                                MediaKind::Image => Action::ScannedImage,
                                MediaKind::Video => Action::ScannedVideo,
                            };
                            self.journal.add_entry(&full_name, action, "");
                        }
                    }
                }
            }
        }
        log::info!("Scanning the takeout, pass one completed");
        Ok(())
    }

    /// Register an asset sidecar. Records sharing base name and capture
    /// year are one logical record: the first decode wins on content, the
    /// rest only contribute their directory.
    fn add_json(&mut self, dir: &str, base: &str, record: MetaRecord) {
        let key = MetaKey {
            year: record.photo_taken_time.year(),
            name: base.to_string(),
        };
        let id = match self.json_by_year.get(&key) {
            Some(&id) => id,
            None => {
                let id = MetaId(self.metas.len());
                self.metas.push(record);
                self.json_by_year.insert(key, id);
                id
            }
        };
        let paths = &mut self.metas[id.0].found_in_paths;
        if !paths.iter().any(|p| p == dir) {
            paths.push(dir.to_string());
        }
    }

    /// Bind every metadata record to the files it describes.
    ///
    /// Candidate files live in the directories the sidecar was found in,
    /// or in the year bucket next to the first of them. Rules run from the
    /// most specific to the broadest over records sorted by capture year
    /// and name; a file binds at most once.
    fn solve_puzzle(&mut self) {
        let metas = &self.metas;
        let catalogs = &mut self.catalogs;
        let journal = &self.journal;
        let walker_names: Vec<&str> = self.walkers.iter().map(|w| w.name()).collect();

        for matcher in matching::MATCHERS {
            for (key, &id) in &self.json_by_year {
                let record = &metas[id.0];
                let mut dirs: BTreeSet<String> =
                    record.found_in_paths.iter().cloned().collect();
                if let Some(first) = record.found_in_paths.first() {
                    dirs.insert(join_dir(
                        parent_dir(first),
                        &format!("{}{}", YEAR_BUCKET_PREFIX, key.year),
                    ));
                }
                for dir in &dirs {
                    for (walker_index, catalog) in catalogs.iter_mut().enumerate() {
                        let Some(dir_catalog) = catalog.get_mut(dir) else {
                            continue;
                        };
                        for (base, file) in dir_catalog.files.iter_mut() {
                            if file.meta.is_none() && matcher(&key.name, base) {
                                journal.add_entry(
                                    &format!(
                                        "{}/{}",
                                        walker_names[walker_index],
                                        join_dir(dir, base)
                                    ),
                                    Action::AssociatedMeta,
                                    &format!("{} ({})", key.name, key.year),
                                );
                                file.meta = Some(id);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Emit every matched file once. This is a blocking producer: run it
    /// on its own thread with a rendezvous channel. Walker failures are
    /// sent in-band and end the stream; dropping the receiver or
    /// cancelling stops it early.
    pub fn browse(&mut self, assets_tx: &Sender<BrowseMessage>, cancel: &AtomicBool) {
        self.uploaded.clear();
        for index in 0..self.walkers.len() {
            if let Err(err) = self.walkers[index].rewind() {
                let _ = send_message(assets_tx, Err(err), cancel);
                return;
            }
            loop {
                if is_cancelled(cancel) {
                    return;
                }
                let entry = match self.walkers[index].next() {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(err) => {
                        log::error!("can't browse {}: {}", self.walkers[index].name(), err);
                        let _ = send_message(assets_tx, Err(err), cancel);
                        return;
                    }
                };
                let (dir, base) = split_dir_base(&entry.path);
                if mime::media_type_from_ext(ext_of(base)).is_err() {
                    continue;
                }
                let full_name = format!("{}/{}", self.walkers[index].name(), entry.path);
                let Some(file) = self.catalogs[index]
                    .get(dir)
                    .and_then(|catalog| catalog.files.get(base))
                else {
                    // this file isn't a cataloged asset
                    continue;
                };
                let Some(id) = file.meta else {
                    self.journal
                        .add_entry(&full_name, Action::Error, "no JSON file found for this file");
                    continue;
                };
                let record = &self.metas[id.0];
                let key = FileKey {
                    base: base.to_string(),
                    size: entry.size,
                    year: record.photo_taken_time.year(),
                };
                if self.uploaded.contains(&key) {
                    self.journal.add_entry(&full_name, Action::LocalDuplicate, "");
                    continue;
                }
                let asset = build_asset(record, &self.albums, &key);
                match send_message(assets_tx, Ok(asset), cancel) {
                    SendOutcome::Sent => {
                        self.uploaded.insert(key);
                    }
                    SendOutcome::Stopped => return,
                }
            }
        }
    }

    /// Close every walker.
    pub fn close(&mut self) -> Result<()> {
        for walker in &mut self.walkers {
            walker.close()?;
        }
        Ok(())
    }
}

enum SendOutcome {
    Sent,
    Stopped,
}

/// Push one message, polling the cancel flag while the channel is full.
fn send_message(
    tx: &Sender<BrowseMessage>,
    message: BrowseMessage,
    cancel: &AtomicBool,
) -> SendOutcome {
    let mut pending = message;
    loop {
        if is_cancelled(cancel) {
            return SendOutcome::Stopped;
        }
        match tx.send_timeout(pending, Duration::from_millis(100)) {
            Ok(()) => return SendOutcome::Sent,
            Err(SendTimeoutError::Timeout(message)) => pending = message,
            Err(SendTimeoutError::Disconnected(_)) => return SendOutcome::Stopped,
        }
    }
}

/// Build the outgoing record. The title keeps the sidecar's stem but must
/// carry the actual file's extension; a mismatched title loses up to two
/// trailing extensions before the file's one is appended.
fn build_asset(
    record: &MetaRecord,
    albums: &BTreeMap<String, String>,
    key: &FileKey,
) -> EmittedAsset {
    let file_ext = ext_of(&key.base).to_string();
    let mut title = record.title.clone();
    let title_ext = ext_of(&title).to_string();
    if title_ext != file_ext {
        title.truncate(title.len() - title_ext.len());
        let title_ext = ext_of(&title).to_string();
        if title_ext != file_ext {
            title.truncate(title.len() - title_ext.len());
            title.push_str(&file_ext);
        }
    }

    let memberships = record
        .found_in_paths
        .iter()
        .filter_map(|path| {
            albums.get(path).map(|name| AlbumMembership {
                path: path.clone(),
                name: name.clone(),
            })
        })
        .collect();

    EmittedAsset {
        file_name: key.base.clone(),
        file_size: key.size,
        title,
        description: record.description.clone(),
        latitude: record.geo_data_exif.latitude,
        longitude: record.geo_data_exif.longitude,
        altitude: record.geo_data_exif.altitude,
        archived: record.archived,
        trashed: record.trashed,
        favorited: record.favorited,
        from_partner: record.is_partner(),
        date_taken: record.photo_taken_time.time(),
        albums: memberships,
    }
}

/// Split an archive path into directory and base name. The directory of a
/// root-level entry is the empty string.
fn split_dir_base(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

fn join_dir(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}
