// Scan journal: per-file diagnostics and per-action counters

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// What happened to one file during a scan or an emit pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    DiscoveredFile,
    ScannedImage,
    ScannedVideo,
    Discarded,
    Uploaded,
    Error,
    LocalDuplicate,
    FailedVideo,
    Unsupported,
    Metadata,
    AssociatedMeta,
    Info,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::DiscoveredFile => "File",
            Action::ScannedImage => "Scanned image",
            Action::ScannedVideo => "Scanned video",
            Action::Discarded => "Discarded",
            Action::Uploaded => "Uploaded",
            Action::Error => "Error",
            Action::LocalDuplicate => "Local duplicate",
            Action::FailedVideo => "Failed video",
            Action::Unsupported => "File type not supported",
            Action::Metadata => "Metadata files",
            Action::AssociatedMeta => "Associated with metadata",
            Action::Info => "Info",
        };
        f.write_str(label)
    }
}

/// Diagnostics sink shared by the scan and emit passes. Entries go to the
/// log as they happen; counts accumulate for the final report.
#[derive(Debug, Default)]
pub struct Journal {
    counts: Mutex<HashMap<Action, u64>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&self, file: &str, action: Action, comment: &str) {
        match action {
            Action::Error => log::error!("{:<25}: {}: {}", action.to_string(), file, comment),
            Action::Uploaded | Action::ScannedImage | Action::ScannedVideo => {
                log::info!("{:<25}: {}: {}", action.to_string(), file, comment)
            }
            _ => log::debug!("{:<25}: {}: {}", action.to_string(), file, comment),
        }
        let mut counts = self.counts.lock().unwrap();
        *counts.entry(action).or_insert(0) += 1;
    }

    /// Number of entries recorded for one action.
    pub fn count(&self, action: Action) -> u64 {
        let counts = self.counts.lock().unwrap();
        counts.get(&action).copied().unwrap_or(0)
    }

    /// Log the per-action totals of the run.
    pub fn report(&self) {
        log::info!("Scan report:");
        log::info!("{:6} files", self.count(Action::DiscoveredFile));
        log::info!("{:6} photos", self.count(Action::ScannedImage));
        log::info!("{:6} videos", self.count(Action::ScannedVideo));
        log::info!("{:6} metadata files", self.count(Action::Metadata));
        log::info!(
            "{:6} files having a type not supported",
            self.count(Action::Unsupported)
        );
        log::info!(
            "{:6} discarded files because in folder failed videos",
            self.count(Action::FailedVideo)
        );
        log::info!("{:6} errors", self.count(Action::Error));
        log::info!("{:6} files with metadata", self.count(Action::AssociatedMeta));
        log::info!(
            "{:6} discarded files because duplicated in the input",
            self.count(Action::LocalDuplicate)
        );
        log::info!("{:6} uploaded files", self.count(Action::Uploaded));
        log::info!(
            "{:6} discarded files because of options",
            self.count(Action::Discarded)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate() {
        let journal = Journal::new();
        journal.add_entry("a.jpg", Action::DiscoveredFile, "");
        journal.add_entry("a.jpg", Action::ScannedImage, "");
        journal.add_entry("b.mp4", Action::DiscoveredFile, "");
        assert_eq!(journal.count(Action::DiscoveredFile), 2);
        assert_eq!(journal.count(Action::ScannedImage), 1);
        assert_eq!(journal.count(Action::Error), 0);
    }
}
