// Takeout Ingest - library entry point

pub mod cancel;
pub mod constants;
pub mod error;
pub mod journal;
pub mod mime;
pub mod takeout;
pub mod walker;

pub use error::{Result, TakeoutError};
pub use journal::{Action, Journal};
pub use takeout::asset::{AlbumMembership, BrowseMessage, EmittedAsset};
pub use takeout::Takeout;
pub use walker::{open_path, EntryKind, WalkEntry, Walker};
