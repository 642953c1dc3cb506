// Emitted asset payload

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::Result;

/// Album a file belongs to, named after the album sidecar of `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumMembership {
    pub path: String,
    pub name: String,
}

/// One matched media file, ready for a downstream consumer. The title is
/// the sidecar's original name reconciled to the actual file extension.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmittedAsset {
    pub file_name: String,
    pub file_size: u64,
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub archived: bool,
    pub trashed: bool,
    pub favorited: bool,
    pub from_partner: bool,
    pub date_taken: DateTime<Local>,
    pub albums: Vec<AlbumMembership>,
}

/// What the browse channel carries: assets, or a walker failure delivered
/// in-band right before the stream closes.
pub type BrowseMessage = Result<EmittedAsset>;
