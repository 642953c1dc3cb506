// Sidecar JSON decoding
//
// Takeout writes one JSON sidecar per asset and one per album folder. The
// two are told apart positionally: an asset sidecar carries a `url` field,
// an album sidecar carries a `date` field. The export stores objects in
// those fields, so what matters is that the field is present, not what it
// holds.

use std::io::Read;

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

use crate::error::Result;

/// How a sidecar classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKind {
    Asset,
    Album,
    Unknown,
}

/// One decoded sidecar. Fields absent from the JSON decode to their zero
/// values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetaRecord {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "date")]
    pub date_present: FieldPresence,
    #[serde(rename = "photoTakenTime")]
    pub photo_taken_time: TimeObject,
    #[serde(rename = "geoDataExif")]
    pub geo_data_exif: GeoData,
    pub trashed: bool,
    pub archived: bool,
    #[serde(rename = "url")]
    pub url_present: FieldPresence,
    pub favorited: bool,
    #[serde(rename = "googlePhotosOrigin")]
    pub google_photos_origin: PhotosOrigin,
    /// Directories this record was seen in. Not part of the JSON; filled
    /// during the scan, duplicate-free, in discovery order.
    #[serde(skip)]
    pub found_in_paths: Vec<String>,
}

impl MetaRecord {
    pub fn kind(&self) -> MetaKind {
        if self.url_present.0 {
            MetaKind::Asset
        } else if self.date_present.0 {
            MetaKind::Album
        } else {
            MetaKind::Unknown
        }
    }

    pub fn is_asset(&self) -> bool {
        self.kind() == MetaKind::Asset
    }

    pub fn is_album(&self) -> bool {
        self.kind() == MetaKind::Album
    }

    pub fn is_partner(&self) -> bool {
        self.google_photos_origin.from_partner_sharing.0
    }
}

/// Marks a field that was lexically present in the JSON, whatever its
/// value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldPresence(pub bool);

impl<'de> Deserialize<'de> for FieldPresence {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        IgnoredAny::deserialize(deserializer)?;
        Ok(FieldPresence(true))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhotosOrigin {
    #[serde(rename = "fromPartnerSharing")]
    pub from_partner_sharing: FieldPresence,
}

/// GPS coordinates of the capture; all zero when absent.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct GeoData {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Capture instant, recorded by the export as epoch seconds in a decimal
/// string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimeObject {
    pub timestamp: String,
}

impl TimeObject {
    /// The instant in the local timezone. An unparseable timestamp counts
    /// as the epoch.
    pub fn time(&self) -> DateTime<Local> {
        let secs = self.timestamp.parse::<i64>().unwrap_or(0);
        Utc.timestamp_opt(secs, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
            .with_timezone(&Local)
    }

    /// Capture year in the local timezone, the year half of catalog keys.
    pub fn year(&self) -> i32 {
        self.time().year()
    }
}

/// Decode one sidecar from an entry stream.
pub fn read_meta<R: Read>(reader: R) -> Result<MetaRecord> {
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_positional() {
        let asset: MetaRecord = serde_json::from_str(
            r#"{"title":"a.jpg","url":{"value":"https://photos.google.com/x"}}"#,
        )
        .unwrap();
        assert_eq!(asset.kind(), MetaKind::Asset);

        let album: MetaRecord =
            serde_json::from_str(r#"{"title":"Holidays","date":{"timestamp":"0"}}"#).unwrap();
        assert_eq!(album.kind(), MetaKind::Album);

        let unknown: MetaRecord = serde_json::from_str(r#"{"title":"stray"}"#).unwrap();
        assert_eq!(unknown.kind(), MetaKind::Unknown);

        // url wins over date when both are present
        let both: MetaRecord =
            serde_json::from_str(r#"{"title":"x","url":{},"date":{}}"#).unwrap();
        assert_eq!(both.kind(), MetaKind::Asset);
    }

    #[test]
    fn test_presence_is_detected_for_any_value() {
        for value in ["{}", "\"\"", "0", "false", "null", "[]"] {
            let json = format!(r#"{{"title":"a.jpg","url":{}}}"#, value);
            let record: MetaRecord = serde_json::from_str(&json).unwrap();
            assert!(record.is_asset(), "url holding {} must still classify", value);
        }
    }

    #[test]
    fn test_partner_flag() {
        let record: MetaRecord = serde_json::from_str(
            r#"{"title":"a.jpg","url":{},"googlePhotosOrigin":{"fromPartnerSharing":{}}}"#,
        )
        .unwrap();
        assert!(record.is_partner());

        let record: MetaRecord = serde_json::from_str(r#"{"title":"a.jpg","url":{}}"#).unwrap();
        assert!(!record.is_partner());
    }

    #[test]
    fn test_capture_time_from_epoch_string() {
        let record: MetaRecord = serde_json::from_str(
            r#"{"title":"a.jpg","url":{},"photoTakenTime":{"timestamp":"1695393876","formatted":"ignored"}}"#,
        )
        .unwrap();
        assert_eq!(record.photo_taken_time.year(), 2023);

        let empty = TimeObject::default();
        assert_eq!(empty.time().timestamp(), 0);
    }

    #[test]
    fn test_missing_fields_decode_to_zero_values() {
        let record: MetaRecord = serde_json::from_str(r#"{"url":{}}"#).unwrap();
        assert_eq!(record.title, "");
        assert_eq!(record.description, "");
        assert_eq!(record.geo_data_exif.latitude, 0.0);
        assert!(!record.trashed);
        assert!(!record.archived);
        assert!(!record.favorited);
    }

    #[test]
    fn test_geo_and_flags_pass_through() {
        let record: MetaRecord = serde_json::from_str(
            r#"{
                "title":"a.jpg","url":{},
                "geoDataExif":{"latitude":48.85,"longitude":2.35,"altitude":35.0},
                "trashed":true,"archived":true,"favorited":true
            }"#,
        )
        .unwrap();
        assert_eq!(record.geo_data_exif.latitude, 48.85);
        assert_eq!(record.geo_data_exif.longitude, 2.35);
        assert!(record.trashed && record.archived && record.favorited);
    }
}
