// Takeout ingest constants

/// Prefix of the per-year folders the exporter moves media into.
/// A full bucket name is `Photos from 2022`.
pub const YEAR_BUCKET_PREFIX: &str = "Photos from ";

/// Path marker for videos Google could not process. Files under such a
/// path are discarded during the scan.
pub const FAILED_VIDEOS_MARKER: &str = "Failed Videos";

/// Extension of the metadata sidecars, lowercased.
pub const SIDECAR_EXTENSION: &str = ".json";

// Image extensions (accepted capture and export formats)
pub const IMAGE_EXTENSIONS: [&str; 18] = [
    "jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp",
    "heic", "heif", "avif", "dng", "raw", "arw", "nef", "cr2",
    "srw", "insp",
];

// Video extensions
pub const VIDEO_EXTENSIONS: [&str; 14] = [
    "mp4", "mov", "avi", "mkv", "mts", "m2ts", "mpg", "mpeg",
    "wmv", "webm", "3gp", "m4v", "ts", "insv",
];

// Tar walker streaming
pub const TAR_CHUNK_SIZE: usize = 64 * 1024;
pub const TAR_CHUNK_QUEUE: usize = 8;
