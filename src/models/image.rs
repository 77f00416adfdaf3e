//! Represents an image persisted by the camera ingest endpoints.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

/// Prefix of every assigned image name.
pub const IMAGE_NAME_PREFIX: &str = "IMG_";

/// Extension of every assigned image name. The camera posts JPEG frames.
pub const IMAGE_NAME_SUFFIX: &str = ".jpg";

/// Metadata for a single stored image.
///
/// The name doubles as the identity: `IMG_<unix-seconds>.jpg`, assigned at
/// upload time. Because timestamps are fixed-width decimal seconds, sorting
/// names lexicographically sorts them chronologically. Two uploads landing in
/// the same second share a name and the later write replaces the earlier one.
#[derive(Serialize, Clone, Debug)]
pub struct StoredImage {
    /// Timestamp-derived name, unique per second.
    pub name: String,

    /// Content type inferred from the name's extension.
    pub content_type: Option<String>,

    /// Payload size in bytes.
    pub size_bytes: i64,

    /// Upload instant, recovered from the name where possible.
    pub stored_at: DateTime<Utc>,
}

impl StoredImage {
    /// Build the canonical name for an upload at the given unix second.
    pub fn timestamped_name(unix_seconds: i64) -> String {
        format!("{IMAGE_NAME_PREFIX}{unix_seconds}{IMAGE_NAME_SUFFIX}")
    }

    /// Assign a name for an upload happening now.
    pub fn name_for_now() -> String {
        Self::timestamped_name(Utc::now().timestamp())
    }

    /// Recover the upload instant embedded in a timestamped name.
    ///
    /// Returns `None` for names that do not follow the
    /// `IMG_<unix-seconds>.jpg` format. Callers fall back to backend
    /// modification time in that case.
    pub fn stored_at_from_name(name: &str) -> Option<DateTime<Utc>> {
        let seconds = name
            .strip_prefix(IMAGE_NAME_PREFIX)?
            .strip_suffix(IMAGE_NAME_SUFFIX)?;
        let seconds: i64 = seconds.parse().ok()?;
        Utc.timestamp_opt(seconds, 0).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_embeds_unix_seconds() {
        assert_eq!(
            StoredImage::timestamped_name(1_700_000_000),
            "IMG_1700000000.jpg"
        );
    }

    #[test]
    fn stored_at_round_trips_through_name() {
        let name = StoredImage::timestamped_name(1_700_000_000);
        let stored_at = StoredImage::stored_at_from_name(&name).unwrap();
        assert_eq!(stored_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn stored_at_rejects_foreign_names() {
        assert!(StoredImage::stored_at_from_name("notes.txt").is_none());
        assert!(StoredImage::stored_at_from_name("IMG_abc.jpg").is_none());
        assert!(StoredImage::stored_at_from_name("IMG_1700000000.png").is_none());
    }

    #[test]
    fn fixed_width_timestamps_sort_chronologically() {
        let older = StoredImage::timestamped_name(1_700_000_000);
        let newer = StoredImage::timestamped_name(1_700_000_001);
        assert!(newer > older);
    }
}
