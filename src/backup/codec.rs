// Record Codec - Binary encoding of backup records
//
// Layout, in order, all little-endian:
//   name              u64 byte length + UTF-8 bytes
//   source_path       u64 byte length + UTF-8 bytes
//   storage_location  u64 byte length + UTF-8 bytes
//   created_at        i64 microseconds since the Unix epoch
//   last_modified     i64 microseconds since the Unix epoch

use super::types::{BackupError, BackupRecord};
use bincode::Options;

fn encoder() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Serialize a record into its on-disk form.
pub fn encode_record(record: &BackupRecord) -> Result<Vec<u8>, BackupError> {
    encoder()
        .serialize(record)
        .map_err(|e| {
            BackupError::Encode(format!("Failed to encode record {}: {}", record.name, e))
        })
}

/// Parse a record, requiring every field and no trailing bytes.
///
/// The input length bounds every length prefix, so garbage input fails
/// instead of allocating.
pub fn decode_record(bytes: &[u8]) -> Result<BackupRecord, bincode::Error> {
    encoder()
        .with_limit(bytes.len() as u64)
        .deserialize(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn sample() -> BackupRecord {
        BackupRecord {
            name: "docs".to_string(),
            source_path: "/home/u/docs".into(),
            storage_location: "/srv/backups/qWeRtYuIoPaSdFgHjKlZx".into(),
            created_at: Utc.with_ymd_and_hms(2021, 3, 14, 15, 9, 26).unwrap(),
            last_modified: Utc.with_ymd_and_hms(2021, 3, 15, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_field_layout() {
        let record = sample();
        let bytes = encode_record(&record).unwrap();

        assert_eq!(&bytes[0..8], &4u64.to_le_bytes());
        assert_eq!(&bytes[8..12], b"docs");
        assert_eq!(&bytes[12..20], &12u64.to_le_bytes());
        assert_eq!(&bytes[20..32], b"/home/u/docs");

        let tail = &bytes[bytes.len() - 16..];
        assert_eq!(&tail[..8], &record.created_at.timestamp_micros().to_le_bytes());
        assert_eq!(&tail[8..], &record.last_modified.timestamp_micros().to_le_bytes());
    }

    #[test]
    fn test_decode_matches_encode() {
        let record = sample();
        let bytes = encode_record(&record).unwrap();
        assert_eq!(decode_record(&bytes).unwrap(), record);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode_record(&sample()).unwrap();
        bytes.push(0);
        assert!(decode_record(&bytes).is_err());
    }

    #[test]
    fn test_huge_length_prefix_rejected() {
        let mut bytes = u64::MAX.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"garbage");
        assert!(decode_record(&bytes).is_err());
    }

    proptest! {
        #[test]
        fn prop_truncated_record_never_decodes(cut in 0usize..64) {
            let bytes = encode_record(&sample()).unwrap();
            let cut = cut.min(bytes.len() - 1);
            prop_assert!(decode_record(&bytes[..cut]).is_err());
        }
    }
}
