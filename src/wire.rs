//! Cookie wire-format codec for touch records.
//!
//! Records are stored in the client-held cookie as delimiter-separated
//! text, optionally wrapped in base64 for transport:
//!
//! # Format
//!
//! ```text
//! record := name '|' type '|' timestamp
//! cookie := record ('/' record)*
//!
//! Example: spring-sale|visit|1525972663761/launch|email|1525972663790
//!
//! timestamp: decimal integer milliseconds since epoch
//! ```
//!
//! The format has no escaping. Campaign names are free text controlled by
//! whoever builds the inbound link, so `/` and `|` can legitimately appear
//! inside a name. [`decode`] reconstructs such names heuristically: a
//! chunk with fewer than three fields is assumed to be a fragment of a
//! name containing `/` and is merged forward into the next chunk; a chunk
//! with more than three fields is assumed to hold a name containing `|`,
//! so everything but the last two fields is re-joined as the name.
//!
//! This greedy left-to-right policy is compatibility-bound: previously
//! issued cookies were written without escaping, so the exact merge rules
//! must be preserved. A name shaped like a short record followed by `/`
//! can still be misparsed; that is an inherent limitation of the format,
//! not a decoder bug. `decode(encode(x)) == x` holds only when no field
//! contains either delimiter.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::debug;

use crate::constants::{FIELD_SEPARATOR, RECORD_SEPARATOR};
use crate::touch::TouchRecord;

/// Transport wrapping applied to the encoded cookie value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Raw delimiter-separated text.
    Plain,
    /// Standard base64 over the delimiter-separated text. Default, since
    /// campaign names routinely contain characters that are unsafe in a
    /// cookie value.
    #[default]
    Base64,
}

/// Decode a raw cookie value into touch records.
///
/// Never fails: empty or unparseable input yields an empty vec, and a
/// truncated final record is produced with empty fields and no timestamp
/// rather than dropped. Duplicate `(name, type)` pairs are passed through
/// as-is; deduplication happens in [`crate::touch::upsert`] only.
///
/// Base64 transport is auto-detected regardless of the configured encode
/// transport, so a deployment can switch transports without invalidating
/// cookies already in the wild.
#[must_use]
pub fn decode(raw: &str) -> Vec<TouchRecord> {
    let text = unwrap_transport(raw);
    if text.is_empty() {
        return Vec::new();
    }

    let chunks: Vec<&str> = text.split(RECORD_SEPARATOR).collect();
    let last = chunks.len() - 1;

    let mut records = Vec::new();
    let mut pending: Option<String> = None;
    for (i, chunk) in chunks.iter().enumerate() {
        // Re-join fragments of a name that contained the record separator.
        let candidate = match pending.take() {
            Some(prefix) => format!("{prefix}{RECORD_SEPARATOR}{chunk}"),
            None => (*chunk).to_string(),
        };

        // Too few fields means the name itself contained '/': merge this
        // chunk into the next one. The last chunk finalizes as-is, even
        // when incomplete.
        if candidate.split(FIELD_SEPARATOR).count() < 3 && i < last {
            pending = Some(candidate);
            continue;
        }

        records.push(parse_record(&candidate));
    }

    records
}

/// Encode touch records into a raw cookie value.
///
/// Timestamps encode as base-10 milliseconds; a missing timestamp (only
/// reachable when the caller skipped the expiry filter on corrupt input)
/// encodes as an empty field.
#[must_use]
pub fn encode(records: &[TouchRecord], transport: Transport) -> String {
    let plain = records
        .iter()
        .map(|record| {
            let timestamp = record
                .timestamp
                .map(|t| t.to_string())
                .unwrap_or_default();
            format!(
                "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
                record.name, record.kind, timestamp
            )
        })
        .collect::<Vec<_>>()
        .join(&RECORD_SEPARATOR.to_string());

    match transport {
        Transport::Plain => plain,
        Transport::Base64 => BASE64.encode(plain),
    }
}

/// Undo base64 transport wrapping if the value is recognized as such.
///
/// Recognition requires both a clean base64 parse and valid UTF-8 in the
/// decoded bytes; anything else falls back to treating the input as
/// already-decoded text. A plain value that happens to satisfy both is
/// misread as transport-wrapped; this matches the historical decoder and
/// is an accepted limitation.
fn unwrap_transport(raw: &str) -> String {
    match BASE64.decode(raw) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                debug!("cookie decoded to non-text bytes, treating as plain");
                raw.to_string()
            }
        },
        Err(_) => raw.to_string(),
    }
}

/// Split a finalized chunk into a record.
///
/// Three fields map directly. More than three means the name contained
/// '|': everything but the last two fields is the name. Fewer than three
/// is genuinely truncated data; missing fields default to empty and the
/// timestamp stays absent, which the expiry filter treats as expired.
fn parse_record(chunk: &str) -> TouchRecord {
    let fields: Vec<&str> = chunk.split(FIELD_SEPARATOR).collect();
    match fields.len() {
        3 => TouchRecord {
            name: fields[0].to_string(),
            kind: fields[1].to_string(),
            timestamp: parse_timestamp(fields[2]),
        },
        n if n > 3 => TouchRecord {
            name: fields[..n - 2].join(&FIELD_SEPARATOR.to_string()),
            kind: fields[n - 2].to_string(),
            timestamp: parse_timestamp(fields[n - 1]),
        },
        _ => TouchRecord {
            name: fields.first().copied().unwrap_or_default().to_string(),
            kind: fields.get(1).copied().unwrap_or_default().to_string(),
            timestamp: None,
        },
    }
}

/// Parse a decimal millisecond timestamp. Non-numeric or negative input
/// yields `None`, which downstream filtering treats as already expired so
/// garbage data is never resurrected.
fn parse_timestamp(field: &str) -> Option<i64> {
    field.parse::<i64>().ok().filter(|t| *t >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(text: &str) -> String {
        BASE64.encode(text)
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode("").is_empty());
    }

    #[test]
    fn test_decode_single_record() {
        let records = decode("spring-sale|visit|1525972663761");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "spring-sale");
        assert_eq!(records[0].kind, "visit");
        assert_eq!(records[0].timestamp, Some(1_525_972_663_761));
    }

    #[test]
    fn test_decode_pipe_inside_name() {
        let records = decode(&b64("te|stname|visit|1525972663761"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "te|stname");
        assert_eq!(records[0].kind, "visit");
        assert_eq!(records[0].timestamp, Some(1_525_972_663_761));
    }

    #[test]
    fn test_decode_slash_inside_names() {
        let records = decode(&b64(
            "te/stname|visit|1525972663790/testname/2|visit|1525972663792",
        ));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "te/stname");
        assert_eq!(records[1].name, "testname/2");
    }

    #[test]
    fn test_decode_mixed_delimiters_three_records() {
        let records = decode(&b64(
            "testn/a|me|visit|1525972663793/testname2|visit|1525972663793/test/name3|visit|1525972663795",
        ));
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "testn/a|me");
        assert_eq!(records[1].name, "testname2");
        assert_eq!(records[2].name, "test/name3");
    }

    #[test]
    fn test_decode_mixed_delimiters_four_records() {
        let records = decode(&b64(
            "test/name|visit|1525972663797/te/stn|ame2|visit|1525972663797/tes|tname/3|visit|1525972663797/test/name4|visit|1525972663798",
        ));
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].name, "test/name");
        assert_eq!(records[1].name, "te/stn|ame2");
        assert_eq!(records[2].name, "tes|tname/3");
        assert_eq!(records[3].name, "test/name4");
    }

    #[test]
    fn test_decode_empty_type() {
        let records = decode(&b64("testname||1525972663761"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "testname");
        assert_eq!(records[0].kind, "");
        assert_eq!(records[0].timestamp, Some(1_525_972_663_761));
    }

    #[test]
    fn test_decode_truncated_final_chunk() {
        let records = decode("testname|visit|1525972663761/leftover");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "leftover");
        assert_eq!(records[1].kind, "");
        assert_eq!(records[1].timestamp, None);
    }

    #[test]
    fn test_decode_two_field_final_chunk() {
        let records = decode("a|b");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a");
        assert_eq!(records[0].kind, "b");
        assert_eq!(records[0].timestamp, None);
    }

    #[test]
    fn test_decode_merged_final_chunk_still_short() {
        // Both chunks are short; they merge and finalize incomplete.
        let records = decode("a/b");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a/b");
        assert_eq!(records[0].kind, "");
        assert_eq!(records[0].timestamp, None);
    }

    #[test]
    fn test_decode_non_numeric_timestamp() {
        let records = decode("testname|visit|garbage");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, None);
    }

    #[test]
    fn test_decode_negative_timestamp_rejected() {
        let records = decode("testname|visit|-5");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, None);
    }

    #[test]
    fn test_decode_invalid_base64_falls_back_to_plain() {
        // '|' and '/' arrangements that are not valid base64 parse as text.
        let records = decode("testname|visit|1525972663761");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "testname");
    }

    #[test]
    fn test_decode_base64_of_non_utf8_falls_back() {
        // "//4AAQ==": decodes cleanly but is not text, so the raw string
        // is parsed as plain wire format instead.
        let raw = BASE64.encode([0xff, 0xfe, 0x00, 0x01]);
        let records = decode(&raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "//4AAQ==");
        assert_eq!(records[0].timestamp, None);
    }

    #[test]
    fn test_encode_plain() {
        let records = vec![
            TouchRecord::new("spring-sale", "visit", 100),
            TouchRecord::new("launch", "email", 200),
        ];
        assert_eq!(
            encode(&records, Transport::Plain),
            "spring-sale|visit|100/launch|email|200"
        );
    }

    #[test]
    fn test_encode_base64() {
        let records = vec![TouchRecord::new("spring-sale", "visit", 100)];
        assert_eq!(
            encode(&records, Transport::Base64),
            b64("spring-sale|visit|100")
        );
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode(&[], Transport::Plain), "");
        assert_eq!(encode(&[], Transport::Base64), "");
    }

    #[test]
    fn test_encode_missing_timestamp() {
        let records = vec![TouchRecord {
            name: "x".to_string(),
            kind: "y".to_string(),
            timestamp: None,
        }];
        assert_eq!(encode(&records, Transport::Plain), "x|y|");
    }

    #[test]
    fn test_roundtrip_clean_names() {
        let records = vec![
            TouchRecord::new("spring-sale", "visit", 1_525_972_663_761),
            TouchRecord::new("launch", "", 1_525_972_663_790),
        ];
        for transport in [Transport::Plain, Transport::Base64] {
            assert_eq!(decode(&encode(&records, transport)), records);
        }
    }

    #[test]
    fn test_base64_and_plain_decode_identically() {
        let text = "te/stname|visit|1525972663790/testname/2|visit|1525972663792";
        assert_eq!(decode(text), decode(&b64(text)));
    }
}
