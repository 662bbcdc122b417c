// 💾 Persistence Codec - family collection <-> durable blob
//
// Blob layout:
//   <sha256 hex of payload>\n<JSON array of groups>
//
// A bare JSON array (no digest line) is accepted on read. Anything that does
// not decode - missing, truncated, tampered, not UTF-8 - reads as an empty
// collection. Decoding never fails the caller.
//
// Encoding refuses non-finite numbers, so a bad value can never replace the
// last good blob with one that reads back empty.

use sha2::{Digest, Sha256};

use crate::entities::VehicleGroup;
use crate::error::{Result, StoreError};

const DIGEST_LEN: usize = 64;

/// Hex SHA-256 of the JSON payload
pub fn payload_digest(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    format!("{:x}", hasher.finalize())
}

/// Reject values that serde_json would silently write as `null`
fn check_finite(groups: &[VehicleGroup]) -> Result<()> {
    for member in groups.iter().flat_map(|g| g.members.iter()) {
        let field = if !member.unit_value.is_finite() {
            "unit_value"
        } else if !member.usage.is_finite() {
            "usage"
        } else {
            continue;
        };
        return Err(StoreError::NonFinite {
            member_id: member.id,
            field,
        });
    }
    Ok(())
}

/// Encode a family's groups into a blob
pub fn encode(groups: &[VehicleGroup]) -> Result<Vec<u8>> {
    check_finite(groups)?;
    let payload = serde_json::to_vec(groups).map_err(StoreError::Encode)?;
    let digest = payload_digest(&payload);

    let mut blob = Vec::with_capacity(DIGEST_LEN + 1 + payload.len());
    blob.extend_from_slice(digest.as_bytes());
    blob.push(b'\n');
    blob.extend_from_slice(&payload);

    Ok(blob)
}

/// Decode a blob, reporting why it could not be read
pub fn try_decode(blob: &[u8]) -> Result<Vec<VehicleGroup>> {
    let payload = match blob.iter().position(|b| *b == b'\n') {
        Some(DIGEST_LEN) => {
            let (header, rest) = blob.split_at(DIGEST_LEN);
            let expected = std::str::from_utf8(header)
                .map_err(|e| StoreError::Decode(format!("digest is not utf-8: {}", e)))?;
            let payload = &rest[1..];
            let found = payload_digest(payload);

            if !expected.eq_ignore_ascii_case(&found) {
                return Err(StoreError::ChecksumMismatch {
                    expected: expected.to_string(),
                    found,
                });
            }
            payload
        }
        // Bare JSON (pretty-printed arrays contain newlines too)
        _ => blob,
    };

    serde_json::from_slice(payload).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Decode a blob; absent or corrupt data yields an empty collection
pub fn decode(blob: Option<&[u8]>) -> Vec<VehicleGroup> {
    match blob {
        None => Vec::new(),
        Some(bytes) => try_decode(bytes).unwrap_or_default(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
