//! Persisted Entry Codec
//!
//! `TigerStyle`: One tag byte, bounded envelope, every decode failure is corruption.
//!
//! # Format
//!
//! ```text
//! [tag: u8][body]
//!   tag 0 (plain): body = JSON envelope
//!   tag 1 (lz4):   body = lz4_flex size-prepended block of the JSON envelope
//! ```
//!
//! The envelope carries `data`, `created_at_ms`, `expires_at_ms` and
//! `priority`. Hit counts and access times are memory-only.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{PersistenceError, PersistenceResult};
use crate::cache::{CacheEntry, Priority};
use crate::constants::{CODEC_ENVELOPE_BYTES_MAX, CODEC_TAG_LZ4, CODEC_TAG_PLAIN};

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    data: &'a T,
    created_at_ms: u64,
    expires_at_ms: u64,
    priority: Priority,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
    created_at_ms: u64,
    expires_at_ms: u64,
    priority: Priority,
}

/// Encode an entry for the durable store.
///
/// The envelope is LZ4-compressed when `compress` is set and the JSON is at
/// least `threshold_bytes` long.
///
/// # Errors
/// Returns `Encode` if serialization fails or the envelope is too large.
pub fn encode_entry<T: Serialize>(
    entry: &CacheEntry<T>,
    compress: bool,
    threshold_bytes: usize,
) -> PersistenceResult<Vec<u8>> {
    let envelope = EnvelopeRef {
        data: &entry.data,
        created_at_ms: entry.created_at_ms,
        expires_at_ms: entry.expires_at_ms,
        priority: entry.priority,
    };
    let json = serde_json::to_vec(&envelope).map_err(|e| PersistenceError::encode(e.to_string()))?;

    if json.len() > CODEC_ENVELOPE_BYTES_MAX {
        return Err(PersistenceError::encode(format!(
            "envelope is {} bytes, max {CODEC_ENVELOPE_BYTES_MAX}",
            json.len()
        )));
    }

    let (tag, body) = if compress && json.len() >= threshold_bytes {
        (CODEC_TAG_LZ4, lz4_flex::compress_prepend_size(&json))
    } else {
        (CODEC_TAG_PLAIN, json)
    };

    let mut bytes = Vec::with_capacity(body.len() + 1);
    bytes.push(tag);
    bytes.extend_from_slice(&body);

    // Postcondition
    assert!(!bytes.is_empty(), "encoded entry must carry a tag");
    Ok(bytes)
}

/// Decode an entry previously written by [`encode_entry`].
///
/// `size_bytes` is recomputed from the payload so it matches a fresh write.
///
/// # Errors
/// Returns `Corrupted` for an unknown tag, a bad LZ4 block, invalid JSON or
/// inconsistent timestamps.
pub fn decode_entry<T>(key: &str, bytes: &[u8]) -> PersistenceResult<CacheEntry<T>>
where
    T: Serialize + DeserializeOwned,
{
    let (&tag, body) = bytes
        .split_first()
        .ok_or_else(|| PersistenceError::corrupted("empty payload"))?;

    let json = match tag {
        CODEC_TAG_PLAIN => body.to_vec(),
        CODEC_TAG_LZ4 => decompress(body)?,
        other => {
            return Err(PersistenceError::corrupted(format!("unknown codec tag {other}")));
        }
    };

    let envelope: Envelope<T> =
        serde_json::from_slice(&json).map_err(|e| PersistenceError::corrupted(e.to_string()))?;

    if envelope.expires_at_ms <= envelope.created_at_ms {
        return Err(PersistenceError::corrupted(format!(
            "expires_at {} not after created_at {}",
            envelope.expires_at_ms, envelope.created_at_ms
        )));
    }

    let size_bytes = serde_json::to_vec(&envelope.data)
        .map_err(|e| PersistenceError::corrupted(e.to_string()))?
        .len();

    Ok(CacheEntry {
        key: key.to_string(),
        data: envelope.data,
        created_at_ms: envelope.created_at_ms,
        expires_at_ms: envelope.expires_at_ms,
        priority: envelope.priority,
        size_bytes,
        hit_count: 0,
        last_accessed_ms: envelope.created_at_ms,
        insert_seq: 0,
        access_seq: 0,
    })
}

fn decompress(body: &[u8]) -> PersistenceResult<Vec<u8>> {
    let prefix: [u8; 4] = body
        .get(..4)
        .and_then(|p| p.try_into().ok())
        .ok_or_else(|| PersistenceError::corrupted("lz4 block missing size prefix"))?;
    let declared = u32::from_le_bytes(prefix) as usize;
    if declared > CODEC_ENVELOPE_BYTES_MAX {
        return Err(PersistenceError::corrupted(format!(
            "lz4 block declares {declared} bytes, max {CODEC_ENVELOPE_BYTES_MAX}"
        )));
    }

    lz4_flex::decompress_size_prepended(body)
        .map_err(|e| PersistenceError::corrupted(format!("lz4 decompression failed: {e}")))
}
