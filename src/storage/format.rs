//! The on-disk record layout shared by the mmap storage variant.
//!
//! Bit-exact layout: an 84-byte header followed by `dimension * 8` bytes of
//! little-endian `f64` payload.
//!
//! ```text
//! offset  size  field
//! 0       64    identifier, UTF-8, null-padded
//! 64      4     dimension (u32 LE); 0 marks a tombstone
//! 68      4     data length in bytes (u32 LE)
//! 72      8     timestamp, unix millis (i64 LE)
//! 80      4     checksum (u32 LE)
//! 84      dim*8 payload, f64 LE
//! ```

use crate::error::{Error, Result};
use crate::record::VectorRecord;

/// Bytes reserved for the identifier field.
pub const ID_LEN: usize = 64;
/// Total header size in bytes.
pub const HEADER_LEN: usize = ID_LEN + 4 + 4 + 8 + 4;

/// A decoded header, without its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Identifier, with trailing NUL padding stripped.
    pub id: String,
    /// Embedding dimension. Zero marks a tombstone.
    pub dimension: u32,
    /// Payload length in bytes (`dimension * 8` for a live record).
    pub data_len: u32,
    /// Unix-millis timestamp.
    pub timestamp: i64,
    /// Additive checksum over the payload bytes.
    pub checksum: u32,
}

impl Header {
    /// Whether this header marks a tombstoned (logically deleted) record.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.dimension == 0
    }
}

/// Computes the additive checksum over raw payload bytes: the sum of every
/// byte lane, wrapping on overflow.
#[must_use]
pub fn checksum(payload: &[u8]) -> u32 {
    payload.iter().fold(0u32, |acc, &b| acc.wrapping_add(u32::from(b)))
}

/// Encodes `record`'s header into an `HEADER_LEN`-byte buffer.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the identifier exceeds
/// [`ID_LEN`] bytes once UTF-8 encoded.
pub fn encode_header(record: &VectorRecord, payload: &[u8]) -> Result<[u8; HEADER_LEN]> {
    let id_bytes = record.id.as_bytes();
    if id_bytes.len() > ID_LEN {
        return Err(Error::InvalidArgument(format!(
            "identifier '{}' exceeds {} bytes",
            record.id, ID_LEN
        )));
    }
    let mut buf = [0u8; HEADER_LEN];
    buf[..id_bytes.len()].copy_from_slice(id_bytes);
    buf[ID_LEN..ID_LEN + 4].copy_from_slice(&(record.dimension() as u32).to_le_bytes());
    buf[ID_LEN + 4..ID_LEN + 8].copy_from_slice(&(payload.len() as u32).to_le_bytes());
    buf[ID_LEN + 8..ID_LEN + 16].copy_from_slice(&record.created_at.to_le_bytes());
    buf[ID_LEN + 16..ID_LEN + 20].copy_from_slice(&checksum(payload).to_le_bytes());
    Ok(buf)
}

/// Decodes a header from exactly [`HEADER_LEN`] bytes.
///
/// # Errors
///
/// Returns [`Error::Corrupt`] if the identifier bytes are not valid UTF-8.
pub fn decode_header(buf: &[u8]) -> Result<Header> {
    debug_assert!(buf.len() >= HEADER_LEN);
    let id_raw = &buf[..ID_LEN];
    let end = id_raw.iter().position(|&b| b == 0).unwrap_or(ID_LEN);
    let id = std::str::from_utf8(&id_raw[..end])
        .map_err(|e| Error::Corrupt(format!("non-UTF-8 identifier: {e}")))?
        .to_string();
    let dimension = u32::from_le_bytes(buf[ID_LEN..ID_LEN + 4].try_into().unwrap());
    let data_len = u32::from_le_bytes(buf[ID_LEN + 4..ID_LEN + 8].try_into().unwrap());
    let timestamp = i64::from_le_bytes(buf[ID_LEN + 8..ID_LEN + 16].try_into().unwrap());
    let checksum = u32::from_le_bytes(buf[ID_LEN + 16..ID_LEN + 20].try_into().unwrap());
    Ok(Header {
        id,
        dimension,
        data_len,
        timestamp,
        checksum,
    })
}

/// Encodes an embedding as little-endian `f64` payload bytes.
#[must_use]
pub fn encode_payload(embedding: &[f64]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(embedding.len() * 8);
    for x in embedding {
        buf.extend_from_slice(&x.to_le_bytes());
    }
    buf
}

/// Decodes a little-endian `f64` payload back into an embedding.
///
/// # Errors
///
/// Returns [`Error::Corrupt`] if `payload`'s length is not a multiple of 8.
pub fn decode_payload(payload: &[u8]) -> Result<Vec<f64>> {
    if payload.len() % 8 != 0 {
        return Err(Error::Corrupt(format!(
            "payload length {} is not a multiple of 8",
            payload.len()
        )));
    }
    Ok(payload
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
        .collect())
}

/// Builds a zeroed tombstone header for an already-written record, preserving
/// identifier and timestamp but setting `dimension = 0`.
#[must_use]
pub fn tombstone_header(existing: &Header) -> [u8; HEADER_LEN] {
    let mut buf = [0u8; HEADER_LEN];
    let id_bytes = existing.id.as_bytes();
    let n = id_bytes.len().min(ID_LEN);
    buf[..n].copy_from_slice(&id_bytes[..n]);
    // dimension stays zero
    buf[ID_LEN + 8..ID_LEN + 16].copy_from_slice(&existing.timestamp.to_le_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> VectorRecord {
        VectorRecord::new("v1", "docs", vec![1.0, 2.0, 3.0], false, 1000)
    }

    #[test]
    fn header_round_trips() {
        let record = sample_record();
        let payload = encode_payload(&record.embedding);
        let encoded = encode_header(&record, &payload).unwrap();
        let decoded = decode_header(&encoded).unwrap();
        assert_eq!(decoded.id, "v1");
        assert_eq!(decoded.dimension, 3);
        assert_eq!(decoded.data_len, 24);
        assert_eq!(decoded.timestamp, 1000);
        assert_eq!(decoded.checksum, checksum(&payload));
    }

    #[test]
    fn payload_round_trips() {
        let embedding = vec![1.5, -2.25, 0.0, 42.0];
        let bytes = encode_payload(&embedding);
        let decoded = decode_payload(&bytes).unwrap();
        assert_eq!(decoded, embedding);
    }

    #[test]
    fn oversized_identifier_is_rejected() {
        let mut record = sample_record();
        record.id = "x".repeat(ID_LEN + 1);
        let payload = encode_payload(&record.embedding);
        assert!(encode_header(&record, &payload).is_err());
    }

    #[test]
    fn tombstone_header_has_zero_dimension() {
        let record = sample_record();
        let payload = encode_payload(&record.embedding);
        let header = decode_header(&encode_header(&record, &payload).unwrap()).unwrap();
        let tomb = decode_header(&tombstone_header(&header)).unwrap();
        assert!(tomb.is_tombstone());
        assert_eq!(tomb.id, "v1");
    }

    #[test]
    fn malformed_payload_length_is_corrupt() {
        let bad = vec![0u8; 7];
        assert!(decode_payload(&bad).is_err());
    }
}
