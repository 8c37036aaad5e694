//! Length-prefixed record framing.
//!
//! Every record in a table buffer is an unsigned LEB128 varint byte length
//! followed by exactly that many payload bytes. These helpers read and write that
//! framing without looking inside the payload. They are panic-free: every length
//! is checked against the buffer before it is sliced.

use prost::encoding::{decode_varint, encode_varint, encoded_len_varint};

use crate::error::{PbTableError, Phase};

/// The location of one record inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFrame {
    /// Offset of the length prefix.
    pub offset: usize,
    /// Size of the varint length prefix in bytes.
    pub prefix_len: usize,
    /// Declared payload length in bytes.
    pub payload_len: usize,
}

impl RecordFrame {
    pub fn payload_start(&self) -> usize {
        self.offset + self.prefix_len
    }

    /// Offset of the first byte after this record.
    pub fn end(&self) -> usize {
        self.payload_start() + self.payload_len
    }

    pub fn payload<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.payload_start()..self.end()]
    }
}

/// Appends `payload` to `out` behind its varint length prefix.
pub fn write_record(payload: &[u8], out: &mut Vec<u8>) {
    out.reserve(encoded_len_varint(payload.len() as u64) + payload.len());
    encode_varint(payload.len() as u64, out);
    out.extend_from_slice(payload);
}

/// Checks a payload about to be written against the limit `read_frame` will
/// later enforce on it.
pub fn check_record_len(payload_len: usize, max_record_len: usize) -> Result<(), String> {
    if payload_len > max_record_len {
        return Err(format!(
            "record of {} bytes exceeds the maximum of {}",
            payload_len, max_record_len
        ));
    }
    Ok(())
}

/// Reads the length prefix at `offset` and validates that the whole record lies
/// inside `buf`.
pub fn read_frame(
    buf: &[u8],
    offset: usize,
    phase: Phase,
    max_record_len: usize,
) -> Result<RecordFrame, PbTableError> {
    let rest = buf
        .get(offset..)
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| PbTableError::format(phase, offset, "unexpected end of buffer"))?;

    let mut cursor = rest;
    let declared = decode_varint(&mut cursor).map_err(|e| {
        PbTableError::format(phase, offset, format!("invalid length prefix: {}", e))
    })?;
    let prefix_len = rest.len() - cursor.len();

    let payload_len = usize::try_from(declared)
        .ok()
        .filter(|&len| len <= max_record_len)
        .ok_or_else(|| {
            PbTableError::format(
                phase,
                offset,
                format!(
                    "declared record length {} exceeds the maximum of {}",
                    declared, max_record_len
                ),
            )
        })?;

    if payload_len > cursor.len() {
        return Err(PbTableError::format(
            phase,
            offset,
            format!(
                "record of {} bytes extends beyond the end of the buffer ({} bytes left)",
                payload_len,
                cursor.len()
            ),
        ));
    }

    Ok(RecordFrame {
        offset,
        prefix_len,
        payload_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 1 << 20;

    #[test]
    fn test_write_then_read_frame() {
        let mut buf = vec![0xAA]; // leading byte so the frame starts at offset 1
        let payload = vec![7u8; 300];
        write_record(&payload, &mut buf);

        let frame = read_frame(&buf, 1, Phase::Row, MAX).unwrap();
        assert_eq!(frame.prefix_len, 2); // 300 needs two varint bytes
        assert_eq!(frame.payload_len, 300);
        assert_eq!(frame.end(), buf.len());
        assert_eq!(frame.payload(&buf), payload.as_slice());
    }

    #[test]
    fn test_truncated_payload_is_rejected() {
        let mut buf = Vec::new();
        write_record(&[1, 2, 3, 4], &mut buf);
        buf.truncate(3);
        let err = read_frame(&buf, 0, Phase::Index, MAX).unwrap_err();
        assert!(matches!(err, PbTableError::Format { phase: Phase::Index, offset: 0, .. }));
    }

    #[test]
    fn test_oversized_length_is_rejected() {
        let mut buf = Vec::new();
        write_record(&[0u8; 64], &mut buf);
        let err = read_frame(&buf, 0, Phase::Header, 16).unwrap_err();
        assert!(err.to_string().contains("exceeds the maximum"));
    }

    #[test]
    fn test_write_limit_matches_read_limit() {
        assert!(check_record_len(16, 16).is_ok());
        let reason = check_record_len(17, 16).unwrap_err();
        assert!(reason.contains("exceeds the maximum of 16"));

        let mut buf = Vec::new();
        write_record(&[0u8; 16], &mut buf);
        assert!(read_frame(&buf, 0, Phase::Row, 16).is_ok());
    }

    #[test]
    fn test_read_past_end_is_rejected() {
        let err = read_frame(&[0x01, 0x00], 2, Phase::Row, MAX).unwrap_err();
        assert!(err.to_string().contains("unexpected end of buffer"));
    }

    #[test]
    fn test_unterminated_varint_is_rejected() {
        let err = read_frame(&[0xFF, 0xFF], 0, Phase::Header, MAX).unwrap_err();
        assert!(err.to_string().contains("invalid length prefix"));
    }
}
