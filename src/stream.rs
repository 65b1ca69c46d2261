//! The byte-stream plumbing shared by the Differ and the Patcher: chunked
//! writes that never hand the underlying writer more than `i32::MAX` bytes
//! in a single call, and the 24-byte patch header (16-byte magic plus the
//! NEW size) that wraps the otherwise-opaque body.

use std::io::{Read, Write};

use crate::error::{BsdiffError, Result};
use crate::int_codec::{self, ENCODED_LEN};

/// ASCII magic identifying this crate's patch format.
pub const MAGIC: &[u8; 16] = b"ENDSLEY/BSDIFF43";

/// Largest single write the reference's 32-bit `write` callback can accept.
pub const MAX_CHUNK: usize = i32::MAX as usize;

/// Writes `buf` in chunks no larger than [`MAX_CHUNK`], matching the
/// reference's `writedata` loop. A short or failing inner write propagates
/// immediately; nothing is retried.
pub fn write_chunked<W: Write + ?Sized>(writer: &mut W, mut buf: &[u8]) -> Result<()> {
    while !buf.is_empty() {
        let chunk_len = buf.len().min(MAX_CHUNK);
        writer.write_all(&buf[..chunk_len])?;
        buf = &buf[chunk_len..];
    }
    Ok(())
}

/// Writes the 24-byte header: the magic followed by NEW's size encoded as a
/// big-endian sign-magnitude i64.
pub fn write_header<W: Write + ?Sized>(writer: &mut W, new_size: i64) -> Result<()> {
    debug_assert!(new_size >= 0, "NEW size must never be negative");
    writer.write_all(MAGIC)?;
    let mut buf = [0u8; ENCODED_LEN];
    int_codec::encode_i64(new_size, &mut buf)?;
    writer.write_all(&buf)?;
    Ok(())
}

/// Reads and validates the 24-byte header, returning the NEW size it
/// declares. Rejects a truncated header, a wrong magic, and a negative size.
pub fn read_header<R: Read + ?Sized>(reader: &mut R) -> Result<i64> {
    let mut header = [0u8; 16 + ENCODED_LEN];
    reader
        .read_exact(&mut header)
        .map_err(|e| truncated_or_io(e, "patch header"))?;

    if &header[..16] != MAGIC {
        return Err(BsdiffError::CorruptPatch(
            "invalid magic (expected ENDSLEY/BSDIFF43)".into(),
        ));
    }

    let mut size_buf = [0u8; ENCODED_LEN];
    size_buf.copy_from_slice(&header[16..]);
    let new_size = int_codec::decode_i64(&size_buf);
    if new_size < 0 {
        return Err(BsdiffError::CorruptPatch("negative NEW size in header".into()));
    }
    Ok(new_size)
}

/// Classifies a short/EOF read against an otherwise generic I/O error into
/// the corrupt-patch bucket, since a truncated header is a data problem, not
/// a transport one.
fn truncated_or_io(e: std::io::Error, what: &str) -> BsdiffError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        BsdiffError::CorruptPatch(format!("truncated {what}"))
    } else {
        BsdiffError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_round_trips() {
        let mut buf = Vec::new();
        write_header(&mut buf, 1234).unwrap();
        assert_eq!(&buf[..16], MAGIC);
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_header(&mut cursor).unwrap(), 1234);
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut buf = vec![0u8; 24];
        buf[..16].copy_from_slice(b"NOT-A-BSDIFF-HDR");
        let mut cursor = Cursor::new(buf);
        assert!(matches!(
            read_header(&mut cursor),
            Err(BsdiffError::CorruptPatch(_))
        ));
    }

    #[test]
    fn rejects_truncated_header() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        assert!(read_header(&mut cursor).is_err());
    }

    #[test]
    fn rejects_negative_size() {
        let mut buf = Vec::new();
        write_header(&mut buf, 5).unwrap();
        buf[23] |= 0x80; // flip the encoded size negative in place
        let mut cursor = Cursor::new(buf);
        assert!(matches!(
            read_header(&mut cursor),
            Err(BsdiffError::CorruptPatch(_))
        ));
    }

    #[test]
    fn write_chunked_handles_empty_and_small_buffers() {
        let mut buf = Vec::new();
        write_chunked(&mut buf, b"").unwrap();
        assert!(buf.is_empty());
        write_chunked(&mut buf, b"hello").unwrap();
        assert_eq!(buf, b"hello");
    }
}
