/*-
 * Copyright 2003-2005 Colin Percival
 * Copyright 2012 Matthew Endsley
 * All rights reserved
 *
 * Redistribution and use in source and binary forms, with or without
 * modification, are permitted providing that the following conditions
 * are met:
 * 1. Redistributions of source code must retain the above copyright
 *    notice, this list of conditions and the following disclaimer.
 * 2. Redistributions in binary form must reproduce the above copyright
 *    notice, this list of conditions and the following disclaimer in the
 *    documentation and/or other materials provided with the distribution.
 *
 * THIS SOFTWARE IS PROVIDED BY THE AUTHOR ``AS IS'' AND ANY EXPRESS OR
 * IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE IMPLIED
 * WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE
 * ARE DISCLAIMED.  IN NO EVENT SHALL THE AUTHOR BE LIABLE FOR ANY
 * DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
 * DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS
 * OR SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION)
 * HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT,
 * STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING
 * IN ANY WAY OUT OF THE USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE
 * POSSIBILITY OF SUCH DAMAGE.
 */

//! The Patcher: decodes the control-triple/diff/extra record stream and
//! reconstructs NEW in place into a caller-supplied, exactly-sized buffer.

use std::io::Read;

use crate::error::{BsdiffError, Result};
use crate::int_codec::{self, ENCODED_LEN};
use crate::stream;

/// Applies a patch body to `old`, writing the reconstructed NEW into `new`
/// (whose length *is* `newsize`). Reads the body only — the caller is
/// expected to have already consumed the 24-byte header and sized `new`
/// accordingly. See [`patch_stream`] for a convenience wrapper that reads
/// the header itself.
pub fn patch<R: Read>(old: &[u8], new: &mut [u8], reader: &mut R) -> Result<()> {
    let newsize = new.len();
    let mut oldpos: i64 = 0;
    let mut newpos: usize = 0;

    while newpos < newsize {
        let mut buf = [0u8; 3 * ENCODED_LEN];
        reader
            .read_exact(&mut buf)
            .map_err(|e| truncated_or_io(e, "control triple"))?;

        let diff_len = int_codec::decode_i64((&buf[0..8]).try_into().unwrap());
        let extra_len = int_codec::decode_i64((&buf[8..16]).try_into().unwrap());
        let old_seek = int_codec::decode_i64((&buf[16..24]).try_into().unwrap());

        if diff_len < 0 || extra_len < 0 {
            return Err(BsdiffError::CorruptPatch(format!(
                "negative control length: diff={diff_len}, extra={extra_len}"
            )));
        }
        if diff_len > stream::MAX_CHUNK as i64 || extra_len > stream::MAX_CHUNK as i64 {
            return Err(BsdiffError::CorruptPatch(format!(
                "control length exceeds {} byte limit",
                stream::MAX_CHUNK
            )));
        }

        let diff_len = diff_len as usize;
        let extra_len = extra_len as usize;

        if newpos + diff_len > newsize {
            return Err(BsdiffError::CorruptPatch(
                "diff segment would write past NEW's declared size".into(),
            ));
        }
        reader
            .read_exact(&mut new[newpos..newpos + diff_len])
            .map_err(|e| truncated_or_io(e, "diff payload"))?;

        for i in 0..diff_len {
            let op = oldpos + i as i64;
            if op >= 0 && (op as usize) < old.len() {
                new[newpos + i] = new[newpos + i].wrapping_add(old[op as usize]);
            }
        }
        newpos += diff_len;
        oldpos += diff_len as i64;

        if newpos + extra_len > newsize {
            return Err(BsdiffError::CorruptPatch(
                "extra segment would write past NEW's declared size".into(),
            ));
        }
        reader
            .read_exact(&mut new[newpos..newpos + extra_len])
            .map_err(|e| truncated_or_io(e, "extra payload"))?;
        newpos += extra_len;

        oldpos += old_seek;
    }

    Ok(())
}

/// Reads the 24-byte patch header from `reader`, allocates an
/// exactly-sized output buffer, applies the body, and returns NEW.
pub fn patch_stream<R: Read>(old: &[u8], reader: &mut R) -> Result<Vec<u8>> {
    let new_size = stream::read_header(reader)?;
    let mut new = vec![0u8; new_size as usize];
    patch(old, &mut new, reader)?;
    Ok(new)
}

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
    use crate::differ;

    #[test]
    fn rejects_negative_control_length() {
        let old = b"hello";
        let mut ctrl = [0u8; 24];
        ctrl[0] = 1;
        ctrl[7] = 0x80; // sign bit set: diff_len = -1
        let mut new = vec![0u8; 4];
        let mut reader: &[u8] = &ctrl;
        assert!(patch(old, &mut new, &mut reader).is_err());
    }

    #[test]
    fn rejects_control_writing_past_newsize() {
        let old = b"hello";
        let mut ctrl = [0u8; 24];
        ctrl[0] = 100; // diff_len = 100, way past a 4-byte NEW
        let mut new = vec![0u8; 4];
        let mut reader: &[u8] = &ctrl;
        assert!(patch(old, &mut new, &mut reader).is_err());
    }

    #[test]
    fn rejects_truncated_control_data() {
        let old = b"hello";
        let ctrl = [0u8; 10]; // short of 24 bytes
        let mut new = vec![0u8; 4];
        let mut reader: &[u8] = &ctrl;
        assert!(patch(old, &mut new, &mut reader).is_err());
    }

    #[test]
    fn patch_stream_round_trips_through_header() {
        let old = b"the quick brown fox";
        let new = b"the slow brown fox jumps";
        let mut body = Vec::new();
        differ::diff_stream(old, new, &mut body).unwrap();
        let mut reader: &[u8] = &body;
        let result = patch_stream(old, &mut reader).unwrap();
        assert_eq!(result, new);
    }

    #[test]
    fn malformed_first_triple_exceeding_newsize_is_rejected_before_writing() {
        let old = b"abc";
        let newsize: i64 = 3;
        let mut body = Vec::new();
        stream::write_header(&mut body, newsize).unwrap();
        let mut ctrl = [0u8; 24];
        int_codec::encode_i64(newsize + 1, (&mut ctrl[0..8]).try_into().unwrap()).unwrap();
        body.extend_from_slice(&ctrl);
        let mut reader: &[u8] = &body;
        assert!(patch_stream(old, &mut reader).is_err());
    }
}
