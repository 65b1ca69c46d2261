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

//! The Differ: segments NEW into approximate matches against OLD's suffix
//! array and emits the control-triple/diff/extra record stream.

use std::io::Write;

use crate::error::Result;
use crate::int_codec::{self, ENCODED_LEN};
use crate::stream;
use crate::suffix_array::SuffixArray;

/// The reference's hardcoded greedy-extension break threshold.
pub const DEFAULT_DISMATCH_THRESHOLD: usize = 8;

/// Default size of the reusable scratch buffer used to stream diff/extra
/// payloads, mirroring `hucsmn-qbsdiff`'s `buffer_size` tunable.
pub const DEFAULT_SCRATCH_CHUNK_SIZE: usize = 16384;

/// Tunables for [`diff_with_options`] / [`diff_stream_with_options`].
#[derive(Debug, Clone, Copy)]
pub struct DifferOptions {
    /// Break the greedy match-extension loop once a new candidate's length
    /// exceeds the previous alignment's score by more than this amount.
    pub dismatch_threshold: usize,
    /// Size of the scratch buffer used when computing/streaming diff and
    /// extra payloads.
    pub scratch_chunk_size: usize,
}

impl Default for DifferOptions {
    fn default() -> Self {
        DifferOptions {
            dismatch_threshold: DEFAULT_DISMATCH_THRESHOLD,
            scratch_chunk_size: DEFAULT_SCRATCH_CHUNK_SIZE,
        }
    }
}

/// Diffs `old` against `new`, writing the body (control triples, diff
/// payloads, extra payloads) to `writer`. Does **not** write the 16-byte
/// magic or the NEW-size header — see [`diff_stream`] for that.
pub fn diff<W: Write>(old: &[u8], new: &[u8], writer: &mut W) -> Result<()> {
    diff_with_options(old, new, writer, DifferOptions::default())
}

/// Like [`diff`], but with tunable greedy-extension and scratch-buffer
/// parameters (see [`DifferOptions`]).
pub fn diff_with_options<W: Write>(
    old: &[u8],
    new: &[u8],
    writer: &mut W,
    options: DifferOptions,
) -> Result<()> {
    let suffix_array = SuffixArray::build(old)?;
    run(old, new, &suffix_array, writer, options)
}

/// Diffs `old` against `new`, first writing the 24-byte patch header (magic
/// plus NEW's size) and then the body, as a single self-framed stream.
pub fn diff_stream<W: Write>(old: &[u8], new: &[u8], writer: &mut W) -> Result<()> {
    diff_stream_with_options(old, new, writer, DifferOptions::default())
}

/// Like [`diff_stream`], with tunable [`DifferOptions`].
pub fn diff_stream_with_options<W: Write>(
    old: &[u8],
    new: &[u8],
    writer: &mut W,
    options: DifferOptions,
) -> Result<()> {
    stream::write_header(writer, new.len() as i64)?;
    diff_with_options(old, new, writer, options)
}

fn run<W: Write>(
    old: &[u8],
    new: &[u8],
    sa: &SuffixArray,
    writer: &mut W,
    options: DifferOptions,
) -> Result<()> {
    let mut scratch = Vec::with_capacity(options.scratch_chunk_size.min(new.len().max(1)));

    let mut scan = 0usize;
    let mut len = 0usize;
    let mut pos = 0usize;
    let mut lastscan = 0usize;
    let mut lastpos = 0usize;
    let mut lastoffset = 0isize;

    while scan < new.len() {
        let mut oldscore = 0usize;
        scan += len;
        let mut scsc = scan;

        // Mirrors the teacher's `for(scsc=scan+=len; scan<newsize; scan++)`:
        // the entry guard must be checked *before* the body runs, so that
        // when the carried-over `len` pushes `scan` to `new.len()` the loop
        // body (and its `search` call, which would otherwise clobber the
        // carried `len`/`pos` with a search over the empty suffix) never
        // executes at all.
        while scan < new.len() {
            let (p, l) = sa.search(old, &new[scan..]);
            pos = p;
            len = l;

            while scsc < scan + len {
                if (scsc as isize + lastoffset) >= 0
                    && (scsc as isize + lastoffset) < old.len() as isize
                    && old[(scsc as isize + lastoffset) as usize] == new[scsc]
                {
                    oldscore += 1;
                }
                scsc += 1;
            }

            if (len == oldscore && len != 0) || len > oldscore + options.dismatch_threshold {
                break;
            }

            if (scan as isize + lastoffset) >= 0
                && (scan as isize + lastoffset) < old.len() as isize
                && old[(scan as isize + lastoffset) as usize] == new[scan]
            {
                oldscore -= 1;
            }
            scan += 1;
        }

        if len != oldscore || scan == new.len() {
            emit_segment(
                old,
                new,
                writer,
                &mut scratch,
                scan,
                pos,
                &mut lastscan,
                &mut lastpos,
                &mut lastoffset,
            )?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn emit_segment<W: Write>(
    old: &[u8],
    new: &[u8],
    writer: &mut W,
    scratch: &mut Vec<u8>,
    scan: usize,
    pos: usize,
    lastscan: &mut usize,
    lastpos: &mut usize,
    lastoffset: &mut isize,
) -> Result<()> {
    // Forward extension: grow the previous segment forward, scoring by
    // `2 * matches - length`.
    let mut s = 0isize;
    let mut best_score = 0isize;
    let mut lenf = 0usize;
    let mut i = 0usize;
    while *lastscan + i < scan && *lastpos + i < old.len() {
        if old[*lastpos + i] == new[*lastscan + i] {
            s += 1;
        }
        i += 1;
        if s * 2 - i as isize > best_score * 2 - lenf as isize {
            best_score = s;
            lenf = i;
        }
    }

    // Backward extension: grow the new match backward, same scoring.
    let mut lenb = 0usize;
    if scan < new.len() {
        let mut s = 0isize;
        let mut best_score = 0isize;
        let mut i = 1usize;
        while scan >= *lastscan + i && pos >= i {
            if old[pos - i] == new[scan - i] {
                s += 1;
            }
            if s * 2 - i as isize > best_score * 2 - lenb as isize {
                best_score = s;
                lenb = i;
            }
            i += 1;
        }
    }

    // Overlap resolution between the two extensions.
    if *lastscan + lenf > scan - lenb {
        let overlap = (*lastscan + lenf) - (scan - lenb);
        let mut s = 0isize;
        let mut best_score = 0isize;
        let mut split_at = 0usize;
        for i in 0..overlap {
            if new[*lastscan + lenf - overlap + i] == old[*lastpos + lenf - overlap + i] {
                s += 1;
            }
            if new[scan - lenb + i] == old[pos - lenb + i] {
                s -= 1;
            }
            if s > best_score {
                best_score = s;
                split_at = i + 1;
            }
        }
        lenf = lenf + split_at - overlap;
        lenb -= split_at;
    }

    let diff_len = lenf as i64;
    let extra_len = (scan - lenb) as i64 - (*lastscan + lenf) as i64;
    let old_seek = (pos - lenb) as i64 - (*lastpos + lenf) as i64;

    let mut ctrl = [0u8; 3 * ENCODED_LEN];
    int_codec::encode_i64(diff_len, (&mut ctrl[0..8]).try_into().unwrap())?;
    int_codec::encode_i64(extra_len, (&mut ctrl[8..16]).try_into().unwrap())?;
    int_codec::encode_i64(old_seek, (&mut ctrl[16..24]).try_into().unwrap())?;
    stream::write_chunked(writer, &ctrl)?;

    scratch.clear();
    scratch.extend(
        new[*lastscan..*lastscan + lenf]
            .iter()
            .zip(&old[*lastpos..*lastpos + lenf])
            .map(|(n, o)| n.wrapping_sub(*o)),
    );
    stream::write_chunked(writer, scratch)?;

    let extra_start = *lastscan + lenf;
    let extra_end = scan - lenb;
    stream::write_chunked(writer, &new[extra_start..extra_end])?;

    *lastscan = scan - lenb;
    *lastpos = pos - lenb;
    *lastoffset = pos as isize - scan as isize;

    Ok(())
}
