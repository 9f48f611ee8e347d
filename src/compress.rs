//! Variable-byte compression of postings lists.
//!
//! A postings list is serialized as interleaved `[delta, tf]` pairs, where
//! the document indices are delta-encoded (first value as-is, then gaps) and
//! every integer is VByte-encoded: seven payload bits per byte, high bit set
//! on every byte except the last.

use crate::base::{DocIndex, IndexError, Posting, Result};

/// Appends one VByte-encoded integer.
pub fn encode_vbyte(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Reads one VByte-encoded integer starting at `*pos`, advancing `*pos` past
/// it. Truncated or over-long encodings fail with `CorruptIndex`.
pub fn decode_vbyte(data: &[u8], pos: &mut usize) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = *data.get(*pos).ok_or_else(|| {
            IndexError::CorruptIndex("truncated VByte integer in postings data".into())
        })?;
        *pos += 1;

        if shift >= 64 || (shift == 63 && (byte & 0x7F) > 1) {
            return Err(IndexError::CorruptIndex(
                "VByte integer exceeds 64 bits".into(),
            ));
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

/// Serializes a postings list (sorted by ascending `doc_index`).
pub fn encode_postings(postings: &[Posting]) -> Vec<u8> {
    // 1-2 bytes per integer is typical for dense corpora
    let mut out = Vec::with_capacity(postings.len() * 4);
    let mut prev: DocIndex = 0;
    for posting in postings {
        encode_vbyte(&mut out, posting.doc_index - prev);
        encode_vbyte(&mut out, u64::from(posting.term_freq));
        prev = posting.doc_index;
    }
    out
}

/// Decodes exactly `df` postings from `data`.
///
/// The byte range must contain the postings and nothing else; short data,
/// trailing bytes, non-increasing document indices, or a zero term frequency
/// all fail with `CorruptIndex`.
pub fn decode_postings(data: &[u8], df: usize) -> Result<Vec<Posting>> {
    // a posting takes at least two bytes, so df can never exceed the range
    if df > data.len() {
        return Err(IndexError::CorruptIndex(format!(
            "{} postings cannot fit in {} bytes",
            df,
            data.len()
        )));
    }
    let mut postings = Vec::with_capacity(df);
    let mut pos = 0usize;
    let mut prev: DocIndex = 0;

    for ix in 0..df {
        let delta = decode_vbyte(data, &mut pos)?;
        if ix > 0 && delta == 0 {
            return Err(IndexError::CorruptIndex(
                "postings list is not strictly increasing".into(),
            ));
        }
        let doc_index = prev.checked_add(delta).ok_or_else(|| {
            IndexError::CorruptIndex("document index overflows 64 bits".into())
        })?;
        prev = doc_index;

        let term_freq = decode_vbyte(data, &mut pos)?;
        if term_freq == 0 {
            return Err(IndexError::CorruptIndex(
                "posting with zero term frequency".into(),
            ));
        }
        let term_freq = u32::try_from(term_freq).map_err(|_| {
            IndexError::CorruptIndex("term frequency exceeds 32 bits".into())
        })?;

        postings.push(Posting {
            doc_index,
            term_freq,
        });
    }

    if pos != data.len() {
        return Err(IndexError::CorruptIndex(format!(
            "{} trailing bytes after {} postings",
            data.len() - pos,
            df
        )));
    }

    Ok(postings)
}
