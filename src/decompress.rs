//! The decoder half of the bitstream contract (spec §4.4-§4.5 inverted).
//! Not part of the core compression algorithm the spec scopes out, but
//! shipped alongside it (as the teacher ships `expand` next to `compress`
//! for every format it supports) so the round-trip property is a testable
//! contract of this crate, not an external assumption.

use crate::container;
use crate::lz_coder::{
    context_id, decode_number, LzCoderState, CONTEXT_GROUP_LENGTH, CONTEXT_GROUP_OFFSET, CONTEXT_KIND,
    CONTEXT_REPEATED, NUM_CONTEXTS,
};
use crate::Error;
use std::io::{Cursor, Read, Seek, Write};

const ADJUST_SHIFT: u32 = 5;
const TOP: u32 = 0x8000;
const WINDOW_BITS: u32 = 16;
const WINDOW_MASK: u32 = 0xFFFF;

/// Mirrors `entropy::range::RangeCoder`'s probability model and
/// renormalization exactly, but reads bits instead of writing them.
struct RangeDecoder<'a> {
    data: &'a [u8],
    bit_pos: usize,
    intervalsize: u32,
    code: u32,
    probs: Vec<u16>,
}

impl<'a> RangeDecoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        let mut dec = Self {
            data,
            bit_pos: 0,
            intervalsize: WINDOW_MASK,
            code: 0,
            probs: vec![0x8000u16; NUM_CONTEXTS],
        };
        for _ in 0..WINDOW_BITS {
            dec.code = (dec.code << 1) | dec.next_bit();
        }
        dec
    }

    fn next_bit(&mut self) -> u32 {
        let byte = self.bit_pos / 8;
        let bit = if byte < self.data.len() {
            (self.data[byte] >> (7 - (self.bit_pos % 8))) & 1
        } else {
            0
        };
        self.bit_pos += 1;
        bit as u32
    }

    fn decode(&mut self, context: i32) -> u32 {
        let idx = context as usize;
        let p = self.probs[idx] as u32;
        let threshold = ((self.intervalsize as u64 * p as u64) >> WINDOW_BITS) as u32;
        let bit;
        if self.code < threshold {
            bit = 1;
            self.intervalsize = threshold;
            self.probs[idx] = (p + ((0xffffu32 >> ADJUST_SHIFT) - (p >> ADJUST_SHIFT))) as u16;
        } else {
            bit = 0;
            self.code -= threshold;
            self.intervalsize -= threshold;
            self.probs[idx] = (p - (p >> ADJUST_SHIFT)) as u16;
        }
        while self.intervalsize < TOP {
            self.code = (self.code << 1) | self.next_bit();
            self.intervalsize <<= 1;
        }
        bit
    }
}

/// Inverts `lz_coder::{encode_literal,encode_reference,finish}` against a
/// freshly range-decoded bit source, stopping at the terminator reference
/// (decoded offset field `2`, i.e. offset `0`).
pub fn decompress_body(data: &[u8], expected_len: usize, parity_context: bool) -> Result<Vec<u8>, Error> {
    let parity_mask = if parity_context { 1 } else { 0 };
    let mut dec = RangeDecoder::new(data);
    let mut state = LzCoderState::default();
    let mut out: Vec<u8> = Vec::with_capacity(expected_len);

    loop {
        let parity_offset = state.parity_offset(parity_mask);
        let is_ref = state.after_first && dec.decode(context_id(CONTEXT_KIND, parity_offset)) == 1;

        if !is_ref {
            let mut context_state: u32 = 1;
            for _ in 0..8 {
                let bit = dec.decode(1 + ((parity_offset as u32) | context_state) as i32);
                context_state = (context_state << 1) | bit;
            }
            out.push((context_state & 0xFF) as u8);
            state.after_first = true;
            state.prev_was_ref = false;
            state.parity = state.parity.wrapping_add(1);
        } else {
            let repeated = !state.prev_was_ref && dec.decode(context_id(CONTEXT_REPEATED, 0)) == 1;
            let offset = if repeated {
                state.last_offset
            } else {
                let n = decode_number(context_id(CONTEXT_GROUP_OFFSET << 8, 0), |ctx| dec.decode(ctx));
                if n < 2 {
                    return Err(Error::CorruptStream);
                }
                n - 2
            };
            if offset == 0 {
                break;
            }
            let length = decode_number(context_id(CONTEXT_GROUP_LENGTH << 8, 0), |ctx| dec.decode(ctx));
            if length < 2 || offset as usize > out.len() {
                return Err(Error::CorruptStream);
            }
            let start = out.len() - offset as usize;
            for i in 0..length as usize {
                let b = out[start + i];
                out.push(b);
            }
            state.after_first = true;
            state.prev_was_ref = true;
            state.parity = state.parity.wrapping_add(length);
            state.last_offset = offset;
        }
        if out.len() > expected_len {
            return Err(Error::CorruptStream);
        }
    }

    if out.len() != expected_len {
        return Err(Error::CorruptStream);
    }
    Ok(out)
}

/// Expand a whole container (header + bitstream) held in memory.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut cursor = Cursor::new(data);
    let header = container::read_header(&mut cursor)?;
    let body = &data[container::HEADER_SIZE..];
    decompress_body(body, header.uncompressed_size as usize, header.parity_context)
}

/// Expand `src` (a container produced by `compress`) into `dst`.
pub fn expand<R: Read + Seek, W: Write + Seek>(src: &mut R, dst: &mut W) -> Result<(u64, u64), Error> {
    let header = container::read_header(src)?;
    let mut body = Vec::new();
    src.read_to_end(&mut body)?;
    let compressed_len = body.len();
    let out = decompress_body(&body, header.uncompressed_size as usize, header.parity_context)?;
    dst.write_all(&out)?;
    Ok(((container::HEADER_SIZE + compressed_len) as u64, out.len() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::RangeCoder;
    use crate::lz_coder::{encode_literal, encode_reference, finish, Coder};

    #[test]
    fn decodes_literal_only_stream() {
        let mut rc = RangeCoder::new();
        let mut state = LzCoderState::default();
        for &b in b"hi" {
            encode_literal(&mut rc, b, &mut state, 0);
        }
        finish(&mut rc, &mut state, 0);
        let bytes = rc.into_bytes();
        let out = decompress_body(&bytes, 2, false).unwrap();
        assert_eq!(out, b"hi");
    }

    #[test]
    fn decodes_literal_then_reference() {
        let mut rc = RangeCoder::new();
        let mut state = LzCoderState::default();
        encode_literal(&mut rc, b'a', &mut state, 0);
        encode_literal(&mut rc, b'b', &mut state, 0);
        encode_reference(&mut rc, 2, 4, &mut state, 0);
        finish(&mut rc, &mut state, 0);
        let bytes = rc.into_bytes();
        let out = decompress_body(&bytes, 6, false).unwrap();
        assert_eq!(out, b"ababab");
    }
}
