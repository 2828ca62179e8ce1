//! LZ symbol encoder / decoder: the context layout and bit-level procedures
//! that define the bitstream (spec §4.4). Shared by all three entropy
//! back-ends (`entropy::{counting,size_measuring,range}`) through the
//! `Coder` trait, and by `decompress.rs` for the inverse direction.

pub const CONTEXT_KIND: i32 = 0;
pub const CONTEXT_REPEATED: i32 = -1;
pub const CONTEXT_GROUP_OFFSET: i32 = 2;
pub const CONTEXT_GROUP_LENGTH: i32 = 3;

pub const NUM_CONTEXTS: usize = 1025;
/// `1 + (CONTEXT_GROUP_OFFSET << 8)`.
pub const NUMBER_CONTEXT_OFFSET: usize = 513;
pub const NUM_NUMBER_CONTEXTS: usize = 16;

const KIND_LIT: u32 = 0;
const KIND_REF: u32 = 1;

/// A cost/coding capability: `code` commits one bit under a context and
/// reports its fractional size (units of `1/2^BIT_PRECISION` real bits);
/// `encode_number` commits (or costs) the bit-tree described below.
pub trait Coder {
    fn code(&mut self, context: i32, bit: u32) -> u32;
    fn encode_number(&mut self, base_context: i32, n: u32) -> u32 {
        default_encode_number(self, base_context, n)
    }
}

/// Rolling state threaded through a sequence of `encode_literal` /
/// `encode_reference` calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct LzCoderState {
    pub after_first: bool,
    pub prev_was_ref: bool,
    pub parity: u32,
    pub last_offset: u32,
}

impl LzCoderState {
    pub fn parity_offset(&self, parity_mask: u32) -> i32 {
        (((self.parity & parity_mask) << 8) & 0xff00) as i32
    }
}

pub(crate) fn context_id(raw: i32, parity_offset: i32) -> i32 {
    1 + raw + parity_offset
}

pub fn encode_literal<C: Coder + ?Sized>(coder: &mut C, value: u8, state: &mut LzCoderState, parity_mask: u32) -> u32 {
    let parity_offset = state.parity_offset(parity_mask);
    let mut size = 0u32;
    if state.after_first {
        size += coder.code(context_id(CONTEXT_KIND, parity_offset), KIND_LIT);
    }
    let mut context_state: u32 = 1;
    for i in (0..8).rev() {
        let bit = ((value as u32) >> i) & 1;
        size += coder.code(1 + ((parity_offset as u32) | context_state) as i32, bit);
        context_state = (context_state << 1) | bit;
    }
    state.after_first = true;
    state.prev_was_ref = false;
    state.parity = state.parity.wrapping_add(1);
    size
}

pub fn encode_reference<C: Coder + ?Sized>(
    coder: &mut C,
    offset: u32,
    length: u32,
    state: &mut LzCoderState,
    parity_mask: u32,
) -> u32 {
    debug_assert!(state.after_first);
    debug_assert!(length >= 2);
    debug_assert!(offset >= 1);
    let parity_offset = state.parity_offset(parity_mask);
    let mut size = coder.code(context_id(CONTEXT_KIND, parity_offset), KIND_REF);

    let repeated = offset == state.last_offset;
    if !state.prev_was_ref {
        size += coder.code(context_id(CONTEXT_REPEATED, 0), repeated as u32);
    } else {
        debug_assert!(!repeated, "offset must differ from last_offset after a reference");
    }
    if !repeated {
        size += coder.encode_number(context_id(CONTEXT_GROUP_OFFSET << 8, 0), offset + 2);
    }
    size += coder.encode_number(context_id(CONTEXT_GROUP_LENGTH << 8, 0), length);

    state.after_first = true;
    state.prev_was_ref = true;
    state.parity = state.parity.wrapping_add(length);
    state.last_offset = offset;
    size
}

/// Stream terminator: a reference whose decoded offset is `0`.
pub fn finish<C: Coder + ?Sized>(coder: &mut C, state: &mut LzCoderState, parity_mask: u32) -> u32 {
    let parity_offset = state.parity_offset(parity_mask);
    let mut size = coder.code(context_id(CONTEXT_KIND, parity_offset), KIND_REF);
    if !state.prev_was_ref {
        size += coder.code(context_id(CONTEXT_REPEATED, 0), 0);
    }
    size += coder.encode_number(context_id(CONTEXT_GROUP_OFFSET << 8, 0), 2);
    size
}

/// `k` such that `4 << (k-1) <= n < 4 << k` (equivalently, `n`'s bit-length
/// minus 2, for `n >= 2`).
pub(crate) fn number_k(n: u32) -> u32 {
    debug_assert!(n >= 2);
    31 - n.leading_zeros() - 1
}

pub(crate) fn default_encode_number<C: Coder + ?Sized>(coder: &mut C, base_context: i32, n: u32) -> u32 {
    let k = number_k(n);
    // lowerbound(k) = 2 << k, matching the spec's 4<<(k-1) for k>=1 and 2 for k==0.
    let lowerbound = 2u32 << k;
    let payload = n - lowerbound;
    let mut size = 0u32;
    for i in 0..k {
        size += coder.code(base_context + 2 * i as i32 + 2, 1);
    }
    size += coder.code(base_context + 2 * k as i32 + 2, 0);
    for i in (0..=k).rev() {
        let bit = (payload >> i) & 1;
        size += coder.code(base_context + 2 * (k - i) as i32 + 1, bit);
    }
    size
}

/// The decode-side inverse of [`default_encode_number`]; reads bits through
/// `read_bit(context) -> bit` rather than a `Coder`, since decompression
/// drives an independent range decoder that does not implement `Coder`.
pub fn decode_number<F: FnMut(i32) -> u32>(base_context: i32, mut read_bit: F) -> u32 {
    let mut k = 0i32;
    loop {
        let cont = read_bit(base_context + 2 * k + 2);
        if cont == 0 {
            break;
        }
        k += 1;
    }
    let mut payload = 0u32;
    for i in (0..=k as u32).rev() {
        let bit = read_bit(base_context + 2 * (k as u32 - i) as i32 + 1);
        payload = (payload << 1) | bit;
    }
    let lowerbound = 2u32 << (k as u32);
    lowerbound + payload
}
