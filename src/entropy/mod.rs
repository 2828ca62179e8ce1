//! Entropy back-ends (spec §4.5): three implementations of `lz_coder::Coder`
//! sharing one context layout — a counting pass gathers statistics, a
//! size-measuring pass turns those into a cost oracle for the parser, and a
//! range coder performs the real bitwise arithmetic coding.

pub mod counting;
pub mod range;
pub mod size_measuring;

pub use counting::CountingCoder;
pub use range::RangeCoder;
pub use size_measuring::SizeMeasuringCoder;

pub const BIT_PRECISION: u32 = 6;
