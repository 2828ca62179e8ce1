//! # shrinkler-rs
//!
//! An LZ77 + range-coding compressor producing a bitstream compatible with
//! the Shrinkler format: matches are found with an SA-IS suffix array, a
//! graph-search parser explores many (offset,length) factorizations per
//! position against a cost oracle, and the winning parse is re-encoded with
//! a bitwise range coder over a small set of adaptive contexts.
//!
//! This crate optimizes for ratio, not speed: `compress` runs multiple
//! refinement passes, rebuilding its cost model from the previous pass's
//! statistics before committing to a final parse.
//!
//! ## Buffer Example
//!
//! ```rs
//! use shrinkler::{compress_slice, expand_slice, Options};
//! let data = b"the rain in spain falls mainly on the plain";
//! let packed = compress_slice(data, &Options::from_preset(3)).expect("compression failed");
//! let restored = expand_slice(&packed).expect("expansion failed");
//! assert_eq!(&restored, data);
//! ```
//!
//! ## File Example
//!
//! ```rs
//! use shrinkler::*;
//! let mut in_file = std::fs::File::open("some_input_path").expect("open failed");
//! let mut out_file = std::fs::File::create("some_output_path").expect("create failed");
//! let (in_size,out_size) = compress(&mut in_file,&mut out_file,&Options::from_preset(3))
//!     .expect("compression failed");
//! eprintln!("compressed {} into {}",in_size,out_size);
//! ```

pub mod container;
pub mod decompress;
pub mod entropy;
pub mod lz_coder;
pub mod matcher;
pub mod pack;
pub mod parser;
pub mod suffix;

use std::io::{Cursor, Read, Seek, Write};

/// Errors produced by this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("file format mismatch")]
    FileFormatMismatch,
    #[error("file too large")]
    FileTooLarge,
    #[error("corrupted stream")]
    CorruptStream,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Options controlling compression. See `Options::from_preset` for the
/// conventional presets 1..9 (default 3).
#[derive(Clone, Debug)]
pub struct Options {
    /// split literal/kind contexts by byte-position parity
    pub parity_context: bool,
    /// number of refinement passes
    pub iterations: u32,
    /// how many shorter-length variants per match the parser also tries
    pub length_margin: u32,
    /// suffix-array extension work cap per side, per query
    pub match_patience: u32,
    /// how many same-length match candidates survive pruning per position
    pub max_same_length: u32,
    /// match length above which the parser greedily skips ahead
    pub skip_length: u32,
    /// RefEdge arena capacity
    pub references: u32,
}

impl Options {
    /// Presets 1..9 map these parameters multiplicatively onto preset 3's
    /// defaults (iterations=3, length_margin=3, max_same_length=30,
    /// match_patience=300, skip_length=3000).
    pub fn from_preset(preset: u32) -> Self {
        let preset = preset.clamp(1, 9) as f64;
        let scale = preset / 3.0;
        Self {
            parity_context: true,
            iterations: ((3.0 * scale).round() as u32).max(1),
            length_margin: (3.0 * scale).round() as u32,
            match_patience: ((300.0 * scale).round() as u32).max(1),
            max_same_length: ((30.0 * scale).round() as u32).max(1),
            skip_length: ((3000.0 * scale).round() as u32).max(2),
            references: ((1_000_000.0 * scale).round() as u32).max(1000),
        }
    }

    /// Reject parameter combinations the core cannot operate on.
    pub fn validate(&self) -> Result<(), Error> {
        if self.iterations < 1 {
            return Err(Error::InvalidParameters("iterations must be >= 1".into()));
        }
        if self.max_same_length < 1 {
            return Err(Error::InvalidParameters("max_same_length must be >= 1".into()));
        }
        if self.skip_length < 2 {
            return Err(Error::InvalidParameters("skip_length must be >= 2".into()));
        }
        if self.references < 1000 {
            return Err(Error::InvalidParameters("references must be >= 1000".into()));
        }
        Ok(())
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::from_preset(3)
    }
}

/// Compress `src` into `dst`, writing the container header described in
/// `container.rs`. Returns `(bytes read, bytes written)`.
pub fn compress<R: Read + Seek, W: Write + Seek>(
    src: &mut R,
    dst: &mut W,
    opt: &Options,
) -> Result<(u64, u64), Error> {
    opt.validate()?;
    let mut data = Vec::new();
    src.read_to_end(&mut data)?;
    if data.len() > u32::MAX as usize {
        return Err(Error::FileTooLarge);
    }
    let body = pack::pack(&data, opt);
    let header = container::Header {
        compressed_size: body.len() as u32,
        uncompressed_size: data.len() as u32,
        safety_margin: 0,
        parity_context: opt.parity_context,
    };
    container::write_header(dst, &header)?;
    dst.write_all(&body)?;
    Ok((data.len() as u64, (container::HEADER_SIZE + body.len()) as u64))
}

/// Expand `src` (a container produced by `compress`) into `dst`. Returns
/// `(bytes read, bytes written)`.
pub fn expand<R: Read + Seek, W: Write + Seek>(
    src: &mut R,
    dst: &mut W,
) -> Result<(u64, u64), Error> {
    let header = container::read_header(src)?;
    let mut body = Vec::new();
    src.read_to_end(&mut body)?;
    let compressed_len = body.len();
    let out = decompress::decompress_body(&body, header.uncompressed_size as usize, header.parity_context)?;
    dst.write_all(&out)?;
    Ok((
        (container::HEADER_SIZE + compressed_len) as u64,
        out.len() as u64,
    ))
}

/// Convenience wrapper: compress a slice into a freshly allocated `Vec<u8>`.
pub fn compress_slice(data: &[u8], opt: &Options) -> Result<Vec<u8>, Error> {
    let mut src = Cursor::new(data);
    let mut out: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src, &mut out, opt)?;
    Ok(out.into_inner())
}

/// Convenience wrapper: expand a slice into a freshly allocated `Vec<u8>`.
pub fn expand_slice(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut src = Cursor::new(data);
    let mut out: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src, &mut out)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_block_round_trips() {
        let packed = compress_slice(b"", &Options::from_preset(3)).unwrap();
        let restored = expand_slice(&packed).unwrap();
        assert_eq!(restored, b"");
    }

    #[test]
    fn single_byte_round_trips() {
        let packed = compress_slice(b"A", &Options::from_preset(3)).unwrap();
        let restored = expand_slice(&packed).unwrap();
        assert_eq!(restored, b"A");
    }

    #[test]
    fn pure_repetition_round_trips_and_shrinks() {
        let data = vec![b'A'; 16];
        let packed = compress_slice(&data, &Options::from_preset(3)).unwrap();
        let restored = expand_slice(&packed).unwrap();
        assert_eq!(restored, data);
        assert!(packed.len() < data.len());
    }

    #[test]
    fn zero_block_round_trips() {
        let data = vec![0u8; 4096];
        let packed = compress_slice(&data, &Options::from_preset(3)).unwrap();
        let restored = expand_slice(&packed).unwrap();
        assert_eq!(restored, data);
        assert!(packed.len() < 256);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut opt = Options::from_preset(3);
        opt.iterations = 0;
        assert!(compress_slice(b"hello", &opt).is_err());
    }

    #[test]
    fn seeded_random_bytes_round_trip() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        let mut rng = SmallRng::seed_from_u64(0xC0FFEE);
        let data: Vec<u8> = (0..1024).map(|_| rng.random::<u8>()).collect();
        let packed = compress_slice(&data, &Options::from_preset(3)).unwrap();
        let restored = expand_slice(&packed).unwrap();
        assert_eq!(restored, data);
    }
}
