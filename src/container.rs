//! File header for raw-data mode (spec §6).
//!
//! Layout (all multi-byte integer fields big-endian, matching the legacy
//! compressor): magic `"Shri"`, major/minor version bytes, 16-bit
//! `header_size`, 32-bit `compressed_size`, 32-bit `uncompressed_size`,
//! 32-bit `safety_margin`, 32-bit `flags` (bit 0 = parity context enabled).

use crate::Error;
use std::io::{Read, Write};

const MAGIC: [u8; 4] = *b"Shri";
const VERSION_MAJOR: u8 = 4;
const VERSION_MINOR: u8 = 7;
const FLAG_PARITY_CONTEXT: u32 = 1;

/// Size in bytes of the on-disk header this module reads/writes.
pub const HEADER_SIZE: usize = 4 + 1 + 1 + 2 + 4 + 4 + 4 + 4;

#[derive(Clone, Debug)]
pub struct Header {
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub safety_margin: u32,
    pub parity_context: bool,
}

pub fn write_header<W: Write>(dst: &mut W, header: &Header) -> Result<(), Error> {
    dst.write_all(&MAGIC)?;
    dst.write_all(&[VERSION_MAJOR, VERSION_MINOR])?;
    dst.write_all(&((HEADER_SIZE - 8) as u16).to_be_bytes())?;
    dst.write_all(&header.compressed_size.to_be_bytes())?;
    dst.write_all(&header.uncompressed_size.to_be_bytes())?;
    dst.write_all(&header.safety_margin.to_be_bytes())?;
    let flags = if header.parity_context { FLAG_PARITY_CONTEXT } else { 0 };
    dst.write_all(&flags.to_be_bytes())?;
    Ok(())
}

pub fn read_header<R: Read>(src: &mut R) -> Result<Header, Error> {
    let mut magic = [0u8; 4];
    src.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(Error::FileFormatMismatch);
    }
    let mut version = [0u8; 2];
    src.read_exact(&mut version)?;
    if version[0] != VERSION_MAJOR {
        return Err(Error::FileFormatMismatch);
    }
    let mut header_size_buf = [0u8; 2];
    src.read_exact(&mut header_size_buf)?;
    let mut compressed_size_buf = [0u8; 4];
    src.read_exact(&mut compressed_size_buf)?;
    let mut uncompressed_size_buf = [0u8; 4];
    src.read_exact(&mut uncompressed_size_buf)?;
    let mut safety_margin_buf = [0u8; 4];
    src.read_exact(&mut safety_margin_buf)?;
    let mut flags_buf = [0u8; 4];
    src.read_exact(&mut flags_buf)?;
    let flags = u32::from_be_bytes(flags_buf);
    Ok(Header {
        compressed_size: u32::from_be_bytes(compressed_size_buf),
        uncompressed_size: u32::from_be_bytes(uncompressed_size_buf),
        safety_margin: u32::from_be_bytes(safety_margin_buf),
        parity_context: flags & FLAG_PARITY_CONTEXT != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_round_trips() {
        let header = Header {
            compressed_size: 123,
            uncompressed_size: 456,
            safety_margin: 0,
            parity_context: true,
        };
        let mut buf: Cursor<Vec<u8>> = Cursor::new(Vec::new());
        write_header(&mut buf, &header).unwrap();
        assert_eq!(buf.get_ref().len(), HEADER_SIZE);
        let mut reader = Cursor::new(buf.into_inner());
        let back = read_header(&mut reader).unwrap();
        assert_eq!(back.compressed_size, 123);
        assert_eq!(back.uncompressed_size, 456);
        assert!(back.parity_context);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut reader = Cursor::new(b"Junk\x04\x07\x00\x00".to_vec());
        assert!(matches!(read_header(&mut reader), Err(Error::FileFormatMismatch)));
    }
}
