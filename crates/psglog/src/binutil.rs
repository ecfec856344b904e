//! Byte readers/writers shared by the header loader and the interpreter.
//!
//! Readers never panic: a read past the end of `bytes` reports
//! [`Error::TruncatedStream`] with the offset that was attempted.
use crate::error::Error;

fn ensure(bytes: &[u8], off: usize, needed: usize) -> Result<(), Error> {
    if bytes.len() < off.saturating_add(needed) {
        return Err(Error::TruncatedStream {
            offset: off,
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}

/// Read a 32-bit little-endian unsigned integer from `bytes` at `off`.
pub fn read_u32_le_at(bytes: &[u8], off: usize) -> Result<u32, Error> {
    ensure(bytes, off, 4)?;
    let mut tmp: [u8; 4] = [0; 4];
    tmp.copy_from_slice(&bytes[off..off + 4]);
    Ok(u32::from_le_bytes(tmp))
}

/// Read a 16-bit little-endian unsigned integer from `bytes` at `off`.
pub fn read_u16_le_at(bytes: &[u8], off: usize) -> Result<u16, Error> {
    ensure(bytes, off, 2)?;
    let mut tmp: [u8; 2] = [0; 2];
    tmp.copy_from_slice(&bytes[off..off + 2]);
    Ok(u16::from_le_bytes(tmp))
}

/// Read a single byte from `bytes` at `off`.
pub fn read_u8_at(bytes: &[u8], off: usize) -> Result<u8, Error> {
    ensure(bytes, off, 1)?;
    Ok(bytes[off])
}

/// Return a borrowed slice of length `len` starting at `off` from `bytes`.
pub fn read_slice(bytes: &[u8], off: usize, len: usize) -> Result<&[u8], Error> {
    ensure(bytes, off, len)?;
    Ok(&bytes[off..off + len])
}

/// Write a 32-bit little-endian unsigned integer `v` into `buf` at `off`.
///
/// No bounds checking; callers size `buf` first.
pub fn write_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

/// Copy `s` into `buf` starting at `off`.
pub fn write_slice(buf: &mut [u8], off: usize, s: &[u8]) {
    buf[off..off + s.len()].copy_from_slice(s);
}
