//! The fixed 64-byte VGM 1.50 header.
//!
//! Only the fields meaningful for a single SN76489 are kept. Offsets stored
//! in the header are relative to their own field position, so the absolute
//! file offset of e.g. the loop point is `loop_offset + 0x1C`.
use crate::binutil::{read_slice, read_u32_le_at, write_slice, write_u32};
use crate::error::{Error, FormatError};
use crate::vgm::{HEADER_SIZE, SUPPORTED_CLOCK, SUPPORTED_VERSION};

pub(crate) const VGM_IDENT: &[u8; 4] = b"Vgm ";

pub(crate) const EOF_OFFSET_FIELD: usize = 0x04;
pub(crate) const VERSION_FIELD: usize = 0x08;
pub(crate) const SN76489_CLOCK_FIELD: usize = 0x0C;
pub(crate) const GD3_OFFSET_FIELD: usize = 0x14;
pub(crate) const TOTAL_SAMPLES_FIELD: usize = 0x18;
pub(crate) const LOOP_OFFSET_FIELD: usize = 0x1C;
pub(crate) const LOOP_SAMPLES_FIELD: usize = 0x20;

/// Header fields of a loaded song, as stored in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongHeader {
    /// File length minus 4.
    pub eof_offset: u32,
    pub version: u32,
    pub sn76489_clock: u32,
    /// Relative to 0x14; 0 when there is no GD3 tag.
    pub gd3_offset: u32,
    pub total_samples: u32,
    /// Relative to 0x1C; 0 when the song does not loop.
    pub loop_offset: u32,
    pub loop_samples: u32,
}

impl Default for SongHeader {
    fn default() -> Self {
        SongHeader {
            eof_offset: (HEADER_SIZE - 4) as u32,
            version: SUPPORTED_VERSION,
            sn76489_clock: SUPPORTED_CLOCK,
            gd3_offset: 0,
            total_samples: 0,
            loop_offset: 0,
            loop_samples: 0,
        }
    }
}

impl SongHeader {
    /// Declared total file length.
    ///
    /// Offsets are widened to `u64` so a hostile header cannot overflow
    /// `usize` on 32-bit targets.
    pub fn file_len(&self) -> u64 {
        self.eof_offset as u64 + 4
    }

    /// Absolute file offset of the GD3 tag, if any.
    pub fn gd3_start(&self) -> Option<u64> {
        (self.gd3_offset != 0).then(|| self.gd3_offset as u64 + GD3_OFFSET_FIELD as u64)
    }

    /// Absolute file offset of the loop point, if any.
    pub fn loop_start(&self) -> Option<u64> {
        (self.loop_offset != 0).then(|| self.loop_offset as u64 + LOOP_OFFSET_FIELD as u64)
    }

    pub(crate) fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        write_slice(&mut buf, 0x00, VGM_IDENT);
        write_u32(&mut buf, EOF_OFFSET_FIELD, self.eof_offset);
        write_u32(&mut buf, VERSION_FIELD, self.version);
        write_u32(&mut buf, SN76489_CLOCK_FIELD, self.sn76489_clock);
        write_u32(&mut buf, GD3_OFFSET_FIELD, self.gd3_offset);
        write_u32(&mut buf, TOTAL_SAMPLES_FIELD, self.total_samples);
        write_u32(&mut buf, LOOP_OFFSET_FIELD, self.loop_offset);
        write_u32(&mut buf, LOOP_SAMPLES_FIELD, self.loop_samples);
        buf
    }
}

/// Parse and validate the header at the start of `bytes`.
///
/// Checks run in order: length, ident, version, clock. Any failure is a
/// [`FormatError`]; no attempt is made to play other versions or clocks.
pub(crate) fn parse_header(bytes: &[u8]) -> Result<SongHeader, Error> {
    if bytes.len() < HEADER_SIZE {
        return Err(FormatError::HeaderTooShort {
            needed: HEADER_SIZE,
            available: bytes.len(),
        }
        .into());
    }

    let ident = read_slice(bytes, 0x00, 4)?;
    if ident != VGM_IDENT {
        let mut id = [0u8; 4];
        id.copy_from_slice(ident);
        return Err(FormatError::InvalidIdent(id).into());
    }

    let version = read_u32_le_at(bytes, VERSION_FIELD)?;
    if version != SUPPORTED_VERSION {
        return Err(FormatError::UnsupportedVersion(version).into());
    }

    let sn76489_clock = read_u32_le_at(bytes, SN76489_CLOCK_FIELD)?;
    if sn76489_clock != SUPPORTED_CLOCK {
        return Err(FormatError::UnsupportedClock(sn76489_clock).into());
    }

    Ok(SongHeader {
        eof_offset: read_u32_le_at(bytes, EOF_OFFSET_FIELD)?,
        version,
        sn76489_clock,
        gd3_offset: read_u32_le_at(bytes, GD3_OFFSET_FIELD)?,
        total_samples: read_u32_le_at(bytes, TOTAL_SAMPLES_FIELD)?,
        loop_offset: read_u32_le_at(bytes, LOOP_OFFSET_FIELD)?,
        loop_samples: read_u32_le_at(bytes, LOOP_SAMPLES_FIELD)?,
    })
}
