//! VGM 1.50 loading for SN76489-only songs.
//!
//! This module exposes the loaded [`Song`], its [`SongHeader`] and the
//! command decoder used by the player.
pub mod command;
mod header;
mod song;

pub use command::{Command, Commands};
pub use header::SongHeader;
pub use song::Song;

/// Size of the fixed VGM 1.50 header; the command stream starts here.
pub const HEADER_SIZE: usize = 0x40;
/// The only accepted header version (VGM 1.50).
pub const SUPPORTED_VERSION: u32 = 0x0000_0150;
/// The only accepted SN76489 clock (NTSC, Hz).
pub const SUPPORTED_CLOCK: u32 = 3_579_545;
/// Samples per 1/60 s frame.
pub const SAMPLES_PER_FRAME: u32 = 735;
/// VGM sample clock in Hz.
pub const SAMPLE_RATE: u32 = SAMPLES_PER_FRAME * 60;

/// Convert a sample count at [`SAMPLE_RATE`] into seconds.
pub fn samples_to_seconds(samples: u32) -> f64 {
    samples as f64 / SAMPLE_RATE as f64
}
