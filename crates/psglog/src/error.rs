//! Error types returned by the loader and the player.
//!
//! Every error is fatal to the song it was raised for: the loader refuses
//! the file, and the player refuses to continue past the failing command.
//! Normal end of playback is *not* an error; it is reported through
//! [`StepResult::EndOfStream`](crate::StepResult::EndOfStream).
use thiserror::Error;

/// The header of a VGM file was rejected by the loader.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The input is shorter than the fixed 64-byte VGM 1.50 header.
    #[error("header too short: {available} bytes, need {needed}")]
    HeaderTooShort { needed: usize, available: usize },

    /// The four-byte file identifier is not `"Vgm "`.
    #[error("invalid ident: {0:02X?}")]
    InvalidIdent([u8; 4]),

    /// Only VGM 1.50 (`0x00000150`) is played.
    #[error("unsupported VGM version: 0x{0:08X} (want 0x00000150)")]
    UnsupportedVersion(u32),

    /// The SN76489 clock is not the NTSC 3579545 Hz rate the player assumes.
    #[error("unsupported SN76489 clock: {0} Hz (want 3579545 Hz)")]
    UnsupportedClock(u32),

    /// The declared end of file lies inside the header.
    #[error("eof offset 0x{eof_offset:08X} ends inside the header")]
    EofOffsetOutOfRange { eof_offset: u32 },

    /// The loop point is not inside the command stream.
    #[error("loop offset 0x{loop_offset:08X} outside command stream of {data_len} bytes")]
    LoopOffsetOutOfRange { loop_offset: u32, data_len: usize },
}

/// Errors produced by `psglog`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid VGM file: {0}")]
    Format(#[from] FormatError),

    /// The command stream ended before a command (or the end-of-data marker)
    /// was complete.
    ///
    /// - `offset` is where the failing read started, relative to the start
    ///   of the command stream (the opcode, or the operand after it).
    /// - `needed` is the number of bytes the read required.
    /// - `available` is the length of the command stream.
    #[error("truncated command stream at 0x{offset:X} (needed {needed} bytes, available {available})")]
    TruncatedStream {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// An opcode other than `0x50`, `0x61`, `0x62` or `0x66` was found.
    #[error("unknown command 0x{opcode:02X} at offset 0x{offset:X}")]
    UnknownCommand { offset: usize, opcode: u8 },

    /// `step` was called after playback reached its end.
    #[error("playback ended; reset or load a song before stepping again")]
    PlaybackEnded,

    /// `step` was called on a player with no song loaded.
    #[error("no song loaded")]
    NoSong,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
