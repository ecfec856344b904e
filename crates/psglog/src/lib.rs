#![doc = include_str!("../README.md")]
//! psglog: loader and real-time interpreter for SN76489 VGM logs
//!
//! `psglog` plays VGM 1.50 files written for a single SN76489 PSG clocked
//! at 3579545 Hz. It is split in two:
//!
//! - [`Song`] validates the header and keeps the command stream and loop
//!   point.
//! - [`Player`] interprets the stream one step at a time. The caller says
//!   how much time has passed; the player emits the register writes that
//!   are due through a [`RegisterSink`] and keeps the rest of the wait as
//!   time debt.
//!
//! The player never sleeps or reads a clock, so it can be driven from a
//! display-refresh loop on a microcontroller, from a desktop timer, or from
//! a test with synthetic time.
//!
//! Example: playing a song into a recording sink
//!
//! ```rust
//! use psglog::{Player, RecordingSink, Song, StepResult};
//!
//! // 0x50 dd: PSG write, 0x61 nn nn: wait n samples, 0x66: end of data
//! let data = vec![0x50, 0x90, 0x61, 0x70, 0x17, 0x50, 0x9F, 0x66];
//! let bytes = Song::new(data, None).unwrap().to_bytes();
//!
//! let song = Song::from_bytes(&bytes).unwrap();
//! let mut player = Player::with_song(RecordingSink::new(), song);
//!
//! let frame = 1.0 / 60.0;
//! loop {
//!     match player.step(frame).unwrap() {
//!         StepResult::EndOfStream { .. } => break,
//!         _ => {}
//!     }
//! }
//!
//! // reset sequence, then the two writes of the song
//! assert_eq!(
//!     player.sink().writes(),
//!     &[0x9F, 0xBF, 0xDF, 0xFF, 0x90, 0x9F]
//! );
//! ```
//!
//! Example: driving real hardware through a shift register
//!
//! ```rust
//! use psglog::sink::{BitOrder, PsgPort, ShiftRegisterSink};
//! use psglog::{Player, Song};
//!
//! struct Pins;
//!
//! impl PsgPort for Pins {
//!     fn shift_out(&mut self, _value: u8) { /* SPI transfer + latch */ }
//!     fn set_we_level(&mut self, _high: bool) { /* GPIO */ }
//! }
//!
//! // The board wires the shift register outputs to D7..D0 in reverse.
//! let sink = ShiftRegisterSink::new(Pins, BitOrder::Lsb);
//! let mut player = Player::new(sink);
//! player.load(Song::new(vec![0x50, 0x90, 0x62, 0x66], None).unwrap());
//! player.step(0.0).unwrap();
//! ```
mod binutil;
pub mod error;
pub mod meta;
pub mod player;
pub mod psg;
pub mod sink;
pub mod vgm;

pub use error::{Error, FormatError, Result};
pub use player::{Player, PlayerState, StepResult};
pub use sink::{RecordingSink, RegisterSink};
pub use vgm::{Song, SongHeader};
