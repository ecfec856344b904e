//! Resumable, single-step interpreter over a [`Song`]'s command stream.
//!
//! The player never sleeps and never reads a clock. The caller reports how
//! much time has passed on every [`Player::step`] call; wait commands are
//! turned into a *time debt* that has to be paid off by later calls before
//! any further command runs. Calling `step` once per display frame is the
//! intended cadence, but any rate works.
//!
//! ```
//! use psglog::{Player, RecordingSink, Song, StepResult};
//!
//! // write 0x90 (channel 0 loud), wait one frame, end
//! let song = Song::new(vec![0x50, 0x90, 0x62, 0x66], None).unwrap();
//! let mut player = Player::with_song(RecordingSink::new(), song);
//!
//! assert_eq!(
//!     player.step(0.0).unwrap(),
//!     StepResult::Yielded { writes: 1, wait_samples: 735 }
//! );
//! assert_eq!(player.step(1.0 / 120.0).unwrap(), StepResult::Pending);
//! assert_eq!(player.step(1.0 / 120.0).unwrap(), StepResult::EndOfStream { writes: 0 });
//! ```
use log::{debug, trace};

use crate::error::{Error, Result};
use crate::sink::RegisterSink;
use crate::vgm::command::{Command, parse_command};
use crate::vgm::{Song, samples_to_seconds};

/// Remaining time debt (seconds) below which the next command may run.
///
/// Absorbs the jitter of a caller-measured clock so a wait that is a few
/// microseconds short of paid off does not cost a whole extra tick.
pub const EPSILON: f64 = 0.0001;

/// Observable interpreter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// At the start of the stream with nothing owed.
    Ready,
    /// Part-way through the stream; the next `step` executes commands.
    Running,
    /// A wait is still being paid off.
    Waiting,
    /// End of data was reached and the song does not loop (any further).
    Ended,
}

/// Outcome of a successful [`Player::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The current wait has not elapsed; no command was executed.
    Pending,
    /// Commands ran up to a wait of `wait_samples` samples.
    Yielded { writes: usize, wait_samples: u32 },
    /// Commands ran up to the end of the song.
    EndOfStream { writes: usize },
}

impl StepResult {
    /// Register writes performed during the step.
    pub fn writes(&self) -> usize {
        match *self {
            StepResult::Pending => 0,
            StepResult::Yielded { writes, .. } | StepResult::EndOfStream { writes } => writes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct PlaybackCursor {
    offset: usize,
    time_debt: f64,
    ended: bool,
    loops: u32,
}

/// Plays one [`Song`] at a time into a [`RegisterSink`].
#[derive(Debug)]
pub struct Player<S: RegisterSink> {
    sink: S,
    song: Option<Song>,
    cursor: PlaybackCursor,
    loop_count: Option<u32>,
}

impl<S: RegisterSink> Player<S> {
    /// Create an idle player. The sink is reset (all channels muted).
    pub fn new(mut sink: S) -> Self {
        sink.reset();
        Player {
            sink,
            song: None,
            cursor: PlaybackCursor::default(),
            loop_count: None,
        }
    }

    /// Create a player with `song` loaded and ready to step.
    pub fn with_song(sink: S, song: Song) -> Self {
        let mut player = Player {
            sink,
            song: None,
            cursor: PlaybackCursor::default(),
            loop_count: None,
        };
        player.load(song);
        player
    }

    /// Replace the current song, silence the chip and rewind.
    pub fn load(&mut self, song: Song) {
        self.song = Some(song);
        self.reset();
    }

    /// Parse `bytes` as a VGM file and load it.
    ///
    /// On error the previously loaded song, if any, stays loaded untouched.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let song = Song::from_bytes(bytes)?;
        self.load(song);
        Ok(())
    }

    /// Drop the current song and silence the chip.
    pub fn unload(&mut self) -> Option<Song> {
        let song = self.song.take();
        self.reset();
        song
    }

    /// Silence the chip and rewind to the start of the song.
    ///
    /// This is the only way to leave [`PlayerState::Ended`] or to recover
    /// after a step error.
    pub fn reset(&mut self) {
        self.sink.reset();
        self.cursor = PlaybackCursor::default();
        debug!("player reset");
    }

    /// Limit how many times the song is played in total.
    ///
    /// `None` (the default) loops forever. `Some(n)` plays the song `n`
    /// times, `Some(0)` and `Some(1)` both meaning a single pass. Songs
    /// without a loop point always end at their end-of-data command.
    pub fn set_loop_count(&mut self, loop_count: Option<u32>) {
        self.loop_count = loop_count;
    }

    pub fn loop_count(&self) -> Option<u32> {
        self.loop_count
    }

    /// How many times playback has jumped back to the loop point.
    pub fn loops_completed(&self) -> u32 {
        self.cursor.loops
    }

    pub fn state(&self) -> PlayerState {
        let c = &self.cursor;
        if c.ended {
            PlayerState::Ended
        } else if c.time_debt > EPSILON {
            PlayerState::Waiting
        } else if c.offset == 0 && c.loops == 0 {
            PlayerState::Ready
        } else {
            PlayerState::Running
        }
    }

    pub fn is_ended(&self) -> bool {
        self.cursor.ended
    }

    /// Offset of the next command in the command stream.
    pub fn offset(&self) -> usize {
        self.cursor.offset
    }

    /// Seconds left before the next command may run.
    pub fn time_debt(&self) -> f64 {
        self.cursor.time_debt
    }

    pub fn song(&self) -> Option<&Song> {
        self.song.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Advance playback by `elapsed_seconds`.
    ///
    /// Pays `elapsed_seconds` off the time debt; if the debt is then
    /// settled (within [`EPSILON`]), executes commands until the next
    /// non-zero wait or the end of the song. Reaching the end of data jumps
    /// to the loop point without yielding.
    ///
    /// On error nothing about the playback position changes, although
    /// writes performed earlier in the same call have reached the sink.
    /// Errors are fatal to the song; call [`Player::reset`] or load another
    /// song to continue.
    pub fn step(&mut self, elapsed_seconds: f64) -> Result<StepResult> {
        if self.cursor.ended {
            return Err(Error::PlaybackEnded);
        }
        let song = self.song.as_ref().ok_or(Error::NoSong)?;

        let mut cursor = self.cursor;
        cursor.time_debt -= elapsed_seconds;
        if cursor.time_debt > EPSILON {
            self.cursor = cursor;
            return Ok(StepResult::Pending);
        }
        cursor.time_debt = 0.0;

        let data = song.data();
        let mut writes = 0;
        let mut looped = false;
        let result = loop {
            let (command, len) = parse_command(data, cursor.offset)?;
            trace!("0x{:04X}: {:?}", cursor.offset, command);
            match command {
                Command::PsgWrite(value) => {
                    self.sink.write(value);
                    writes += 1;
                    cursor.offset += len;
                }
                Command::WaitSamples(_) | Command::Wait735Samples => {
                    let samples = command.wait_samples().unwrap_or(0);
                    cursor.offset += len;
                    cursor.time_debt = samples_to_seconds(samples);
                    if cursor.time_debt > EPSILON {
                        break StepResult::Yielded {
                            writes,
                            wait_samples: samples,
                        };
                    }
                }
                Command::EndOfData => {
                    let loop_offset = song.loop_offset().filter(|_| {
                        self.loop_count
                            .is_none_or(|n| cursor.loops.saturating_add(1) < n)
                    });
                    match loop_offset {
                        // A second loop in one call means the looped section
                        // has no time in it; hand control back instead of
                        // spinning forever.
                        Some(_) if looped => {
                            break StepResult::Yielded {
                                writes,
                                wait_samples: 0,
                            };
                        }
                        Some(loop_offset) => {
                            cursor.loops += 1;
                            cursor.offset = loop_offset;
                            looped = true;
                            debug!("loop {} -> 0x{:04X}", cursor.loops, loop_offset);
                        }
                        None => {
                            cursor.ended = true;
                            debug!("end of song at 0x{:04X}", cursor.offset);
                            break StepResult::EndOfStream { writes };
                        }
                    }
                }
            }
        };

        self.cursor = cursor;
        Ok(result)
    }
}
