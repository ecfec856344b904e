//! Loading a VGM file into a playable [`Song`].
use std::io::Read;
use std::time::Duration;

use log::{debug, warn};

use crate::error::{Error, FormatError, Result};
use crate::meta::{Gd3, parse_gd3};
use crate::vgm::command::Commands;
use crate::vgm::header::{GD3_OFFSET_FIELD, LOOP_OFFSET_FIELD, SongHeader, parse_header};
use crate::vgm::{HEADER_SIZE, samples_to_seconds};

/// A loaded song: the command stream and its loop point.
///
/// `loop_offset` is relative to the start of the command stream (file
/// offset 0x40) and, when present, is always inside the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    header: SongHeader,
    data: Vec<u8>,
    loop_offset: Option<usize>,
    gd3: Option<Gd3>,
}

impl Song {
    /// Build a song from a raw command stream.
    ///
    /// The header's sample counts are computed from the wait commands in
    /// `data`, up to the first end-of-data or undecodable command.
    ///
    /// ```
    /// use psglog::Song;
    ///
    /// let song = Song::new(vec![0x50, 0x9F, 0x62, 0x66], Some(0)).unwrap();
    /// assert_eq!(song.header().total_samples, 735);
    /// assert_eq!(song.loop_offset(), Some(0));
    /// ```
    pub fn new(data: Vec<u8>, loop_offset: Option<usize>) -> Result<Self> {
        if let Some(lo) = loop_offset
            && lo >= data.len()
        {
            return Err(FormatError::LoopOffsetOutOfRange {
                loop_offset: (lo + HEADER_SIZE - LOOP_OFFSET_FIELD) as u32,
                data_len: data.len(),
            }
            .into());
        }

        let mut total_samples = 0u32;
        let mut loop_samples = 0u32;
        for (at, command) in Commands::new(&data).map_while(|r| r.ok()) {
            let samples = command.wait_samples().unwrap_or(0);
            total_samples = total_samples.saturating_add(samples);
            if loop_offset.is_some_and(|lo| at >= lo) {
                loop_samples = loop_samples.saturating_add(samples);
            }
        }

        let header = SongHeader {
            eof_offset: (HEADER_SIZE + data.len() - 4) as u32,
            total_samples,
            loop_offset: loop_offset
                .map(|lo| (lo + HEADER_SIZE - LOOP_OFFSET_FIELD) as u32)
                .unwrap_or(0),
            loop_samples,
            ..SongHeader::default()
        };

        Ok(Song {
            header,
            data,
            loop_offset,
            gd3: None,
        })
    }

    /// Load a song from a complete VGM file image.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = parse_header(bytes)?;

        let declared_end = header.file_len();
        if declared_end < HEADER_SIZE as u64 {
            return Err(FormatError::EofOffsetOutOfRange {
                eof_offset: header.eof_offset,
            }
            .into());
        }
        let file_end = match usize::try_from(declared_end) {
            Ok(end) if end <= bytes.len() => end,
            _ => {
                warn!(
                    "eof offset declares {} bytes but only {} are present",
                    declared_end,
                    bytes.len()
                );
                bytes.len()
            }
        };
        let within_file = |offset: u64| -> Option<usize> {
            usize::try_from(offset).ok().filter(|&at| at < file_end)
        };

        // The GD3 tag, when present, follows the command stream.
        let gd3_start = header.gd3_start().and_then(within_file);
        let data_end = match gd3_start {
            Some(start) if start > HEADER_SIZE => start,
            _ => file_end,
        };
        let data = bytes[HEADER_SIZE..data_end].to_vec();

        let loop_offset = match header.loop_start() {
            None => None,
            Some(start) => match within_file(start) {
                Some(at) if at >= HEADER_SIZE && at - HEADER_SIZE < data.len() => {
                    Some(at - HEADER_SIZE)
                }
                _ => {
                    return Err(FormatError::LoopOffsetOutOfRange {
                        loop_offset: header.loop_offset,
                        data_len: data.len(),
                    }
                    .into());
                }
            },
        };

        let gd3 = gd3_start.and_then(|start| match parse_gd3(&bytes[start..file_end]) {
            Ok(gd3) => Some(gd3),
            Err(e) => {
                warn!("ignoring unreadable GD3 tag at 0x{:X}: {}", start, e);
                None
            }
        });

        debug!(
            "loaded VGM 0x{:08X}: {} command bytes, loop {:?}, {} samples",
            header.version,
            data.len(),
            loop_offset,
            header.total_samples
        );

        Ok(Song {
            header,
            data,
            loop_offset,
            gd3,
        })
    }

    /// Load a song by reading `reader` to its end.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Song::from_bytes(&bytes)
    }

    /// The command stream (file bytes from 0x40 up to the end of data).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Loop point relative to the start of the command stream.
    pub fn loop_offset(&self) -> Option<usize> {
        self.loop_offset
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    pub fn header(&self) -> &SongHeader {
        &self.header
    }

    pub fn gd3(&self) -> Option<&Gd3> {
        self.gd3.as_ref()
    }

    pub fn set_gd3(&mut self, gd3: Option<Gd3>) {
        self.gd3 = gd3;
    }

    /// Iterate the decoded commands of one pass through the stream.
    pub fn commands(&self) -> Commands<'_> {
        Commands::new(&self.data)
    }

    /// Length of one pass, from the header's total sample count.
    pub fn duration(&self) -> Duration {
        samples_to_duration(self.header.total_samples)
    }

    /// Length of the looped section, if the song loops.
    pub fn loop_duration(&self) -> Option<Duration> {
        self.loop_offset
            .map(|_| samples_to_duration(self.header.loop_samples))
    }

    /// Serialize into a VGM 1.50 file image.
    pub fn to_bytes(&self) -> Vec<u8> {
        let gd3 = self.gd3.as_ref().map(Gd3::to_bytes).unwrap_or_default();
        let data_end = HEADER_SIZE + self.data.len();

        let mut header = self.header.clone();
        header.eof_offset = (data_end + gd3.len() - 4) as u32;
        header.gd3_offset = if gd3.is_empty() {
            0
        } else {
            (data_end - GD3_OFFSET_FIELD) as u32
        };
        header.loop_offset = self
            .loop_offset
            .map(|lo| (lo + HEADER_SIZE - LOOP_OFFSET_FIELD) as u32)
            .unwrap_or(0);

        let mut out = Vec::with_capacity(data_end + gd3.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&gd3);
        out
    }
}

fn samples_to_duration(samples: u32) -> Duration {
    Duration::from_secs_f64(samples_to_seconds(samples))
}

impl TryFrom<&[u8]> for Song {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
        Song::from_bytes(bytes)
    }
}

impl From<&Song> for Vec<u8> {
    fn from(song: &Song) -> Vec<u8> {
        song.to_bytes()
    }
}
