//! Command decoding for the SN76489 subset of the VGM command set.
//!
//! Only four opcodes are understood. Anything else is rejected with
//! [`Error::UnknownCommand`], because VGM opcodes carry no length prefix and
//! skipping a guessed number of bytes would desynchronize the rest of the
//! stream.
use crate::binutil::{read_u8_at, read_u16_le_at};
use crate::error::Error;
use crate::vgm::SAMPLES_PER_FRAME;

pub const OP_PSG_WRITE: u8 = 0x50;
pub const OP_WAIT_SAMPLES: u8 = 0x61;
pub const OP_WAIT_735_SAMPLES: u8 = 0x62;
pub const OP_END_OF_DATA: u8 = 0x66;

/// One decoded VGM command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `0x50 dd`: write `dd` to the PSG port.
    PsgWrite(u8),
    /// `0x61 nn nn`: wait `n` samples.
    WaitSamples(u16),
    /// `0x62`: wait one 60 Hz frame (735 samples).
    Wait735Samples,
    /// `0x66`: end of sound data.
    EndOfData,
}

impl Command {
    pub fn opcode(&self) -> u8 {
        match self {
            Command::PsgWrite(_) => OP_PSG_WRITE,
            Command::WaitSamples(_) => OP_WAIT_SAMPLES,
            Command::Wait735Samples => OP_WAIT_735_SAMPLES,
            Command::EndOfData => OP_END_OF_DATA,
        }
    }

    /// Encoded size in bytes, opcode included.
    pub fn encoded_len(&self) -> usize {
        match self {
            Command::PsgWrite(_) => 2,
            Command::WaitSamples(_) => 3,
            Command::Wait735Samples | Command::EndOfData => 1,
        }
    }

    /// Samples this command waits for, or `None` if it does not wait.
    pub fn wait_samples(&self) -> Option<u32> {
        match self {
            Command::WaitSamples(n) => Some(*n as u32),
            Command::Wait735Samples => Some(SAMPLES_PER_FRAME),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            Command::PsgWrite(v) => vec![OP_PSG_WRITE, v],
            Command::WaitSamples(n) => {
                let [lo, hi] = n.to_le_bytes();
                vec![OP_WAIT_SAMPLES, lo, hi]
            }
            Command::Wait735Samples => vec![OP_WAIT_735_SAMPLES],
            Command::EndOfData => vec![OP_END_OF_DATA],
        }
    }
}

/// Decode the command at `off` in the command stream `data`.
///
/// Returns the command and the number of bytes it occupies. Running out of
/// bytes, at the opcode or inside its operands, is
/// [`Error::TruncatedStream`].
pub fn parse_command(data: &[u8], off: usize) -> Result<(Command, usize), Error> {
    let opcode = read_u8_at(data, off)?;
    let command = match opcode {
        OP_PSG_WRITE => Command::PsgWrite(read_u8_at(data, off + 1)?),
        OP_WAIT_SAMPLES => Command::WaitSamples(read_u16_le_at(data, off + 1)?),
        OP_WAIT_735_SAMPLES => Command::Wait735Samples,
        OP_END_OF_DATA => Command::EndOfData,
        opcode => return Err(Error::UnknownCommand { offset: off, opcode }),
    };
    Ok((command, command.encoded_len()))
}

/// Iterator over `(offset, command)` pairs of a command stream.
///
/// Stops after the first `EndOfData` or after yielding the first error.
/// It never follows the loop point.
#[derive(Debug, Clone)]
pub struct Commands<'a> {
    data: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> Commands<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Commands {
            data,
            offset: 0,
            done: false,
        }
    }
}

impl Iterator for Commands<'_> {
    type Item = Result<(usize, Command), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match parse_command(self.data, self.offset) {
            Ok((command, len)) => {
                let at = self.offset;
                self.offset += len;
                self.done = command == Command::EndOfData;
                Some(Ok((at, command)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_each_opcode() {
        let data = [0x50, 0x9F, 0x61, 0xDF, 0x02, 0x62, 0x66];
        assert_eq!(parse_command(&data, 0).unwrap(), (Command::PsgWrite(0x9F), 2));
        assert_eq!(parse_command(&data, 2).unwrap(), (Command::WaitSamples(735), 3));
        assert_eq!(parse_command(&data, 5).unwrap(), (Command::Wait735Samples, 1));
        assert_eq!(parse_command(&data, 6).unwrap(), (Command::EndOfData, 1));
    }

    #[test]
    fn unsupported_opcode_is_refused() {
        // 0x63 (wait 882) is valid VGM but not part of the SN76489 subset played here.
        let data = [0x63, 0x66];
        match parse_command(&data, 0) {
            Err(Error::UnknownCommand { offset, opcode }) => {
                assert_eq!(offset, 0);
                assert_eq!(opcode, 0x63);
            }
            other => panic!("expected UnknownCommand, got {:?}", other),
        }
    }

    #[test]
    fn truncated_operand() {
        assert!(matches!(
            parse_command(&[0x61, 0x10], 0),
            Err(Error::TruncatedStream { offset: 1, needed: 2, .. })
        ));
        assert!(matches!(
            parse_command(&[0x50], 0),
            Err(Error::TruncatedStream { offset: 1, needed: 1, .. })
        ));
    }

    #[test]
    fn iterator_stops_at_end_of_data() {
        let data = [0x50, 0x01, 0x62, 0x66, 0x50, 0x02];
        let commands: Vec<_> = Commands::new(&data).map(Result::unwrap).collect();
        assert_eq!(
            commands,
            vec![
                (0, Command::PsgWrite(0x01)),
                (2, Command::Wait735Samples),
                (3, Command::EndOfData),
            ]
        );
    }

    #[test]
    fn opcode_and_length_match_the_encoding() {
        for command in [
            Command::PsgWrite(0x9F),
            Command::WaitSamples(6000),
            Command::Wait735Samples,
            Command::EndOfData,
        ] {
            let bytes = command.to_bytes();
            assert_eq!(bytes[0], command.opcode());
            assert_eq!(bytes.len(), command.encoded_len());
        }
    }

    #[test]
    fn encodes_back_to_bytes() {
        let data: Vec<u8> = [
            Command::PsgWrite(0xAB),
            Command::WaitSamples(0x1234),
            Command::Wait735Samples,
            Command::EndOfData,
        ]
        .iter()
        .flat_map(Command::to_bytes)
        .collect();
        assert_eq!(data, vec![0x50, 0xAB, 0x61, 0x34, 0x12, 0x62, 0x66]);
    }
}
