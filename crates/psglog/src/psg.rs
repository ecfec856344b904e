//! SN76489 write-port decoding, for diagnostics.
//!
//! The player forwards bytes without looking at them; this module is what
//! tools use to show what a byte does to the chip.
//!
//! # Register layout
//!
//! - Latch byte (bit 7 = 1): bits 6-5 select the channel (3 = noise), bit 4
//!   selects attenuation (1) or tone/noise control (0), bits 3-0 are data.
//! - Data byte (bit 7 = 0): bits 5-0 are the high six bits of the latched
//!   tone period.
use std::fmt;

/// Number of channels: three tone channels and one noise channel.
pub const CHANNELS: usize = 4;
/// Index of the noise channel.
pub const NOISE_CHANNEL: u8 = 3;
/// Attenuation value that mutes a channel.
pub const ATTENUATION_OFF: u8 = 0x0F;

/// Register selected by a latch byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Tone period (channels 0-2) or noise control (channel 3).
    Tone,
    Attenuation,
}

/// One byte written to the SN76489, decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsgWrite {
    Latch {
        channel: u8,
        register: Register,
        data: u8,
    },
    Data {
        data: u8,
    },
}

impl PsgWrite {
    pub fn decode(value: u8) -> Self {
        if value & 0x80 != 0 {
            PsgWrite::Latch {
                channel: (value >> 5) & 0x03,
                register: if value & 0x10 != 0 {
                    Register::Attenuation
                } else {
                    Register::Tone
                },
                data: value & 0x0F,
            }
        } else {
            PsgWrite::Data { data: value & 0x3F }
        }
    }

    /// True for a latch that mutes its channel.
    pub fn is_silence(&self) -> bool {
        matches!(
            self,
            PsgWrite::Latch {
                register: Register::Attenuation,
                data: ATTENUATION_OFF,
                ..
            }
        )
    }
}

impl From<u8> for PsgWrite {
    fn from(value: u8) -> Self {
        PsgWrite::decode(value)
    }
}

impl fmt::Display for PsgWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PsgWrite::Latch {
                channel,
                register: Register::Attenuation,
                data,
            } => {
                if data == ATTENUATION_OFF {
                    write!(f, "ch{} off", channel)
                } else {
                    write!(f, "ch{} att {:2} (-{} dB)", channel, data, data as u32 * 2)
                }
            }
            PsgWrite::Latch {
                channel: NOISE_CHANNEL,
                register: Register::Tone,
                data,
            } => {
                let kind = if data & 0x04 != 0 { "white" } else { "periodic" };
                match data & 0x03 {
                    3 => write!(f, "noise {} rate=tone2", kind),
                    shift => write!(f, "noise {} rate=clk/{}", kind, 512 << shift),
                }
            }
            PsgWrite::Latch { channel, data, .. } => {
                write!(f, "ch{} tone lo=0x{:X}", channel, data)
            }
            PsgWrite::Data { data } => write!(f, "data hi=0x{:02X}", data),
        }
    }
}

/// Key transitions reported by [`PsgState::apply`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PsgEvent {
    /// A channel became audible.
    KeyOn { channel: u8 },
    /// A channel was muted.
    KeyOff { channel: u8 },
    /// A tone channel's period changed while audible.
    ToneChange { channel: u8, period: u16 },
}

/// Shadow of the chip's registers built from the write stream.
///
/// Key on/off is inferred from attenuation: the SN76489 has no key
/// commands, so a channel leaving attenuation 15 is a key on and
/// returning to it is a key off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsgState {
    latch: Option<(u8, Register)>,
    tone: [u16; 3],
    noise: u8,
    attenuation: [u8; CHANNELS],
}

impl Default for PsgState {
    fn default() -> Self {
        PsgState {
            latch: None,
            tone: [0; 3],
            noise: 0,
            attenuation: [ATTENUATION_OFF; CHANNELS],
        }
    }
}

impl PsgState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 10-bit tone period of a tone channel (0-2).
    pub fn tone_period(&self, channel: u8) -> Option<u16> {
        self.tone.get(channel as usize).copied()
    }

    /// Output frequency of a tone channel for a chip clocked at `clock_hz`.
    pub fn tone_frequency(&self, channel: u8, clock_hz: u32) -> Option<f32> {
        match self.tone_period(channel)? {
            0 => None,
            period => Some(clock_hz as f32 / (32.0 * period as f32)),
        }
    }

    pub fn attenuation(&self, channel: u8) -> Option<u8> {
        self.attenuation.get(channel as usize).copied()
    }

    pub fn noise_control(&self) -> u8 {
        self.noise
    }

    pub fn is_audible(&self, channel: u8) -> bool {
        self.attenuation(channel)
            .is_some_and(|a| a != ATTENUATION_OFF)
    }

    /// Track one written byte and report the key transition it causes.
    pub fn apply(&mut self, value: u8) -> Option<PsgEvent> {
        let (channel, register, data) = match PsgWrite::decode(value) {
            PsgWrite::Latch {
                channel,
                register,
                data,
            } => {
                self.latch = Some((channel, register));
                (channel, register, data)
            }
            PsgWrite::Data { data } => {
                let (channel, register) = self.latch?;
                (channel, register, data)
            }
        };
        let is_latch = value & 0x80 != 0;
        let ch = channel as usize;

        match register {
            Register::Attenuation => {
                let was_audible = self.is_audible(channel);
                self.attenuation[ch] = data & 0x0F;
                match (was_audible, self.is_audible(channel)) {
                    (false, true) => Some(PsgEvent::KeyOn { channel }),
                    (true, false) => Some(PsgEvent::KeyOff { channel }),
                    _ => None,
                }
            }
            Register::Tone if channel == NOISE_CHANNEL => {
                self.noise = data & 0x07;
                None
            }
            Register::Tone => {
                let period = &mut self.tone[ch];
                *period = if is_latch {
                    (*period & 0x3F0) | data as u16
                } else {
                    (*period & 0x00F) | ((data as u16 & 0x3F) << 4)
                };
                // A latch alone only updates the low bits; report once the
                // data byte completes the period.
                (!is_latch && self.is_audible(channel)).then(|| PsgEvent::ToneChange {
                    channel,
                    period: self.tone[ch],
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_latch_and_data() {
        assert_eq!(
            PsgWrite::decode(0x9F),
            PsgWrite::Latch {
                channel: 0,
                register: Register::Attenuation,
                data: 0x0F
            }
        );
        assert_eq!(
            PsgWrite::decode(0xC5),
            PsgWrite::Latch {
                channel: 2,
                register: Register::Tone,
                data: 0x05
            }
        );
        assert_eq!(PsgWrite::decode(0x3F), PsgWrite::Data { data: 0x3F });
    }

    #[test]
    fn silence_sequence_is_silent() {
        for v in crate::sink::SILENCE {
            assert!(PsgWrite::decode(v).is_silence(), "0x{:02X}", v);
        }
        assert!(!PsgWrite::decode(0x90).is_silence());
    }

    #[test]
    fn display() {
        assert_eq!(PsgWrite::decode(0xBF).to_string(), "ch1 off");
        assert_eq!(PsgWrite::decode(0x92).to_string(), "ch0 att  2 (-4 dB)");
        assert_eq!(PsgWrite::decode(0xE4).to_string(), "noise white rate=clk/512");
        assert_eq!(PsgWrite::decode(0x8A).to_string(), "ch0 tone lo=0xA");
        assert_eq!(PsgWrite::decode(0x1F).to_string(), "data hi=0x1F");
    }

    #[test]
    fn state_tracks_tone_and_keys() {
        let mut psg = PsgState::new();
        // ch0 period 0x0FE: latch low nibble 0xE, data high bits 0x0F
        assert_eq!(psg.apply(0x8E), None);
        assert_eq!(psg.apply(0x0F), None);
        assert_eq!(psg.tone_period(0), Some(0x0FE));

        assert_eq!(psg.apply(0x90), Some(PsgEvent::KeyOn { channel: 0 }));
        // re-latch the tone register before the next data byte
        assert_eq!(psg.apply(0x8E), None);
        assert_eq!(
            psg.apply(0x10),
            Some(PsgEvent::ToneChange {
                channel: 0,
                period: 0x10E
            })
        );
        assert_eq!(psg.apply(0x9F), Some(PsgEvent::KeyOff { channel: 0 }));

        let hz = psg.tone_frequency(0, 3_579_545).unwrap();
        assert!((hz - 3_579_545.0 / (32.0 * 0x10E as f32)).abs() < 0.01);
    }

    #[test]
    fn noise_latch_sets_noise_control() {
        let mut psg = PsgState::new();
        assert_eq!(psg.noise_control(), 0);
        // white noise, rate clk/1024
        assert_eq!(psg.apply(0xE5), None);
        assert_eq!(psg.noise_control(), 0x05);
        // tone periods are untouched by the noise register
        assert_eq!(psg.tone_period(2), Some(0));
    }

    #[test]
    fn data_without_latch_is_ignored() {
        let mut psg = PsgState::new();
        assert_eq!(psg.apply(0x3F), None);
        assert_eq!(psg, PsgState::new());
    }
}
