//! Register sinks: where the player's PSG writes go.
//!
//! The player only knows [`RegisterSink`]. Wiring details such as the bit
//! order of the shift register feeding the chip's data bus, or the
//! write-enable strobe, live in the adapter ([`ShiftRegisterSink`]) so the
//! interpreter stays the same for every board.
use log::trace;

/// Attenuation-15 latches for tone channels 0-2 and the noise channel.
pub const SILENCE: [u8; 4] = [0x9F, 0xBF, 0xDF, 0xFF];

/// Destination for SN76489 write-port bytes.
pub trait RegisterSink {
    /// Send one byte to the chip's write port.
    fn write(&mut self, value: u8);

    /// Mute all four channels.
    fn reset(&mut self) {
        for value in SILENCE {
            self.write(value);
        }
    }
}

impl<S: RegisterSink + ?Sized> RegisterSink for &mut S {
    fn write(&mut self, value: u8) {
        (**self).write(value)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

impl<S: RegisterSink + ?Sized> RegisterSink for Box<S> {
    fn write(&mut self, value: u8) {
        (**self).write(value)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Reverse the bit order of a byte (bit 7 becomes bit 0).
///
/// ```
/// assert_eq!(psglog::sink::reverse_bits(0b1011_0000), 0b0000_1101);
/// ```
pub const fn reverse_bits(value: u8) -> u8 {
    let v = (value & 0xF0) >> 4 | (value & 0x0F) << 4;
    let v = (v & 0xCC) >> 2 | (v & 0x33) << 2;
    (v & 0xAA) >> 1 | (v & 0x55) << 1
}

/// How the shift register outputs map onto the chip's D0-D7 pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// Bytes are shifted out unchanged.
    #[default]
    Msb,
    /// Outputs are wired in reverse; bytes are bit-reversed before shifting.
    Lsb,
}

impl BitOrder {
    pub const fn apply(self, value: u8) -> u8 {
        match self {
            BitOrder::Msb => value,
            BitOrder::Lsb => reverse_bits(value),
        }
    }
}

/// The pins an SN76489 is driven through: a serial-in/parallel-out shift
/// register on the data bus plus the chip's active-low WE line.
pub trait PsgPort {
    /// Shift `value` into the register and latch it onto the outputs.
    fn shift_out(&mut self, value: u8);

    /// Drive the WE pin; `false` is asserted (low).
    fn set_we_level(&mut self, high: bool);

    /// Hold while WE is asserted so the chip can sample the bus.
    fn settle(&mut self) {}
}

impl<P: PsgPort + ?Sized> PsgPort for &mut P {
    fn shift_out(&mut self, value: u8) {
        (**self).shift_out(value)
    }

    fn set_we_level(&mut self, high: bool) {
        (**self).set_we_level(high)
    }

    fn settle(&mut self) {
        (**self).settle()
    }
}

/// Hardware adapter: writes each byte through a shift register and strobes
/// WE around it.
#[derive(Debug)]
pub struct ShiftRegisterSink<P: PsgPort> {
    port: P,
    bit_order: BitOrder,
}

impl<P: PsgPort> ShiftRegisterSink<P> {
    /// Take over `port`, deassert WE and silence the chip.
    pub fn new(port: P, bit_order: BitOrder) -> Self {
        let mut sink = ShiftRegisterSink { port, bit_order };
        sink.port.set_we_level(true);
        sink.reset();
        sink
    }

    pub fn bit_order(&self) -> BitOrder {
        self.bit_order
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }
}

impl<P: PsgPort> RegisterSink for ShiftRegisterSink<P> {
    fn write(&mut self, value: u8) {
        let wire = self.bit_order.apply(value);
        trace!("psg write 0x{:02X} (bus 0x{:02X})", value, wire);
        self.port.shift_out(wire);
        self.port.set_we_level(false);
        self.port.settle();
        self.port.set_we_level(true);
    }
}

/// Sink that records every byte it is given, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSink {
    writes: Vec<u8>,
    resets: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every byte written so far, reset sequences included.
    pub fn writes(&self) -> &[u8] {
        &self.writes
    }

    /// Number of times `reset` was called.
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Drain the recorded writes.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.writes)
    }

    pub fn clear(&mut self) {
        self.writes.clear();
        self.resets = 0;
    }
}

impl RegisterSink for RecordingSink {
    fn write(&mut self, value: u8) {
        self.writes.push(value);
    }

    fn reset(&mut self) {
        self.resets += 1;
        self.writes.extend_from_slice(&SILENCE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_bits_examples() {
        assert_eq!(reverse_bits(0b1011_0000), 0b0000_1101);
        assert_eq!(reverse_bits(0x01), 0x80);
        assert_eq!(reverse_bits(0x9F), 0xF9);
        assert_eq!(reverse_bits(0x00), 0x00);
        assert_eq!(reverse_bits(0xFF), 0xFF);
    }

    #[test]
    fn reverse_bits_matches_std_and_is_involution() {
        for v in 0..=u8::MAX {
            assert_eq!(reverse_bits(v), v.reverse_bits());
            assert_eq!(reverse_bits(reverse_bits(v)), v);
        }
    }

    #[test]
    fn bit_order_apply() {
        assert_eq!(BitOrder::Msb.apply(0xAB), 0xAB);
        assert_eq!(BitOrder::Lsb.apply(0xAB), 0xD5);
        assert_eq!(BitOrder::default(), BitOrder::Msb);
    }

    #[test]
    fn recording_sink_counts_resets() {
        let mut sink = RecordingSink::new();
        sink.write(0x42);
        sink.reset();
        assert_eq!(sink.writes(), &[0x42, 0x9F, 0xBF, 0xDF, 0xFF]);
        assert_eq!(sink.resets(), 1);
        assert_eq!(sink.take().len(), 5);
        assert!(sink.writes().is_empty());
        assert_eq!(sink.resets(), 1);
    }

    #[test]
    fn recording_sink_clear_forgets_resets() {
        let mut sink = RecordingSink::new();
        sink.reset();
        sink.write(0x42);
        sink.clear();
        assert!(sink.writes().is_empty());
        assert_eq!(sink.resets(), 0);
        assert_eq!(sink, RecordingSink::new());
    }
}
