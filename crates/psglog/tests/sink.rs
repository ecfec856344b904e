use psglog::sink::{BitOrder, PsgPort, RegisterSink, SILENCE, ShiftRegisterSink, reverse_bits};
use psglog::{Player, Song, StepResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pin {
    Shift(u8),
    We(bool),
    Settle,
}

#[derive(Debug, Default)]
struct MockPort {
    events: Vec<Pin>,
}

impl PsgPort for MockPort {
    fn shift_out(&mut self, value: u8) {
        self.events.push(Pin::Shift(value));
    }

    fn set_we_level(&mut self, high: bool) {
        self.events.push(Pin::We(high));
    }

    fn settle(&mut self) {
        self.events.push(Pin::Settle);
    }
}

impl MockPort {
    fn shifted(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Pin::Shift(v) => Some(*v),
                _ => None,
            })
            .collect()
    }
}

fn strobe(value: u8) -> [Pin; 4] {
    [Pin::Shift(value), Pin::We(false), Pin::Settle, Pin::We(true)]
}

#[test]
fn construction_deasserts_we_and_silences() {
    let sink = ShiftRegisterSink::new(MockPort::default(), BitOrder::Msb);
    let port = sink.into_port();

    let mut expected = vec![Pin::We(true)];
    for v in SILENCE {
        expected.extend_from_slice(&strobe(v));
    }
    assert_eq!(port.events, expected);
}

#[test]
fn write_strobes_we_around_each_byte() {
    let mut sink = ShiftRegisterSink::new(MockPort::default(), BitOrder::Msb);
    sink.port_mut().events.clear();

    sink.write(0x8E);
    sink.write(0x0F);
    let mut expected = strobe(0x8E).to_vec();
    expected.extend_from_slice(&strobe(0x0F));
    assert_eq!(sink.port().events, expected);
}

#[test]
fn lsb_wiring_reverses_every_byte() {
    let mut sink = ShiftRegisterSink::new(MockPort::default(), BitOrder::Lsb);
    assert_eq!(sink.bit_order(), BitOrder::Lsb);
    assert_eq!(sink.port().shifted(), vec![0xF9, 0xFD, 0xFB, 0xFF]);

    sink.port_mut().events.clear();
    sink.write(0b1011_0000);
    assert_eq!(sink.port().shifted(), vec![0b0000_1101]);
}

#[test]
fn player_drives_the_adapter() {
    let sink = ShiftRegisterSink::new(MockPort::default(), BitOrder::Lsb);
    let song = Song::new(vec![0x50, 0xAB, 0x66], None).unwrap();
    let mut player = Player::with_song(sink, song);

    assert_eq!(player.step(0.0).unwrap(), StepResult::EndOfStream { writes: 1 });

    let shifted = player.into_sink().into_port().shifted();
    // construction reset, load reset, then the song's single write
    let mut expected: Vec<u8> = SILENCE.iter().map(|&v| reverse_bits(v)).collect();
    expected.extend(SILENCE.iter().map(|&v| reverse_bits(v)));
    expected.push(reverse_bits(0xAB));
    assert_eq!(shifted, expected);
}

#[test]
fn borrowed_port_is_a_port() {
    let mut port = MockPort::default();
    {
        let mut sink = ShiftRegisterSink::new(&mut port, BitOrder::Msb);
        sink.write(0x42);
    }
    assert_eq!(port.shifted().last(), Some(&0x42));
}
