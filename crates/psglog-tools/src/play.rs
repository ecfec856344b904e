use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use log::{debug, info};
use psglog::psg::{PsgEvent, PsgState, PsgWrite};
use psglog::sink::{BitOrder, RegisterSink};
use psglog::vgm::SAMPLE_RATE;
use psglog::{Player, StepResult};

use crate::vgm::load_song;

/// Options for the `play` subcommand.
#[derive(Debug, Clone)]
pub struct PlayOptions {
    pub fps: u32,
    pub loops: Option<u32>,
    pub dry_run: bool,
    pub max_steps: u64,
    pub reverse_bits: bool,
    pub quiet: bool,
}

/// One byte as it reached the sink.
#[derive(Debug, Clone, PartialEq)]
struct TracedWrite {
    value: u8,
    wire: u8,
    event: Option<PsgEvent>,
    /// `event` rendered against the chip state right after this write.
    event_text: String,
}

/// Sink that shadows the chip state and buffers every write for printing.
struct TraceSink {
    state: PsgState,
    clock: u32,
    bit_order: BitOrder,
    pending: Vec<TracedWrite>,
    total: u64,
}

impl TraceSink {
    fn new(clock: u32, bit_order: BitOrder) -> Self {
        Self {
            state: PsgState::new(),
            clock,
            bit_order,
            pending: Vec::new(),
            total: 0,
        }
    }

    fn drain(&mut self) -> std::vec::Drain<'_, TracedWrite> {
        self.pending.drain(..)
    }
}

impl RegisterSink for TraceSink {
    fn write(&mut self, value: u8) {
        let event = self.state.apply(value);
        let event_text = event
            .as_ref()
            .map(|e| format_event(e, &self.state, self.clock))
            .unwrap_or_default();
        self.pending.push(TracedWrite {
            value,
            wire: self.bit_order.apply(value),
            event,
            event_text,
        });
        self.total += 1;
    }
}

fn format_event(event: &PsgEvent, state: &PsgState, clock: u32) -> String {
    match *event {
        PsgEvent::KeyOn { channel } => match state.tone_frequency(channel, clock) {
            Some(hz) => format!("KeyOn ch{} ({:.1} Hz)", channel, hz),
            None => format!("KeyOn ch{}", channel),
        },
        PsgEvent::KeyOff { channel } => format!("KeyOff ch{}", channel),
        PsgEvent::ToneChange { channel, period } => {
            match state.tone_frequency(channel, clock) {
                Some(hz) => format!("Tone ch{} period={} ({:.1} Hz)", channel, period, hz),
                None => format!("Tone ch{} period={}", channel, period),
            }
        }
    }
}

fn format_write(write: &TracedWrite, reverse_bits: bool) -> String {
    let decoded = PsgWrite::decode(write.value).to_string();
    if reverse_bits {
        format!("0x{:02X} -> 0x{:02X}  {}", write.value, write.wire, decoded)
    } else {
        format!("0x{:02X}  {}", write.value, decoded)
    }
}

fn print_pending(sink: &mut TraceSink, sample: u64, options: &PlayOptions) {
    let reverse_bits = options.reverse_bits;
    for write in sink.drain() {
        if options.quiet {
            continue;
        }
        println!(
            "{:<12} {:<40} {}",
            sample,
            format_write(&write, reverse_bits),
            write.event_text
        );
    }
}

/// Play a VGM file through a tracing sink, printing each write when it is due.
pub fn play(path: &Path, bytes: Vec<u8>, options: &PlayOptions) -> Result<()> {
    if options.fps == 0 {
        bail!("--fps must be greater than zero");
    }

    let song = load_song(path, &bytes)?;
    let clock = song.header().sn76489_clock;
    let frame = 1.0 / options.fps as f64;
    let frame_duration = Duration::from_secs_f64(frame);

    if !options.quiet {
        println!("=== VGM File: {} ===", path.display());
        if let Some(title) = song.gd3().and_then(|g| g.title()) {
            println!("Title: {}", title);
        }
        println!("Total Samples: {}", song.header().total_samples);
        match song.loop_offset() {
            Some(lo) => println!("Loop Offset: 0x{:04X}", lo),
            None => println!("Loop Offset: (none)"),
        }
        println!();
        println!("{:<12} {:<40} Events", "Sample", "Register Write");
        println!("{}", "-".repeat(80));
    }

    let bit_order = if options.reverse_bits {
        BitOrder::Lsb
    } else {
        BitOrder::Msb
    };
    let mut player = Player::with_song(TraceSink::new(clock, bit_order), song);
    player.set_loop_count(options.loops);
    // The reset sequence from loading is part of the trace.
    print_pending(player.sink_mut(), 0, options);

    info!(
        "playing {} at {} steps/s{}",
        path.display(),
        options.fps,
        if options.dry_run { " (dry run)" } else { "" }
    );

    let started = Instant::now();
    let mut last = started;
    let mut played = 0.0f64;
    let mut steps: u64 = 0;
    let mut ended = false;

    while !ended {
        let elapsed = if options.dry_run {
            if steps >= options.max_steps {
                info!("stopping after {} steps", steps);
                break;
            }
            frame
        } else {
            let next = last + frame_duration;
            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            }
            let now = Instant::now();
            let elapsed = now.duration_since(last).as_secs_f64();
            last = now;
            elapsed
        };
        played += elapsed;
        steps += 1;

        let result = player
            .step(elapsed)
            .with_context(|| format!("playback failed at offset 0x{:04X}", player.offset()));
        let sample = (played * SAMPLE_RATE as f64) as u64;
        print_pending(player.sink_mut(), sample, options);

        match result? {
            StepResult::Pending => {}
            StepResult::Yielded {
                writes,
                wait_samples,
            } => debug!("step {}: {} writes, wait {}", steps, writes, wait_samples),
            StepResult::EndOfStream { writes } => {
                debug!("step {}: {} writes, end of stream", steps, writes);
                ended = true;
            }
        }
    }

    let total_writes = player.sink().total;
    if !options.quiet {
        println!("{}", "-".repeat(80));
    }
    println!(
        "{} writes in {} steps, {:.3}s of song time, {} loops{}",
        total_writes,
        steps,
        played,
        player.loops_completed(),
        if ended { "" } else { " (stopped)" }
    );
    if !options.dry_run {
        debug!("wall time {:.3}s", started.elapsed().as_secs_f64());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_sink_records_wire_bytes_and_events() {
        let mut sink = TraceSink::new(3_579_545, BitOrder::Lsb);
        sink.write(0x8E);
        sink.write(0x0F);
        sink.write(0x90);

        let writes: Vec<TracedWrite> = sink.drain().collect();
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0].wire, 0x71);
        assert_eq!(writes[2].event, Some(PsgEvent::KeyOn { channel: 0 }));
        assert_eq!(sink.total, 3);
        assert!(sink.pending.is_empty());
    }

    #[test]
    fn key_on_reports_the_frequency_at_that_write() {
        let mut sink = TraceSink::new(3_579_545, BitOrder::Msb);
        // ch0 period 0x0FE, key on, then retune to 0x10E in the same batch
        for value in [0x8E, 0x0F, 0x90, 0x8E, 0x10] {
            sink.write(value);
        }
        let writes: Vec<TracedWrite> = sink.drain().collect();

        let at_key_on = 3_579_545.0 / (32.0 * 0x0FE as f32);
        assert_eq!(writes[2].event_text, format!("KeyOn ch0 ({:.1} Hz)", at_key_on));
        let retuned = 3_579_545.0 / (32.0 * 0x10E as f32);
        assert_eq!(
            writes[4].event_text,
            format!("Tone ch0 period=270 ({:.1} Hz)", retuned)
        );
        assert!(writes[0].event_text.is_empty());
    }

    #[test]
    fn reset_is_traced_as_silence() {
        let mut sink = TraceSink::new(3_579_545, BitOrder::Msb);
        sink.reset();
        let values: Vec<u8> = sink.drain().map(|w| w.value).collect();
        assert_eq!(values, psglog::sink::SILENCE.to_vec());
    }

    #[test]
    fn write_shows_reversed_byte_when_asked() {
        let write = TracedWrite {
            value: 0x9F,
            wire: 0xF9,
            event: None,
            event_text: String::new(),
        };
        assert_eq!(format_write(&write, false), "0x9F  ch0 off");
        assert_eq!(format_write(&write, true), "0x9F -> 0xF9  ch0 off");
    }
}
