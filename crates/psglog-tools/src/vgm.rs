use std::fs::File;
use std::io::{Read, stdin};
use std::path::{Path, PathBuf};

use anyhow::Context;
use comfy_table::{Cell, ContentArrangement, Table, presets::NOTHING};
use flate2::read::GzDecoder;
use log::debug;
use psglog::Song;
use psglog::vgm::Command;

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1F && bytes[1] == 0x8B
}

fn gunzip(bytes: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .context("failed to decompress gzip data")?;
    Ok(out)
}

/// Read VGM bytes from a path or stdin ('-') into a Vec<u8>.
///
/// `.vgz` files and any input starting with the gzip magic are inflated.
pub fn read_vgm_as_vec(path: &PathBuf) -> anyhow::Result<Vec<u8>> {
    let mut raw = Vec::new();
    if path == Path::new("-") {
        stdin()
            .read_to_end(&mut raw)
            .context("failed to read from stdin")?;
    } else {
        File::open(path)
            .with_context(|| format!("failed to open input file: {}", path.display()))?
            .read_to_end(&mut raw)
            .context("failed to read input file")?;
    }

    let is_vgz = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("vgz"))
        .unwrap_or(false);

    if is_vgz || is_gzip(&raw) {
        debug!("inflating gzip input ({} bytes)", raw.len());
        gunzip(&raw)
    } else {
        Ok(raw)
    }
}

/// Load `bytes` as a song, naming the file in the error.
pub fn load_song(path: &Path, bytes: &[u8]) -> anyhow::Result<Song> {
    Song::from_bytes(bytes)
        .with_context(|| format!("failed to load VGM file: {}", path.display()))
}

#[derive(Debug, Default)]
struct CommandCounts {
    writes: usize,
    waits: usize,
    error: Option<String>,
}

fn count_commands(song: &Song) -> CommandCounts {
    let mut counts = CommandCounts::default();
    for item in song.commands() {
        match item {
            Ok((_, Command::PsgWrite(_))) => counts.writes += 1,
            Ok((_, Command::WaitSamples(_) | Command::Wait735Samples)) => counts.waits += 1,
            Ok((_, Command::EndOfData)) => {}
            Err(e) => counts.error = Some(e.to_string()),
        }
    }
    counts
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs_f64();
    format!("{}:{:06.3}", (secs / 60.0) as u64, secs % 60.0)
}

/// Print a header and content summary of a VGM file.
pub fn info(path: &Path, bytes: Vec<u8>) -> anyhow::Result<()> {
    let song = load_song(path, &bytes)?;
    let header = song.header();
    let counts = count_commands(&song);

    let mut rows: Vec<(&str, String)> = vec![
        ("File", path.display().to_string()),
        ("Version", format!("0x{:08X}", header.version)),
        ("SN76489 clock", format!("{} Hz", header.sn76489_clock)),
        ("File length", format!("{} bytes", header.file_len())),
        ("Data length", format!("{} bytes", song.data().len())),
        (
            "Loop offset",
            match song.loop_offset() {
                Some(lo) => format!("0x{:04X} (raw 0x{:08X})", lo, header.loop_offset),
                None => "(none)".to_string(),
            },
        ),
        (
            "Duration",
            format!(
                "{} ({} samples)",
                format_duration(song.duration()),
                header.total_samples
            ),
        ),
    ];
    if let Some(d) = song.loop_duration() {
        rows.push((
            "Loop length",
            format!("{} ({} samples)", format_duration(d), header.loop_samples),
        ));
    }
    rows.push(("PSG writes", counts.writes.to_string()));
    rows.push(("Waits", counts.waits.to_string()));
    if let Some(e) = counts.error {
        rows.push(("Stream error", e));
    }
    if let Some(gd3) = song.gd3() {
        let fields = [
            ("Track", &gd3.track_name_en, &gd3.track_name_jp),
            ("Game", &gd3.game_name_en, &gd3.game_name_jp),
            ("System", &gd3.system_name_en, &gd3.system_name_jp),
            ("Author", &gd3.author_name_en, &gd3.author_name_jp),
        ];
        for (name, en, jp) in fields {
            let value = match (en, jp) {
                (Some(en), Some(jp)) => format!("{} / {}", en, jp),
                (Some(s), None) | (None, Some(s)) => s.clone(),
                (None, None) => continue,
            };
            rows.push((name, value));
        }
        if let Some(date) = &gd3.release_date {
            rows.push(("Released", date.clone()));
        }
        if let Some(creator) = &gd3.creator {
            rows.push(("VGM by", creator.clone()));
        }
    }

    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    println!("{}", table);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_gzip_magic() {
        assert!(is_gzip(&[0x1F, 0x8B, 0x08]));
        assert!(!is_gzip(b"Vgm "));
        assert!(!is_gzip(&[0x1F]));
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(
            format_duration(std::time::Duration::from_millis(83_250)),
            "1:23.250"
        );
    }

    #[test]
    fn counts_writes_and_waits() {
        let song = Song::new(vec![0x50, 0x9F, 0x62, 0x50, 0xBF, 0x61, 0x01, 0x00, 0x66], None)
            .unwrap();
        let counts = count_commands(&song);
        assert_eq!(counts.writes, 2);
        assert_eq!(counts.waits, 2);
        assert!(counts.error.is_none());
    }
}
