use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod play;
mod vgm;
use play::{PlayOptions, play as vgm_play};
use vgm::{info as vgm_info, read_vgm_as_vec};

/// psglog command line tools
#[derive(Parser)]
#[command(
    name = "psglog",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show summary info for a VGM file (accepts .vgm or .vgz; use '-' for stdin)
    Info {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Play a VGM file and print every PSG write as it becomes due
    Play {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Steps per second (the caller-side tick rate)
        #[arg(long, default_value_t = 60)]
        fps: u32,

        /// Total number of passes through a looping song (default: forever)
        #[arg(long)]
        loops: Option<u32>,

        /// Feed synthetic elapsed time instead of sleeping
        #[arg(long)]
        dry_run: bool,

        /// Stop a dry run after this many steps
        #[arg(long, default_value_t = 36_000)]
        max_steps: u64,

        /// Show bytes as they would leave an LSB-first wired shift register
        #[arg(long)]
        reverse_bits: bool,

        /// Do not print writes (errors and the summary only)
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file } => {
            let bytes = read_vgm_as_vec(&file)?;
            vgm_info(&file, bytes)?;
        }
        Commands::Play {
            file,
            fps,
            loops,
            dry_run,
            max_steps,
            reverse_bits,
            quiet,
        } => {
            let bytes = read_vgm_as_vec(&file)?;
            let options = PlayOptions {
                fps,
                loops,
                dry_run,
                max_steps,
                reverse_bits,
                quiet,
            };
            vgm_play(&file, bytes, &options)?;
        }
    }

    Ok(())
}
