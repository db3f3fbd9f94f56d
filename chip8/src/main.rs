use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::error;

use chip8_core::constants::DEFAULT_CYCLES_PER_FRAME;
use chip8_core::{Chip8, Quirks};

mod keymap;
mod run;

/// Largest pixel multiplier; a 64x scaled window is already 4096x2048
const MAX_SCALE: u32 = 64;

/// Runs a Chip-8 ROM in a window.
///
/// Keys 1-4, Q-R, A-F and Z-V stand in for the hexadecimal keypad; Escape quits.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Raw Chip-8 ROM to run
    rom: PathBuf,

    /// Size multiplier for each Chip-8 pixel
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=MAX_SCALE as i64))]
    scale: u32,

    /// CPU cycles to run for every 60Hz frame
    #[arg(short, long, default_value_t = DEFAULT_CYCLES_PER_FRAME)]
    cycles_per_frame: u32,

    /// Shift Vx in place instead of shifting Vy into Vx
    #[arg(long)]
    shift_vx: bool,

    /// Leave I unchanged after storing or loading registers
    #[arg(long)]
    static_index: bool,
}

impl Args {
    fn quirks(&self) -> Quirks {
        Quirks {
            shift_uses_vy: !self.shift_vx,
            load_store_advances_index: !self.static_index,
        }
    }
}

fn try_main(args: Args) -> Result<(), Box<dyn Error>> {
    // Load the ROM before opening a window so bad files fail fast
    let rom = fs::read(&args.rom)
        .map_err(|e| format!("unable to read {}: {}", args.rom.display(), e))?;

    let mut chip8 = Chip8::new();
    chip8.set_quirks(args.quirks());
    chip8.load_rom(&rom)?;

    let settings = run::Settings {
        scale: args.scale,
        cycles_per_frame: args.cycles_per_frame,
    };
    run::run(&mut chip8, &settings)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = try_main(args) {
        error!("{}", e);
        process::exit(1);
    }
}
