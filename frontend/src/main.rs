use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use invaders_core::prelude::Machine;
use invaders_machines::space_invaders::SpaceInvadersSystem;

mod config;
mod rom_path;
mod runner;
mod screenshot;

use config::InputEvent;
use runner::{InputSchedule, RunSettings};

const ROM_SET_NAME: &str = "invaders";
const DEFAULT_FRAMES: u64 = 600;

#[derive(Parser, Debug)]
#[command(name = "invaders", version, about = "Headless Space Invaders runner")]
struct Args {
    /// ROM directory, rompath containing invaders.zip, or a ZIP file
    rom_path: PathBuf,

    /// Config file (default: <config dir>/invaders/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Frames to run
    #[arg(long)]
    frames: Option<u64>,

    /// DIP switch bytes, e.g. 0x0E,0x08,0x00
    #[arg(long, value_name = "A,B,C", value_parser = parse_dips)]
    dip: Option<[u8; 3]>,

    /// Save state to restore before running
    #[arg(long, value_name = "STATE")]
    load: Option<PathBuf>,

    /// Write a save state after running
    #[arg(long, value_name = "STATE")]
    save: Option<PathBuf>,

    /// Write the final screen as PNG, upright
    #[arg(long, value_name = "FILE.png")]
    screenshot: Option<PathBuf>,

    /// Latch input bits at a frame, e.g. 100:0x01 (repeatable)
    #[arg(long = "input", value_name = "FRAME:BITS", value_parser = parse_input_event)]
    inputs: Vec<InputEvent>,

    /// Log an observation every N frames (0 = never)
    #[arg(long, value_name = "N")]
    report_every: Option<u64>,
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("'{s}': {e}"))
}

fn parse_dips(s: &str) -> Result<[u8; 3], String> {
    let bytes = s
        .split(',')
        .map(parse_byte)
        .collect::<Result<Vec<_>, _>>()?;
    <[u8; 3]>::try_from(bytes).map_err(|v| format!("expected 3 bytes, got {}", v.len()))
}

fn parse_input_event(s: &str) -> Result<InputEvent, String> {
    let (frame, bits) = s
        .split_once(':')
        .ok_or_else(|| format!("'{s}': expected FRAME:BITS"))?;
    let frame = frame
        .trim()
        .parse()
        .map_err(|e| format!("'{frame}': {e}"))?;
    Ok(InputEvent {
        frame,
        bits: parse_byte(bits)?,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let file = config::load(args.config.as_deref())?;
    let mut machine_config = file.machine.to_machine_config();
    if let Some(dips) = args.dip {
        machine_config.dip_switches = dips;
    }

    let rom_set = rom_path::load_rom_set(ROM_SET_NAME, &args.rom_path)?;
    let mut sys = SpaceInvadersSystem::from_rom_set(&rom_set, machine_config)?;

    if let Some(path) = &args.load {
        sys.load_state(path)?;
    }

    let mut events = file.run.input;
    events.extend(args.inputs);
    let mut schedule = InputSchedule::new(events);
    let settings = RunSettings {
        frames: args.frames.or(file.run.frames).unwrap_or(DEFAULT_FRAMES),
        report_every: args.report_every.or(file.run.report_every).unwrap_or(0),
    };
    runner::run(&mut sys, &settings, &mut schedule);
    log::info!(
        "ran {} frames, {} cycles",
        sys.frame_count(),
        sys.cycle_count()
    );

    if let Some(path) = &args.screenshot {
        sys.update_framebuffer();
        let (width, height) = sys.display_size();
        screenshot::save_png(path, sys.framebuffer(), width as usize, height as usize)?;
        log::info!("screenshot written to {}", path.display());
    }

    if let Some(path) = &args.save {
        sys.save_state(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dip_list() {
        assert_eq!(parse_dips("0x0E,8,0"), Ok([0x0E, 0x08, 0x00]));
        assert!(parse_dips("1,2").is_err());
        assert!(parse_dips("1,2,300").is_err());
    }

    #[test]
    fn parse_input() {
        assert_eq!(
            parse_input_event("120:0x10"),
            Ok(InputEvent { frame: 120, bits: 0x10 })
        );
        assert!(parse_input_event("120").is_err());
        assert!(parse_input_event("x:1").is_err());
    }

    #[test]
    fn cli_flags() {
        let args = Args::try_parse_from([
            "invaders",
            "roms",
            "--frames",
            "10",
            "--input",
            "1:0x01",
            "--input",
            "5:0",
            "--dip",
            "0,8,0",
        ])
        .unwrap();
        assert_eq!(args.frames, Some(10));
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.dip, Some([0, 8, 0]));
    }
}
