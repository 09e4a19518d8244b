use std::{env, path::PathBuf, process::ExitCode, str::FromStr};

use anyhow::{Context, Result, bail};
use nessie_core::{Nes, StopReason};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_FRAMES: u64 = 60;

fn log_level() -> Level {
    env::var("NESSIE_LOG")
        .ok()
        .and_then(|level| Level::from_str(&level).ok())
        .unwrap_or(Level::INFO)
}

fn frame_count() -> Result<u64> {
    match env::var("NESSIE_FRAMES") {
        Ok(frames) => frames
            .parse()
            .with_context(|| format!("NESSIE_FRAMES is not a frame count: {frames:?}")),
        Err(_) => Ok(DEFAULT_FRAMES),
    }
}

fn run() -> Result<()> {
    let Some(rom) = env::args_os().nth(1).map(PathBuf::from) else {
        bail!("usage: nessie <rom.nes>");
    };
    let frames = frame_count()?;

    let mut nes = Nes::new();
    nes.load_rom(&rom)
        .with_context(|| format!("failed to open {}", rom.display()))?;

    for _ in 0..frames {
        if nes.run_frame() != StopReason::FrameComplete {
            break;
        }
    }
    info!(frames = nes.frames(), "{}", nes.cpu_snapshot());

    if nes.cartridge().is_some_and(|cart| cart.has_battery()) && !nes.save_battery() {
        warn!("battery save was not written");
    }
    Ok(())
}

fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {err}");
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
