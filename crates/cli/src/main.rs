// GpioPad - GPIO Keypad Event Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

mod stimulus;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use gpiopad_config::PadManifest;
use gpiopad_core::{ButtonDevice, ButtonHandle, PollFlags, PollTable, ReadMode, SimChip};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

const EXIT_PASS: u8 = 0;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

/// How long the scripted runner keeps draining after the last directive
/// before calling the session quiet.
const DRAIN_QUIET_WINDOW: Duration = Duration::from_millis(300);

#[derive(Parser, Debug)]
#[command(author, version, about = "GpioPad Simulator", long_about = None)]
struct Cli {
    /// Path to the pad manifest (YAML). Uses the built-in five-button pad
    /// when omitted.
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Stimulus script to replay instead of an interactive stdin session
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Enable debug-level tracing
    #[arg(short, long)]
    trace: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level based on --trace flag
    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    let manifest = match load_manifest(cli.manifest.as_deref()) {
        Ok(manifest) => manifest,
        Err(err) => {
            error!("{:#}", err);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let chip = Arc::new(SimChip::new(&manifest.chip, 128));
    let device = match ButtonDevice::bring_up(&chip, &manifest) {
        Ok(device) => device,
        Err(err) => {
            error!("bring-up failed: {}", err);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    let outcome = match cli.script {
        Some(script) => run_script(&chip, &device, &manifest, &script),
        None => run_interactive(&chip, &device, &manifest),
    };

    match outcome {
        Ok(()) => ExitCode::from(EXIT_PASS),
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}

fn load_manifest(path: Option<&std::path::Path>) -> Result<PadManifest> {
    let manifest = match path {
        Some(path) => PadManifest::from_file(path)?,
        None => PadManifest::default_pad(),
    };
    manifest.validate()?;
    Ok(manifest)
}

fn offset_of(manifest: &PadManifest, id: u8) -> Result<u32> {
    manifest
        .lines
        .iter()
        .find(|binding| binding.id == id)
        .map(|binding| binding.offset)
        .ok_or_else(|| anyhow!("no binding for line id {}", id))
}

fn describe_event(manifest: &PadManifest, byte: u8) -> String {
    let id = byte.wrapping_sub(b'0');
    match manifest.key_for(id) {
        Some(key) => format!("line {} ({})", id, key),
        None => format!("line {}", id),
    }
}

/// Replay a stimulus script, then drain and print every event the pad
/// produced. Deterministic and CI-friendly.
fn run_script(
    chip: &Arc<SimChip>,
    device: &ButtonDevice,
    manifest: &PadManifest,
    script: &std::path::Path,
) -> Result<()> {
    let content = std::fs::read_to_string(script)
        .with_context(|| format!("Failed to read stimulus script {:?}", script))?;
    let directives = stimulus::parse(&content)?;
    info!("replaying {} directives from {:?}", directives.len(), script);

    // Drain with poll + non-blocking reads while the script runs, so
    // coalescing only merges presses the script makes back-to-back.
    let mut handle = device.open(ReadMode::NonBlocking);
    let mut events = 0usize;

    for directive in directives {
        match directive {
            stimulus::Directive::Press(id) => {
                let offset = offset_of(manifest, id)?;
                chip.pulse(offset)
                    .map_err(|err| anyhow!("pulse on line {}: {}", id, err))?;
            }
            stimulus::Directive::Wait(ms) => thread::sleep(Duration::from_millis(ms)),
        }
        events += drain_pending(&mut handle, manifest)?;
    }

    // Quiet window: catch stragglers raised right at the end of the script.
    let mut table = PollTable::new();
    loop {
        if handle.poll(Some(&mut table)).contains(PollFlags::READABLE) {
            events += drain_pending(&mut handle, manifest)?;
            continue;
        }
        if !table.wait_timeout(DRAIN_QUIET_WINDOW) {
            break;
        }
    }

    info!("script finished; {} events delivered", events);
    Ok(())
}

fn drain_pending(handle: &mut ButtonHandle, manifest: &PadManifest) -> Result<usize> {
    let mut delivered = 0usize;
    let mut buf = [0u8; 1];
    while handle.read(&mut buf)? == 1 {
        println!("event: {}", describe_event(manifest, buf[0]));
        delivered += 1;
    }
    Ok(delivered)
}

/// Interactive session: stdin digits 1..5 press lines, `q` quits. A blocking
/// reader thread prints events as they arrive.
fn run_interactive(chip: &Arc<SimChip>, device: &ButtonDevice, manifest: &PadManifest) -> Result<()> {
    info!(
        "interactive session on pad '{}': type 1..5 to press, q to quit",
        manifest.name
    );

    let mut reader_handle = device.open(ReadMode::Blocking);
    let reader_manifest = manifest.clone();
    // Blocking reads are never cancelled; the thread is reaped at process
    // exit, matching the device's no-cancellation-on-close contract.
    thread::spawn(move || loop {
        let mut buf = [0u8; 1];
        match reader_handle.read(&mut buf) {
            Ok(1) => println!("event: {}", describe_event(&reader_manifest, buf[0])),
            Ok(_) => {}
            Err(err) => {
                error!("reader stopped: {}", err);
                break;
            }
        }
    });

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let input = line.trim();
        match input {
            "" => {}
            "q" | "quit" => break,
            _ => match input.parse::<u8>() {
                Ok(id @ 1..=5) => {
                    let offset = offset_of(manifest, id)?;
                    if let Err(err) = chip.pulse(offset) {
                        error!("pulse on line {}: {}", id, err);
                    }
                }
                _ => debug!("ignoring input '{}'", input),
            },
        }
    }

    info!("session closed");
    Ok(())
}
