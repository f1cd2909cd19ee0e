//! Proximity light: shows a sensor reading as an LED colour.
//!
//! Polls the sensor face ten times a second and picks a palette colour from
//! the value, `COLORS[value / 32]`.
//!
//! Run with:
//!   cargo run --example led --features cli -- -a 00:11:22:33:44:55 --sensor 6

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use mossbrain::client::{connect, ClientConfig, Color, Face, FaceState, COLORS};

const POLLING_PERIOD: Duration = Duration::from_millis(100);

#[derive(Parser)]
struct Args {
    /// Device Bluetooth address (skips discovery).
    #[arg(short, long, env = "MOSSBRAIN_ADDRESS")]
    address: Option<String>,
    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,
    /// Face the proximity sensor is attached to (0-7).
    #[arg(long, default_value_t = 6)]
    sensor: u8,
}

fn color_for(value: u8) -> Color {
    COLORS[usize::from(value / 32)]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    let sensor = Face::new(args.sensor)?;
    let mut config = ClientConfig::default();
    if let Some(address) = args.address {
        config = config.with_address(address);
    }

    let mut brain = connect(&config)?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    let interrupter = brain.interrupter()?;
    ctrlc::set_handler(move || {
        // A second Ctrl-C aborts a call stuck on a silent device.
        if !flag.swap(false, Ordering::SeqCst) {
            let _ = interrupter.interrupt();
        }
    })?;

    brain.set_face_state(sensor, FaceState::Input)?;
    while running.load(Ordering::SeqCst) {
        let value = brain.face_value(sensor)?;
        brain.set_led(color_for(value))?;
        thread::sleep(POLLING_PERIOD);
    }

    eprintln!("Stopping");
    brain.close();
    Ok(())
}
