//! Obstacle-avoiding rover.
//!
//! Two wheel motors hang off the right and left faces and a proximity sensor
//! looks ahead. The rover drives forward until the sensor reads an obstacle,
//! then backs up, turns and carries on. The LED shows the manoeuvre: green
//! forward, red backward, yellow turning.
//!
//! Run with:
//!   cargo run --example rover --features cli -- -a 00:11:22:33:44:55

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use mossbrain::client::{connect, BrainClient, ClientConfig, ClientError, Color, Face, FaceState};
use mossbrain::transport::DuplexStream;

const FORWARD_SPEED: u8 = 200;
const BACKWARD_SPEED: u8 = 55;

const FORWARD_DURATION: Duration = Duration::from_millis(500);
const BACKWARD_DURATION: Duration = Duration::from_millis(400);
const TURN_DURATION: Duration = Duration::from_millis(600);

/// Sensor values at or above this mean something is close.
const OBSTACLE_THRESHOLD: u8 = 85;

#[derive(Parser)]
struct Args {
    /// Device Bluetooth address (skips discovery).
    #[arg(short, long, env = "MOSSBRAIN_ADDRESS")]
    address: Option<String>,
    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,
    /// Proximity sensor face (0-7).
    #[arg(long, default_value_t = 6)]
    sensor: u8,
    /// Right wheel face (0-7).
    #[arg(long, default_value_t = 0)]
    right: u8,
    /// Left wheel face (0-7).
    #[arg(long, default_value_t = 7)]
    left: u8,
}

struct Rover<'a, S: DuplexStream> {
    brain: &'a mut BrainClient<S>,
    right: Face,
    left: Face,
}

impl<S: DuplexStream> Rover<'_, S> {
    fn control(
        &mut self,
        duration: Duration,
        left: u8,
        right: u8,
        color: Color,
    ) -> Result<(), ClientError> {
        self.brain.set_led(color)?;
        self.brain.set_face_value(self.right, right)?;
        self.brain.set_face_value(self.left, left)?;
        thread::sleep(duration);
        Ok(())
    }

    fn forward(&mut self, duration: Duration) -> Result<(), ClientError> {
        self.control(duration, FORWARD_SPEED, FORWARD_SPEED, Color::GREEN)
    }

    fn backward(&mut self, duration: Duration) -> Result<(), ClientError> {
        self.control(duration, BACKWARD_SPEED, BACKWARD_SPEED, Color::RED)
    }

    fn turn(&mut self, duration: Duration) -> Result<(), ClientError> {
        self.control(duration, BACKWARD_SPEED, FORWARD_SPEED, Color::YELLOW)
    }
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
    let right = Face::new(args.right)?;
    let left = Face::new(args.left)?;
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
    let mut rover = Rover {
        brain: &mut brain,
        right,
        left,
    };
    rover.forward(Duration::ZERO)?;
    while running.load(Ordering::SeqCst) {
        thread::sleep(FORWARD_DURATION);
        if rover.brain.face_value(sensor)? < OBSTACLE_THRESHOLD {
            continue;
        }
        rover.backward(BACKWARD_DURATION)?;
        rover.turn(TURN_DURATION)?;
        rover.forward(Duration::ZERO)?;
    }

    eprintln!("Stopping");
    brain.close();
    Ok(())
}
