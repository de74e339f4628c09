//! Huddle scenario runner.
//!
//! # Usage
//!
//! ```bash
//! # Start a call in a fresh room, then leave
//! huddle --scenario happy
//!
//! # Open a deep link against a room base URL and watch the engine fail
//! huddle --path /standup --room-base https://team.example.com --scenario engine-error
//! ```

use std::io::Write;

use clap::Parser;
use huddle_cli::{Scenario, ScenarioConfig, scenario};
use huddle_core::RoomAddressCodec;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Huddle call session simulator
#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(about = "Run scripted call scenarios against a simulated engine")]
#[command(version)]
struct Args {
    /// Page path the client opens at. A single segment joins that room.
    #[arg(short, long, default_value = "/")]
    path: String,

    /// Base URL room identifiers resolve against
    #[arg(long)]
    room_base: Option<String>,

    /// Scenario to run
    #[arg(short, long, value_enum, default_value_t = Scenario::Happy)]
    scenario: Scenario,

    /// Seed for generated room names
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let codec = match &args.room_base {
        Some(base) => RoomAddressCodec::with_base(base)?,
        None => RoomAddressCodec::new(),
    };
    let config = ScenarioConfig { path: args.path, codec, seed: args.seed };

    let report = scenario::run(args.scenario, config).await?;

    let mut out = std::io::stdout().lock();
    for frame in &report.frames {
        writeln!(out, "== {}", frame.label)?;
        for line in &frame.lines {
            writeln!(out, "  {line}")?;
        }
    }
    writeln!(out, "== final state: {}", report.final_state)?;

    Ok(())
}
