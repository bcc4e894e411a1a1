//! Headless widget driver
//!
//! Launches one map widget against a [`RecordingHost`], replays a JSONL
//! file of host events through its command bus and prints every vendor call
//! the widget made, one JSON object per line.

use anyhow::{Context, Result};
use clap::Parser;
use maps_toolkit::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "toolkit-app")]
#[command(about = "Replay host commands against a map widget and print the vendor calls")]
#[command(version)]
struct Cli {
    /// google-maps, mapbox, here-maps or leaflet
    #[arg(short, long)]
    provider: Provider,

    /// Widget configuration (JSON object)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host events, one `{"topic": .., "payload": ..}` object per line
    #[arg(long)]
    commands: Option<PathBuf>,

    /// Position reported by the geolocation API as `lat,lng`; denied when absent
    #[arg(long, value_parser = parse_position)]
    user_location: Option<LatLng>,

    /// Failed readiness probes before the SDK global appears
    #[arg(long, default_value_t = 0)]
    ready_after: u32,

    #[arg(long, default_value_t = 300)]
    interval_ms: u64,

    #[arg(long, default_value_t = 10)]
    max_attempts: u32,

    /// Tear the widget down after the commands ran
    #[arg(long)]
    teardown: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn parse_position(s: &str) -> std::result::Result<LatLng, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lng, got '{s}'"))?;
    let lat = lat.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let lng = lng.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(LatLng::new(lat, lng))
}

fn read_config(path: Option<&Path>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(Value::Null);
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn read_commands(path: &Path) -> Result<Vec<HostEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading commands {}", path.display()))?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid event", path.display(), n + 1))
        })
        .collect()
}

fn print_calls(host: &RecordingHost) -> Result<()> {
    for call in host.calls() {
        println!("{}", serde_json::to_string(&call)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        maps_toolkit::init_debug_logging();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let raw = read_config(cli.config.as_deref())?;
    let settings = ConfigResolver::new(cli.provider).resolve_value(&raw);
    let global = adapter_for(cli.provider).script(&settings).global;

    let host = RecordingHost::new().ready_after(&global, cli.ready_after);
    let loader = ScriptLoader::new(TokioScheduler)
        .with_interval(Duration::from_millis(cli.interval_ms))
        .with_max_attempts(cli.max_attempts);
    let geolocator = cli
        .user_location
        .map(StaticGeolocator::at)
        .unwrap_or_else(StaticGeolocator::denied);

    let launched = WidgetBuilder::new(cli.provider)
        .config(raw)
        .host(host.clone())
        .geolocator(geolocator)
        .launch(&loader)
        .await;
    let mut widget = match launched {
        Ok(widget) => widget,
        Err(e) => {
            print_calls(&host)?;
            return Err(e).context(format!("{} widget failed to start", cli.provider));
        }
    };

    if let Some(path) = cli.commands.as_deref() {
        let events = read_commands(path)?;
        for event in &events {
            widget.publish(&event.topic, event.payload.clone())?;
        }
        let handled = widget.pump();
        log::info!("handled {handled} of {} events", events.len());
    }

    log::info!(
        "{} markers on the map, surface {}",
        widget.surface().registry().len(),
        widget.surface().state()
    );

    if cli.teardown {
        widget.teardown()?;
    }

    print_calls(&host)
}
