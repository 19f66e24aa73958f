use building_sim::config::SimulatorConfig;
use building_sim::{shutdown_channel, BuildingSimulator, ConfigError, SystemClock};
use clap::{App, Arg, ArgMatches};
use colored::*;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("building-sim")
        .version("0.1.0")
        .about("🏢 Building Sensor Simulator - BACnet objects, Modbus registers and room telemetry")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("PATH")
                .help("TOML file with simulator settings, rooms and sensor bindings")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .value_name("SEED")
                .help("Base seed for reproducible runs")
                .takes_value(true)
                .validator(|v| v.parse::<u64>().map(|_| ()).map_err(|_| "Seed must be a non-negative integer".into())),
        )
        .arg(
            Arg::with_name("publish-interval")
                .long("publish-interval")
                .value_name("MS")
                .help("Room telemetry publish interval in milliseconds")
                .env("PUBLISH_INTERVAL_MS")
                .takes_value(true)
                .validator(|v| match v.parse::<u64>() {
                    Ok(ms) if ms > 0 => Ok(()),
                    _ => Err("Publish interval must be a positive number of milliseconds".into()),
                }),
        )
        .arg(
            Arg::with_name("topic-prefix")
                .long("topic-prefix")
                .value_name("PREFIX")
                .help("Topic prefix for room telemetry")
                .env("TOPIC_PREFIX")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("log-level")
                .short("l")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level when RUST_LOG is not set")
                .takes_value(true)
                .possible_values(&["error", "warn", "info", "debug", "trace"]),
        )
        .get_matches();

    let config = match load_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "configuration error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.simulator.log_level)),
        )
        .init();

    let simulator = match BuildingSimulator::from_config(&config, Arc::new(SystemClock)) {
        Ok(simulator) => simulator,
        Err(e) => {
            error!(error = %e, "failed to build simulator");
            eprintln!("{} {}", "configuration error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    print_banner(&simulator, &config);

    let mut telemetry_rx = simulator.subscribe();
    let listener = tokio::spawn(async move {
        loop {
            match telemetry_rx.recv().await {
                Ok(message) => debug!(topic = %message.topic, payload = %message.payload, "telemetry"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "telemetry listener lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let (trigger, shutdown) = shutdown_channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown requested"),
            Err(e) => error!(error = %e, "failed to listen for ctrl-c, shutting down"),
        }
        trigger.trigger();
    });

    let stats = simulator.run(shutdown).await;
    listener.abort();

    println!();
    println!("{}", "Simulation stopped".bold());
    println!(
        "  {} {} passes, {} lagging, {} failed entries",
        "bacnet:   ".cyan(),
        stats.bacnet.passes,
        stats.bacnet.lagging_passes,
        stats.bacnet.failed_entries
    );
    println!(
        "  {} {} passes, {} lagging, {} failed entries",
        "modbus:   ".cyan(),
        stats.modbus.passes,
        stats.modbus.lagging_passes,
        stats.modbus.failed_entries
    );
    println!(
        "  {} {} messages in {:.1}s ({:.2} msg/s)",
        "telemetry:".cyan(),
        stats.publisher.total_messages,
        stats.publisher.elapsed_s,
        stats.publisher.average_rate
    );

    Ok(())
}

/// File (or built-in reference layout) with command line overrides applied.
fn load_config(matches: &ArgMatches) -> Result<SimulatorConfig, ConfigError> {
    let mut config = match matches.value_of("config") {
        Some(path) => SimulatorConfig::load(Path::new(path))?,
        None => SimulatorConfig::default(),
    };

    // Validators above guarantee these parse
    if let Some(seed) = matches.value_of("seed").and_then(|v| v.parse().ok()) {
        config.simulator.seed = Some(seed);
    }
    if let Some(ms) = matches.value_of("publish-interval").and_then(|v| v.parse().ok()) {
        config.simulator.publish_interval_ms = ms;
    }
    if let Some(prefix) = matches.value_of("topic-prefix") {
        config.simulator.topic_prefix = prefix.to_string();
    }
    if let Some(level) = matches.value_of("log-level") {
        config.simulator.log_level = level.to_string();
    }

    config.validate()?;
    Ok(config)
}

fn print_banner(simulator: &BuildingSimulator, config: &SimulatorConfig) {
    println!("{}", "🏢 Building Sensor Simulator".bold());
    println!("============================");
    for room in simulator.publisher().rooms() {
        println!(
            "   {} {:<18} floor {}  → {}",
            room.room_id.cyan(),
            room.name,
            room.floor,
            simulator.publisher().topic_for(room.room_id)
        );
    }
    let device = simulator.objects().device();
    println!(
        "📡 BACnet device {} ({} objects), Modbus block ({} registers)",
        device.instance.to_string().green(),
        simulator.objects().len(),
        simulator.registers().len()
    );
    println!(
        "⏱  protocol refresh {} ms, telemetry every {} ms, seed {}",
        config.simulator.protocol_refresh_ms,
        config.simulator.publish_interval_ms,
        config
            .simulator
            .seed
            .map_or_else(|| "random".to_string(), |seed| seed.to_string())
    );
    println!("Press Ctrl-C to stop");
}
