//! arpwatch - passive network watcher daemon.
//!
//! Captures on one interface, classifies frames into host sightings and
//! hands them to a sink on a separate thread.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use arptools::config::{SinkKind, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use arptools::{
    drain, CaptureLoop, Config, ConsoleSink, Dissector, ObservationBuffer, ObservationSink,
    PnetCapture, ReverseDns, SqlSink,
};

#[derive(Parser)]
#[command(name = "arpwatch")]
#[command(version, about = "Passive network watcher - records hosts seen on the wire")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Network interface to watch (overrides the config file)
    #[arg(short, long)]
    interface: Option<String>,

    /// Enable debug logging and verbose console output
    #[arg(short, long)]
    debug: bool,

    /// List available network interfaces and exit
    #[arg(long)]
    list_interfaces: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_interfaces {
        println!("Available network interfaces:");
        for iface in PnetCapture::list_interfaces() {
            println!("  {}", iface);
        }
        return Ok(());
    }

    let mut config = load_config(&args)?;
    if let Some(interface) = args.interface {
        config.interface = Some(interface);
    }

    init_tracing(&config, args.debug);
    run(config, args.debug)
}

/// `RUST_LOG` wins, then `--debug`, then `configured`.
fn env_filter(configured: &str, debug: bool) -> EnvFilter {
    let fallback = if debug { "debug" } else { configured };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// The log filter lives in the config file, so loading it runs under a
/// temporary subscriber with the default filter.
fn load_config(args: &Args) -> Result<Config> {
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter(DEFAULT_LOG_FILTER, args.debug))
        .with_target(false)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::with_default(bootstrap, || Config::load(&args.config))
        .with_context(|| format!("Failed to load config from {:?}", args.config))
}

fn init_tracing(config: &Config, debug: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.log_filter, debug))
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn make_sink(config: &Config, verbose: bool) -> Result<Box<dyn ObservationSink>> {
    let sink: Box<dyn ObservationSink> = match config.sink {
        SinkKind::Console => Box::new(ConsoleSink::new().with_verbose(verbose)),
        SinkKind::Sql => match &config.sql_output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create SQL output {:?}", path))?;
                sql_sink(config, BufWriter::new(file))
            }
            None => sql_sink(config, io::stdout()),
        },
    };
    Ok(sink)
}

fn sql_sink<W: Write + Send + 'static>(config: &Config, out: W) -> Box<dyn ObservationSink> {
    let sink = SqlSink::new(out, config.location.clone(), config.label.clone());
    if config.reverse_dns {
        Box::new(sink.with_resolver(ReverseDns))
    } else {
        Box::new(sink)
    }
}

fn run(config: Config, verbose: bool) -> Result<()> {
    let interface = match config.interface.clone() {
        Some(name) => name,
        None => PnetCapture::default_interface()
            .ok_or_else(|| anyhow!("No suitable network interface found"))?,
    };

    let source = PnetCapture::open(&interface, &config.capture_options())
        .with_context(|| format!("Failed to open capture on {}", interface))?;
    let buffer = Arc::new(ObservationBuffer::new(config.buffer_size, config.ring)?);
    let dissector = Dissector::new(config.vlan_context());

    info!(
        "Watching {} (buffer {} slots, {} mode, native VLAN {:?}, location '{}')",
        interface,
        config.buffer_size,
        if buffer.is_ring() { "ring" } else { "bounded" },
        config.native_vlan,
        config.location
    );

    let mut sink = make_sink(&config, verbose)?;
    sink.on_start(&interface);
    let sink_thread = {
        let buffer = buffer.clone();
        thread::Builder::new()
            .name("sink".to_string())
            .spawn(move || {
                let handled = drain(&buffer, sink.as_mut());
                sink.on_stop();
                handled
            })
            .context("Failed to start sink thread")?
    };

    let capture = CaptureLoop::new(source, dissector, buffer.clone())
        .with_stats_interval(config.stats_interval)
        .spawn()
        .context("Failed to start capture thread")?;

    let stopper = capture.stopper();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        stopper.stop();
    })
    .context("Failed to set Ctrl-C handler")?;

    let result = capture.join();

    buffer.close();
    let handled = sink_thread
        .join()
        .map_err(|_| anyhow!("Sink thread panicked"))?;

    let summary = result.context("Capture failed")?;
    let stats = buffer.stats();
    info!(
        "Stopped: {} frames, {} observations, {} reported",
        summary.frames, summary.observations, handled
    );
    if stats.overruns > 0 || summary.truncated > 0 || summary.malformed > 0 {
        warn!(
            "{} overruns ({} dropped, {} evicted), {} duplicates, {} truncated frames, {} malformed frames",
            stats.overruns,
            summary.dropped,
            summary.evicted,
            summary.duplicates,
            summary.truncated,
            summary.malformed
        );
    }

    Ok(())
}
