//! humaninput CLI
//!
//! Validate configuration, list input devices, replay transition scripts and
//! watch live devices through the humaninput engine.

mod keys;
mod script;
mod watch;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use humaninput_config::{Config, ConfigError};
use miette::IntoDiagnostic;

#[derive(Parser, Debug)]
#[command(name = "humaninput")]
#[command(about = "Named input events from keyboards, pointers and more")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = humaninput_config::DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration file
    Validate,

    /// List available input devices
    Devices,

    /// Run a transition script through the engine and print the fired events
    Replay {
        /// Script file, one transition per line
        script: PathBuf,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the events fired by a live input device
    Watch {
        /// evdev device node (e.g. /dev/input/event3)
        device: PathBuf,

        /// Print one JSON object per transition
        #[arg(long)]
        json: bool,
    },
}

/// Load the configuration, treating a missing file as the defaults.
fn load_config(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    humaninput_config::parse_config(path).map(Some)
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path = humaninput_config::config_path(Some(&cli.config));
    let loaded = load_config(&config_path);

    // RUST_LOG wins over the configured level
    let level = match &loaded {
        Ok(Some(config)) => config.global.log_level,
        _ => Default::default(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate => cmd_validate(&config_path, loaded),
        Commands::Devices => cmd_devices(),
        Commands::Replay { script, json } => cmd_replay(&config_path, loaded?, &script, json),
        Commands::Watch { device, json } => cmd_watch(&config_path, loaded?, &device, json),
    }
}

fn engine_config(config_path: &Path, loaded: Option<Config>) -> Config {
    loaded.unwrap_or_else(|| {
        tracing::debug!(
            "No configuration at {}, using defaults",
            config_path.display()
        );
        Config::default()
    })
}

fn cmd_validate(config_path: &Path, loaded: Result<Option<Config>, ConfigError>) -> miette::Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let config = match loaded? {
        Some(config) => config,
        None => {
            return Err(miette::miette!(
                "Configuration file not found: {}",
                config_path.display()
            ))
        }
    };

    println!("Configuration is valid!");
    let settings = &config.settings;
    let listen: Vec<String> = settings.listen.iter().map(ToString::to_string).collect();
    println!("  Listening to: {}", listen.join(", "));
    println!(
        "  Sequence timeout: {}ms, buffer: {}",
        settings.sequence_timeout_ms, settings.max_sequence_buf
    );
    println!("  Aliases: {}", config.aliases.len());
    for (name, target) in &config.aliases {
        println!("    - {} -> {}", name, target);
    }
    println!("  Controllers: {}", config.controllers.len());
    for layout in &config.controllers {
        println!("    - {} ({} button(s))", layout.name, layout.aliases.len());
    }
    println!("  Key map overrides: {}", config.keymap.len());
    Ok(())
}

fn cmd_devices() -> miette::Result<()> {
    println!("Available input devices:\n");

    for entry in std::fs::read_dir("/dev/input").into_diagnostic()? {
        let entry = entry.into_diagnostic()?;
        let path = entry.path();

        if !path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false)
        {
            continue;
        }

        match evdev::Device::open(&path) {
            Ok(device) => {
                let name = device.name().unwrap_or("Unknown");
                let id = device.input_id();
                let vendor_product = format!("{:04x}:{:04x}", id.vendor(), id.product());

                let keys = device.supported_keys();
                let has_key = |key: evdev::Key| keys.map(|keys| keys.contains(key)).unwrap_or(false);
                let has_wheel = device
                    .supported_relative_axes()
                    .map(|axes| axes.contains(evdev::RelativeAxisType::REL_WHEEL))
                    .unwrap_or(false);

                let device_type = if has_key(evdev::Key::KEY_A) {
                    "keyboard"
                } else if has_key(evdev::Key::BTN_LEFT) || has_wheel {
                    "pointer"
                } else {
                    "other"
                };

                println!("  {} [{}]", name, device_type);
                println!("    Path: {}", path.display());
                println!("    ID: {}", vendor_product);
                println!();
            }
            Err(e) => {
                tracing::debug!("Could not open {}: {}", path.display(), e);
            }
        }
    }

    Ok(())
}

fn cmd_replay(config_path: &Path, loaded: Option<Config>, script_path: &Path, json: bool) -> miette::Result<()> {
    let config = engine_config(config_path, loaded);
    let mut engine = config.build_engine()?;

    let source = std::fs::read_to_string(script_path).into_diagnostic()?;
    let keymap = config.keymap();
    let steps = script::parse_script(&source, &keymap).map_err(|e| miette::miette!("{:#}", e))?;
    let report = script::replay(&mut engine, &steps, Instant::now());

    if json {
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        return Ok(());
    }

    for step in &report.steps {
        let marker = if step.prevented { " (prevented)" } else { "" };
        println!("{:>4}  {}{}", step.line, step.step, marker);
        for name in &step.events {
            println!("        {}", name);
        }
    }
    println!("\n{} unique event(s)", report.events.len());
    Ok(())
}

fn cmd_watch(config_path: &Path, loaded: Option<Config>, device: &Path, json: bool) -> miette::Result<()> {
    let engine = engine_config(config_path, loaded).build_engine()?;

    // The engine is single-threaded; keep everything on this thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    runtime
        .block_on(watch::run(engine, device, json))
        .map_err(|e| miette::miette!("{:#}", e))
}
