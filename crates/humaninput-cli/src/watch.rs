//! Live input from an evdev device

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use evdev::Device;
use humaninput_core::{Dispatch, HumanInput, Phase};

use crate::keys::KeyTranslator;

/// Sleep until `deadline`, or forever when there is none.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

fn print_fired(names: &[String], dispatch: &Dispatch, json: bool) -> Result<()> {
    if names.is_empty() {
        return Ok(());
    }
    if json {
        let line = serde_json::json!({
            "events": names,
            "prevented": dispatch.prevent_default(),
        });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!("{}", names.join("  "));
    }
    Ok(())
}

/// Feed `path`'s events to `engine` and print every fired name until Ctrl-C.
pub async fn run(mut engine: HumanInput, path: &Path, json: bool) -> Result<()> {
    let device = Device::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let name = device.name().unwrap_or("Unknown").to_string();
    let mut stream = device
        .into_event_stream()
        .with_context(|| format!("Failed to create event stream for '{}' at {}", name, path.display()))?;
    tracing::info!("Watching '{}' at {}", name, path.display());
    eprintln!("Watching '{}' (Ctrl-C to stop)", name);

    let mut translator = KeyTranslator::default();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let deadline = engine.next_deadline();
        tokio::select! {
            result = stream.next_event() => {
                let event = result.with_context(|| format!("Event read error on {}", path.display()))?;
                let Some((phase, raw)) = translator.translate(&event) else {
                    continue;
                };
                let now = Instant::now();
                engine.start_recording();
                let dispatch = match phase {
                    Phase::Press => engine.handle_press(raw, now),
                    Phase::Release => engine.handle_release(raw, now),
                    Phase::Momentary => engine.handle_momentary(raw, now),
                };
                print_fired(&engine.stop_recording(), &dispatch, json)?;
            }
            _ = sleep_until(deadline) => {
                engine.start_recording();
                let dispatch = engine.tick(Instant::now());
                print_fired(&engine.stop_recording(), &dispatch, json)?;
            }
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Shutting down...");
                break;
            }
        }
    }

    Ok(())
}
