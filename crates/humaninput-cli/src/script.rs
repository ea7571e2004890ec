//! Replay scripts
//!
//! One transition per line, `#` starts a comment:
//!
//! ```text
//! down Control at=left     # press, key location optional
//! down ? code=191          # legacy key code, when the key map has none
//! up ? code=191
//! tap a                    # press then release
//! wait 500                 # advance the clock (ms); due timers fire
//! wheel 0 -3
//! mouse down left 10 20
//! mouse up left 10 20
//! touch down 1 0 100
//! say open file            # final speech transcript
//! ```

use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use humaninput_core::{
    HumanInput, KeyInput, KeyLocation, KeyMap, Phase, PointerButton, PointerInput, RawEvent,
    SpeechInput, WheelInput,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Key(Phase, KeyInput),
    Tap(KeyInput),
    Wait(Duration),
    Momentary(RawEvent),
    Pointer(Phase, PointerInput),
}

/// A parsed step and the script line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub text: String,
    pub step: Step,
}

#[derive(Debug, Default, Serialize)]
pub struct StepReport {
    pub line: usize,
    pub step: String,
    pub events: Vec<String>,
    pub prevented: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepReport>,
    /// Every name fired during the replay, once, in first-fired order
    pub events: Vec<String>,
}

const BUTTONS: [PointerButton; 6] = [
    PointerButton::Left,
    PointerButton::Middle,
    PointerButton::Right,
    PointerButton::Back,
    PointerButton::Forward,
    PointerButton::Eraser,
];

fn parse_button(name: &str) -> Result<PointerButton> {
    BUTTONS
        .into_iter()
        .find(|button| button.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow!("unknown pointer button '{}'", name))
}

fn parse_number<T: std::str::FromStr>(value: Option<&str>, what: &str) -> Result<T> {
    let value = value.ok_or_else(|| anyhow!("missing {}", what))?;
    value
        .parse()
        .map_err(|_| anyhow!("{} must be a number, got '{}'", what, value))
}

fn parse_phase(word: Option<&str>) -> Result<Phase> {
    match word {
        Some("down") => Ok(Phase::Press),
        Some("up") => Ok(Phase::Release),
        Some(other) => bail!("expected 'down' or 'up', got '{}'", other),
        None => bail!("expected 'down' or 'up'"),
    }
}

/// `<key> [at=<location>] [code=<n>] [repeat]`. Without `code=`, the key map
/// is asked for the legacy code of `key`.
fn parse_key<'a>(mut words: impl Iterator<Item = &'a str>, keymap: &KeyMap) -> Result<KeyInput> {
    let key = words.next().ok_or_else(|| anyhow!("missing key"))?;
    let mut input = KeyInput::new(key);
    let mut explicit_code = None;

    for word in words {
        match word.split_once('=') {
            Some(("at", location)) => {
                input = input.at(location.parse::<KeyLocation>().map_err(|e| anyhow!(e))?);
            }
            Some(("code", code)) => explicit_code = Some(parse_number::<u32>(Some(code), "code")?),
            None if word == "repeat" => input = input.repeating(),
            _ => bail!("unexpected '{}'", word),
        }
    }

    let code = explicit_code.or_else(|| {
        [input.location, KeyLocation::Standard].into_iter().find_map(|location| {
            keymap
                .code(location, key)
                .or_else(|| keymap.code(location, &key.to_uppercase()))
        })
    });
    if let Some(code) = code {
        input = input.with_key_code(code);
    }
    Ok(input)
}

fn parse_line(text: &str, keymap: &KeyMap) -> Result<Option<Step>> {
    let mut words = text.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    let step = match command {
        "down" => Step::Key(Phase::Press, parse_key(words, keymap)?),
        "up" => Step::Key(Phase::Release, parse_key(words, keymap)?),
        "tap" => Step::Tap(parse_key(words, keymap)?),
        "wait" => Step::Wait(Duration::from_millis(parse_number(words.next(), "wait time")?)),
        "wheel" => Step::Momentary(RawEvent::Wheel(WheelInput {
            delta_x: parse_number(words.next(), "horizontal delta")?,
            delta_y: parse_number(words.next(), "vertical delta")?,
        })),
        "say" => {
            let transcript = words.collect::<Vec<_>>().join(" ");
            if transcript.is_empty() {
                bail!("nothing to say");
            }
            Step::Momentary(RawEvent::Speech(SpeechInput {
                transcript,
                is_final: true,
            }))
        }
        "mouse" => {
            let phase = parse_phase(words.next())?;
            let button = parse_button(words.next().ok_or_else(|| anyhow!("missing button"))?)?;
            let coords: Vec<&str> = words.collect();
            let (x, y) = match coords.as_slice() {
                [] => (0.0, 0.0),
                [x, y] => (parse_number(Some(x), "x")?, parse_number(Some(y), "y")?),
                _ => bail!("expected 'mouse down|up <button> [x y]'"),
            };
            Step::Pointer(phase, PointerInput::mouse(button, x, y))
        }
        "touch" => {
            let phase = parse_phase(words.next())?;
            let id = parse_number(words.next(), "touch id")?;
            let x = parse_number(words.next(), "x")?;
            let y = parse_number(words.next(), "y")?;
            Step::Pointer(phase, PointerInput::touch(id, x, y))
        }
        other => bail!("unknown command '{}'", other),
    };
    Ok(Some(step))
}

/// Parse a whole script. Key codes are looked up in `keymap`.
pub fn parse_script(source: &str, keymap: &KeyMap) -> Result<Vec<ScriptLine>> {
    let mut lines = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let text = raw.split('#').next().unwrap_or("").trim();
        let step = parse_line(text, keymap).with_context(|| format!("line {}: {}", index + 1, raw.trim()))?;
        if let Some(step) = step {
            lines.push(ScriptLine {
                line: index + 1,
                text: text.to_string(),
                step,
            });
        }
    }
    Ok(lines)
}

/// Run `script` through `engine` on a synthetic clock starting at `start`.
pub fn replay(engine: &mut HumanInput, script: &[ScriptLine], start: Instant) -> ReplayReport {
    let mut report = ReplayReport::default();
    let mut now = start;

    for line in script {
        engine.start_recording();
        let mut dispatch = engine.tick(now);
        match &line.step {
            Step::Wait(duration) => {
                now += *duration;
                dispatch.merge(engine.tick(now));
            }
            Step::Key(Phase::Press, input) => dispatch.merge(engine.handle_press(input.clone(), now)),
            Step::Key(_, input) => dispatch.merge(engine.handle_release(input.clone(), now)),
            Step::Tap(input) => {
                dispatch.merge(engine.handle_press(input.clone(), now));
                dispatch.merge(engine.handle_release(input.clone(), now));
            }
            Step::Momentary(event) => dispatch.merge(engine.handle_momentary(event.clone(), now)),
            Step::Pointer(Phase::Press, input) => dispatch.merge(engine.handle_press(*input, now)),
            Step::Pointer(_, input) => dispatch.merge(engine.handle_release(*input, now)),
        }
        let events = engine.stop_recording();

        for name in &events {
            if !report.events.contains(name) {
                report.events.push(name.clone());
            }
        }
        report.steps.push(StepReport {
            line: line.line,
            step: line.text.clone(),
            events,
            prevented: dispatch.prevent_default(),
        });
    }
    report
}
