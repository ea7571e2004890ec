use std::collections::HashMap;

use crate::engine::{Core, Dispatch};
use crate::input::{ClickInput, ClickKind, Modality, Phase, PointerButton, PointerInput, PointerKind, RawEvent};
use crate::registry::Payload;

use super::{InputHandler, Transition};

/// A touch that ends within this many pixels of where it started is a tap;
/// platforms follow it with emulated mouse events that are dropped.
const EMULATED_MOUSE_RADIUS: f64 = 20.0;

/// Pointer, mouse and touch presses plus click gestures.
#[derive(Debug, Default)]
pub struct PointerHandler {
    /// Where each active touch started
    touches: HashMap<u32, (f64, f64)>,
    down_at: Option<(f64, f64)>,
    no_mouse_events: bool,
}

fn ledger_name(input: &PointerInput) -> String {
    match input.button {
        Some(button) => format!("pointer:{}", button.name()),
        None => "pointer".to_string(),
    }
}

fn payload(input: &PointerInput) -> Payload {
    Payload::Pointer {
        kind: input.kind,
        button: input.button.map(|b| b.name()),
        x: input.x,
        y: input.y,
    }
}

/// Swipe direction for a pointer that travelled from `start` to `end`.
fn swipe_direction(start: (f64, f64), end: (f64, f64), threshold: f64) -> Option<&'static str> {
    let dx = start.0 - end.0;
    let dy = start.1 - end.1;
    if dx.abs() > dy.abs() {
        if dx > threshold {
            Some("left")
        } else if dx < -threshold {
            Some("right")
        } else {
            None
        }
    } else if dy > threshold {
        Some("up")
    } else if dy < -threshold {
        Some("down")
    } else {
        None
    }
}

impl PointerHandler {
    fn press(&mut self, core: &mut Core, transition: &Transition<'_>, input: &PointerInput) -> Dispatch {
        if input.kind == PointerKind::Mouse && self.no_mouse_events {
            return Dispatch::default();
        }
        if let (PointerKind::Touch, Some(id)) = (input.kind, input.pointer_id) {
            self.touches.entry(id).or_insert((input.x, input.y));
        }
        self.down_at = Some((input.x, input.y));
        core.rearm(transition.now);

        let name = ledger_name(input);
        let payload = payload(input);
        let accepted = core.accepts(transition.event);
        let mut dispatch = Dispatch::default();
        if accepted {
            dispatch.extend(core.trigger("pointer:down", &payload));
            if let Some(button) = input.button {
                dispatch.extend(core.trigger(format!("pointer:{}:down", button.name()), &payload));
                if input.kind == PointerKind::Mouse {
                    dispatch.extend(core.trigger(format!("mouse:{}:down", button.name()), &payload));
                }
            }
            if input.kind == PointerKind::Touch {
                dispatch.extend(core.trigger("touch:down", &payload));
            }
        }
        core.add_down(&name, None);
        if accepted {
            dispatch.extend(core.handle_down_events(&payload));
        }
        dispatch
    }

    fn release(&mut self, core: &mut Core, transition: &Transition<'_>, input: &PointerInput) -> Dispatch {
        let start = match (input.kind, input.pointer_id) {
            (PointerKind::Touch, Some(id)) => self.touches.remove(&id).or(self.down_at),
            _ => self.down_at,
        };
        let mut click = false;
        if input.kind == PointerKind::Touch {
            if let Some((x, y)) = start {
                if (input.x - x).abs() < EMULATED_MOUSE_RADIUS && (input.y - y).abs() < EMULATED_MOUSE_RADIUS {
                    self.no_mouse_events = true;
                }
                click = input.x == x && input.y == y;
            }
        }
        if input.kind == PointerKind::Mouse && self.no_mouse_events {
            self.no_mouse_events = false;
            return Dispatch::default();
        }
        core.rearm(transition.now);
        self.down_at = None;

        let name = ledger_name(input);
        if !core.accepts(transition.event) {
            core.remove_down(&name);
            return Dispatch::default();
        }

        let payload = payload(input);
        let mut dispatch = Dispatch::from(core.trigger("pointer:up", &payload));
        if let Some(button) = input.button {
            dispatch.extend(core.trigger(format!("pointer:{}:up", button.name()), &payload));
            if input.kind == PointerKind::Mouse {
                dispatch.extend(core.trigger(format!("mouse:{}:up", button.name()), &payload));
            }
        } else if input.kind == PointerKind::Touch {
            dispatch.extend(core.trigger("touch:up", &payload));
        }

        let threshold = core.settings().swipe_threshold;
        match start.and_then(|start| swipe_direction(start, (input.x, input.y), threshold)) {
            Some(direction) => {
                let swipe = format!("swipe:{}", direction);
                tracing::debug!("Swipe detected: {}", swipe);
                core.remove_down(&name);
                core.add_down(&swipe, None);
                dispatch.extend(core.handle_down_events(&payload));
                dispatch.extend(core.handle_seq_events(transition.now));
                core.remove_down(&swipe);
            }
            None => {
                dispatch.extend(core.handle_seq_events(transition.now));
                core.remove_down(&name);
                if click {
                    dispatch.extend(core.trigger("click", &payload));
                }
            }
        }
        dispatch
    }

    /// Click gestures never enter the ledger or the sequence buffer.
    fn click(&mut self, core: &mut Core, transition: &Transition<'_>, input: &ClickInput) -> Dispatch {
        core.rearm(transition.now);
        if !core.accepts(transition.event) {
            return Dispatch::default();
        }
        let payload = Payload::Pointer {
            kind: PointerKind::Mouse,
            button: Some(input.button.name()),
            x: 0.0,
            y: 0.0,
        };
        let base = match input.kind {
            ClickKind::Click => "click",
            ClickKind::DoubleClick => "dblclick",
            ClickKind::ContextMenu => return Dispatch::from(core.trigger("contextmenu", &payload)),
        };
        let mut dispatch = Dispatch::default();
        if input.button == PointerButton::Left {
            dispatch.extend(core.trigger(base, &payload));
        }
        dispatch.extend(core.trigger(format!("{}:{}", base, input.button.name()), &payload));
        dispatch
    }
}

impl InputHandler for PointerHandler {
    fn modality(&self) -> Modality {
        Modality::Pointer
    }

    fn handle(&mut self, core: &mut Core, transition: Transition<'_>) -> Dispatch {
        match (transition.event, transition.phase) {
            (RawEvent::Pointer(input), Phase::Press) => self.press(core, &transition, input),
            (RawEvent::Pointer(input), Phase::Release) => self.release(core, &transition, input),
            (RawEvent::Pointer(input), Phase::Momentary) => {
                let mut dispatch = self.press(core, &transition, input);
                dispatch.merge(self.release(core, &transition, input));
                dispatch
            }
            (RawEvent::Click(input), Phase::Press | Phase::Momentary) => {
                self.click(core, &transition, input)
            }
            _ => Dispatch::default(),
        }
    }

    fn reset(&mut self) {
        self.touches.clear();
        self.down_at = None;
        self.no_mouse_events = false;
    }
}
