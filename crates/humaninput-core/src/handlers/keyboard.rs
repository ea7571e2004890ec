use crate::engine::{Core, Dispatch};
use crate::input::{KeyInput, Modality, Phase, RawEvent};
use crate::names::ResolvedKey;
use crate::registry::Payload;

use super::{InputHandler, Transition};

/// More than this many inputs held at once fires `faceplant`.
const FACEPLANT_THRESHOLD: usize = 5;

/// The name platforms report while an IME composition is starting.
const COMPOSE_KEY: &str = "Compose";

#[derive(Debug, Default)]
pub struct KeyboardHandler {
    composing: bool,
}

impl KeyboardHandler {
    fn press(&mut self, core: &mut Core, transition: &Transition<'_>, input: &KeyInput) -> Dispatch {
        let ResolvedKey { name, code, .. } = core.resolver().resolve(input);
        if name == COMPOSE_KEY {
            self.composing = true;
            return Dispatch::default();
        }
        if !core.ledger().press_time().contains(&name) {
            core.add_down(&name, Some(&code));
        }
        core.rearm(transition.now);

        if !core.accepts(transition.event) {
            return Dispatch::default();
        }
        if input.repeat && core.settings().no_key_repeat {
            return Dispatch::suppressed();
        }

        let payload = Payload::Key {
            key: name.clone(),
            code,
        };
        let mut dispatch = Dispatch::from(core.trigger("keydown", &payload));
        if core.ledger().len() > FACEPLANT_THRESHOLD {
            dispatch.extend(core.trigger("faceplant", &payload));
        }
        dispatch.extend(core.trigger(format!("keydown:{}", name.to_lowercase()), &payload));
        dispatch.extend(core.handle_down_events(&payload));
        dispatch
    }

    fn release(&mut self, core: &mut Core, transition: &Transition<'_>, input: &KeyInput) -> Dispatch {
        // Nothing held means state was reset while this key was down
        if core.ledger().is_empty() {
            return Dispatch::default();
        }
        if self.composing {
            self.composing = false;
            return Dispatch::default();
        }

        let ResolvedKey { name, code, .. } = core.resolver().resolve(input);
        let mut dispatch = Dispatch::default();
        if core.accepts(transition.event) {
            let payload = Payload::Key {
                key: name.clone(),
                code,
            };
            dispatch.extend(core.trigger("keyup", &payload));
            dispatch.extend(core.trigger(format!("keyup:{}", name.to_lowercase()), &payload));
            dispatch.extend(core.handle_seq_events(transition.now));
        }
        // State stays accurate even when filtered
        core.remove_down(&name);
        dispatch
    }
}

impl InputHandler for KeyboardHandler {
    fn modality(&self) -> Modality {
        Modality::Keyboard
    }

    fn handle(&mut self, core: &mut Core, transition: Transition<'_>) -> Dispatch {
        let RawEvent::Key(input) = transition.event else {
            return Dispatch::default();
        };
        match transition.phase {
            Phase::Press => self.press(core, &transition, input),
            Phase::Release => self.release(core, &transition, input),
            Phase::Momentary => {
                let mut dispatch = self.press(core, &transition, input);
                dispatch.merge(self.release(core, &transition, input));
                dispatch
            }
        }
    }

    fn reset(&mut self) {
        self.composing = false;
    }
}
