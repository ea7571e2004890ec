use crate::engine::{Core, Dispatch};
use crate::input::{Modality, Phase, RawEvent, WheelInput};
use crate::registry::Payload;

use super::{InputHandler, Transition};

/// Wheel ticks. Each directional tick is a momentary ledger entry, so it can
/// take part in chords (`ctrl-wheel:up`) and sequences.
#[derive(Debug, Default)]
pub struct WheelHandler;

fn direction(input: &WheelInput) -> Option<&'static str> {
    if input.delta_y > 0.0 {
        Some("wheel:down")
    } else if input.delta_y < 0.0 {
        Some("wheel:up")
    } else if input.delta_x > 0.0 {
        Some("wheel:right")
    } else if input.delta_x < 0.0 {
        Some("wheel:left")
    } else {
        None
    }
}

impl InputHandler for WheelHandler {
    fn modality(&self) -> Modality {
        Modality::Wheel
    }

    fn handle(&mut self, core: &mut Core, transition: Transition<'_>) -> Dispatch {
        let RawEvent::Wheel(input) = transition.event else {
            return Dispatch::default();
        };
        if transition.phase == Phase::Release {
            return Dispatch::default();
        }
        core.rearm(transition.now);
        if !core.accepts(transition.event) {
            return Dispatch::default();
        }

        let payload = Payload::Wheel {
            delta_x: input.delta_x,
            delta_y: input.delta_y,
        };
        let mut dispatch = Dispatch::from(core.trigger("wheel", &payload));
        if let Some(name) = direction(input) {
            core.add_down(name, None);
            dispatch.extend(core.handle_down_events(&payload));
            dispatch.extend(core.handle_seq_events(transition.now));
            core.remove_down(name);
        }
        dispatch
    }
}
