use std::collections::HashMap;

use crate::engine::{Core, Dispatch};
use crate::input::{ButtonSample, GamepadSnapshot, Modality, RawEvent};
use crate::registry::Payload;

use super::{InputHandler, Transition};

/// Supplies gamepad snapshots whenever the engine's poll timer fires.
pub trait GamepadSource {
    fn poll(&mut self) -> Vec<GamepadSnapshot>;
}

impl<F> GamepadSource for F
where
    F: FnMut() -> Vec<GamepadSnapshot>,
{
    fn poll(&mut self) -> Vec<GamepadSnapshot> {
        self()
    }
}

/// Alias names for one controller family's buttons.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerLayout {
    pub name: String,
    pub aliases: Vec<(String, String)>,
}

impl ControllerLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.push((alias.into(), target.into()));
        self
    }

    /// DualShock/Xbox style layout.
    pub fn standard() -> Self {
        [
            ("gpad:up", 12),
            ("gpad:down", 13),
            ("gpad:left", 14),
            ("gpad:right", 15),
            ("gpad:select", 8),
            ("gpad:share", 8),
            ("gpad:start", 9),
            ("gpad:options", 9),
            ("gpad:l1", 4),
            ("gpad:l2", 6),
            ("gpad:r1", 5),
            ("gpad:r2", 7),
        ]
        .into_iter()
        .fold(Self::new("standard"), |layout, (alias, button)| {
            layout.with_alias(alias, format!("gpad:button:{}", button))
        })
    }

    /// A layout shipped with the engine, by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::standard()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct PadState {
    timestamp: u64,
    buttons: Vec<ButtonSample>,
    axes: Vec<f64>,
}

/// Diffs successive snapshots of each pad into button and axis events.
#[derive(Debug, Default)]
pub struct GamepadHandler {
    pads: HashMap<usize, PadState>,
}

impl GamepadHandler {
    fn update(&mut self, core: &mut Core, transition: &Transition<'_>, snapshot: &GamepadSnapshot) -> Dispatch {
        let pad = snapshot.index;
        if !self.pads.contains_key(&pad) {
            tracing::debug!("Gamepad {} detected: {}", pad, snapshot.id);
            let dispatch = Dispatch::from(core.trigger(
                "gpad:connected",
                &Payload::Gamepad {
                    index: pad,
                    id: snapshot.id.clone(),
                },
            ));
            // Start from a released state so the next sample reports changes
            self.pads.insert(
                pad,
                PadState {
                    timestamp: snapshot.timestamp,
                    buttons: vec![ButtonSample::released(); snapshot.buttons.len()],
                    axes: vec![0.0; snapshot.axes.len()],
                },
            );
            return dispatch;
        }
        let Some(state) = self.pads.get_mut(&pad) else {
            return Dispatch::default();
        };
        if state.timestamp == snapshot.timestamp {
            return Dispatch::default();
        }

        let previous = std::mem::replace(
            state,
            PadState {
                timestamp: snapshot.timestamp,
                buttons: snapshot.buttons.clone(),
                axes: snapshot.axes.clone(),
            },
        );
        let accepted = core.accepts(transition.event);
        let mut dispatch = Dispatch::default();
        let mut button_changed = false;

        for (j, button) in snapshot.buttons.iter().enumerate() {
            let name = format!("gpad:button:{}", j);
            let before = previous.buttons.get(j).copied().unwrap_or_default();
            let held = core.ledger().is_held(&name);
            if button.pressed {
                if !held {
                    core.add_down(&name, None);
                }
            } else if held {
                if accepted {
                    dispatch.extend(core.handle_seq_events(transition.now));
                }
                core.remove_down(&name);
            }
            if !accepted {
                continue;
            }
            let payload = Payload::Button {
                pad,
                button: j,
                value: button.value,
            };
            if button.pressed != before.pressed {
                let state = if button.pressed { "down" } else { "up" };
                dispatch.extend(core.trigger(format!("{}:{}", name, state), &payload));
                button_changed = true;
            }
            if button.value != before.value {
                dispatch.extend(core.trigger(format!("{}:value", name), &payload));
            }
        }

        if accepted {
            for (j, value) in snapshot.axes.iter().enumerate() {
                if previous.axes.get(j).copied().unwrap_or(0.0) != *value {
                    dispatch.extend(core.trigger(
                        format!("gpad:axis:{}", j),
                        &Payload::Axis {
                            pad,
                            axis: j,
                            value: *value,
                        },
                    ));
                }
            }
            if button_changed {
                dispatch.extend(core.handle_down_events(&Payload::Gamepad {
                    index: pad,
                    id: snapshot.id.clone(),
                }));
            }
        }
        dispatch
    }

    pub fn known_pads(&self) -> usize {
        self.pads.len()
    }
}

impl InputHandler for GamepadHandler {
    fn modality(&self) -> Modality {
        Modality::Gamepad
    }

    fn handle(&mut self, core: &mut Core, transition: Transition<'_>) -> Dispatch {
        match transition.event {
            RawEvent::Gamepad(snapshot) => self.update(core, &transition, snapshot),
            _ => Dispatch::default(),
        }
    }

    fn reset(&mut self) {
        self.pads.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout() {
        let layout = ControllerLayout::standard();
        assert_eq!(layout.name, "standard");
        assert!(layout
            .aliases
            .contains(&("gpad:up".to_string(), "gpad:button:12".to_string())));
        assert!(layout
            .aliases
            .contains(&("gpad:r2".to_string(), "gpad:button:7".to_string())));
        assert_eq!(layout.aliases.len(), 12);
    }

    #[test]
    fn test_builtin_lookup() {
        assert!(ControllerLayout::builtin("standard").is_some());
        assert!(ControllerLayout::builtin("n64").is_none());
    }

    #[test]
    fn test_closure_source() {
        let mut calls = 0;
        let mut source = || {
            calls += 1;
            Vec::<GamepadSnapshot>::new()
        };
        assert!(GamepadSource::poll(&mut source).is_empty());
        assert_eq!(calls, 1);
    }
}
