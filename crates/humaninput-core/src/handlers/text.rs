use crate::engine::{Core, Dispatch};
use crate::input::{ClipboardAction, CompositionStage, Modality, RawEvent, TextInput};
use crate::registry::Payload;

use super::{InputHandler, Transition};

/// IME composition and clipboard events. None of these touch the ledger.
#[derive(Debug, Default)]
pub struct TextHandler;

fn composition(core: &mut Core, stage: CompositionStage, data: Option<&str>) -> Dispatch {
    let payload = Payload::Text {
        data: data.map(str::to_string),
    };
    let base = match stage {
        CompositionStage::Start => "compositionstart",
        CompositionStage::Update => "compositionupdate",
        CompositionStage::End => "compositionend",
    };
    let mut dispatch = Dispatch::from(core.trigger(base, &payload));
    if let Some(data) = data.filter(|d| !d.is_empty()) {
        let detail = match stage {
            CompositionStage::Update => Some(format!("composing:\"{}\"", data.to_lowercase())),
            CompositionStage::End => Some(format!("composed:\"{}\"", data.to_lowercase())),
            CompositionStage::Start => None,
        };
        if let Some(detail) = detail {
            dispatch.extend(core.trigger(detail, &payload));
        }
    }
    dispatch
}

fn clipboard(core: &mut Core, action: ClipboardAction, data: Option<&str>) -> Dispatch {
    let Some(data) = data.filter(|d| !d.is_empty()) else {
        return Dispatch::default();
    };
    let payload = Payload::Text {
        data: Some(data.to_string()),
    };
    let mut dispatch = Dispatch::from(core.trigger(action.name(), &payload));
    dispatch.extend(core.trigger(
        format!("{}:\"{}\"", action.name(), data.to_lowercase()),
        &payload,
    ));
    dispatch
}

impl InputHandler for TextHandler {
    fn modality(&self) -> Modality {
        Modality::Text
    }

    fn handle(&mut self, core: &mut Core, transition: Transition<'_>) -> Dispatch {
        let RawEvent::Text(input) = transition.event else {
            return Dispatch::default();
        };
        if !core.accepts(transition.event) {
            return Dispatch::default();
        }
        match input {
            TextInput::Composition { stage, data } => composition(core, *stage, data.as_deref()),
            TextInput::Clipboard { action, data } => clipboard(core, *action, data.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Instant;

    use crate::engine::HumanInput;
    use crate::input::{CompositionStage, TextInput};
    use crate::registry::{Callback, Payload, Registry};
    use crate::settings::Settings;

    fn compose(stage: CompositionStage, data: Option<&str>) -> TextInput {
        TextInput::Composition {
            stage,
            data: data.map(str::to_string),
        }
    }

    #[test]
    fn test_composition_events() {
        let mut hi = HumanInput::new(Settings::default()).unwrap();
        let payloads: Rc<RefCell<Vec<Payload>>> = Rc::default();
        let seen = payloads.clone();
        hi.on(
            "composed:\"ab\"",
            Callback::new(move |_: &mut Registry, payload: &Payload| {
                seen.borrow_mut().push(payload.clone())
            }),
        );
        let now = Instant::now();

        hi.start_recording();
        hi.handle_momentary(compose(CompositionStage::Start, None), now);
        assert!(hi.core().ledger().is_empty());
        hi.handle_momentary(compose(CompositionStage::Update, Some("Ab")), now);
        assert!(hi.core().ledger().is_empty());
        hi.handle_momentary(compose(CompositionStage::End, Some("Ab")), now);
        assert!(hi.core().ledger().is_empty());
        assert_eq!(
            hi.stop_recording(),
            vec![
                "compositionstart",
                "compositionupdate",
                "composing:\"ab\"",
                "compositionend",
                "composed:\"ab\"",
            ]
        );
        assert_eq!(
            *payloads.borrow(),
            vec![Payload::Text {
                data: Some("Ab".to_string())
            }]
        );
        assert!(hi.core().sequences().is_empty());
    }

    #[test]
    fn test_empty_composition_data_fires_only_the_stage() {
        let mut hi = HumanInput::new(Settings::default()).unwrap();
        hi.start_recording();
        hi.handle_momentary(compose(CompositionStage::Update, Some("")), Instant::now());
        assert_eq!(hi.stop_recording(), vec!["compositionupdate"]);
    }
}
