//! Per-modality input handlers
//!
//! Each modality gets one [`InputHandler`] strategy. The engine builds the
//! table once from `Settings::listen` and routes every raw transition by its
//! [`Modality`] tag.

use std::time::Instant;

use crate::engine::{Core, Dispatch};
use crate::input::{Modality, Phase, RawEvent};

mod gamepad;
mod keyboard;
mod pointer;
mod speech;
mod text;
mod wheel;

pub use gamepad::{ControllerLayout, GamepadHandler, GamepadSource};
pub use keyboard::KeyboardHandler;
pub use pointer::PointerHandler;
pub use speech::SpeechHandler;
pub use text::TextHandler;
pub use wheel::WheelHandler;

/// One raw transition as seen by a handler.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a> {
    pub phase: Phase,
    pub event: &'a RawEvent,
    pub now: Instant,
}

pub trait InputHandler {
    fn modality(&self) -> Modality;

    /// Update engine state for one transition and fire the resulting events.
    fn handle(&mut self, core: &mut Core, transition: Transition<'_>) -> Dispatch;

    /// Forget any per-handler state (engine re-initialization).
    fn reset(&mut self) {}
}

/// The handler for `modality`.
pub fn build(modality: Modality) -> Box<dyn InputHandler> {
    match modality {
        Modality::Keyboard => Box::new(KeyboardHandler::default()),
        Modality::Pointer => Box::new(PointerHandler::default()),
        Modality::Wheel => Box::new(WheelHandler),
        Modality::Gamepad => Box::new(GamepadHandler::default()),
        Modality::Speech => Box::new(SpeechHandler::default()),
        Modality::Text => Box::new(TextHandler),
    }
}
