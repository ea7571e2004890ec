//! Input state tracking and combo/sequence matching
//!
//! Turns raw keyboard, pointer, wheel, gamepad, speech and text transitions
//! into named events (`ctrl-s`, `shift-?`, `up up down down`,
//! `pointer:left pointer:left`) and dispatches them to registered listeners.
//!
//! The entry point is [`HumanInput`]. Feed it transitions with
//! [`HumanInput::handle_press`], [`HumanInput::handle_release`] and
//! [`HumanInput::handle_momentary`], register listeners with
//! [`HumanInput::on`], and drive its timers with [`HumanInput::tick`].

pub mod combo;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod handlers;
pub mod input;
pub mod ledger;
pub mod names;
pub mod registry;
pub mod sequence;
pub mod settings;
pub mod timer;

pub use engine::{Core, Dispatch, HumanInput};
pub use error::SettingsError;
pub use grammar::{canonical_name, Chord, EventSpec, GrammarProblem};
pub use handlers::{ControllerLayout, GamepadSource};
pub use input::{
    ButtonSample, ClickInput, ClickKind, ClipboardAction, CompositionStage, GamepadSnapshot, KeyInput,
    KeyLocation, Modality, Phase, PointerButton, PointerInput, PointerKind, RawEvent, SpeechInput,
    TextInput, WheelInput,
};
pub use ledger::{DownLedger, ModifierState};
pub use names::{KeyMap, ModifierClass, NameResolver, ResolvedKey};
pub use registry::{Callback, ContextMatch, EventNames, ListenerOptions, Payload, Registry, Response};
pub use sequence::SequenceBuffer;
pub use settings::{Platform, Settings, MAX_SEQUENCE_BUF};
