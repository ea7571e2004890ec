//! Raw input transitions supplied by platform collaborators
//!
//! Nothing in here knows how the transitions were captured. A browser shim,
//! an evdev reader or a test builds these values and hands them to
//! [`HumanInput`](crate::HumanInput) together with a press/release phase.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Input modality tag used to select a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Keyboard,
    Pointer,
    Wheel,
    Gamepad,
    Speech,
    /// IME composition and clipboard data
    Text,
}

impl Modality {
    pub const ALL: [Modality; 6] = [
        Modality::Keyboard,
        Modality::Pointer,
        Modality::Wheel,
        Modality::Gamepad,
        Modality::Speech,
        Modality::Text,
    ];
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Modality::Keyboard => "keyboard",
            Modality::Pointer => "pointer",
            Modality::Wheel => "wheel",
            Modality::Gamepad => "gamepad",
            Modality::Speech => "speech",
            Modality::Text => "text",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keyboard" | "key" | "keys" => Ok(Self::Keyboard),
            "pointer" | "mouse" | "touch" => Ok(Self::Pointer),
            "wheel" => Ok(Self::Wheel),
            "gamepad" | "gpad" => Ok(Self::Gamepad),
            "speech" => Ok(Self::Speech),
            "text" | "composition" | "clipboard" => Ok(Self::Text),
            _ => Err(format!("Unknown modality: {}", s)),
        }
    }
}

/// Which half of a transition is being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Press,
    Release,
    /// Transitions without a matching release (wheel ticks, clicks, speech,
    /// gamepad samples)
    Momentary,
}

/// Physical location slot of a key, as used by the key map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLocation {
    #[default]
    Standard = 0,
    Left = 1,
    Right = 2,
    Numpad = 3,
}

impl KeyLocation {
    pub const ALL: [KeyLocation; 4] = [
        KeyLocation::Standard,
        KeyLocation::Left,
        KeyLocation::Right,
        KeyLocation::Numpad,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Standard),
            1 => Some(Self::Left),
            2 => Some(Self::Right),
            3 => Some(Self::Numpad),
            _ => None,
        }
    }
}

impl std::str::FromStr for KeyLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "0" => Ok(Self::Standard),
            "left" | "1" => Ok(Self::Left),
            "right" | "2" => Ok(Self::Right),
            "numpad" | "3" => Ok(Self::Numpad),
            _ => Err(format!("Unknown key location: {}", s)),
        }
    }
}

/// A keyboard transition.
///
/// `key` is the layout-aware character or key name the platform reported (may
/// already be shifted, e.g. `"?"`), `key_code` the legacy numeric code and
/// `code` the platform's physical key identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyInput {
    pub key: Option<String>,
    pub key_code: Option<u32>,
    pub code: Option<String>,
    pub location: KeyLocation,
    pub repeat: bool,
}

impl KeyInput {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// A transition known only by its numeric code.
    pub fn from_code(key_code: u32) -> Self {
        Self {
            key_code: Some(key_code),
            ..Self::default()
        }
    }

    pub fn with_key_code(mut self, key_code: u32) -> Self {
        self.key_code = Some(key_code);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn at(mut self, location: KeyLocation) -> Self {
        self.location = location;
        self
    }

    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
    Pen,
}

/// Pointer buttons, numbered the way DOM `MouseEvent.button` numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
    Back,
    Forward,
    Eraser,
    Other(u8),
}

impl PointerButton {
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => PointerButton::Left,
            1 => PointerButton::Middle,
            2 => PointerButton::Right,
            3 => PointerButton::Back,
            4 => PointerButton::Forward,
            5 => PointerButton::Eraser,
            n => PointerButton::Other(n),
        }
    }

    pub fn name(&self) -> String {
        match self {
            PointerButton::Left => "left".to_string(),
            PointerButton::Middle => "middle".to_string(),
            PointerButton::Right => "right".to_string(),
            PointerButton::Back => "back".to_string(),
            PointerButton::Forward => "forward".to_string(),
            PointerButton::Eraser => "eraser".to_string(),
            PointerButton::Other(n) => n.to_string(),
        }
    }
}

/// A pointer, mouse or touch press/release.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerInput {
    pub kind: PointerKind,
    pub button: Option<PointerButton>,
    /// Touch point / pointer identifier, when the platform provides one
    pub pointer_id: Option<u32>,
    pub x: f64,
    pub y: f64,
}

impl PointerInput {
    pub fn mouse(button: PointerButton, x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Mouse,
            button: Some(button),
            pointer_id: None,
            x,
            y,
        }
    }

    pub fn touch(pointer_id: u32, x: f64, y: f64) -> Self {
        Self {
            kind: PointerKind::Touch,
            button: None,
            pointer_id: Some(pointer_id),
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Click,
    DoubleClick,
    ContextMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickInput {
    pub kind: ClickKind,
    pub button: PointerButton,
}

/// Wheel deltas, already normalized to "lines" (positive y scrolls down).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ButtonSample {
    pub pressed: bool,
    /// 0.0 (released) ..= 1.0 (fully pressed)
    pub value: f64,
}

impl ButtonSample {
    pub fn pressed() -> Self {
        Self {
            pressed: true,
            value: 1.0,
        }
    }

    pub fn released() -> Self {
        Self::default()
    }
}

/// One polled snapshot of a gamepad.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GamepadSnapshot {
    pub index: usize,
    pub id: String,
    /// Changes whenever the device reports new data
    pub timestamp: u64,
    pub buttons: Vec<ButtonSample>,
    pub axes: Vec<f64>,
}

/// A recognized speech fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechInput {
    pub transcript: String,
    /// Interim results arrive with `is_final == false`
    pub is_final: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionStage {
    Start,
    Update,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardAction {
    Cut,
    Copy,
    Paste,
}

impl ClipboardAction {
    pub fn name(self) -> &'static str {
        match self {
            ClipboardAction::Cut => "cut",
            ClipboardAction::Copy => "copy",
            ClipboardAction::Paste => "paste",
        }
    }
}

/// Composition and clipboard activity. Retrieving clipboard contents is the
/// collaborator's job; `data` is whatever it managed to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextInput {
    Composition {
        stage: CompositionStage,
        data: Option<String>,
    },
    Clipboard {
        action: ClipboardAction,
        data: Option<String>,
    },
}

/// Any raw transition the engine understands.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    Key(KeyInput),
    Pointer(PointerInput),
    Click(ClickInput),
    Wheel(WheelInput),
    Gamepad(GamepadSnapshot),
    Speech(SpeechInput),
    Text(TextInput),
}

impl RawEvent {
    pub fn modality(&self) -> Modality {
        match self {
            RawEvent::Key(_) => Modality::Keyboard,
            RawEvent::Pointer(_) | RawEvent::Click(_) => Modality::Pointer,
            RawEvent::Wheel(_) => Modality::Wheel,
            RawEvent::Gamepad(_) => Modality::Gamepad,
            RawEvent::Speech(_) => Modality::Speech,
            RawEvent::Text(_) => Modality::Text,
        }
    }
}

impl From<KeyInput> for RawEvent {
    fn from(input: KeyInput) -> Self {
        RawEvent::Key(input)
    }
}

impl From<PointerInput> for RawEvent {
    fn from(input: PointerInput) -> Self {
        RawEvent::Pointer(input)
    }
}

impl From<ClickInput> for RawEvent {
    fn from(input: ClickInput) -> Self {
        RawEvent::Click(input)
    }
}

impl From<WheelInput> for RawEvent {
    fn from(input: WheelInput) -> Self {
        RawEvent::Wheel(input)
    }
}

impl From<GamepadSnapshot> for RawEvent {
    fn from(input: GamepadSnapshot) -> Self {
        RawEvent::Gamepad(input)
    }
}

impl From<SpeechInput> for RawEvent {
    fn from(input: SpeechInput) -> Self {
        RawEvent::Speech(input)
    }
}

impl From<TextInput> for RawEvent {
    fn from(input: TextInput) -> Self {
        RawEvent::Text(input)
    }
}
