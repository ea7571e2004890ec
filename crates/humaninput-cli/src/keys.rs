//! evdev events to engine transitions
//!
//! Keys are labelled for a US layout: the character a key produces with
//! shift held is reported as the key, the legacy code stays the physical one.

use evdev::{InputEvent, InputEventKind, Key, RelativeAxisType};
use humaninput_core::{KeyInput, KeyLocation, Phase, PointerButton, PointerInput, RawEvent, WheelInput};

use KeyLocation::{Left, Numpad, Right, Standard};

/// (evdev key, key, key with shift held, legacy key code, location)
type KeySpec = (Key, &'static str, Option<&'static str>, u32, KeyLocation);

const KEYS: &[KeySpec] = &[
    (Key::KEY_A, "a", Some("A"), 65, Standard),
    (Key::KEY_B, "b", Some("B"), 66, Standard),
    (Key::KEY_C, "c", Some("C"), 67, Standard),
    (Key::KEY_D, "d", Some("D"), 68, Standard),
    (Key::KEY_E, "e", Some("E"), 69, Standard),
    (Key::KEY_F, "f", Some("F"), 70, Standard),
    (Key::KEY_G, "g", Some("G"), 71, Standard),
    (Key::KEY_H, "h", Some("H"), 72, Standard),
    (Key::KEY_I, "i", Some("I"), 73, Standard),
    (Key::KEY_J, "j", Some("J"), 74, Standard),
    (Key::KEY_K, "k", Some("K"), 75, Standard),
    (Key::KEY_L, "l", Some("L"), 76, Standard),
    (Key::KEY_M, "m", Some("M"), 77, Standard),
    (Key::KEY_N, "n", Some("N"), 78, Standard),
    (Key::KEY_O, "o", Some("O"), 79, Standard),
    (Key::KEY_P, "p", Some("P"), 80, Standard),
    (Key::KEY_Q, "q", Some("Q"), 81, Standard),
    (Key::KEY_R, "r", Some("R"), 82, Standard),
    (Key::KEY_S, "s", Some("S"), 83, Standard),
    (Key::KEY_T, "t", Some("T"), 84, Standard),
    (Key::KEY_U, "u", Some("U"), 85, Standard),
    (Key::KEY_V, "v", Some("V"), 86, Standard),
    (Key::KEY_W, "w", Some("W"), 87, Standard),
    (Key::KEY_X, "x", Some("X"), 88, Standard),
    (Key::KEY_Y, "y", Some("Y"), 89, Standard),
    (Key::KEY_Z, "z", Some("Z"), 90, Standard),
    (Key::KEY_1, "1", Some("!"), 49, Standard),
    (Key::KEY_2, "2", Some("@"), 50, Standard),
    (Key::KEY_3, "3", Some("#"), 51, Standard),
    (Key::KEY_4, "4", Some("$"), 52, Standard),
    (Key::KEY_5, "5", Some("%"), 53, Standard),
    (Key::KEY_6, "6", Some("^"), 54, Standard),
    (Key::KEY_7, "7", Some("&"), 55, Standard),
    (Key::KEY_8, "8", Some("*"), 56, Standard),
    (Key::KEY_9, "9", Some("("), 57, Standard),
    (Key::KEY_0, "0", Some(")"), 48, Standard),
    (Key::KEY_MINUS, "-", Some("_"), 189, Standard),
    (Key::KEY_EQUAL, "=", Some("+"), 61, Standard),
    (Key::KEY_LEFTBRACE, "[", Some("{"), 219, Standard),
    (Key::KEY_RIGHTBRACE, "]", Some("}"), 221, Standard),
    (Key::KEY_BACKSLASH, "\\", Some("|"), 220, Standard),
    (Key::KEY_SEMICOLON, ";", Some(":"), 59, Standard),
    (Key::KEY_APOSTROPHE, "'", Some("\""), 222, Standard),
    (Key::KEY_GRAVE, "`", Some("~"), 192, Standard),
    (Key::KEY_COMMA, ",", Some("<"), 188, Standard),
    (Key::KEY_DOT, ".", Some(">"), 190, Standard),
    (Key::KEY_SLASH, "/", Some("?"), 191, Standard),
    (Key::KEY_SPACE, "Space", None, 32, Standard),
    (Key::KEY_ENTER, "Enter", None, 13, Standard),
    (Key::KEY_TAB, "Tab", None, 9, Standard),
    (Key::KEY_BACKSPACE, "Backspace", None, 8, Standard),
    (Key::KEY_ESC, "Escape", None, 27, Standard),
    (Key::KEY_CAPSLOCK, "CapsLock", None, 20, Standard),
    (Key::KEY_UP, "ArrowUp", None, 38, Standard),
    (Key::KEY_DOWN, "ArrowDown", None, 40, Standard),
    (Key::KEY_LEFT, "ArrowLeft", None, 37, Standard),
    (Key::KEY_RIGHT, "ArrowRight", None, 39, Standard),
    (Key::KEY_HOME, "Home", None, 36, Standard),
    (Key::KEY_END, "End", None, 35, Standard),
    (Key::KEY_PAGEUP, "PageUp", None, 33, Standard),
    (Key::KEY_PAGEDOWN, "PageDown", None, 34, Standard),
    (Key::KEY_INSERT, "Insert", None, 45, Standard),
    (Key::KEY_DELETE, "Delete", None, 46, Standard),
    (Key::KEY_F1, "F1", None, 112, Standard),
    (Key::KEY_F2, "F2", None, 113, Standard),
    (Key::KEY_F3, "F3", None, 114, Standard),
    (Key::KEY_F4, "F4", None, 115, Standard),
    (Key::KEY_F5, "F5", None, 116, Standard),
    (Key::KEY_F6, "F6", None, 117, Standard),
    (Key::KEY_F7, "F7", None, 118, Standard),
    (Key::KEY_F8, "F8", None, 119, Standard),
    (Key::KEY_F9, "F9", None, 120, Standard),
    (Key::KEY_F10, "F10", None, 121, Standard),
    (Key::KEY_F11, "F11", None, 122, Standard),
    (Key::KEY_F12, "F12", None, 123, Standard),
    (Key::KEY_LEFTSHIFT, "Shift", None, 16, Left),
    (Key::KEY_RIGHTSHIFT, "Shift", None, 16, Right),
    (Key::KEY_LEFTCTRL, "Control", None, 17, Left),
    (Key::KEY_RIGHTCTRL, "Control", None, 17, Right),
    (Key::KEY_LEFTALT, "Alt", None, 18, Left),
    (Key::KEY_RIGHTALT, "Alt", None, 18, Right),
    (Key::KEY_LEFTMETA, "OS", None, 91, Left),
    (Key::KEY_RIGHTMETA, "OS", None, 92, Right),
    (Key::KEY_KP0, "0", None, 96, Numpad),
    (Key::KEY_KP1, "1", None, 97, Numpad),
    (Key::KEY_KP2, "2", None, 98, Numpad),
    (Key::KEY_KP3, "3", None, 99, Numpad),
    (Key::KEY_KP4, "4", None, 100, Numpad),
    (Key::KEY_KP5, "5", None, 101, Numpad),
    (Key::KEY_KP6, "6", None, 102, Numpad),
    (Key::KEY_KP7, "7", None, 103, Numpad),
    (Key::KEY_KP8, "8", None, 104, Numpad),
    (Key::KEY_KP9, "9", None, 105, Numpad),
    (Key::KEY_KPASTERISK, "*", None, 106, Numpad),
    (Key::KEY_KPPLUS, "+", None, 107, Numpad),
    (Key::KEY_KPMINUS, "-", None, 109, Numpad),
    (Key::KEY_KPDOT, ".", None, 46, Numpad),
    (Key::KEY_KPSLASH, "/", None, 111, Numpad),
    (Key::KEY_KPENTER, "Enter", None, 13, Numpad),
];

fn key_spec(key: Key) -> Option<&'static KeySpec> {
    KEYS.iter().find(|spec| spec.0 == key)
}

fn pointer_button(key: Key) -> Option<PointerButton> {
    match key {
        Key::BTN_LEFT => Some(PointerButton::Left),
        Key::BTN_MIDDLE => Some(PointerButton::Middle),
        Key::BTN_RIGHT => Some(PointerButton::Right),
        Key::BTN_SIDE => Some(PointerButton::Back),
        Key::BTN_EXTRA => Some(PointerButton::Forward),
        _ => None,
    }
}

/// Turns evdev events into engine transitions, tracking shift to label keys.
#[derive(Debug, Default)]
pub struct KeyTranslator {
    shift_held: [bool; 2],
}

impl KeyTranslator {
    pub fn translate(&mut self, event: &InputEvent) -> Option<(Phase, RawEvent)> {
        match event.kind() {
            InputEventKind::Key(key) => self.translate_key(key, event.value()),
            InputEventKind::RelAxis(axis) => {
                let value = f64::from(event.value());
                // evdev counts wheel-up as positive; the engine uses scroll deltas
                let wheel = match axis {
                    RelativeAxisType::REL_WHEEL => WheelInput {
                        delta_x: 0.0,
                        delta_y: -value,
                    },
                    RelativeAxisType::REL_HWHEEL => WheelInput {
                        delta_x: value,
                        delta_y: 0.0,
                    },
                    _ => return None,
                };
                Some((Phase::Momentary, RawEvent::Wheel(wheel)))
            }
            _ => None,
        }
    }

    fn translate_key(&mut self, key: Key, value: i32) -> Option<(Phase, RawEvent)> {
        let (phase, repeat) = match value {
            0 => (Phase::Release, false),
            1 => (Phase::Press, false),
            2 => (Phase::Press, true),
            _ => return None,
        };

        if let Some(button) = pointer_button(key) {
            if repeat {
                return None;
            }
            return Some((phase, RawEvent::Pointer(PointerInput::mouse(button, 0.0, 0.0))));
        }

        let shift_side = match key {
            Key::KEY_LEFTSHIFT => Some(0),
            Key::KEY_RIGHTSHIFT => Some(1),
            _ => None,
        };
        if let Some(side) = shift_side {
            self.shift_held[side] = phase == Phase::Press;
        }

        let input = match key_spec(key) {
            Some((_, plain, shifted, key_code, location)) => {
                let label = match shifted {
                    Some(shifted) if self.shift_held.iter().any(|held| *held) => *shifted,
                    _ => *plain,
                };
                KeyInput::new(label).with_key_code(*key_code).at(*location)
            }
            None => {
                tracing::trace!("No key table entry for {:?}", key);
                KeyInput::default().with_code(format!("{:?}", key))
            }
        };
        let input = if repeat { input.repeating() } else { input };
        Some((phase, RawEvent::Key(input)))
    }
}
