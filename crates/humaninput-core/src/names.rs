//! Canonical key names, modifier classes and the per-location key map

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::input::{KeyInput, KeyLocation};
use crate::settings::Platform;

// ============================================================================
// Modifier classes
// ============================================================================

/// The four modifier families. Every left/right/platform spelling of a
/// modifier belongs to exactly one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierClass {
    Ctrl,
    Shift,
    Alt,
    Os,
}

impl ModifierClass {
    pub const ALL: [ModifierClass; 4] = [
        ModifierClass::Ctrl,
        ModifierClass::Shift,
        ModifierClass::Alt,
        ModifierClass::Os,
    ];

    /// The generic event name for this class (`ctrl`, `shift`, `alt`, `os`).
    pub fn event_name(self) -> &'static str {
        match self {
            ModifierClass::Ctrl => "ctrl",
            ModifierClass::Shift => "shift",
            ModifierClass::Alt => "alt",
            ModifierClass::Os => "os",
        }
    }

    /// Sort priority used when serializing chords. Higher sorts first.
    pub fn priority(self) -> u8 {
        match self {
            ModifierClass::Ctrl => 5,
            ModifierClass::Shift => 4,
            ModifierClass::Alt => 3,
            ModifierClass::Os => 2,
        }
    }

    /// Classify a raw or alias name, case-insensitively.
    ///
    /// Returns `None` for anything that is not a modifier, including names
    /// that merely contain a modifier word (`shiftlock`).
    pub fn of(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "control" | "controlleft" | "controlright" | "ctrl" => Some(ModifierClass::Ctrl),
            "shift" | "shiftleft" | "shiftright" | "⇧" => Some(ModifierClass::Shift),
            "alt" | "altleft" | "altright" | "option" | "⌥" => Some(ModifierClass::Alt),
            "os" | "osleft" | "osright" | "meta" | "metaleft" | "metaright" | "win" | "⌘"
            | "cmd" | "command" => Some(ModifierClass::Os),
            _ => None,
        }
    }

    /// Map a platform spelling (`control`, `⇧`, `option`, `⌘`) onto the class name.
    /// Left/right qualified spellings are kept as they are.
    pub fn normalize_alias(token: &str) -> Option<&'static str> {
        match token {
            "control" => Some("ctrl"),
            "⇧" => Some("shift"),
            "option" | "⌥" => Some("alt"),
            "meta" | "win" | "⌘" | "cmd" | "command" => Some("os"),
            _ => None,
        }
    }
}

/// The generic event name for `name`: the modifier class name for modifiers,
/// the lowercased name for everything else.
pub fn event_name(name: &str) -> String {
    match ModifierClass::of(name) {
        Some(class) => class.event_name().to_string(),
        None => name.to_lowercase(),
    }
}

/// Every accepted spelling of one ledger entry, specific spelling first.
pub fn alternates(name: &str) -> Vec<String> {
    let specific = name.to_lowercase();
    let generic = event_name(name);
    if generic == specific {
        vec![specific]
    } else {
        vec![specific, generic]
    }
}

fn priority(name: &str) -> u8 {
    ModifierClass::of(name).map_or(0, ModifierClass::priority)
}

/// Ordering of names inside a simultaneous chord: ctrl, shift, alt, os, then
/// longer names before shorter ones, then case-insensitive lexicographic.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    priority(b)
        .cmp(&priority(a))
        .then_with(|| b.chars().count().cmp(&a.chars().count()))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
}

// ============================================================================
// Key map
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Slot {
    by_code: HashMap<u32, String>,
    by_name: HashMap<String, u32>,
}

/// Bidirectional code/name table, one slot per [`KeyLocation`].
///
/// Several names may share a code (`ArrowLeft` and `Left` are both 37); the
/// first name inserted for a code is the one `name()` returns.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    slots: [Slot; 4],
}

const STANDARD_KEYS: &[(&str, u32)] = &[
    ("Backspace", 8),
    ("Tab", 9),
    ("Enter", 13),
    ("Shift", 16),
    ("Control", 17),
    ("Alt", 18),
    ("Pause", 19),
    ("CapsLock", 20),
    ("Escape", 27),
    ("Space", 32),
    ("PageUp", 33),
    ("PageDown", 34),
    ("End", 35),
    ("Home", 36),
    ("ArrowLeft", 37),
    ("Left", 37),
    ("ArrowUp", 38),
    ("Up", 38),
    ("ArrowRight", 39),
    ("Right", 39),
    ("ArrowDown", 40),
    ("Down", 40),
    ("PrintScreen", 42),
    ("Insert", 45),
    ("Delete", 46),
    ("Semicolon", 59),
    ("=", 61),
    ("OS", 92),
    ("Select", 93),
    ("NumLock", 144),
    ("ScrollLock", 145),
    ("VolumeDown", 174),
    ("VolumeUp", 175),
    ("MediaTrackPrevious", 177),
    ("MediaPlayPause", 179),
    (",", 188),
    ("-", 189),
    (".", 190),
    ("/", 191),
    ("`", 192),
    ("[", 219),
    ("\\", 220),
    ("]", 221),
    ("'", 222),
    ("AltGraph", 225),
    ("Compose", 229),
];

const LEFT_KEYS: &[(&str, u32)] = &[
    ("ShiftLeft", 16),
    ("ControlLeft", 17),
    ("AltLeft", 18),
    ("OSLeft", 91),
];

const RIGHT_KEYS: &[(&str, u32)] = &[
    ("ShiftRight", 16),
    ("ControlRight", 17),
    ("AltRight", 18),
    ("OSRight", 92),
];

const NUMPAD_UNIQUE_KEYS: &[(&str, u32)] = &[
    ("NumpadMultiply", 106),
    ("NumpadAdd", 107),
    ("NumpadSubtract", 109),
    ("NumpadDecimal", 46),
    ("Slash", 111),
];

const NUMPAD_SHARED_KEYS: &[(&str, u32)] = &[("*", 106), ("+", 107), ("-", 109), (".", 46), ("/", 111)];

// Private-use codes reported by some macOS browsers
const MACOS_KEYS: &[(&str, u32)] = &[
    ("Enter", 3),
    ("NumpadClear", 63289),
    ("PageUp", 63276),
    ("PageDown", 63277),
    ("End", 63275),
    ("Home", 63273),
    ("ArrowLeft", 63234),
    ("ArrowUp", 63232),
    ("ArrowRight", 63235),
    ("ArrowDown", 63233),
    ("Insert", 63302),
    ("Delete", 63272),
];

impl KeyMap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table.
    pub fn standard(unique_numpad: bool, platform: Platform) -> Self {
        let mut map = Self::empty();
        map.extend(KeyLocation::Standard, STANDARD_KEYS);
        map.extend(KeyLocation::Left, LEFT_KEYS);
        map.extend(KeyLocation::Right, RIGHT_KEYS);
        if unique_numpad {
            map.extend(KeyLocation::Numpad, NUMPAD_UNIQUE_KEYS);
        } else {
            map.extend(KeyLocation::Numpad, NUMPAD_SHARED_KEYS);
        }

        for code in 48..=57u32 {
            map.insert(KeyLocation::Standard, code, (code - 48).to_string());
        }
        for code in 65..=90u32 {
            if let Some(letter) = char::from_u32(code) {
                map.insert(KeyLocation::Standard, code, letter.to_string());
            }
        }
        for code in 96..=105u32 {
            map.insert(KeyLocation::Numpad, code, format!("Numpad{}", code - 96));
        }
        for code in 112..=123u32 {
            map.insert(KeyLocation::Standard, code, format!("F{}", code - 111));
        }

        if platform == Platform::MacOs {
            map.extend(KeyLocation::Standard, MACOS_KEYS);
            for code in 63236..=63242u32 {
                map.insert(KeyLocation::Standard, code, format!("F{}", code - 63235));
            }
        }
        map
    }

    fn extend(&mut self, location: KeyLocation, entries: &[(&str, u32)]) {
        for (name, code) in entries {
            self.insert(location, *code, *name);
        }
    }

    /// Add a mapping. The reverse direction is always updated; the forward
    /// direction only when the code has no name yet.
    pub fn insert(&mut self, location: KeyLocation, code: u32, name: impl Into<String>) {
        let name = name.into();
        let slot = &mut self.slots[location.index()];
        slot.by_code.entry(code).or_insert_with(|| name.clone());
        slot.by_name.insert(name, code);
    }

    /// Add a mapping that replaces whatever name the code had before.
    pub fn override_code(&mut self, location: KeyLocation, code: u32, name: impl Into<String>) {
        let name = name.into();
        let slot = &mut self.slots[location.index()];
        slot.by_code.insert(code, name.clone());
        slot.by_name.insert(name, code);
    }

    pub fn name(&self, location: KeyLocation, code: u32) -> Option<&str> {
        self.slots[location.index()].by_code.get(&code).map(String::as_str)
    }

    pub fn code(&self, location: KeyLocation, name: &str) -> Option<u32> {
        self.slots[location.index()].by_name.get(name).copied()
    }

    /// Number of code entries in one slot.
    pub fn len(&self, location: KeyLocation) -> usize {
        self.slots[location.index()].by_code.len()
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// A keyboard transition turned into ledger names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    /// Name as reported at this moment (may be a shifted character)
    pub name: String,
    /// Layout-independent name of the physical key
    pub code: String,
    pub modifier: Option<ModifierClass>,
}

/// Turns raw keyboard transitions into canonical names using a [`KeyMap`].
#[derive(Debug, Clone)]
pub struct NameResolver {
    keymap: KeyMap,
    unique_numpad: bool,
}

impl NameResolver {
    pub fn new(keymap: KeyMap, unique_numpad: bool) -> Self {
        Self {
            keymap,
            unique_numpad,
        }
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn keymap_mut(&mut self) -> &mut KeyMap {
        &mut self.keymap
    }

    /// Resolve a keyboard transition.
    ///
    /// The physical name comes from the key map (location slot first, then
    /// the standard slot), then the platform code hint, then the numeric code
    /// itself. The live name is the reported key, falling back to the
    /// physical name. Nothing here fails: unknown identifiers pass through.
    pub fn resolve(&self, input: &KeyInput) -> ResolvedKey {
        let mapped = input.key_code.and_then(|key_code| {
            self.keymap
                .name(input.location, key_code)
                .or_else(|| self.keymap.name(KeyLocation::Standard, key_code))
        });
        let code = match (mapped, &input.code, input.key_code) {
            (Some(name), _, _) => name.to_string(),
            (None, Some(hint), _) => normalize_code_hint(hint),
            (None, None, Some(key_code)) => key_code.to_string(),
            (None, None, None) => input.key.clone().unwrap_or_else(|| "Unidentified".to_string()),
        };
        let key = input
            .key
            .clone()
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| code.clone());
        let name = self.normalize_special(input.location, key, &code);
        let sided = code.contains("Left") || code.contains("Right");
        let code = if self.unique_numpad && input.location == KeyLocation::Numpad && !sided {
            name.clone()
        } else {
            strip_arrow(code)
        };
        let modifier = ModifierClass::of(&name);
        ResolvedKey {
            name,
            code,
            modifier,
        }
    }

    /// Left/right qualified codes win over the generic key so modifier state
    /// can tell the sides apart; numpad keys optionally get their own names;
    /// the `Arrow` prefix is dropped.
    fn normalize_special(&self, location: KeyLocation, key: String, code: &str) -> String {
        if code.contains("Left") || code.contains("Right") {
            strip_arrow(code.to_string())
        } else if self.unique_numpad && location == KeyLocation::Numpad {
            format!("numpad{}", key)
        } else {
            strip_arrow(key)
        }
    }
}

fn strip_arrow(name: String) -> String {
    match name.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("arrow") && name.len() > 5 => name[5..].to_string(),
        _ => name,
    }
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::new(KeyMap::standard(false, Platform::Standard), false)
    }
}

/// `KeyA` -> `A`, `Digit1` -> `1`; anything else unchanged.
fn normalize_code_hint(hint: &str) -> String {
    for prefix in ["Key", "Digit"] {
        if let Some(rest) = hint.strip_prefix(prefix) {
            if rest.chars().count() == 1 {
                return rest.to_string();
            }
        }
    }
    hint.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> NameResolver {
        NameResolver::default()
    }

    #[test]
    fn test_modifier_classification() {
        assert_eq!(ModifierClass::of("ShiftLeft"), Some(ModifierClass::Shift));
        assert_eq!(ModifierClass::of("control"), Some(ModifierClass::Ctrl));
        assert_eq!(ModifierClass::of("⌘"), Some(ModifierClass::Os));
        assert_eq!(ModifierClass::of("MetaRight"), Some(ModifierClass::Os));
        assert_eq!(ModifierClass::of("option"), Some(ModifierClass::Alt));
        assert_eq!(ModifierClass::of("a"), None);
        assert_eq!(ModifierClass::of("shiftlock"), None);
    }

    #[test]
    fn test_symbol_spellings_normalize_like_their_class() {
        for symbol in ["⇧", "⌥", "⌘"] {
            let class = ModifierClass::of(symbol).map(ModifierClass::event_name);
            assert_eq!(ModifierClass::normalize_alias(symbol), class);
        }
    }

    #[test]
    fn test_alternates_for_modifiers_and_plain_keys() {
        assert_eq!(alternates("ControlLeft"), vec!["controlleft", "ctrl"]);
        assert_eq!(alternates("Shift"), vec!["shift"]);
        assert_eq!(alternates("A"), vec!["a"]);
    }

    #[test]
    fn test_compare_names_priority_then_length_then_lexical() {
        let mut names = vec!["a", "alt", "shift", "ctrl", "os", "bb", "b"];
        names.sort_by(|a, b| compare_names(a, b));
        assert_eq!(names, vec!["ctrl", "shift", "alt", "os", "bb", "a", "b"]);
    }

    #[test]
    fn test_keymap_bidirectional() {
        let map = KeyMap::standard(false, Platform::Standard);
        assert_eq!(map.name(KeyLocation::Standard, 65), Some("A"));
        assert_eq!(map.code(KeyLocation::Standard, "A"), Some(65));
        assert_eq!(map.name(KeyLocation::Standard, 37), Some("ArrowLeft"));
        assert_eq!(map.code(KeyLocation::Standard, "Left"), Some(37));
        assert_eq!(map.name(KeyLocation::Left, 16), Some("ShiftLeft"));
        assert_eq!(map.name(KeyLocation::Numpad, 101), Some("Numpad5"));
        assert_eq!(map.name(KeyLocation::Standard, 123), Some("F12"));
        assert_eq!(map.name(KeyLocation::Numpad, 107), Some("+"));
    }

    #[test]
    fn test_keymap_unique_numpad_and_macos() {
        let map = KeyMap::standard(true, Platform::MacOs);
        assert_eq!(map.name(KeyLocation::Numpad, 107), Some("NumpadAdd"));
        assert_eq!(map.name(KeyLocation::Standard, 63234), Some("ArrowLeft"));
        assert_eq!(map.name(KeyLocation::Standard, 63242), Some("F7"));
        // macOS extras extend the standard table
        assert_eq!(map.name(KeyLocation::Standard, 65), Some("A"));
    }

    #[test]
    fn test_keymap_override() {
        let mut map = KeyMap::standard(false, Platform::Standard);
        map.override_code(KeyLocation::Standard, 173, "AudioVolumeMute");
        map.override_code(KeyLocation::Standard, 65, "Q");
        assert_eq!(map.name(KeyLocation::Standard, 173), Some("AudioVolumeMute"));
        assert_eq!(map.name(KeyLocation::Standard, 65), Some("Q"));
    }

    #[test]
    fn test_resolve_left_right_code_wins() {
        let resolved = resolver().resolve(
            &KeyInput::new("Shift")
                .with_key_code(16)
                .at(KeyLocation::Left),
        );
        assert_eq!(resolved.name, "ShiftLeft");
        assert_eq!(resolved.code, "ShiftLeft");
        assert_eq!(resolved.modifier, Some(ModifierClass::Shift));
    }

    #[test]
    fn test_resolve_shifted_character_keeps_physical_code() {
        let resolved = resolver().resolve(&KeyInput::new("?").with_key_code(191));
        assert_eq!(resolved.name, "?");
        assert_eq!(resolved.code, "/");
        assert_eq!(resolved.modifier, None);
    }

    #[test]
    fn test_resolve_strips_arrow_prefix() {
        let resolved = resolver().resolve(&KeyInput::new("ArrowUp").with_key_code(38));
        assert_eq!(resolved.name, "Up");
        assert_eq!(resolved.code, "Up");
        let resolved = resolver().resolve(&KeyInput::from_code(40));
        assert_eq!(resolved.name, "Down");
        assert_eq!(resolved.code, "Down");
    }

    #[test]
    fn test_resolve_unique_numpad() {
        let resolver = NameResolver::new(KeyMap::standard(true, Platform::Standard), true);
        let resolved = resolver.resolve(
            &KeyInput::new("5")
                .with_key_code(101)
                .at(KeyLocation::Numpad),
        );
        assert_eq!(resolved.name, "numpad5");
        assert_eq!(resolved.code, "numpad5");
    }

    #[test]
    fn test_resolve_unknown_passes_through() {
        let resolved = resolver().resolve(&KeyInput::from_code(9999));
        assert_eq!(resolved.name, "9999");
        let resolved = resolver().resolve(&KeyInput::default().with_code("KeyZ"));
        assert_eq!(resolved.name, "Z");
        let resolved = resolver().resolve(&KeyInput::new("Hyper"));
        assert_eq!(resolved.name, "Hyper");
        assert_eq!(resolved.code, "Hyper");
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let input = KeyInput::new("a").with_key_code(65);
        assert_eq!(resolver().resolve(&input), resolver().resolve(&input));
    }
}
