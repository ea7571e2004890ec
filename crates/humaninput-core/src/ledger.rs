//! The set of currently active inputs

use crate::names::ModifierClass;

/// Which modifier classes are held. Always derived from the ledger contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub os: bool,
}

impl ModifierState {
    fn from_names<'a>(names: impl Iterator<Item = &'a String>) -> Self {
        let mut state = Self::default();
        for name in names {
            match ModifierClass::of(name) {
                Some(ModifierClass::Ctrl) => state.ctrl = true,
                Some(ModifierClass::Shift) => state.shift = true,
                Some(ModifierClass::Alt) => state.alt = true,
                Some(ModifierClass::Os) => state.os = true,
                None => {}
            }
        }
        state
    }

    pub fn is_held(&self, class: ModifierClass) -> bool {
        match class {
            ModifierClass::Ctrl => self.ctrl,
            ModifierClass::Shift => self.shift,
            ModifierClass::Alt => self.alt,
            ModifierClass::Os => self.os,
        }
    }

    /// Look up a modifier by one of its side-less names (`ctrl`, `option`,
    /// `⌘`). Sided names (`shiftleft`) only match the ledger entry itself.
    pub fn get(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        if lower.ends_with("left") || lower.ends_with("right") {
            return false;
        }
        ModifierClass::of(&lower).is_some_and(|class| self.is_held(class))
    }

    pub fn any(&self) -> bool {
        self.ctrl || self.shift || self.alt || self.os
    }
}

/// Ordered record of active inputs.
///
/// Each entry keeps two names: the live name, as most recently reported, and
/// the name the input had when it was pressed. Some platforms report a
/// different identity for a key on release than on press (the release of a
/// shifted `?` may arrive as `/`), so releases are matched against both.
#[derive(Debug, Clone, Default)]
pub struct DownLedger {
    live: Vec<String>,
    press_time: Vec<String>,
    modifiers: ModifierState,
    last_release_len: usize,
}

impl DownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press. Ignored when the input (under either name) is already
    /// present.
    pub fn add(&mut self, name: &str, alt: Option<&str>) -> bool {
        let present = self.live.iter().any(|n| n == name)
            || self.press_time.iter().any(|n| n == name)
            || alt.is_some_and(|alt| self.press_time.iter().any(|n| n == alt));
        if present {
            return false;
        }
        self.live.push(name.to_string());
        self.press_time.push(alt.unwrap_or(name).to_string());
        self.refresh();
        true
    }

    /// Record a release.
    ///
    /// Matches the live name first, then the press-time name, then the
    /// upper-cased name against press-time names (a letter released after
    /// shift was let go). Unknown releases are ignored.
    pub fn remove(&mut self, name: &str) -> bool {
        let upper = name.to_uppercase();
        let index = self
            .live
            .iter()
            .position(|n| n == name)
            .or_else(|| self.press_time.iter().position(|n| n == name))
            .or_else(|| self.press_time.iter().position(|n| *n == upper));
        let removed = match index {
            Some(index) => {
                self.live.remove(index);
                self.press_time.remove(index);
                self.refresh();
                true
            }
            None => false,
        };
        self.last_release_len = self.live.len();
        removed
    }

    pub fn reset(&mut self) {
        self.live.clear();
        self.press_time.clear();
        self.last_release_len = 0;
        self.refresh();
    }

    fn refresh(&mut self) {
        debug_assert_eq!(
            self.live.len(),
            self.press_time.len(),
            "ledger views out of step"
        );
        self.modifiers = ModifierState::from_names(self.live.iter().chain(self.press_time.iter()));
    }

    pub fn live(&self) -> &[String] {
        &self.live
    }

    pub fn press_time(&self) -> &[String] {
        &self.press_time
    }

    /// `(live, press_time)` pairs in press order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.live
            .iter()
            .zip(self.press_time.iter())
            .map(|(live, press)| (live.as_str(), press.as_str()))
    }

    pub fn modifiers(&self) -> ModifierState {
        self.modifiers
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Ledger length right after the most recent release.
    pub fn last_release_len(&self) -> usize {
        self.last_release_len
    }

    /// True when the ledger grew since the last release, i.e. releasing now
    /// completes a chord.
    pub fn completes_chord(&self) -> bool {
        self.last_release_len < self.live.len()
    }

    /// True if `name` (case-insensitive) is held under either of its names,
    /// or is a modifier class/alias that any held input belongs to.
    pub fn is_held(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        let direct = self
            .entries()
            .any(|(live, press)| live.to_lowercase() == lower || press.to_lowercase() == lower);
        direct || self.modifiers.get(&lower)
    }
}
