//! Listener registry and dispatch

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::grammar::canonical_name;
use crate::input::PointerKind;

// ============================================================================
// Listener values
// ============================================================================

/// What a listener wants done with the platform's default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Response {
    /// No opinion
    #[default]
    Continue,
    Allow,
    /// Suppress the default action for the raw event being handled
    PreventDefault,
}

impl From<()> for Response {
    fn from(_: ()) -> Self {
        Response::Continue
    }
}

impl From<bool> for Response {
    fn from(allow: bool) -> Self {
        if allow {
            Response::Allow
        } else {
            Response::PreventDefault
        }
    }
}

/// Data handed to listeners alongside the event name.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    None,
    Key {
        key: String,
        code: String,
    },
    Pointer {
        kind: PointerKind,
        button: Option<String>,
        x: f64,
        y: f64,
    },
    Wheel {
        delta_x: f64,
        delta_y: f64,
    },
    Gamepad {
        index: usize,
        id: String,
    },
    Button {
        pad: usize,
        button: usize,
        value: f64,
    },
    Axis {
        pad: usize,
        axis: usize,
        value: f64,
    },
    Speech {
        transcript: String,
    },
    Text {
        data: Option<String>,
    },
}

type CallbackFn = dyn Fn(&mut Registry, &Payload) -> Response;

/// A listener callback.
///
/// Clones share identity, which is what [`Registry::off_matching`] compares.
/// Callbacks receive the registry itself so they can register, remove and
/// trigger listeners while being dispatched.
#[derive(Clone)]
pub struct Callback(Rc<CallbackFn>);

impl Callback {
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(&mut Registry, &Payload) -> R + 'static,
        R: Into<Response>,
    {
        Callback(Rc::new(move |registry: &mut Registry, payload: &Payload| {
            f(registry, payload).into()
        }))
    }

    pub fn same(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn call(&self, registry: &mut Registry, payload: &Payload) -> Response {
        (self.0)(registry, payload)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

#[derive(Debug)]
struct ListenerRecord {
    callback: Callback,
    context: Option<String>,
    /// `None` means unlimited
    remaining: Cell<Option<u32>>,
}

/// Extra registration options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub context: Option<String>,
    pub max_calls: Option<u32>,
}

/// Context filter for [`Registry::off_matching`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContextMatch {
    /// Any context, including none
    #[default]
    Any,
    /// Only records registered without a context
    Unset,
    Is(String),
}

impl ContextMatch {
    fn matches(&self, context: Option<&str>) -> bool {
        match self {
            ContextMatch::Any => true,
            ContextMatch::Unset => context.is_none(),
            ContextMatch::Is(wanted) => context == Some(wanted.as_str()),
        }
    }
}

/// One event name or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventNames(Vec<String>);

impl EventNames {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl IntoIterator for EventNames {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<&str> for EventNames {
    fn from(name: &str) -> Self {
        EventNames(vec![name.to_string()])
    }
}

impl From<String> for EventNames {
    fn from(name: String) -> Self {
        EventNames(vec![name])
    }
}

impl From<&String> for EventNames {
    fn from(name: &String) -> Self {
        EventNames(vec![name.clone()])
    }
}

impl From<Vec<String>> for EventNames {
    fn from(names: Vec<String>) -> Self {
        EventNames(names)
    }
}

impl From<Vec<&str>> for EventNames {
    fn from(names: Vec<&str>) -> Self {
        EventNames(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for EventNames {
    fn from(names: &[&str]) -> Self {
        EventNames(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for EventNames {
    fn from(names: [&str; N]) -> Self {
        EventNames(names.iter().map(|n| n.to_string()).collect())
    }
}

// ============================================================================
// Registry
// ============================================================================

const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("tap", "click"),
    ("middleclick", "pointer:middle:click"),
    ("rightclick", "pointer:right:click"),
    ("doubleclick", "dblclick"),
    ("tripleclick", "pointer:left pointer:left pointer:left"),
    (
        "quadrupleclick",
        "pointer:left pointer:left pointer:left pointer:left",
    ),
    ("konami", "up up down down left right left right b a enter"),
    ("portrait", "window:orientation:portrait"),
    ("landscape", "window:orientation:landscape"),
    ("hulksmash", "faceplant"),
];

/// Listeners keyed by normalized event name, plus aliases, the scope stack
/// and the recording buffer.
#[derive(Debug, Default)]
pub struct Registry {
    listeners: HashMap<String, Vec<Rc<ListenerRecord>>>,
    aliases: HashMap<String, String>,
    scope: Vec<String>,
    recording: Option<Vec<String>>,
}

impl Registry {
    /// An empty registry without any aliases.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry with the built-in aliases (`tap`, `konami`, ...).
    pub fn with_default_aliases() -> Self {
        let mut registry = Self::new();
        registry.install_default_aliases();
        registry
    }

    fn install_default_aliases(&mut self) {
        for (name, target) in DEFAULT_ALIASES {
            self.aliases.insert(name.to_string(), target.to_string());
        }
    }

    /// Drop every listener, alias override, scope and recording, then
    /// reinstall the built-in aliases.
    pub fn reset(&mut self) {
        self.listeners.clear();
        self.aliases.clear();
        self.scope.clear();
        self.recording = None;
        self.install_default_aliases();
    }

    // ------------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------------

    fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Normalize a name the way registrations are stored: one level of alias
    /// indirection, a lone upper-case character becomes `shift-<char>`, then
    /// lowercase and canonical chord order. No scope prefix.
    pub fn normalize(&self, name: &str) -> String {
        let resolved = self.resolve_alias(name);
        let mut chars = resolved.chars();
        let expanded = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_uppercase() => format!("shift-{}", resolved),
            _ => resolved.to_string(),
        };
        canonical_name(&expanded)
    }

    fn scoped(&self, name: &str) -> String {
        format!("{}{}", self.scope(), name)
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    pub fn on(&mut self, names: impl Into<EventNames>, callback: Callback) -> &mut Self {
        self.on_with(names, callback, ListenerOptions::default())
    }

    pub fn on_with(
        &mut self,
        names: impl Into<EventNames>,
        callback: Callback,
        options: ListenerOptions,
    ) -> &mut Self {
        for name in names.into() {
            let event = self.scoped(&self.normalize(&name));
            tracing::trace!("Registering listener for {}", event);
            self.listeners
                .entry(event)
                .or_default()
                .push(Rc::new(ListenerRecord {
                    callback: callback.clone(),
                    context: options.context.clone(),
                    remaining: Cell::new(options.max_calls),
                }));
        }
        self
    }

    /// Register a listener that removes itself after its first call.
    pub fn once(&mut self, names: impl Into<EventNames>, callback: Callback) -> &mut Self {
        self.on_with(
            names,
            callback,
            ListenerOptions {
                context: None,
                max_calls: Some(1),
            },
        )
    }

    pub fn off_all(&mut self) -> &mut Self {
        self.listeners.clear();
        self
    }

    /// Remove every listener registered for `names`.
    pub fn off(&mut self, names: impl Into<EventNames>) -> &mut Self {
        self.off_matching(Some(names.into()), None, ContextMatch::Any)
    }

    /// Remove listeners selectively.
    ///
    /// `names: None` searches every event. A record is removed when its
    /// callback is `callback` (or `callback` is `None`) and its context
    /// satisfies `context`. Events left without listeners are dropped.
    pub fn off_matching(
        &mut self,
        names: Option<EventNames>,
        callback: Option<&Callback>,
        context: ContextMatch,
    ) -> &mut Self {
        let events: Vec<String> = match names {
            Some(names) => names
                .into_iter()
                .map(|name| self.scoped(&self.normalize(&name)))
                .collect(),
            None => self.listeners.keys().cloned().collect(),
        };
        for event in events {
            if let Some(records) = self.listeners.get_mut(&event) {
                records.retain(|record| {
                    let callback_matches = callback.map_or(true, |cb| record.callback.same(cb));
                    !(callback_matches && context.matches(record.context.as_deref()))
                });
                if records.is_empty() {
                    self.listeners.remove(&event);
                }
            }
        }
        self
    }

    /// Number of listeners a `trigger(name)` would reach right now.
    pub fn listener_count(&self, name: &str) -> usize {
        let event = self.scoped(&self.normalize(name));
        self.listeners.get(&event).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Fire `names` within the current scope and collect every listener's
    /// response, in invocation order across all names.
    pub fn trigger(&mut self, names: impl Into<EventNames>, payload: &Payload) -> Vec<Response> {
        let prefix = self.scope();
        let mut results = Vec::new();
        for name in names.into() {
            let event = format!("{}{}", prefix, self.resolve_alias(&name));
            results.extend(self.dispatch(&event, payload));
        }
        results
    }

    /// Same as [`trigger`](Self::trigger).
    pub fn emit(&mut self, names: impl Into<EventNames>, payload: &Payload) -> Vec<Response> {
        self.trigger(names, payload)
    }

    /// Fire `names` ignoring the current scope (lifecycle events).
    pub fn trigger_unscoped(&mut self, names: impl Into<EventNames>, payload: &Payload) -> Vec<Response> {
        let mut results = Vec::new();
        for name in names.into() {
            let event = self.resolve_alias(&name).to_string();
            results.extend(self.dispatch(&event, payload));
        }
        results
    }

    fn dispatch(&mut self, event: &str, payload: &Payload) -> Vec<Response> {
        tracing::debug!("Triggering: {}", event);
        if let Some(recorded) = self.recording.as_mut() {
            recorded.push(event.to_string());
        }
        // Listeners may change this list while it is being walked
        let snapshot = match self.listeners.get(event) {
            Some(records) => records.clone(),
            None => return Vec::new(),
        };
        let mut results = Vec::with_capacity(snapshot.len());
        for record in snapshot {
            match record.remaining.get() {
                Some(0) => continue,
                Some(n) => {
                    record.remaining.set(Some(n - 1));
                    if n == 1 {
                        self.remove_record(event, &record);
                    }
                }
                None => {}
            }
            results.push(record.callback.call(self, payload));
        }
        results
    }

    fn remove_record(&mut self, event: &str, record: &Rc<ListenerRecord>) {
        if let Some(records) = self.listeners.get_mut(event) {
            records.retain(|r| !Rc::ptr_eq(r, record));
            if records.is_empty() {
                self.listeners.remove(event);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Aliases
    // ------------------------------------------------------------------------

    pub fn alias(&mut self, name: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.aliases.insert(name.into(), target.into());
        self
    }

    pub fn remove_alias(&mut self, name: &str) -> Option<String> {
        self.aliases.remove(name)
    }

    pub fn aliases(&self) -> &HashMap<String, String> {
        &self.aliases
    }

    // ------------------------------------------------------------------------
    // Scope
    // ------------------------------------------------------------------------

    pub fn push_scope(&mut self, segment: impl Into<String>) -> &mut Self {
        self.scope.push(segment.into());
        self
    }

    pub fn pop_scope(&mut self) -> Option<String> {
        self.scope.pop()
    }

    /// The current prefix: `""` when unscoped, otherwise `"outer.inner:"`.
    pub fn scope(&self) -> String {
        if self.scope.is_empty() {
            String::new()
        } else {
            format!("{}:", self.scope.join("."))
        }
    }

    // ------------------------------------------------------------------------
    // Recording
    // ------------------------------------------------------------------------

    pub fn start_recording(&mut self) {
        self.recording = Some(Vec::new());
    }

    /// Stop recording and return each fired name once, in first-fired order.
    pub fn stop_recording(&mut self) -> Vec<String> {
        let recorded = self.recording.take().unwrap_or_default();
        let mut unique: Vec<String> = Vec::with_capacity(recorded.len());
        for name in recorded {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        unique
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn counter() -> (Rc<Cell<u32>>, Callback) {
        let count = Rc::new(Cell::new(0));
        let inner = count.clone();
        let callback = Callback::new(move |_: &mut Registry, _: &Payload| {
            inner.set(inner.get() + 1);
        });
        (count, callback)
    }

    #[test]
    fn test_on_and_trigger() {
        let mut registry = Registry::new();
        let (count, callback) = counter();
        registry.on("jump", callback);
        let results = registry.trigger("jump", &Payload::None);
        assert_eq!(results, vec![Response::Continue]);
        assert_eq!(count.get(), 1);
        assert!(registry.trigger("duck", &Payload::None).is_empty());
    }

    #[test]
    fn test_registration_is_canonicalized() {
        let mut registry = Registry::new();
        let (count, callback) = counter();
        registry.on("Shift-Control-A", callback);
        registry.trigger("ctrl-shift-a", &Payload::None);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_uppercase_shortcut() {
        let mut registry = Registry::new();
        let (count, callback) = counter();
        registry.on("A", callback.clone());
        registry.on("?", callback);
        registry.trigger("shift-a", &Payload::None);
        registry.trigger("?", &Payload::None);
        assert_eq!(count.get(), 2);
        assert_eq!(registry.listener_count("shift-?"), 0);
    }

    #[test]
    fn test_alias_resolution() {
        let mut registry = Registry::with_default_aliases();
        let (count, callback) = counter();
        registry.on("tap", callback.clone());
        registry.trigger("click", &Payload::None);
        registry.alias("save", "ctrl-s");
        registry.on("ctrl-s", callback);
        registry.trigger("save", &Payload::None);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_once_fires_once() {
        let mut registry = Registry::new();
        let (count, callback) = counter();
        registry.once("boom", callback);
        for _ in 0..3 {
            registry.trigger("boom", &Payload::None);
        }
        assert_eq!(count.get(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_max_calls() {
        let mut registry = Registry::new();
        let (count, callback) = counter();
        registry.on_with(
            "tick",
            callback,
            ListenerOptions {
                context: None,
                max_calls: Some(2),
            },
        );
        for _ in 0..5 {
            registry.trigger("tick", &Payload::None);
        }
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_off_all() {
        let mut registry = Registry::new();
        let (_, callback) = counter();
        registry.on(["a", "b", "ctrl-c"], callback);
        registry.off_all();
        assert!(registry.trigger(["a", "b", "ctrl-c"], &Payload::None).is_empty());
    }

    #[test]
    fn test_off_by_name_deletes_entry() {
        let mut registry = Registry::new();
        let (_, callback) = counter();
        registry.on("a", callback.clone());
        registry.on("b", callback);
        registry.off("a");
        assert_eq!(registry.listener_count("a"), 0);
        assert_eq!(registry.listener_count("b"), 1);
        registry.off("b");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_off_matching_callback_and_context() {
        let mut registry = Registry::new();
        let (first_count, first) = counter();
        let (second_count, second) = counter();
        registry.on("x", first.clone());
        registry.on_with(
            "x",
            first.clone(),
            ListenerOptions {
                context: Some("menu".to_string()),
                max_calls: None,
            },
        );
        registry.on("x", second);

        registry.off_matching(Some("x".into()), Some(&first), ContextMatch::Unset);
        registry.trigger("x", &Payload::None);
        assert_eq!(first_count.get(), 1);
        assert_eq!(second_count.get(), 1);

        registry.off_matching(None, Some(&first), ContextMatch::Is("menu".to_string()));
        registry.trigger("x", &Payload::None);
        assert_eq!(first_count.get(), 1);
        assert_eq!(second_count.get(), 2);
    }

    #[test]
    fn test_responses_in_registration_order() {
        let mut registry = Registry::new();
        registry.on("x", Callback::new(|_: &mut Registry, _: &Payload| true));
        registry.on("x", Callback::new(|_: &mut Registry, _: &Payload| false));
        registry.on("y", Callback::new(|_: &mut Registry, _: &Payload| {}));
        let results = registry.trigger(["x", "y"], &Payload::None);
        assert_eq!(
            results,
            vec![Response::Allow, Response::PreventDefault, Response::Continue]
        );
    }

    #[test]
    fn test_scope_prefixes_registration_and_trigger() {
        let mut registry = Registry::new();
        let (count, callback) = counter();
        registry.push_scope("game");
        assert_eq!(registry.scope(), "game:");
        registry.on("jump", callback);
        registry.trigger("jump", &Payload::None);
        assert_eq!(count.get(), 1);

        registry.pop_scope();
        assert_eq!(registry.scope(), "");
        registry.trigger("jump", &Payload::None);
        assert_eq!(count.get(), 1);
        registry.trigger("game:jump", &Payload::None);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_nested_scope_string() {
        let mut registry = Registry::new();
        registry.push_scope("foo").push_scope("bar");
        assert_eq!(registry.scope(), "foo.bar:");
        assert_eq!(registry.pop_scope(), Some("bar".to_string()));
        assert_eq!(registry.scope(), "foo:");
        registry.pop_scope();
        assert_eq!(registry.pop_scope(), None);
    }

    #[test]
    fn test_recording_is_unique_and_ordered() {
        let mut registry = Registry::new();
        registry.start_recording();
        registry.trigger(["b", "a", "b"], &Payload::None);
        assert_eq!(registry.stop_recording(), vec!["b".to_string(), "a".to_string()]);
        assert!(!registry.is_recording());
    }

    #[test]
    fn test_reentrant_registration_during_dispatch() {
        let mut registry = Registry::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        registry.on(
            "x",
            Callback::new(move |registry: &mut Registry, _: &Payload| {
                log.borrow_mut().push("first");
                let inner = log.clone();
                registry.on(
                    "x",
                    Callback::new(move |_: &mut Registry, _: &Payload| {
                        inner.borrow_mut().push("added");
                    }),
                );
            }),
        );
        let log = seen.clone();
        registry.on(
            "x",
            Callback::new(move |registry: &mut Registry, _: &Payload| {
                log.borrow_mut().push("second");
                registry.off_all();
            }),
        );
        registry.trigger("x", &Payload::None);
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_once_not_double_fired_by_reentrant_trigger() {
        let mut registry = Registry::new();
        let (count, callback) = counter();
        let forwarded = Rc::new(Cell::new(false));
        registry.on(
            "x",
            Callback::new(move |registry: &mut Registry, payload: &Payload| {
                if !forwarded.replace(true) {
                    registry.trigger("x", payload);
                }
            }),
        );
        registry.once("x", callback);
        registry.trigger("x", &Payload::None);
        assert_eq!(count.get(), 1);
        assert_eq!(registry.listener_count("x"), 1);
    }
}
