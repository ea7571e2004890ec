//! The input engine
//!
//! # Data flow
//!
//! ```text
//!  raw transition ──► InputHandler (per modality)
//!                          │
//!                          ├─ NameResolver      canonical names
//!                          ├─ DownLedger        add on press / remove on release
//!                          │
//!                          ├─ on press:   down_events(ledger) ──► Registry::trigger
//!                          └─ on release: SequenceBuffer::record
//!                                         + trailing slices   ──► Registry::trigger
//! ```
//!
//! Everything runs synchronously on the caller's thread. The only timed
//! behavior is the inactivity reset and gamepad polling; both are deadlines
//! the caller drives through [`HumanInput::tick`].
//!
//! # Default-action suppression
//!
//! Every entry point returns a [`Dispatch`]. When any listener answered
//! [`Response::PreventDefault`] (or the engine swallowed an auto-repeat),
//! [`Dispatch::prevent_default`] is true and the caller should suppress the
//! platform's default handling of the raw event.

use std::collections::HashMap;
use std::time::Instant;

use crate::combo::down_events;
use crate::error::SettingsError;
use crate::handlers::{self, ControllerLayout, GamepadSource, InputHandler, Transition};
use crate::input::{Modality, Phase, RawEvent};
use crate::ledger::DownLedger;
use crate::names::{KeyMap, NameResolver};
use crate::registry::{Callback, ContextMatch, EventNames, Payload, Registry, Response};
use crate::sequence::SequenceBuffer;
use crate::settings::Settings;
use crate::timer::{InactivityTimer, PollTimer};

// ============================================================================
// Dispatch result
// ============================================================================

/// Aggregated listener responses for one raw transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    responses: Vec<Response>,
    suppressed: bool,
}

impl Dispatch {
    /// A dispatch the engine itself wants suppressed.
    pub fn suppressed() -> Self {
        Self {
            responses: Vec::new(),
            suppressed: true,
        }
    }

    pub fn extend(&mut self, responses: Vec<Response>) {
        self.responses.extend(responses);
    }

    pub fn merge(&mut self, other: Dispatch) {
        self.responses.extend(other.responses);
        self.suppressed |= other.suppressed;
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// True if at least one listener ran.
    pub fn matched(&self) -> bool {
        !self.responses.is_empty()
    }

    pub fn prevent_default(&self) -> bool {
        self.suppressed || self.responses.contains(&Response::PreventDefault)
    }
}

impl From<Vec<Response>> for Dispatch {
    fn from(responses: Vec<Response>) -> Self {
        Self {
            responses,
            suppressed: false,
        }
    }
}

// ============================================================================
// Core state shared by all handlers
// ============================================================================

type Filter = Box<dyn Fn(&RawEvent) -> bool>;

/// State every handler works against: ledger, sequence buffer, registry and
/// the inactivity timer.
pub struct Core {
    settings: Settings,
    resolver: NameResolver,
    ledger: DownLedger,
    sequences: SequenceBuffer,
    registry: Registry,
    timer: InactivityTimer,
    filter: Option<Filter>,
}

impl Core {
    fn new(settings: Settings, keymap: KeyMap) -> Self {
        let resolver = NameResolver::new(keymap, settings.unique_numpad);
        let sequences = SequenceBuffer::new(settings.max_sequence_buf);
        let timer = InactivityTimer::new(settings.sequence_timeout());
        Self {
            settings,
            resolver,
            ledger: DownLedger::new(),
            sequences,
            registry: Registry::with_default_aliases(),
            timer,
            filter: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    pub fn ledger(&self) -> &DownLedger {
        &self.ledger
    }

    pub fn sequences(&self) -> &SequenceBuffer {
        &self.sequences
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Whether listeners should hear about `event`. State tracking happens
    /// regardless.
    pub fn accepts(&self, event: &RawEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    pub fn add_down(&mut self, name: &str, alt: Option<&str>) {
        self.ledger.add(name, alt);
    }

    pub fn remove_down(&mut self, name: &str) {
        self.ledger.remove(name);
    }

    pub fn rearm(&mut self, now: Instant) {
        self.timer.rearm(now);
    }

    /// Fire `names` in the current scope.
    pub fn trigger(&mut self, names: impl Into<EventNames>, payload: &Payload) -> Vec<Response> {
        self.registry.trigger(names, payload)
    }

    pub fn down_events(&self) -> Vec<String> {
        down_events(&self.ledger)
    }

    /// Fire every name describing the inputs held right now.
    pub fn handle_down_events(&mut self, payload: &Payload) -> Vec<Response> {
        let events = self.down_events();
        self.registry.trigger(events, payload)
    }

    /// Call on release, before the released input leaves the ledger.
    ///
    /// When the release completes a chord, the chord is appended to the
    /// sequence buffer and every trailing slice is fired as one batch. Any
    /// listener answering consumes the whole buffer. The inactivity timer is
    /// re-armed either way.
    pub fn handle_seq_events(&mut self, now: Instant) -> Vec<Response> {
        let mut results = Vec::new();
        if self.ledger.completes_chord() {
            self.sequences.record(self.ledger.live().to_vec());
            let slices = self.sequences.slices();
            if !slices.is_empty() {
                results = self.registry.trigger(slices, &Payload::None);
                if !results.is_empty() {
                    self.sequences.clear();
                }
            }
        }
        self.timer.rearm(now);
        results
    }

    /// True if `name` is held, either as an input or as a chord currently
    /// satisfied by the ledger.
    pub fn is_down(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.down_events().contains(&lower) || self.ledger.is_held(&lower)
    }

    pub fn reset_key_states(&mut self) {
        self.ledger.reset();
        self.sequences.clear();
    }

    fn expire(&mut self, now: Instant) -> bool {
        if self.timer.fire_if_due(now) {
            tracing::debug!("Resetting key states due to timeout");
            self.reset_key_states();
            return true;
        }
        false
    }
}

// ============================================================================
// Engine
// ============================================================================

/// The engine: a [`Core`] plus one handler per listened modality.
pub struct HumanInput {
    core: Core,
    handlers: HashMap<Modality, Box<dyn InputHandler>>,
    paused: bool,
    hidden: bool,
    gamepads: Option<Box<dyn GamepadSource>>,
    pads_seen: bool,
    poller: PollTimer,
}

impl HumanInput {
    pub fn new(settings: Settings) -> Result<Self, SettingsError> {
        let keymap = KeyMap::standard(settings.unique_numpad, settings.platform);
        Self::with_keymap(settings, keymap)
    }

    /// Build an engine around a custom key map.
    pub fn with_keymap(settings: Settings, keymap: KeyMap) -> Result<Self, SettingsError> {
        settings.validate()?;
        let handlers: HashMap<Modality, Box<dyn InputHandler>> = settings
            .listen
            .iter()
            .map(|modality| (*modality, handlers::build(*modality)))
            .collect();
        tracing::debug!("Listening to: {:?}", settings.listen);
        let poller = PollTimer::new(settings.gamepad_interval(), settings.gamepad_check_interval());

        let mut engine = Self {
            core: Core::new(settings, keymap),
            handlers,
            paused: false,
            hidden: false,
            gamepads: None,
            pads_seen: false,
            poller,
        };
        engine.core.registry.trigger_unscoped("hi:initialized", &Payload::None);
        Ok(engine)
    }

    // ------------------------------------------------------------------------
    // Input entry points
    // ------------------------------------------------------------------------

    pub fn handle_press(&mut self, event: impl Into<RawEvent>, now: Instant) -> Dispatch {
        self.dispatch(Phase::Press, event.into(), now)
    }

    pub fn handle_release(&mut self, event: impl Into<RawEvent>, now: Instant) -> Dispatch {
        self.dispatch(Phase::Release, event.into(), now)
    }

    /// For transitions without a release: wheel ticks, clicks, speech,
    /// composition and clipboard activity, gamepad snapshots.
    pub fn handle_momentary(&mut self, event: impl Into<RawEvent>, now: Instant) -> Dispatch {
        self.dispatch(Phase::Momentary, event.into(), now)
    }

    fn dispatch(&mut self, phase: Phase, event: RawEvent, now: Instant) -> Dispatch {
        self.core.expire(now);
        if self.paused {
            return Dispatch::default();
        }
        let modality = event.modality();
        let Some(handler) = self.handlers.get_mut(&modality) else {
            tracing::trace!("Ignoring {} input: not listening", modality);
            return Dispatch::default();
        };
        handler.handle(
            &mut self.core,
            Transition {
                phase,
                event: &event,
                now,
            },
        )
    }

    /// Run whatever timers are due at `now`.
    pub fn tick(&mut self, now: Instant) -> Dispatch {
        self.core.expire(now);
        if self.poller.is_due(now) {
            return self.poll_gamepads(now);
        }
        Dispatch::default()
    }

    /// The earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.core.timer.deadline(), self.poller.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn poll_gamepads(&mut self, now: Instant) -> Dispatch {
        let snapshots = match self.gamepads.as_mut() {
            Some(source) => source.poll(),
            None => return Dispatch::default(),
        };
        self.pads_seen |= !snapshots.is_empty();
        let mut dispatch = Dispatch::default();
        for snapshot in snapshots {
            dispatch.merge(self.dispatch(Phase::Momentary, RawEvent::Gamepad(snapshot), now));
        }
        if !self.paused && !self.hidden {
            self.poller.schedule(now, self.pads_seen);
        }
        dispatch
    }

    /// Start polling `source` for gamepad snapshots. Polls once right away.
    pub fn attach_gamepads(&mut self, source: impl GamepadSource + 'static, now: Instant) -> Dispatch {
        if !self.core.settings.listens_to(Modality::Gamepad) {
            tracing::warn!("Gamepad source attached but gamepad input is not enabled");
            return Dispatch::default();
        }
        self.gamepads = Some(Box::new(source));
        self.poll_gamepads(now)
    }

    /// Install a controller layout's aliases.
    pub fn load_controller(&mut self, layout: &ControllerLayout) -> &mut Self {
        tracing::debug!("Loading controller layout: {}", layout.name);
        for (alias, target) in &layout.aliases {
            self.core.registry.alias(alias.clone(), target.clone());
        }
        self
    }

    // ------------------------------------------------------------------------
    // State queries
    // ------------------------------------------------------------------------

    pub fn is_down(&self, name: &str) -> bool {
        self.core.is_down(name)
    }

    pub fn down_events(&self) -> Vec<String> {
        self.core.down_events()
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn settings(&self) -> &Settings {
        &self.core.settings
    }

    pub fn keymap_mut(&mut self) -> &mut KeyMap {
        self.core.resolver.keymap_mut()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // ------------------------------------------------------------------------
    // Listener API
    // ------------------------------------------------------------------------

    pub fn registry(&self) -> &Registry {
        &self.core.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.core.registry
    }

    pub fn on(&mut self, names: impl Into<EventNames>, callback: Callback) -> &mut Self {
        self.core.registry.on(names, callback);
        self
    }

    pub fn once(&mut self, names: impl Into<EventNames>, callback: Callback) -> &mut Self {
        self.core.registry.once(names, callback);
        self
    }

    pub fn off(&mut self, names: impl Into<EventNames>) -> &mut Self {
        self.core.registry.off(names);
        self
    }

    pub fn off_all(&mut self) -> &mut Self {
        self.core.registry.off_all();
        self
    }

    /// Remove listeners by name, callback identity and context.
    /// See [`Registry::off_matching`].
    pub fn off_matching(
        &mut self,
        names: Option<EventNames>,
        callback: Option<&Callback>,
        context: ContextMatch,
    ) -> &mut Self {
        self.core.registry.off_matching(names, callback, context);
        self
    }

    pub fn trigger(&mut self, names: impl Into<EventNames>, payload: &Payload) -> Vec<Response> {
        self.core.registry.trigger(names, payload)
    }

    pub fn emit(&mut self, names: impl Into<EventNames>, payload: &Payload) -> Vec<Response> {
        self.trigger(names, payload)
    }

    pub fn push_scope(&mut self, segment: impl Into<String>) -> &mut Self {
        self.core.registry.push_scope(segment);
        self
    }

    pub fn pop_scope(&mut self) -> Option<String> {
        self.core.registry.pop_scope()
    }

    pub fn scope(&self) -> String {
        self.core.registry.scope()
    }

    pub fn start_recording(&mut self) {
        self.core.registry.start_recording();
    }

    pub fn stop_recording(&mut self) -> Vec<String> {
        self.core.registry.stop_recording()
    }

    /// Veto triggering for raw events `filter` rejects. Ledger and sequence
    /// state are still tracked for them.
    pub fn set_filter(&mut self, filter: impl Fn(&RawEvent) -> bool + 'static) {
        self.core.filter = Some(Box::new(filter));
    }

    pub fn clear_filter(&mut self) {
        self.core.filter = None;
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Stop handling input until [`resume`](Self::resume).
    pub fn pause(&mut self) {
        self.paused = true;
        self.poller.stop();
        self.core.registry.trigger_unscoped("hi:pause", &Payload::None);
    }

    pub fn resume(&mut self, now: Instant) {
        self.paused = false;
        if self.gamepads.is_some() && !self.hidden {
            self.poller.schedule(now, self.pads_seen);
        }
        self.core.registry.trigger_unscoped("hi:resume", &Payload::None);
    }

    /// Re-initialize: clears the ledger, sequence buffer, listeners, aliases,
    /// scope and per-handler state, then fires `hi:initialized`.
    pub fn reset(&mut self) {
        self.core.reset_key_states();
        self.core.registry.reset();
        self.core.timer.cancel();
        for handler in self.handlers.values_mut() {
            handler.reset();
        }
        self.paused = false;
        self.core.registry.trigger_unscoped("hi:initialized", &Payload::None);
    }

    /// Report document visibility. Gamepad polling stops while hidden.
    pub fn set_visibility(&mut self, hidden: bool, now: Instant) -> Vec<Response> {
        self.hidden = hidden;
        if hidden {
            self.poller.stop();
            self.core.registry.trigger_unscoped("document:hidden", &Payload::None)
        } else {
            if self.gamepads.is_some() && !self.paused {
                self.poller.schedule(now, self.pads_seen);
            }
            self.core.registry.trigger_unscoped("document:visible", &Payload::None)
        }
    }
}
