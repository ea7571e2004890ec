//! End-to-end behavior of the engine through its public API.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use humaninput_core::{
    Callback, ContextMatch, HumanInput, KeyInput, KeyLocation, Payload, Registry, Response,
    Settings, SettingsError, MAX_SEQUENCE_BUF,
};

fn engine() -> HumanInput {
    HumanInput::new(Settings::default()).expect("default settings are valid")
}

type Log = Rc<RefCell<Vec<String>>>;

fn listen(hi: &mut HumanInput, name: &str, log: &Log) {
    let log = log.clone();
    let label = name.to_string();
    hi.on(
        name,
        Callback::new(move |_: &mut Registry, _: &Payload| log.borrow_mut().push(label.clone())),
    );
}

fn ctrl() -> KeyInput {
    KeyInput::new("Control").with_key_code(17).at(KeyLocation::Left)
}

fn shift() -> KeyInput {
    KeyInput::new("Shift").with_key_code(16).at(KeyLocation::Left)
}

fn key(name: &str) -> KeyInput {
    KeyInput::new(name)
}

fn tap(hi: &mut HumanInput, input: KeyInput, now: Instant) {
    hi.handle_press(input.clone(), now);
    hi.handle_release(input, now);
}

#[test]
fn test_ledger_views_stay_the_same_length() {
    let mut hi = engine();
    let now = Instant::now();
    let inputs = [ctrl(), shift(), key("A").with_key_code(65), key("?").with_key_code(191)];
    for input in &inputs {
        hi.handle_press(input.clone(), now);
        let ledger = hi.core().ledger();
        assert_eq!(ledger.live().len(), ledger.press_time().len());
    }
    for input in inputs.iter().rev() {
        hi.handle_release(input.clone(), now);
        let ledger = hi.core().ledger();
        assert_eq!(ledger.live().len(), ledger.press_time().len());
    }
    assert!(hi.core().ledger().is_empty());
}

#[test]
fn test_chord_fires_in_any_registration_order() {
    let mut hi = engine();
    let log: Log = Rc::default();
    listen(&mut hi, "shift-ctrl-a", &log);
    listen(&mut hi, "ctrl->shift->a", &log);
    listen(&mut hi, "shift->ctrl->a", &log);

    let now = Instant::now();
    hi.handle_press(ctrl(), now);
    hi.handle_press(shift(), now);
    hi.handle_press(key("a").with_key_code(65), now);

    assert_eq!(*log.borrow(), vec!["ctrl->shift->a", "shift-ctrl-a"]);
    assert!(hi.down_events().contains(&"ctrl-shift-a".to_string()));
    assert!(hi.is_down("ctrl"));
    assert!(hi.is_down("ShiftLeft"));
}

#[test]
fn test_sequence_fires_once_and_clears_buffer() {
    let mut hi = engine();
    let log: Log = Rc::default();
    listen(&mut hi, "a b", &log);
    let now = Instant::now();

    tap(&mut hi, key("a"), now);
    assert!(log.borrow().is_empty());
    tap(&mut hi, key("b"), now);
    assert_eq!(log.borrow().len(), 1);
    assert!(hi.core().sequences().is_empty());

    // The buffer was consumed, so a lone `b` does not complete it again
    tap(&mut hi, key("b"), now);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_sequence_with_chord_steps() {
    let mut hi = engine();
    let log: Log = Rc::default();
    listen(&mut hi, "ctrl-k ctrl-c", &log);
    let now = Instant::now();

    for letter in ["k", "c"] {
        hi.handle_press(ctrl(), now);
        hi.handle_press(key(letter), now);
        hi.handle_release(key(letter), now);
        hi.handle_release(ctrl(), now);
    }
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_sequence_expires_after_inactivity() {
    let mut hi = engine();
    let log: Log = Rc::default();
    listen(&mut hi, "a b", &log);
    let start = Instant::now();

    tap(&mut hi, key("a"), start);
    let deadline = hi.next_deadline().expect("inactivity timer armed");
    assert_eq!(deadline, start + Duration::from_millis(3000));
    tap(&mut hi, key("b"), deadline + Duration::from_millis(1));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_timeout_clears_stuck_modifier() {
    let mut hi = engine();
    let log: Log = Rc::default();
    listen(&mut hi, "ctrl-a", &log);
    listen(&mut hi, "a", &log);
    let start = Instant::now();

    // The release of ctrl is never reported
    hi.handle_press(ctrl(), start);
    assert!(hi.is_down("ctrl"));
    hi.tick(start + Duration::from_secs(4));
    assert!(!hi.is_down("ctrl"));
    assert!(hi.core().sequences().is_empty());

    hi.handle_press(key("a"), start + Duration::from_secs(5));
    assert_eq!(*log.borrow(), vec!["a"]);
}

#[test]
fn test_once_listener_runs_a_single_time() {
    let mut hi = engine();
    let log: Log = Rc::default();
    let inner = log.clone();
    hi.once(
        "x",
        Callback::new(move |_: &mut Registry, _: &Payload| inner.borrow_mut().push("x".to_string())),
    );
    let now = Instant::now();
    tap(&mut hi, key("x"), now);
    tap(&mut hi, key("x"), now);
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(hi.registry().listener_count("x"), 0);
}

#[test]
fn test_off_removes_listeners() {
    let mut hi = engine();
    let log: Log = Rc::default();
    listen(&mut hi, "ctrl-s", &log);
    hi.off("s-ctrl");
    let now = Instant::now();
    hi.handle_press(ctrl(), now);
    hi.handle_press(key("s"), now);
    assert!(log.borrow().is_empty());
}

#[test]
fn test_off_matching_removes_only_that_callback() {
    let mut hi = engine();
    let log: Log = Rc::default();
    let first = {
        let log = log.clone();
        Callback::new(move |_: &mut Registry, _: &Payload| log.borrow_mut().push("first".into()))
    };
    let second = {
        let log = log.clone();
        Callback::new(move |_: &mut Registry, _: &Payload| log.borrow_mut().push("second".into()))
    };
    hi.on("ctrl-s", first.clone());
    hi.on("ctrl-s", second);
    hi.off_matching(Some("s-ctrl".into()), Some(&first), ContextMatch::Unset);
    assert_eq!(hi.registry().listener_count("ctrl-s"), 1);

    let now = Instant::now();
    hi.handle_press(ctrl(), now);
    hi.handle_press(key("s"), now);
    assert_eq!(*log.borrow(), vec!["second".to_string()]);
}

#[test]
fn test_oversized_sequence_buffer_is_rejected() {
    let result = HumanInput::new(Settings {
        max_sequence_buf: usize::MAX,
        ..Settings::default()
    });
    assert!(matches!(
        result,
        Err(SettingsError::SequenceBufferTooLarge { max: MAX_SEQUENCE_BUF, .. })
    ));
}

#[test]
fn test_off_all_silences_every_name() {
    let mut hi = engine();
    let log: Log = Rc::default();
    listen(&mut hi, "a", &log);
    listen(&mut hi, "custom:event", &log);
    hi.off_all();
    assert!(hi.trigger("a", &Payload::None).is_empty());
    assert!(hi.trigger(["custom:event", "b"], &Payload::None).is_empty());
    assert!(log.borrow().is_empty());
}

#[test]
fn test_unit_and_true_returns_do_not_prevent_default() {
    let mut hi = engine();
    hi.on("ctrl-s", Callback::new(|_: &mut Registry, _: &Payload| true));
    hi.on("ctrl-s", Callback::new(|_: &mut Registry, _: &Payload| {}));
    let now = Instant::now();
    hi.handle_press(ctrl(), now);
    let dispatch = hi.handle_press(key("s"), now);
    assert_eq!(dispatch.responses(), &[Response::Allow, Response::Continue]);
    assert!(!dispatch.prevent_default());
}

#[test]
fn test_false_return_prevents_default() {
    let mut hi = engine();
    hi.on("ctrl-s", Callback::new(|_: &mut Registry, _: &Payload| false));
    let now = Instant::now();
    let dispatch = hi.handle_press(ctrl(), now);
    assert!(!dispatch.prevent_default());
    let dispatch = hi.handle_press(key("s"), now);
    assert!(dispatch.prevent_default());
    assert_eq!(dispatch.responses(), &[Response::PreventDefault]);
}

#[test]
fn test_scoped_listeners_only_fire_in_scope() {
    let mut hi = engine();
    let log: Log = Rc::default();
    hi.push_scope("editor");
    listen(&mut hi, "ctrl-z", &log);
    hi.pop_scope();
    listen(&mut hi, "ctrl-z", &log);

    let now = Instant::now();
    hi.handle_press(ctrl(), now);
    hi.handle_press(key("z"), now);
    hi.handle_release(key("z"), now);
    assert_eq!(log.borrow().len(), 1);

    hi.push_scope("editor");
    assert_eq!(hi.scope(), "editor:");
    hi.handle_press(key("z"), now);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn test_scoped_trigger_matches_only_in_scope() {
    let mut hi = engine();
    let log: Log = Rc::default();
    hi.push_scope("game");
    listen(&mut hi, "jump", &log);
    assert_eq!(hi.trigger("jump", &Payload::None).len(), 1);
    hi.pop_scope();
    assert!(hi.trigger("jump", &Payload::None).is_empty());

    listen(&mut hi, "jump", &log);
    assert_eq!(hi.trigger("jump", &Payload::None).len(), 1);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn test_uppercase_registration_means_shift() {
    let mut hi = engine();
    let log: Log = Rc::default();
    listen(&mut hi, "A", &log);
    let now = Instant::now();
    hi.handle_press(key("a").with_key_code(65), now);
    assert!(log.borrow().is_empty());
    hi.handle_release(key("a").with_key_code(65), now);

    hi.handle_press(shift(), now);
    hi.handle_press(key("A").with_key_code(65), now);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_shift_symbol_registers_as_shift() {
    let mut hi = engine();
    let log: Log = Rc::default();
    listen(&mut hi, "⇧-a", &log);
    assert_eq!(hi.registry().listener_count("shift-a"), 1);
    let now = Instant::now();
    hi.handle_press(shift(), now);
    hi.handle_press(key("A").with_key_code(65), now);
    assert_eq!(*log.borrow(), vec!["⇧-a".to_string()]);
}

#[test]
fn test_custom_alias() {
    let mut hi = engine();
    hi.registry_mut().alias("save", "ctrl-s");
    let log: Log = Rc::default();
    listen(&mut hi, "save", &log);
    let now = Instant::now();
    hi.handle_press(ctrl(), now);
    hi.handle_press(key("s"), now);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_listener_can_trigger_from_callback() {
    let mut hi = engine();
    let log: Log = Rc::default();
    listen(&mut hi, "custom:saved", &log);
    hi.on(
        "ctrl-s",
        Callback::new(|registry: &mut Registry, _: &Payload| {
            registry.trigger("custom:saved", &Payload::None);
        }),
    );
    let now = Instant::now();
    hi.handle_press(ctrl(), now);
    hi.handle_press(key("s"), now);
    assert_eq!(*log.borrow(), vec!["custom:saved"]);
}

#[test]
fn test_recording_lists_fired_names() {
    let mut hi = engine();
    let now = Instant::now();
    hi.start_recording();
    hi.handle_press(ctrl(), now);
    hi.handle_press(key("s"), now);
    let names = hi.stop_recording();
    assert!(names.contains(&"keydown".to_string()));
    assert!(names.contains(&"ctrl-s".to_string()));
    assert!(names.contains(&"controlleft->s".to_string()));
    assert_eq!(
        names.iter().filter(|name| name.as_str() == "keydown").count(),
        1
    );
}

#[test]
fn test_konami_alias() {
    let mut hi = engine();
    let log: Log = Rc::default();
    listen(&mut hi, "konami", &log);
    let now = Instant::now();
    let codes = [38, 38, 40, 40, 37, 39, 37, 39];
    for code in codes {
        tap(&mut hi, KeyInput::from_code(code), now);
    }
    tap(&mut hi, key("b").with_key_code(66), now);
    tap(&mut hi, key("a").with_key_code(65), now);
    tap(&mut hi, key("Enter").with_key_code(13), now);
    assert_eq!(log.borrow().len(), 1);
}
