// Keychord Integration Tests
//
// These tests drive the full pipeline through the public engine API:
// raw events -> key state -> context lookup -> chord trie -> listeners

use std::cell::RefCell;
use std::rc::Rc;

use keychord_core::{
    Callback, ChordError, Engine, EventKind, Key, KeyEvent, ListenError, OwnerToken, Platform,
};

// pc key codes
const SHIFT: u16 = 16;
const CTRL: u16 = 17;
const A: u16 = 65;
const B: u16 = 66;
const C: u16 = 67;
const EQUAL_SIGN: u16 = 187;

type Log = Rc<RefCell<Vec<&'static str>>>;

fn engine() -> Engine {
    Engine::with_platform(Platform::Pc)
}

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn tag(log: &Log, label: &'static str) -> Callback {
    let log = log.clone();
    Rc::new(move |_| log.borrow_mut().push(label))
}

fn down(engine: &mut Engine, code: u16, ctrl: bool, shift: bool) {
    engine.key_down(KeyEvent::new(code).with_modifiers(false, ctrl, false, shift));
}

fn up(engine: &mut Engine, code: u16, ctrl: bool, shift: bool) {
    engine.key_up(KeyEvent::new(code).with_modifiers(false, ctrl, false, shift));
}

#[test]
fn test_chord_fires_on_final_key_down() {
    let mut engine = engine();
    let log = log();
    engine
        .listen(EventKind::Chord, None, tag(&log, "chord"), &["ctrl", "a"], false, "default")
        .unwrap();

    down(&mut engine, CTRL, true, false);
    assert!(log.borrow().is_empty());
    down(&mut engine, A, true, false);
    assert_eq!(*log.borrow(), vec!["chord"]);
}

#[test]
fn test_chord_matches_in_any_press_order() {
    // declaration order is fixed (shortcuts first) but physical press
    // order must not matter
    let orders: &[&[(u16, bool, bool)]] = &[
        &[(CTRL, true, false), (SHIFT, true, true), (A, true, true), (B, true, true)],
        &[(SHIFT, false, true), (CTRL, true, true), (B, true, true), (A, true, true)],
        &[(A, false, false), (B, false, false), (SHIFT, false, true), (CTRL, true, true)],
        &[(B, false, false), (CTRL, true, false), (A, true, false), (SHIFT, true, true)],
    ];

    for order in orders {
        let mut engine = engine();
        let log = log();
        engine
            .listen(
                EventKind::Chord,
                None,
                tag(&log, "chord"),
                &["ctrl", "shift", "a", "b"],
                false,
                "default",
            )
            .unwrap();

        for &(code, ctrl, shift) in *order {
            down(&mut engine, code, ctrl, shift);
        }
        assert_eq!(*log.borrow(), vec!["chord"], "order {:?} failed", order);
    }
}

#[test]
fn test_chord_consumes_normal_keys_for_chaining() {
    let mut engine = engine();
    let log = log();
    engine
        .listen(EventKind::Chord, None, tag(&log, "ctrl+a"), &["ctrl", "a"], false, "default")
        .unwrap();
    engine
        .listen(EventKind::Chord, None, tag(&log, "ctrl+b"), &["ctrl", "b"], false, "default")
        .unwrap();

    // ctrl stays held across both chords; the normal key is consumed on
    // match so the next chord starts from a clean sequence
    down(&mut engine, CTRL, true, false);
    down(&mut engine, A, true, false);
    down(&mut engine, B, true, false);

    assert_eq!(*log.borrow(), vec!["ctrl+a", "ctrl+b"]);
}

#[test]
fn test_chord_fires_forced_up_for_consumed_keys() {
    let mut engine = engine();
    let log = log();
    engine
        .listen(EventKind::Chord, None, tag(&log, "chord"), &["ctrl", "a"], false, "default")
        .unwrap();
    engine
        .listen(EventKind::Up, None, tag(&log, "a up"), &["a"], false, "default")
        .unwrap();

    down(&mut engine, CTRL, true, false);
    down(&mut engine, A, true, false);
    assert_eq!(*log.borrow(), vec!["chord", "a up"]);

    // the real key-up still arrives later and fires again (ups are
    // unconditional)
    up(&mut engine, A, true, false);
    assert_eq!(*log.borrow(), vec!["chord", "a up", "a up"]);
}

#[test]
fn test_chord_shape_validation() {
    let mut engine = engine();
    let cb: Callback = Rc::new(|_| {});

    let cases: &[(&[&str], ChordError)] = &[
        (&["a"], ChordError::TooFewKeys(1)),
        (&["ctrl", "a", "b", "c", "d", "e", "f"], ChordError::TooManyKeys(7)),
        (&["ctrl", "a", "a"], ChordError::DuplicateKey(Key(A))),
        (&["ctrl", "a", "shift"], ChordError::ShortcutAfterNormal(Key(SHIFT))),
        (&["ctrl", "shift"], ChordError::NoNormalKey),
        (&["ctrl", "a", "b", "c", "d"], ChordError::TooManyNormalKeys(4)),
    ];

    for (names, expected) in cases {
        let result = engine.listen(EventKind::Chord, None, cb.clone(), names, false, "default");
        assert_eq!(result, Err(ListenError::Chord(expected.clone())), "names {:?}", names);
    }
}

#[test]
fn test_chord_prefix_collision_rejected() {
    let mut engine = engine();
    let cb: Callback = Rc::new(|_| {});

    engine
        .listen(EventKind::Chord, None, cb.clone(), &["ctrl", "a"], false, "default")
        .unwrap();
    // the existing chord is a prefix of the new one
    assert_eq!(
        engine.listen(EventKind::Chord, None, cb, &["ctrl", "a", "b"], false, "default"),
        Err(ListenError::Chord(ChordError::Collision))
    );
}

#[test]
fn test_chord_suffix_collision_rejected() {
    let mut engine = engine();
    let cb: Callback = Rc::new(|_| {});

    engine
        .listen(EventKind::Chord, None, cb.clone(), &["ctrl", "a", "b"], false, "default")
        .unwrap();
    // the new chord is a prefix of the existing one
    assert_eq!(
        engine.listen(EventKind::Chord, None, cb, &["ctrl", "a"], false, "default"),
        Err(ListenError::Chord(ChordError::Collision))
    );
}

#[test]
fn test_same_chord_registers_multiple_listeners() {
    let mut engine = engine();
    let log = log();
    engine
        .listen(EventKind::Chord, None, tag(&log, "first"), &["ctrl", "a"], false, "default")
        .unwrap();
    engine
        .listen(EventKind::Chord, None, tag(&log, "second"), &["ctrl", "a"], false, "default")
        .unwrap();

    down(&mut engine, CTRL, true, false);
    down(&mut engine, A, true, false);
    assert_eq!(*log.borrow(), vec!["first", "second"]);
}

#[test]
fn test_stop_listening_chord() {
    let mut engine = engine();
    let log = log();
    let cb = tag(&log, "chord");
    let owner = Some(OwnerToken::from_raw(7));
    engine
        .listen(EventKind::Chord, owner, cb.clone(), &["ctrl", "a"], false, "default")
        .unwrap();
    engine
        .stop_listening(EventKind::Chord, owner, &cb, &["ctrl", "a"], "default")
        .unwrap();

    down(&mut engine, CTRL, true, false);
    down(&mut engine, A, true, false);
    assert!(log.borrow().is_empty());

    // the same chord can be registered again
    engine
        .listen(EventKind::Chord, None, cb, &["ctrl", "a"], false, "default")
        .unwrap();
    up(&mut engine, A, true, false);
    down(&mut engine, A, true, false);
    assert_eq!(*log.borrow(), vec!["chord"]);
}

#[test]
fn test_contexts_are_isolated() {
    let mut engine = engine();
    let log = log();
    engine
        .listen(EventKind::Press, None, tag(&log, "default a"), &["a"], false, "default")
        .unwrap();
    engine
        .listen(EventKind::Press, None, tag(&log, "overlay a"), &["a"], false, "overlay")
        .unwrap();

    down(&mut engine, A, false, false);
    up(&mut engine, A, false, false);

    engine.set_context("overlay");
    down(&mut engine, A, false, false);
    up(&mut engine, A, false, false);

    engine.set_default_context();
    down(&mut engine, A, false, false);

    assert_eq!(*log.borrow(), vec!["default a", "overlay a", "default a"]);
}

#[test]
fn test_context_switch_resets_into_old_context() {
    let mut engine = engine();
    let log = log();
    engine.add_context("overlay").unwrap();
    engine
        .listen(EventKind::Up, None, tag(&log, "default up"), &["a"], false, "default")
        .unwrap();
    engine
        .listen(EventKind::Up, None, tag(&log, "overlay up"), &["a"], false, "overlay")
        .unwrap();

    // a is held down across the switch; its synthesized up belongs to the
    // context it was pressed in
    down(&mut engine, A, false, false);
    engine.set_context("overlay");

    assert_eq!(*log.borrow(), vec!["default up"]);
    assert_eq!(engine.current_context_name(), "overlay");
}

#[test]
fn test_switch_to_unknown_context_is_noop() {
    let mut engine = engine();
    engine.set_context("missing");
    assert_eq!(engine.current_context_name(), "default");
}

#[test]
fn test_blur_releases_held_keys() {
    let mut engine = engine();
    let log = log();
    engine
        .listen(EventKind::Up, None, tag(&log, "a up"), &["a"], false, "default")
        .unwrap();
    engine
        .listen(EventKind::Up, None, tag(&log, "b up"), &["b"], false, "default")
        .unwrap();

    down(&mut engine, A, false, false);
    down(&mut engine, B, false, false);
    engine.blur();

    assert_eq!(*log.borrow(), vec!["a up", "b up"]);
    // context survives blur
    assert_eq!(engine.current_context_name(), "default");
}

#[test]
fn test_stuck_key_recovery_unblocks_chords() {
    let mut engine = engine();
    let log = log();
    engine
        .listen(EventKind::Chord, None, tag(&log, "ctrl+b"), &["ctrl", "b"], false, "default")
        .unwrap();
    engine
        .listen(EventKind::Up, None, tag(&log, "a up"), &["a"], false, "default")
        .unwrap();

    // the OS swallowed a's key-up while ctrl was held, leaving it stuck
    down(&mut engine, CTRL, true, false);
    down(&mut engine, A, true, false);

    engine.tick(150.0);
    assert!(log.borrow().is_empty());
    engine.tick(100.0);
    assert_eq!(*log.borrow(), vec!["a up"]);

    // with a cleared from the sequence, ctrl+b matches again
    down(&mut engine, B, true, false);
    assert_eq!(*log.borrow(), vec!["a up", "ctrl+b"]);
}

#[test]
fn test_hold_timers_idle_without_root_modifier() {
    let mut engine = engine();
    let log = log();
    engine
        .listen(EventKind::Up, None, tag(&log, "a up"), &["a"], false, "default")
        .unwrap();

    down(&mut engine, A, false, false);
    engine.tick(10_000.0);

    // no root-shortcut/meta held, so the key is never considered stuck
    assert!(log.borrow().is_empty());
}

#[test]
fn test_disable_suppresses_all_processing() {
    let mut engine = engine();
    let log = log();
    engine
        .listen(EventKind::Chord, None, tag(&log, "chord"), &["ctrl", "a"], false, "default")
        .unwrap();

    engine.disable();
    down(&mut engine, CTRL, true, false);
    down(&mut engine, A, true, false);
    engine.tick(1000.0);
    engine.blur();
    assert!(log.borrow().is_empty());

    engine.enable();
    down(&mut engine, CTRL, true, false);
    down(&mut engine, A, true, false);
    assert_eq!(*log.borrow(), vec!["chord"]);
}

#[test]
fn test_repeat_does_not_refire_chord() {
    let mut engine = engine();
    let log = log();
    engine
        .listen(EventKind::Chord, None, tag(&log, "chord"), &["ctrl", "a"], false, "default")
        .unwrap();

    down(&mut engine, CTRL, true, false);
    engine.key_down(
        KeyEvent::new(CTRL)
            .with_modifiers(false, true, false, false)
            .repeating(),
    );
    down(&mut engine, A, true, false);
    assert_eq!(*log.borrow(), vec!["chord"]);
}

#[test]
fn test_meta_variants_collapse_to_one_identity() {
    let mut engine = Engine::with_platform(Platform::MacFamily);
    let log = log();
    engine
        .listen(EventKind::Chord, None, tag(&log, "chord"), &["command", "a"], false, "default")
        .unwrap();

    // right-hand meta reports code 93 on mac but matches the same chord
    engine.key_down(KeyEvent::new(93).with_modifiers(false, false, true, false));
    engine.key_down(KeyEvent::new(A).with_modifiers(false, false, true, false));
    assert_eq!(*log.borrow(), vec!["chord"]);
}

#[test]
fn test_ctrl_equal_sign_scenario() {
    let mut engine = engine();
    let log = log();
    engine
        .listen(
            EventKind::Chord,
            None,
            tag(&log, "zoom in"),
            &["ctrl", "equal sign"],
            false,
            "default",
        )
        .unwrap();

    down(&mut engine, CTRL, true, false);
    down(&mut engine, EQUAL_SIGN, true, false);
    assert_eq!(*log.borrow(), vec!["zoom in"]);

    // ctrl is still held; release and re-press the normal key to chain
    up(&mut engine, EQUAL_SIGN, true, false);
    down(&mut engine, EQUAL_SIGN, true, false);
    assert_eq!(*log.borrow(), vec!["zoom in", "zoom in"]);
}

#[test]
fn test_three_normal_keys_no_modifier() {
    let mut engine = engine();
    let log = log();
    engine
        .listen(EventKind::Chord, None, tag(&log, "abc"), &["a", "b", "c"], false, "default")
        .unwrap();

    // no shortcut key involved at all; any arrival order works
    down(&mut engine, C, false, false);
    down(&mut engine, A, false, false);
    down(&mut engine, B, false, false);
    assert_eq!(*log.borrow(), vec!["abc"]);
}
