// Keychord Key State
// Down-set, press sequence, hold timers, and stuck-key recovery

use smallvec::SmallVec;
use std::collections::HashMap;

use crate::event::KeyEvent;
use crate::key::Key;

/// Default hold duration after which a down key is forcibly released while
/// a root-shortcut or meta modifier is held. OS-level chords can swallow
/// the matching key-up, leaving the key stuck down and blocking chords.
pub const STUCK_KEY_TIMEOUT_MS: f64 = 200.0;

/// Transient key state: the currently-down normal keys, the in-progress
/// press sequence, per-key hold timers, and the last raw event with its
/// modifier flags.
///
/// The press sequence keeps shortcut-class keys ahead of normal-class
/// keys, preserving arrival order within each class. The chord trie only
/// stores class-preserving orderings, so this is what makes one
/// sequence-order walk cover every physical press order.
#[derive(Debug)]
pub struct KeyState {
    downs: SmallVec<[Key; 8]>,
    sequence: SmallVec<[Key; 8]>,
    /// Number of shortcut-class keys at the front of `sequence`
    shortcut_prefix_len: usize,
    hold_ms: HashMap<Key, f64>,
    last_event: Option<KeyEvent>,
    stuck_timeout_ms: f64,
}

impl KeyState {
    pub fn new() -> Self {
        Self::with_timeout(STUCK_KEY_TIMEOUT_MS)
    }

    /// Create with a custom stuck-key timeout in milliseconds
    pub fn with_timeout(stuck_timeout_ms: f64) -> Self {
        Self {
            downs: SmallVec::new(),
            sequence: SmallVec::new(),
            shortcut_prefix_len: 0,
            hold_ms: HashMap::new(),
            last_event: None,
            stuck_timeout_ms,
        }
    }

    /// Record the raw event so modifier flags and synthesized dispatches
    /// can refer to the latest observed state
    pub fn observe(&mut self, event: KeyEvent) {
        self.last_event = Some(event);
    }

    pub fn last_event(&self) -> Option<&KeyEvent> {
        self.last_event.as_ref()
    }

    /// Mark a key down. Shortcut-class keys never enter the down-set, and
    /// an already-down key is ignored.
    pub fn record_down(&mut self, key: Key, is_shortcut: bool) {
        if is_shortcut || self.downs.contains(&key) {
            return;
        }
        self.downs.push(key);
        self.hold_ms.insert(key, 0.0);
    }

    /// Append a key to the in-progress press sequence. Shortcut-class keys
    /// slot in after the last shortcut key; normal keys go to the end.
    pub fn push_sequence(&mut self, key: Key, is_shortcut: bool) {
        if self.sequence.contains(&key) {
            return;
        }
        if is_shortcut {
            self.sequence.insert(self.shortcut_prefix_len, key);
            self.shortcut_prefix_len += 1;
        } else {
            self.sequence.push(key);
        }
    }

    /// Remove a key from the down-set and sequence. Idempotent: removing a
    /// key that was never tracked is a no-op.
    pub fn record_up(&mut self, key: Key) {
        if let Some(pos) = self.downs.iter().position(|&k| k == key) {
            self.downs.remove(pos);
        }
        self.hold_ms.remove(&key);
        self.remove_from_sequence(key);
    }

    fn remove_from_sequence(&mut self, key: Key) {
        if let Some(pos) = self.sequence.iter().position(|&k| k == key) {
            self.sequence.remove(pos);
            if pos < self.shortcut_prefix_len {
                self.shortcut_prefix_len -= 1;
            }
        }
    }

    /// Clear the keys a completed chord consumed: every non-shortcut key
    /// in the sequence leaves the down-set and the sequence. Shortcut keys
    /// stay put - the user is still holding them and may chain further
    /// chords. Returns the consumed keys for synthesized up dispatch.
    pub fn consume_chord(&mut self, is_shortcut: impl Fn(Key) -> bool) -> SmallVec<[Key; 8]> {
        let consumed: SmallVec<[Key; 8]> = self
            .sequence
            .iter()
            .copied()
            .filter(|&k| !is_shortcut(k))
            .collect();
        for &key in &consumed {
            if let Some(pos) = self.downs.iter().position(|&k| k == key) {
                self.downs.remove(pos);
            }
            self.hold_ms.remove(&key);
        }
        self.sequence.truncate(self.shortcut_prefix_len);
        consumed
    }

    /// Advance hold timers by one frame's delta.
    ///
    /// Timers only run while a root-shortcut or meta modifier is held
    /// (`advance`); the engine derives that from the last raw event. Keys
    /// held past the stuck-key timeout are released and returned so their
    /// up-listeners can fire.
    pub fn tick(&mut self, delta_ms: f64, advance: bool) -> SmallVec<[Key; 4]> {
        let mut released: SmallVec<[Key; 4]> = SmallVec::new();
        if !advance {
            return released;
        }
        for &key in &self.downs {
            let hold = self.hold_ms.entry(key).or_insert(0.0);
            *hold += delta_ms;
            if *hold > self.stuck_timeout_ms {
                released.push(key);
            }
        }
        for &key in &released {
            self.record_up(key);
        }
        released
    }

    /// Forcibly release everything: returns every down or in-sequence key
    /// (sequence order first) for synthesized up dispatch, then clears all
    /// sets, timers, and the last observed event.
    pub fn reset(&mut self) -> SmallVec<[Key; 8]> {
        let mut drained: SmallVec<[Key; 8]> = self.sequence.clone();
        for &key in &self.downs {
            if !drained.contains(&key) {
                drained.push(key);
            }
        }
        self.downs.clear();
        self.sequence.clear();
        self.shortcut_prefix_len = 0;
        self.hold_ms.clear();
        self.last_event = None;
        drained
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.downs.contains(&key)
    }

    pub fn downs(&self) -> &[Key] {
        &self.downs
    }

    pub fn sequence(&self) -> &[Key] {
        &self.sequence
    }

    pub fn is_alt_down(&self) -> bool {
        self.last_event.map(|e| e.alt).unwrap_or(false)
    }

    pub fn is_ctrl_down(&self) -> bool {
        self.last_event.map(|e| e.ctrl).unwrap_or(false)
    }

    pub fn is_meta_down(&self) -> bool {
        self.last_event.map(|e| e.meta).unwrap_or(false)
    }

    pub fn is_shift_down(&self) -> bool {
        self.last_event.map(|e| e.shift).unwrap_or(false)
    }
}

impl Default for KeyState {
    fn default() -> Self {
        Self::new()
    }
}
