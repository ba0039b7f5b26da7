// Keychord Engine
// Event reconciliation and the host-facing API surface

use smallvec::SmallVec;

use crate::chord::{Chord, MAX_CHORD_KEYS};
use crate::context::ContextRegistry;
use crate::event::KeyEvent;
use crate::key::{Key, KeyCatalog, Platform, META_KEY_CODE};
use crate::listener::{Callback, EventKind, ListenError, ListenerEntry, OwnerToken};
use crate::settings::Settings;
use crate::state::KeyState;

/// The keyboard listener engine.
///
/// One explicit object owns the catalog, the context registry, and the
/// transient key state; there are no ambient globals. The host pushes raw
/// key transitions, a window-blur signal, and a per-frame tick; the engine
/// updates state, matches chords, and invokes listeners synchronously in
/// registration order.
///
/// Everything runs on the caller's thread. Listeners receive only the raw
/// event, so they cannot re-enter the engine during dispatch.
pub struct Engine {
    catalog: KeyCatalog,
    contexts: ContextRegistry,
    state: KeyState,
    disabled: bool,
    key_press_logging: bool,
    text_input_focused: bool,
}

impl Engine {
    /// Create an engine for the detected platform with default settings
    pub fn new() -> Self {
        Self::with_platform(Platform::detect())
    }

    /// Create an engine for an explicit platform
    pub fn with_platform(platform: Platform) -> Self {
        Self {
            catalog: KeyCatalog::new(platform),
            contexts: ContextRegistry::new(),
            state: KeyState::new(),
            disabled: false,
            key_press_logging: false,
            text_input_focused: false,
        }
    }

    /// Create an engine from loaded settings
    pub fn with_settings(settings: &Settings) -> Self {
        let platform = settings.platform_override().unwrap_or_else(Platform::detect);
        let mut engine = Self::with_platform(platform);
        engine.state = KeyState::with_timeout(settings.stuck_key_timeout_ms() as f64);
        engine.key_press_logging = settings.key_press_logging();
        engine
    }

    /// The key catalog in use (name/code lookups for the host)
    pub fn catalog(&self) -> &KeyCatalog {
        &self.catalog
    }

    pub fn platform(&self) -> Platform {
        self.catalog.platform()
    }

    // ---- registration -------------------------------------------------

    /// Register a listener.
    ///
    /// For up/down/press kinds, every name in `names` gets its own
    /// registration of the same entry. For the chord kind, the 2-6 names
    /// declare one chord (shortcut keys first). A rejected call registers
    /// nothing; the returned status is the diagnostic channel and is safe
    /// to ignore.
    pub fn listen(
        &mut self,
        kind: EventKind,
        owner: Option<OwnerToken>,
        callback: Callback,
        names: &[&str],
        ignore_text_input: bool,
        context: &str,
    ) -> Result<(), ListenError> {
        let keys = self.resolve_keys(names)?;
        let entry = ListenerEntry::new(owner, callback, ignore_text_input);

        match kind {
            EventKind::Chord => {
                let chord = Chord::new(&keys, |k| self.catalog.is_shortcut_class(k))?;
                self.contexts.ensure(context)?.chords_mut().insert(&chord, entry)?;
            }
            _ => {
                let ctx = self.contexts.ensure(context)?;
                for &key in &keys {
                    ctx.add_listener(kind, key, entry.clone());
                }
            }
        }
        Ok(())
    }

    /// Remove listeners matching the (owner, callback) identity pair.
    ///
    /// Mirrors [`Engine::listen`]. Removing from a context that was never
    /// created is a no-op.
    pub fn stop_listening(
        &mut self,
        kind: EventKind,
        owner: Option<OwnerToken>,
        callback: &Callback,
        names: &[&str],
        context: &str,
    ) -> Result<(), ListenError> {
        if context.is_empty() {
            return Err(ListenError::InvalidContextName(context.to_string()));
        }
        let keys = self.resolve_keys(names)?;

        match kind {
            EventKind::Chord => {
                let chord = Chord::new(&keys, |k| self.catalog.is_shortcut_class(k))?;
                if let Some(ctx) = self.contexts.get_mut(context) {
                    ctx.chords_mut().remove(&chord, owner, callback);
                }
            }
            _ => {
                if let Some(ctx) = self.contexts.get_mut(context) {
                    for &key in &keys {
                        ctx.remove_listener(kind, key, owner, callback);
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve_keys(&self, names: &[&str]) -> Result<SmallVec<[Key; MAX_CHORD_KEYS]>, ListenError> {
        if names.is_empty() {
            return Err(ListenError::NoKeys);
        }
        let mut keys: SmallVec<[Key; MAX_CHORD_KEYS]> = SmallVec::new();
        for name in names {
            let key = self
                .catalog
                .key_from_name(name)
                .ok_or_else(|| ListenError::UnknownKeyName(name.to_string()))?;
            keys.push(key);
        }
        Ok(keys)
    }

    // ---- event input --------------------------------------------------

    /// Process a raw key-down transition.
    ///
    /// Within one event, dispatch order is fixed: down-listener fan-out,
    /// then press-listeners, then chord matching, then any synthesized
    /// forced-up from a completed chord.
    pub fn key_down(&mut self, ev: KeyEvent) {
        if self.disabled {
            return;
        }
        let Some(key) = self.catalog.identity_for(ev.code) else {
            log::debug!("ignoring unknown key code {}", ev.code);
            return;
        };

        self.state.observe(ev);
        let is_shortcut = self.catalog.is_shortcut_class(key);
        self.state.record_down(key, is_shortcut);

        // Down-listeners fire for every currently-down key, once per down
        // event, suppressed entirely while a root-shortcut/meta modifier
        // is held so modifier chords don't also fire directional listeners.
        if !self.is_meta_or_root_shortcut_key_down() {
            let downs: SmallVec<[Key; 8]> = self.state.downs().iter().copied().collect();
            for down_key in downs {
                self.dispatch(EventKind::Down, down_key, &ev);
            }
        }

        // Auto-repeat stops short of the press pipeline.
        if ev.repeat {
            return;
        }

        if self.key_press_logging {
            log::info!("key press: '{}' ({})", key.name(), key.code());
        }

        self.dispatch(EventKind::Press, key, &ev);
        self.state.push_sequence(key, is_shortcut);
        self.match_chords(&ev);
    }

    /// Process a raw key-up transition.
    ///
    /// Unconditional and idempotent: up-listeners fire even for a key that
    /// was never tracked down, matching hosts that deliver up without a
    /// preceding down (e.g. right after a context-switch reset).
    pub fn key_up(&mut self, ev: KeyEvent) {
        if self.disabled {
            return;
        }
        let Some(key) = self.catalog.identity_for(ev.code) else {
            return;
        };
        self.state.observe(ev);
        self.state.record_up(key);
        self.dispatch(EventKind::Up, key, &ev);
    }

    /// Window lost focus: force-release everything without switching
    /// context. Each released key fires its up-listeners.
    pub fn blur(&mut self) {
        if self.disabled {
            return;
        }
        self.release_all();
    }

    /// Per-frame tick with elapsed milliseconds since the previous tick.
    ///
    /// Drives stuck-key recovery: a key held past the timeout while a
    /// root-shortcut/meta modifier is down gets a synthesized release, so
    /// an OS-level chord that swallowed its key-up cannot block further
    /// chord matching.
    pub fn tick(&mut self, delta_ms: f64) {
        if self.disabled {
            return;
        }
        let advance = self.is_meta_or_root_shortcut_key_down();
        let released = self.state.tick(delta_ms, advance);
        if released.is_empty() {
            return;
        }
        let ev = self.state.last_event().copied().unwrap_or_default();
        for key in released {
            log::debug!("stuck key '{}' forcibly released", key.name());
            self.dispatch(EventKind::Up, key, &ev);
        }
    }

    // ---- context control ----------------------------------------------

    pub fn has_context(&self, name: &str) -> bool {
        self.contexts.has(name)
    }

    /// Explicitly create a context. No-op if it already exists.
    pub fn add_context(&mut self, name: &str) -> Result<(), ListenError> {
        self.contexts.add(name)
    }

    /// Switch the active context. Unknown names are a logged no-op. Any
    /// known-name call resets the key state first (even when the name is
    /// already active), so a key held across the switch produces a
    /// synthesized up in the old context rather than a spurious down in
    /// the new one.
    pub fn set_context(&mut self, name: &str) {
        if !self.contexts.has(name) {
            log::warn!("ignoring switch to unknown context '{}'", name);
            return;
        }
        self.release_all();
        self.contexts.set_active(name);
    }

    /// Switch back to the default context
    pub fn set_default_context(&mut self) {
        self.set_context(crate::context::DEFAULT_CONTEXT);
    }

    pub fn current_context_name(&self) -> &str {
        self.contexts.active_name()
    }

    // ---- global queries -----------------------------------------------

    pub fn is_alt_down(&self) -> bool {
        self.state.is_alt_down()
    }

    pub fn is_ctrl_down(&self) -> bool {
        self.state.is_ctrl_down()
    }

    pub fn is_meta_down(&self) -> bool {
        self.state.is_meta_down()
    }

    pub fn is_shift_down(&self) -> bool {
        self.state.is_shift_down()
    }

    pub fn is_any_shortcut_key_down(&self) -> bool {
        self.is_alt_down() || self.is_ctrl_down() || self.is_meta_down() || self.is_shift_down()
    }

    pub fn is_root_shortcut_key_down(&self) -> bool {
        match self.platform().root_shortcut_key().code() {
            META_KEY_CODE => self.is_meta_down(),
            _ => self.is_ctrl_down(),
        }
    }

    pub fn is_meta_or_root_shortcut_key_down(&self) -> bool {
        self.is_meta_down() || self.is_root_shortcut_key_down()
    }

    /// Host pushes text-input focus state; entries registered without
    /// `ignore_text_input` are skipped while this is set.
    pub fn set_text_input_focused(&mut self, focused: bool) {
        self.text_input_focused = focused;
    }

    pub fn is_text_input_focused(&self) -> bool {
        self.text_input_focused
    }

    /// Canonical name for a raw key code; empty when unknown
    pub fn key_name(&self, code: u16) -> &'static str {
        self.catalog.name_of(code).unwrap_or("")
    }

    /// Name of the platform's root shortcut key ("meta" or "ctrl")
    pub fn root_shortcut_key_name(&self) -> &'static str {
        self.platform().root_shortcut_key_name()
    }

    // ---- enable / disable ---------------------------------------------

    /// Disable event processing. Forces a full key-state reset (the
    /// synthesized ups still fire) and suppresses everything until
    /// re-enabled. Listener registrations survive.
    pub fn disable(&mut self) {
        if self.disabled {
            return;
        }
        self.release_all();
        self.disabled = true;
    }

    pub fn enable(&mut self) {
        self.disabled = false;
    }

    pub fn toggle_disable(&mut self) {
        if self.disabled {
            self.enable();
        } else {
            self.disable();
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    // ---- diagnostics ---------------------------------------------------

    pub fn is_key_press_logging(&self) -> bool {
        self.key_press_logging
    }

    pub fn enable_key_press_logging(&mut self) {
        self.key_press_logging = true;
    }

    pub fn disable_key_press_logging(&mut self) {
        self.key_press_logging = false;
    }

    pub fn toggle_key_press_logging(&mut self) {
        self.key_press_logging = !self.key_press_logging;
    }

    // ---- internals -----------------------------------------------------

    /// Reset the key state, firing up-listeners for every drained key in
    /// the currently active context.
    fn release_all(&mut self) {
        let ev = self.state.last_event().copied().unwrap_or_default();
        let drained = self.state.reset();
        for key in drained {
            self.dispatch(EventKind::Up, key, &ev);
        }
    }

    /// Try the in-progress sequence against the active context's trie. On
    /// a match, invoke the shared list, then force-release every consumed
    /// normal key (modifiers stay down for chaining).
    fn match_chords(&mut self, ev: &KeyEvent) {
        let Some(list) = self.contexts.active().chords().find(self.state.sequence()) else {
            return;
        };
        let entries: Vec<ListenerEntry> = list.borrow().clone();
        self.invoke_all(&entries, ev);

        let released = self.state.consume_chord(|k| self.catalog.is_shortcut_class(k));
        for key in released {
            self.dispatch(EventKind::Up, key, ev);
        }
    }

    fn dispatch(&self, kind: EventKind, key: Key, ev: &KeyEvent) {
        let Some(entries) = self.contexts.active().listeners_for(kind, key) else {
            return;
        };
        let entries = entries.clone();
        self.invoke_all(&entries, ev);
    }

    fn invoke_all(&self, entries: &[ListenerEntry], ev: &KeyEvent) {
        for entry in entries {
            if !entry.ignore_text_input && self.text_input_focused {
                continue;
            }
            (entry.callback)(ev);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
