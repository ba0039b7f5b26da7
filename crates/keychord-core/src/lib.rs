// Keychord Core Library
// Keyboard event listener engine: contexts, chords, and key state

pub mod chord;
pub mod context;
pub mod engine;
pub mod event;
pub mod key;
pub mod listener;
pub mod settings;
pub mod state;
pub mod trie;

pub use chord::{Chord, ChordError, MAX_CHORD_KEYS, MAX_KEYS_PER_CLASS, MIN_CHORD_KEYS};
pub use context::{Context, ContextRegistry, DEFAULT_CONTEXT};
pub use engine::Engine;
pub use event::KeyEvent;
pub use key::{is_shortcut_key_code, Key, KeyCatalog, Platform, META_KEY_CODE};
pub use listener::{Callback, EventKind, ListenError, ListenerEntry, OwnerToken};
pub use settings::{default_settings_content, Settings, SettingsError};
pub use state::{KeyState, STUCK_KEY_TIMEOUT_MS};
pub use trie::{ChordTrie, SharedListenerList};
