// Keychord Listener Types
// Listener records, event kinds, and registration errors

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::chord::ChordError;
use crate::event::KeyEvent;

/// Callback invoked with the raw event that triggered it.
pub type Callback = Rc<dyn Fn(&KeyEvent)>;

/// The four kinds of keyboard event a listener can be registered for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    Up,
    Down,
    Press,
    Chord,
}

/// Opaque owner identity for listener removal.
///
/// Mint fresh tokens with [`OwnerToken::next`], or wrap a host-side id with
/// [`OwnerToken::from_raw`]. Two entries registered with the same token and
/// the same callback are removed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerToken(u64);

static NEXT_OWNER_TOKEN: AtomicU64 = AtomicU64::new(1);

impl OwnerToken {
    /// Mint a fresh, process-unique token
    pub fn next() -> Self {
        OwnerToken(NEXT_OWNER_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a host-supplied id
    pub fn from_raw(id: u64) -> Self {
        OwnerToken(id)
    }
}

/// A registered listener: owner, callback, and the text-input policy flag.
///
/// When `ignore_text_input` is false the entry is skipped while a
/// text-input element has focus.
#[derive(Clone)]
pub struct ListenerEntry {
    pub owner: Option<OwnerToken>,
    pub callback: Callback,
    pub ignore_text_input: bool,
}

impl ListenerEntry {
    pub fn new(owner: Option<OwnerToken>, callback: Callback, ignore_text_input: bool) -> Self {
        Self {
            owner,
            callback,
            ignore_text_input,
        }
    }

    /// Structural (owner, callback) identity used for removal
    pub fn matches(&self, owner: Option<OwnerToken>, callback: &Callback) -> bool {
        self.owner == owner && Rc::ptr_eq(&self.callback, callback)
    }
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("owner", &self.owner)
            .field("ignore_text_input", &self.ignore_text_input)
            .finish_non_exhaustive()
    }
}

/// Errors surfaced by the registration API.
///
/// Rejected registrations install nothing; the caller is free to ignore the
/// status, in which case the behavior is the original fire-and-forget
/// no-op.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListenError {
    #[error("unknown key name: '{0}'")]
    UnknownKeyName(String),

    #[error("invalid context name: '{0}'")]
    InvalidContextName(String),

    #[error("listen call named no keys")]
    NoKeys,

    #[error(transparent)]
    Chord(#[from] ChordError),
}
