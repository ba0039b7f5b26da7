// Keychord Chord Type
// Multi-key chord declarations: shape validation and permutation expansion

use smallvec::SmallVec;

use crate::key::Key;

/// Minimum number of keys in a chord
pub const MIN_CHORD_KEYS: usize = 2;
/// Maximum number of keys in a chord
pub const MAX_CHORD_KEYS: usize = 6;
/// Maximum keys of either class (shortcut or normal) in a chord
pub const MAX_KEYS_PER_CLASS: usize = 3;

/// Errors for chord declaration and registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordError {
    #[error("chord needs at least {MIN_CHORD_KEYS} keys, got {0}")]
    TooFewKeys(usize),

    #[error("chord takes at most {MAX_CHORD_KEYS} keys, got {0}")]
    TooManyKeys(usize),

    #[error("duplicate key in chord: {0}")]
    DuplicateKey(Key),

    #[error("shortcut key {0} declared after a normal key")]
    ShortcutAfterNormal(Key),

    #[error("chord takes at most {MAX_KEYS_PER_CLASS} shortcut keys, got {0}")]
    TooManyShortcutKeys(usize),

    #[error("chord takes at most {MAX_KEYS_PER_CLASS} normal keys, got {0}")]
    TooManyNormalKeys(usize),

    #[error("chord needs at least one normal key")]
    NoNormalKey,

    #[error("chord collides with a previously registered chord")]
    Collision,
}

/// A validated multi-key chord.
///
/// Declared as an ordered list but matched as a set: the declaration must
/// put shortcut-class keys before normal-class keys, yet physical press
/// order never matters for matching. Holds 2-6 unique keys, at most 3 of
/// either class, at least one of them normal-class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    shortcut_keys: SmallVec<[Key; MAX_KEYS_PER_CLASS]>,
    normal_keys: SmallVec<[Key; MAX_KEYS_PER_CLASS]>,
}

impl Chord {
    /// Validate a declared key list into a chord.
    ///
    /// `is_shortcut` classifies identities; it comes from the key catalog.
    pub fn new(keys: &[Key], is_shortcut: impl Fn(Key) -> bool) -> Result<Self, ChordError> {
        if keys.len() < MIN_CHORD_KEYS {
            return Err(ChordError::TooFewKeys(keys.len()));
        }
        if keys.len() > MAX_CHORD_KEYS {
            return Err(ChordError::TooManyKeys(keys.len()));
        }

        let mut shortcut_keys: SmallVec<[Key; MAX_KEYS_PER_CLASS]> = SmallVec::new();
        let mut normal_keys: SmallVec<[Key; MAX_KEYS_PER_CLASS]> = SmallVec::new();

        for &key in keys {
            if shortcut_keys.contains(&key) || normal_keys.contains(&key) {
                return Err(ChordError::DuplicateKey(key));
            }
            if is_shortcut(key) {
                if !normal_keys.is_empty() {
                    return Err(ChordError::ShortcutAfterNormal(key));
                }
                shortcut_keys.push(key);
            } else {
                normal_keys.push(key);
            }
        }

        if shortcut_keys.len() > MAX_KEYS_PER_CLASS {
            return Err(ChordError::TooManyShortcutKeys(shortcut_keys.len()));
        }
        if normal_keys.len() > MAX_KEYS_PER_CLASS {
            return Err(ChordError::TooManyNormalKeys(normal_keys.len()));
        }
        if normal_keys.is_empty() {
            return Err(ChordError::NoNormalKey);
        }

        Ok(Self {
            shortcut_keys,
            normal_keys,
        })
    }

    /// Total number of keys
    pub fn len(&self) -> usize {
        self.shortcut_keys.len() + self.normal_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        false // a valid chord always has keys
    }

    /// The shortcut-class prefix, in declared order
    pub fn shortcut_keys(&self) -> &[Key] {
        &self.shortcut_keys
    }

    /// The normal-class suffix, in declared order
    pub fn normal_keys(&self) -> &[Key] {
        &self.normal_keys
    }

    /// Every class-preserving ordering of this chord.
    ///
    /// Shortcut keys permute among themselves and normal keys among
    /// themselves (shortcut permutations x normal permutations), so the
    /// trie can match any physical press order with one arrival-order
    /// walk. Bounded: at most 6 orderings per class, 36 total.
    pub fn permutations(&self) -> Vec<SmallVec<[Key; MAX_CHORD_KEYS]>> {
        let mut paths = Vec::new();
        for prefix in permutations_of(&self.shortcut_keys) {
            for suffix in permutations_of(&self.normal_keys) {
                let mut path: SmallVec<[Key; MAX_CHORD_KEYS]> = SmallVec::new();
                path.extend(prefix.iter().copied());
                path.extend(suffix.iter().copied());
                paths.push(path);
            }
        }
        paths
    }
}

impl std::fmt::Display for Chord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .shortcut_keys
            .iter()
            .chain(self.normal_keys.iter())
            .map(|k| k.to_string())
            .collect();
        write!(f, "{}", parts.join("+"))
    }
}

/// All orderings of a short key list (len <= 3, so at most 6)
fn permutations_of(keys: &[Key]) -> Vec<SmallVec<[Key; MAX_KEYS_PER_CLASS]>> {
    if keys.len() <= 1 {
        return vec![keys.iter().copied().collect()];
    }
    let mut out = Vec::new();
    for (i, &head) in keys.iter().enumerate() {
        let rest: SmallVec<[Key; MAX_KEYS_PER_CLASS]> = keys
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &k)| k)
            .collect();
        for mut tail in permutations_of(&rest) {
            tail.insert(0, head);
            out.push(tail);
        }
    }
    out
}
