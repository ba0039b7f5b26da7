// Keychord Chord Trie
// Permutation-expanded trie mapping key sequences to shared listener lists

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::chord::{Chord, ChordError};
use crate::key::Key;
use crate::listener::{Callback, ListenerEntry, OwnerToken};

/// Listener list shared by every permutation path of one chord, so a
/// single push or removal affects all of them.
pub type SharedListenerList = Rc<RefCell<Vec<ListenerEntry>>>;

/// A trie node is exactly one of: an internal key map, or a terminal
/// listener list. Never both.
#[derive(Debug)]
enum Node {
    Internal(HashMap<Key, Node>),
    Terminal(SharedListenerList),
}

/// Per-context chord store.
///
/// Every class-preserving ordering of a chord is inserted as its own path,
/// all pointing at one shared listener list. Matching then needs a single
/// walk of the in-progress sequence in stored order - no sorting or
/// hashing per event.
#[derive(Debug, Default)]
pub struct ChordTrie {
    root: HashMap<Key, Node>,
}

impl ChordTrie {
    pub fn new() -> Self {
        Self {
            root: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Register a listener for a chord.
    ///
    /// Re-registering the same identity set appends to the existing shared
    /// list. A chord whose key set stands in a prefix or suffix relation
    /// to an already registered chord (under class-preserving orderings)
    /// is rejected with [`ChordError::Collision`] rather than silently
    /// shadowing it.
    pub fn insert(&mut self, chord: &Chord, entry: ListenerEntry) -> Result<(), ChordError> {
        let paths = chord.permutations();

        // Same identity set already registered: share its list.
        if let Some(list) = self.terminal_at(&paths[0]) {
            list.borrow_mut().push(entry);
            return Ok(());
        }

        for path in &paths {
            self.check_path(path)?;
        }

        let shared: SharedListenerList = Rc::new(RefCell::new(vec![entry]));
        for path in &paths {
            self.insert_path(path, shared.clone());
        }
        Ok(())
    }

    /// Remove entries matching the (owner, callback) identity pair from a
    /// chord's shared listener list. Unknown chords are a no-op. Paths are
    /// left in place; an emptied list simply matches zero listeners.
    pub fn remove(&mut self, chord: &Chord, owner: Option<OwnerToken>, callback: &Callback) {
        let paths = chord.permutations();
        if let Some(list) = self.terminal_at(&paths[0]) {
            list.borrow_mut().retain(|e| !e.matches(owner, callback));
        }
    }

    /// Match the in-progress key sequence, in stored order.
    ///
    /// Fails as soon as a step has no child; succeeds only when the walk
    /// ends exactly on a terminal.
    pub fn find(&self, sequence: &[Key]) -> Option<SharedListenerList> {
        self.terminal_at(sequence)
    }

    fn terminal_at(&self, path: &[Key]) -> Option<SharedListenerList> {
        if path.is_empty() {
            return None;
        }
        let mut map = &self.root;
        for (i, key) in path.iter().enumerate() {
            let last = i + 1 == path.len();
            match map.get(key)? {
                Node::Terminal(list) if last => return Some(list.clone()),
                Node::Terminal(_) => return None,
                Node::Internal(_) if last => return None,
                Node::Internal(children) => map = children,
            }
        }
        None
    }

    /// Reject a path that would shadow, or be shadowed by, an existing
    /// chord: a terminal reached before the final key (existing chord is a
    /// prefix of the new one), or anything already occupying the final key
    /// slot (new chord is a prefix of an existing one).
    fn check_path(&self, path: &[Key]) -> Result<(), ChordError> {
        let mut map = &self.root;
        for (i, key) in path.iter().enumerate() {
            let last = i + 1 == path.len();
            match map.get(key) {
                None => return Ok(()),
                Some(Node::Terminal(_)) => {
                    log::debug!("chord collision at {}", key);
                    return Err(ChordError::Collision);
                }
                Some(Node::Internal(children)) => {
                    if last {
                        log::debug!("chord collision at {}", key);
                        return Err(ChordError::Collision);
                    }
                    map = children;
                }
            }
        }
        Ok(())
    }

    fn insert_path(&mut self, path: &[Key], list: SharedListenerList) {
        let mut map = &mut self.root;
        for (i, key) in path.iter().enumerate() {
            if i + 1 == path.len() {
                map.insert(*key, Node::Terminal(list));
                return;
            }
            let node = map
                .entry(*key)
                .or_insert_with(|| Node::Internal(HashMap::new()));
            match node {
                Node::Internal(children) => map = children,
                // check_path ran first, so a terminal mid-path cannot occur
                Node::Terminal(_) => return,
            }
        }
    }
}
