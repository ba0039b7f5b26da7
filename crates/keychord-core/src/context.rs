// Keychord Context Registry
// Named, mutually exclusive listener namespaces

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::key::Key;
use crate::listener::{Callback, EventKind, ListenError, ListenerEntry, OwnerToken};
use crate::trie::ChordTrie;

/// Name of the context created at startup; it is never removable.
pub const DEFAULT_CONTEXT: &str = "default";

/// One listener namespace: three keyed stores (up/down/press) plus the
/// chord trie.
#[derive(Debug)]
pub struct Context {
    name: String,
    up: HashMap<Key, Vec<ListenerEntry>>,
    down: HashMap<Key, Vec<ListenerEntry>>,
    press: HashMap<Key, Vec<ListenerEntry>>,
    chords: ChordTrie,
}

impl Context {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            up: HashMap::new(),
            down: HashMap::new(),
            press: HashMap::new(),
            chords: ChordTrie::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn keyed_store(&self, kind: EventKind) -> Option<&HashMap<Key, Vec<ListenerEntry>>> {
        match kind {
            EventKind::Up => Some(&self.up),
            EventKind::Down => Some(&self.down),
            EventKind::Press => Some(&self.press),
            EventKind::Chord => None,
        }
    }

    fn keyed_store_mut(&mut self, kind: EventKind) -> Option<&mut HashMap<Key, Vec<ListenerEntry>>> {
        match kind {
            EventKind::Up => Some(&mut self.up),
            EventKind::Down => Some(&mut self.down),
            EventKind::Press => Some(&mut self.press),
            EventKind::Chord => None,
        }
    }

    /// Listeners registered for a key under an up/down/press kind
    pub fn listeners_for(&self, kind: EventKind, key: Key) -> Option<&Vec<ListenerEntry>> {
        self.keyed_store(kind).and_then(|store| store.get(&key))
    }

    /// Append a listener to a keyed store. Chord registration goes through
    /// the trie instead.
    pub fn add_listener(&mut self, kind: EventKind, key: Key, entry: ListenerEntry) {
        if let Some(store) = self.keyed_store_mut(kind) {
            store.entry(key).or_default().push(entry);
        }
    }

    /// Remove entries matching the (owner, callback) identity pair
    pub fn remove_listener(
        &mut self,
        kind: EventKind,
        key: Key,
        owner: Option<OwnerToken>,
        callback: &Callback,
    ) {
        if let Some(store) = self.keyed_store_mut(kind) {
            if let Some(entries) = store.get_mut(&key) {
                entries.retain(|e| !e.matches(owner, callback));
            }
        }
    }

    pub fn chords(&self) -> &ChordTrie {
        &self.chords
    }

    pub fn chords_mut(&mut self) -> &mut ChordTrie {
        &mut self.chords
    }
}

/// Owns the named contexts and tracks the single active one.
///
/// Contexts are created on first reference and persist until process end;
/// there is no deletion API.
#[derive(Debug)]
pub struct ContextRegistry {
    contexts: IndexMap<String, Context>,
    active: String,
}

impl ContextRegistry {
    pub fn new() -> Self {
        let mut contexts = IndexMap::new();
        contexts.insert(DEFAULT_CONTEXT.to_string(), Context::new(DEFAULT_CONTEXT));
        Self {
            contexts,
            active: DEFAULT_CONTEXT.to_string(),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.contexts.contains_key(name)
    }

    /// Resolve a context by name, creating it on first reference. This is
    /// the documented convenience behind listen-calls naming a new
    /// context; an empty name is rejected.
    pub fn ensure(&mut self, name: &str) -> Result<&mut Context, ListenError> {
        if name.is_empty() {
            return Err(ListenError::InvalidContextName(name.to_string()));
        }
        if !self.contexts.contains_key(name) {
            log::debug!("creating context '{}'", name);
            self.contexts
                .insert(name.to_string(), Context::new(name));
        }
        Ok(self
            .contexts
            .get_mut(name)
            .expect("context inserted above"))
    }

    /// Explicitly create a context. No-op if it already exists.
    pub fn add(&mut self, name: &str) -> Result<(), ListenError> {
        self.ensure(name).map(|_| ())
    }

    /// Switch the active context. Unknown names are a logged no-op;
    /// returns whether the active context changed.
    pub fn set_active(&mut self, name: &str) -> bool {
        if !self.contexts.contains_key(name) {
            log::warn!("ignoring switch to unknown context '{}'", name);
            return false;
        }
        if self.active == name {
            return false;
        }
        self.active = name.to_string();
        true
    }

    pub fn active_name(&self) -> &str {
        &self.active
    }

    pub fn active(&self) -> &Context {
        // the default context always exists and `active` only ever holds
        // registered names
        self.contexts
            .get(&self.active)
            .expect("active context is always registered")
    }

    pub fn active_mut(&mut self) -> &mut Context {
        self.contexts
            .get_mut(&self.active)
            .expect("active context is always registered")
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Context> {
        self.contexts.get_mut(name)
    }
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    const A: Key = Key(65);

    fn callback() -> Callback {
        Rc::new(|_| {})
    }

    #[test]
    fn test_default_context_exists() {
        let registry = ContextRegistry::new();
        assert!(registry.has(DEFAULT_CONTEXT));
        assert_eq!(registry.active_name(), DEFAULT_CONTEXT);
    }

    #[test]
    fn test_ensure_creates_once() {
        let mut registry = ContextRegistry::new();
        registry.ensure("overlay").unwrap();
        assert!(registry.has("overlay"));
        // second ensure resolves the same context
        registry.ensure("overlay").unwrap();
        assert_eq!(registry.active_name(), DEFAULT_CONTEXT);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut registry = ContextRegistry::new();
        assert_eq!(
            registry.ensure("").unwrap_err(),
            ListenError::InvalidContextName(String::new())
        );
    }

    #[test]
    fn test_set_active() {
        let mut registry = ContextRegistry::new();
        registry.add("overlay").unwrap();

        assert!(registry.set_active("overlay"));
        assert_eq!(registry.active_name(), "overlay");

        // unknown name is a no-op
        assert!(!registry.set_active("missing"));
        assert_eq!(registry.active_name(), "overlay");

        // switching to the current context changes nothing
        assert!(!registry.set_active("overlay"));
    }

    #[test]
    fn test_keyed_listener_stores() {
        let mut registry = ContextRegistry::new();
        let cb = callback();
        let ctx = registry.active_mut();
        ctx.add_listener(EventKind::Press, A, ListenerEntry::new(None, cb.clone(), false));

        assert_eq!(ctx.listeners_for(EventKind::Press, A).unwrap().len(), 1);
        assert!(ctx.listeners_for(EventKind::Up, A).is_none());

        ctx.remove_listener(EventKind::Press, A, None, &cb);
        assert!(ctx.listeners_for(EventKind::Press, A).unwrap().is_empty());
    }

    #[test]
    fn test_chord_kind_has_no_keyed_store() {
        let mut registry = ContextRegistry::new();
        let ctx = registry.active_mut();
        ctx.add_listener(EventKind::Chord, A, ListenerEntry::new(None, callback(), false));
        assert!(ctx.listeners_for(EventKind::Chord, A).is_none());
    }

    #[test]
    fn test_contexts_are_isolated() {
        let mut registry = ContextRegistry::new();
        let cb = callback();
        registry
            .ensure("overlay")
            .unwrap()
            .add_listener(EventKind::Down, A, ListenerEntry::new(None, cb, false));

        assert!(registry.active().listeners_for(EventKind::Down, A).is_none());
        registry.set_active("overlay");
        assert_eq!(
            registry.active().listeners_for(EventKind::Down, A).unwrap().len(),
            1
        );
    }
}
