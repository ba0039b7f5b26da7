// Keychord Input Layer
// Raw key-transition events pushed by the host event source

/// A raw key transition as delivered by the host.
///
/// Carries the platform key code (pre-normalization), the auto-repeat flag,
/// and the modifier flags the host reports as currently held. Listeners
/// receive a reference to the event that triggered them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// Raw platform key code
    pub code: u16,
    /// Set when this down event is an auto-repeat
    pub repeat: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyEvent {
    /// Create an event for a bare key with no modifiers held
    pub fn new(code: u16) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    /// Mark this event as an auto-repeat
    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Set the held-modifier flags
    pub fn with_modifiers(mut self, alt: bool, ctrl: bool, meta: bool, shift: bool) -> Self {
        self.alt = alt;
        self.ctrl = ctrl;
        self.meta = meta;
        self.shift = shift;
        self
    }
}
