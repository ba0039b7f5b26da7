// Keychord Key Type
// Key identities, the fixed name/code table, and platform classification

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Canonical code for the meta key after normalization.
pub const META_KEY_CODE: u16 = 91;

/// Represents a single keyboard key identity.
///
/// This is a newtype wrapper around the host key code for type safety.
/// Codes follow the host keyboard vocabulary bundled in this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Key(pub u16);

impl Key {
    /// Get the raw numeric code value
    pub fn code(self) -> u16 {
        self.0
    }

    /// Get the canonical name of this key, or "" when unknown
    pub fn name(self) -> &'static str {
        key_name(self.0).unwrap_or("")
    }
}

impl From<u16> for Key {
    fn from(code: u16) -> Self {
        Key(code)
    }
}

impl From<Key> for u16 {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        key_from_name(s).ok_or_else(|| format!("unknown key: {}", s))
    }
}

/// The fixed key table: canonical name to host key code.
///
/// Callers hardcode these names, so the table must be bundled verbatim.
const KEY_TABLE: &[(&str, u16)] = &[
    ("backspace", 8),
    ("tab", 9),
    ("enter", 13),
    ("shift", 16),
    ("ctrl", 17),
    ("alt", 18),
    ("pause", 19),
    ("caps lock", 20),
    ("escape", 27),
    ("space", 32),
    ("page up", 33),
    ("page down", 34),
    ("end", 35),
    ("home", 36),
    ("left arrow", 37),
    ("up arrow", 38),
    ("right arrow", 39),
    ("down arrow", 40),
    ("insert", 45),
    ("delete", 46),
    ("0", 48),
    ("1", 49),
    ("2", 50),
    ("3", 51),
    ("4", 52),
    ("5", 53),
    ("6", 54),
    ("7", 55),
    ("8", 56),
    ("9", 57),
    ("a", 65),
    ("b", 66),
    ("c", 67),
    ("d", 68),
    ("e", 69),
    ("f", 70),
    ("g", 71),
    ("h", 72),
    ("i", 73),
    ("j", 74),
    ("k", 75),
    ("l", 76),
    ("m", 77),
    ("n", 78),
    ("o", 79),
    ("p", 80),
    ("q", 81),
    ("r", 82),
    ("s", 83),
    ("t", 84),
    ("u", 85),
    ("v", 86),
    ("w", 87),
    ("x", 88),
    ("y", 89),
    ("z", 90),
    ("meta", 91),
    ("select key", 93),
    ("numpad 0", 96),
    ("numpad 1", 97),
    ("numpad 2", 98),
    ("numpad 3", 99),
    ("numpad 4", 100),
    ("numpad 5", 101),
    ("numpad 6", 102),
    ("numpad 7", 103),
    ("numpad 8", 104),
    ("numpad 9", 105),
    ("multiply", 106),
    ("add", 107),
    ("subtract", 109),
    ("decimal point", 110),
    ("divide", 111),
    ("f1", 112),
    ("f2", 113),
    ("f3", 114),
    ("f4", 115),
    ("f5", 116),
    ("f6", 117),
    ("f7", 118),
    ("f8", 119),
    ("f9", 120),
    ("f10", 121),
    ("f11", 122),
    ("f12", 123),
    ("num lock", 144),
    ("scroll lock", 145),
    ("semi-colon", 186),
    ("equal sign", 187),
    ("comma", 188),
    ("dash", 189),
    ("period", 190),
    ("forward slash", 191),
    ("grave accent", 192),
    ("open bracket", 219),
    ("back slash", 220),
    ("close bracket", 221),
    ("single quote", 222),
];

/// Alternate names accepted by name lookup.
const KEY_ALIASES: &[(&str, u16)] = &[
    ("command", 91),
    ("windows", 91),
    ("super", 91),
    ("cmd", 91),
    ("control", 17),
    ("option", 18),
    ("esc", 27),
    ("return", 13),
];

/// Display name for a key code
pub fn key_name(code: u16) -> Option<&'static str> {
    static NAMES: OnceLock<HashMap<u16, &'static str>> = OnceLock::new();
    NAMES
        .get_or_init(|| KEY_TABLE.iter().map(|&(name, code)| (code, name)).collect())
        .get(&code)
        .copied()
}

/// Try to parse a key name to a key
pub fn key_from_name(name: &str) -> Option<Key> {
    static CODES: OnceLock<HashMap<&'static str, u16>> = OnceLock::new();
    let map = CODES.get_or_init(|| {
        KEY_TABLE
            .iter()
            .chain(KEY_ALIASES.iter())
            .map(|&(name, code)| (name, code))
            .collect()
    });
    let lower = name.trim().to_lowercase();
    map.get(lower.as_str()).copied().map(Key::from)
}

/// Static array of shortcut-class (modifier) key codes
///
/// Shortcut keys never enter the down-set and may only appear as the
/// prefix of a chord declaration.
const SHORTCUT_KEY_CODES: &[u16] = &[
    16, // shift
    17, // ctrl
    18, // alt
    91, // meta
];

/// Check if a key code is shortcut-class (O(1), lock-free)
#[inline]
pub const fn is_shortcut_key_code(code: u16) -> bool {
    let mut i = 0;
    while i < SHORTCUT_KEY_CODES.len() {
        if SHORTCUT_KEY_CODES[i] == code {
            return true;
        }
        i += 1;
    }
    false
}

/// Host platform family, which decides the root shortcut key and which raw
/// codes collapse into the canonical meta identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacFamily,
    Pc,
}

impl Platform {
    /// Detect the platform from the build target
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacFamily
        } else {
            Platform::Pc
        }
    }

    /// Parse a platform name ("mac" or "pc")
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "mac" | "macos" => Some(Platform::MacFamily),
            "pc" | "windows" | "linux" => Some(Platform::Pc),
            _ => None,
        }
    }

    /// The modifier that acts as the root shortcut key on this platform
    pub fn root_shortcut_key(self) -> Key {
        match self {
            Platform::MacFamily => Key(META_KEY_CODE),
            Platform::Pc => Key(17),
        }
    }

    /// Canonical name of the root shortcut key
    pub fn root_shortcut_key_name(self) -> &'static str {
        match self {
            Platform::MacFamily => "meta",
            Platform::Pc => "ctrl",
        }
    }

    /// Raw codes that all mean "the meta key" on this platform
    fn meta_codes(self) -> &'static [u16] {
        match self {
            Platform::MacFamily => &[91, 93],
            Platform::Pc => &[91, 92],
        }
    }
}

/// Fixed bidirectional mapping between key identity and key name.
///
/// Pure lookup with no side effects; absence is the only failure mode.
/// Normalizes the platform's physically distinct meta keys to one
/// canonical identity before any lookup.
#[derive(Debug, Clone, Copy)]
pub struct KeyCatalog {
    platform: Platform,
}

impl KeyCatalog {
    /// Create a catalog for the given platform
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Get the platform this catalog was built for
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolve a raw key code to its canonical identity
    pub fn identity_for(&self, code: u16) -> Option<Key> {
        let code = if self.platform.meta_codes().contains(&code) {
            META_KEY_CODE
        } else {
            code
        };
        key_name(code).map(|_| Key(code))
    }

    /// Resolve a key name (or alias) to its canonical identity
    pub fn key_from_name(&self, name: &str) -> Option<Key> {
        key_from_name(name).and_then(|key| self.identity_for(key.code()))
    }

    /// Canonical name for a key code, if the code is in the table
    pub fn name_of(&self, code: u16) -> Option<&'static str> {
        key_name(code)
    }

    /// Check if an identity is shortcut-class (modifier)
    pub fn is_shortcut_class(&self, key: Key) -> bool {
        is_shortcut_key_code(key.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_name() {
        assert_eq!(key_from_name("a"), Some(Key(65)));
        assert_eq!(key_from_name("A"), Some(Key(65)));
        assert_eq!(key_from_name("ctrl"), Some(Key(17)));
        assert_eq!(key_from_name("up arrow"), Some(Key(38)));
        assert_eq!(key_from_name("equal sign"), Some(Key(187)));
        assert_eq!(key_from_name("1"), Some(Key(49)));
        assert_eq!(key_from_name("nonsense"), None);
    }

    #[test]
    fn test_key_aliases() {
        assert_eq!(key_from_name("command"), Some(Key(91)));
        assert_eq!(key_from_name("windows"), Some(Key(91)));
        assert_eq!(key_from_name("esc"), key_from_name("escape"));
        assert_eq!(key_from_name("return"), key_from_name("enter"));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(Key(65).to_string(), "a");
        assert_eq!(Key(13).to_string(), "enter");
        assert_eq!(Key(9999).to_string(), "");
    }

    #[test]
    fn test_key_from_str() {
        assert_eq!("space".parse::<Key>(), Ok(Key(32)));
        assert!("not a key".parse::<Key>().is_err());
    }

    #[test]
    fn test_is_shortcut_key_code() {
        assert!(is_shortcut_key_code(16)); // shift
        assert!(is_shortcut_key_code(17)); // ctrl
        assert!(is_shortcut_key_code(18)); // alt
        assert!(is_shortcut_key_code(91)); // meta
        assert!(!is_shortcut_key_code(65)); // a
        assert!(!is_shortcut_key_code(32)); // space
    }

    #[test]
    fn test_meta_canonicalization_pc() {
        let catalog = KeyCatalog::new(Platform::Pc);
        assert_eq!(catalog.identity_for(91), Some(Key(91)));
        assert_eq!(catalog.identity_for(92), Some(Key(91)));
        // 93 stays "select key" on pc
        assert_eq!(catalog.identity_for(93), Some(Key(93)));
    }

    #[test]
    fn test_meta_canonicalization_mac() {
        let catalog = KeyCatalog::new(Platform::MacFamily);
        assert_eq!(catalog.identity_for(91), Some(Key(91)));
        assert_eq!(catalog.identity_for(93), Some(Key(91)));
    }

    #[test]
    fn test_identity_for_unknown_code() {
        let catalog = KeyCatalog::new(Platform::Pc);
        assert_eq!(catalog.identity_for(7), None);
        assert_eq!(catalog.identity_for(999), None);
    }

    #[test]
    fn test_root_shortcut_key() {
        assert_eq!(Platform::MacFamily.root_shortcut_key(), Key(91));
        assert_eq!(Platform::Pc.root_shortcut_key(), Key(17));
        assert_eq!(Platform::MacFamily.root_shortcut_key_name(), "meta");
        assert_eq!(Platform::Pc.root_shortcut_key_name(), "ctrl");
    }

    #[test]
    fn test_platform_from_name() {
        assert_eq!(Platform::from_name("mac"), Some(Platform::MacFamily));
        assert_eq!(Platform::from_name("pc"), Some(Platform::Pc));
        assert_eq!(Platform::from_name("amiga"), None);
    }

    #[test]
    fn test_catalog_name_lookup_canonicalizes() {
        let catalog = KeyCatalog::new(Platform::MacFamily);
        // "select key" resolves to code 93, which is a meta key on mac
        assert_eq!(catalog.key_from_name("select key"), Some(Key(91)));
        let catalog = KeyCatalog::new(Platform::Pc);
        assert_eq!(catalog.key_from_name("select key"), Some(Key(93)));
    }

    #[test]
    fn test_key_ordering_and_hash() {
        use std::collections::HashMap;
        assert!(Key(65) < Key(66));
        let mut map = HashMap::new();
        map.insert(Key(65), "value");
        assert_eq!(map.get(&Key(65)), Some(&"value"));
    }
}
