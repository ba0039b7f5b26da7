// Keychord Settings Module
// User-configurable engine settings loaded from TOML

use std::path::{Path, PathBuf};

use crate::key::Platform;
use crate::state::STUCK_KEY_TIMEOUT_MS;

/// Engine settings.
///
/// Loaded from a TOML file (default: ~/.config/keychord/settings.toml):
///
/// ```toml
/// [engine]
/// stuck_key_timeout_ms = 200
/// key_press_logging = false
///
/// [platform]
/// # "mac" or "pc"; auto-detected from the build target when absent
/// override = "mac"
/// ```
#[derive(Debug, Clone)]
pub struct Settings {
    stuck_key_timeout_ms: u64,
    key_press_logging: bool,
    platform_override: Option<Platform>,

    /// Path to the settings file (for reload)
    source_path: Option<PathBuf>,
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

/// TOML representation for deserializing settings
#[derive(Debug, Clone, serde::Deserialize, Default)]
struct SettingsToml {
    #[serde(default)]
    engine: Option<EngineSettings>,

    #[serde(default)]
    platform: Option<PlatformSettings>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct EngineSettings {
    #[serde(default)]
    stuck_key_timeout_ms: Option<u64>,

    #[serde(default)]
    key_press_logging: Option<bool>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct PlatformSettings {
    #[serde(default, rename = "override")]
    override_platform: Option<String>,
}

impl Settings {
    /// Create settings with the built-in defaults
    pub fn new() -> Self {
        Self {
            stuck_key_timeout_ms: STUCK_KEY_TIMEOUT_MS as u64,
            key_press_logging: false,
            platform_override: None,
            source_path: None,
        }
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(&path)?;
        let mut settings = Self::from_toml(&content)?;
        settings.source_path = Some(path.as_ref().to_path_buf());
        Ok(settings)
    }

    /// Load settings from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let parsed: SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let mut settings = Self::new();

        if let Some(engine) = parsed.engine {
            if let Some(ms) = engine.stuck_key_timeout_ms {
                if ms == 0 {
                    return Err(SettingsError::InvalidValue(
                        "stuck_key_timeout_ms must be greater than zero".to_string(),
                    ));
                }
                settings.stuck_key_timeout_ms = ms;
            }
            if let Some(logging) = engine.key_press_logging {
                settings.key_press_logging = logging;
            }
        }

        if let Some(platform) = parsed.platform {
            if let Some(name) = platform.override_platform {
                let parsed = Platform::from_name(&name).ok_or_else(|| {
                    SettingsError::InvalidValue(format!("unknown platform '{}'", name))
                })?;
                settings.platform_override = Some(parsed);
            }
        }

        Ok(settings)
    }

    /// Get the default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("keychord").join("settings.toml"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist
    pub fn load_default() -> Result<Self, SettingsError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Ok(Self::new())
    }

    pub fn stuck_key_timeout_ms(&self) -> u64 {
        self.stuck_key_timeout_ms
    }

    pub fn key_press_logging(&self) -> bool {
        self.key_press_logging
    }

    pub fn platform_override(&self) -> Option<Platform> {
        self.platform_override
    }

    /// Reload settings from the original file
    pub fn reload(&mut self) -> Result<(), SettingsError> {
        if let Some(ref path) = self.source_path {
            let new_settings = Self::from_file(path)?;
            *self = new_settings;
            Ok(())
        } else {
            Err(SettingsError::InvalidValue("No source path set".to_string()))
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Create default settings content for a new installation
pub fn default_settings_content() -> &'static str {
    r#"# Keychord Settings
# Place this file at: ~/.config/keychord/settings.toml

[engine]
# Hold duration (ms) after which a down key is forcibly released while a
# root-shortcut or meta modifier is held
stuck_key_timeout_ms = 200

# Emit the latest key name/code on every press
key_press_logging = false

[platform]
# Optional platform override (auto-detected if not set)
# Valid values: "mac", "pc"
# override = "mac"
"#
}
