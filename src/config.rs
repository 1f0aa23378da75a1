//! Runtime settings with environment variable support.
//!
//! Project-specific values live in the YAML configuration (see [`crate::project`]).
//! This module only covers process-wide defaults:
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `WALLET_GUIDE_OUTPUT_ROOT` | Root for published and staged guides | `output` |
//! | `WALLET_GUIDE_BACKEND` | Backend used when the config names none | `pyautogui` |
//! | `WALLET_GUIDE_DISPLAY_SCALE` | Overrides `automation.display_scale` | unset |
//! | `WALLET_GUIDE_TEXT_SCALE` | Glyph magnification for annotation text | `3` |
//!
//! # Example
//!
//! ```bash
//! # Annotate retina captures without editing every config
//! export WALLET_GUIDE_DISPLAY_SCALE=2.0
//! export WALLET_GUIDE_OUTPUT_ROOT="/var/tmp/wallet-docs"
//! ```

use std::env;
use std::sync::OnceLock;

// ============================================================================
// Default Values
// ============================================================================

/// Default root directory for `output/` and `output/staging/`
pub const DEFAULT_OUTPUT_ROOT: &str = "output";

/// Default automation backend name
pub const DEFAULT_BACKEND: &str = "pyautogui";

/// Default glyph magnification (8x8 font, so 24px tall text)
pub const DEFAULT_TEXT_SCALE: u32 = 3;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the output root
pub const ENV_OUTPUT_ROOT: &str = "WALLET_GUIDE_OUTPUT_ROOT";

/// Environment variable for the default backend
pub const ENV_BACKEND: &str = "WALLET_GUIDE_BACKEND";

/// Environment variable for the display scale override
pub const ENV_DISPLAY_SCALE: &str = "WALLET_GUIDE_DISPLAY_SCALE";

/// Environment variable for annotation text scale
pub const ENV_TEXT_SCALE: &str = "WALLET_GUIDE_TEXT_SCALE";

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Get the global settings (initialized from environment on first access)
pub fn get() -> &'static Settings {
    SETTINGS.get_or_init(Settings::from_env)
}

/// Process-wide defaults
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Root for published and staged output
    pub output_root: String,
    /// Backend used when a config does not name one
    pub backend: String,
    /// Display scale forced over every project config
    pub display_scale_override: Option<f64>,
    /// Glyph magnification for annotation labels
    pub text_scale: u32,
}

impl Settings {
    /// Create settings from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            output_root: env::var(ENV_OUTPUT_ROOT)
                .unwrap_or_else(|_| DEFAULT_OUTPUT_ROOT.to_string()),
            backend: env::var(ENV_BACKEND).unwrap_or_else(|_| DEFAULT_BACKEND.to_string()),
            display_scale_override: env::var(ENV_DISPLAY_SCALE)
                .ok()
                .and_then(|s| parse_scale(&s)),
            text_scale: env::var(ENV_TEXT_SCALE)
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|scale: &u32| *scale > 0)
                .unwrap_or(DEFAULT_TEXT_SCALE),
        }
    }

    /// Create settings with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            output_root: DEFAULT_OUTPUT_ROOT.to_string(),
            backend: DEFAULT_BACKEND.to_string(),
            display_scale_override: None,
            text_scale: DEFAULT_TEXT_SCALE,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Parse a positive, finite scale factor
fn parse_scale(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}
