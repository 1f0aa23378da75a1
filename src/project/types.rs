use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config;
use crate::geometry::{DisplayScale, Point, Region};
use crate::workflow::Step;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error types for configuration loading and backend selection
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Document could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document is not valid YAML for this schema
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Backend name not recognised
    #[error("Unknown automation backend '{0}'. Supported backends: 'appium', 'pyautogui', 'mock'")]
    UnknownBackend(String),

    /// Backend is known but no implementation was registered for it
    #[error("Automation backend '{0}' is not available in this build")]
    BackendUnavailable(String),
}

/// `wallet:` group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub wallet_type: String,
    pub platforms: Vec<String>,
    /// Platform name to application path
    #[serde(rename = "app_path")]
    pub app_paths: BTreeMap<String, String>,
    pub version: String,
}

impl Default for WalletInfo {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            wallet_type: "desktop".to_string(),
            platforms: vec!["macos".to_string()],
            app_paths: BTreeMap::new(),
            version: "1.0.0".to_string(),
        }
    }
}

/// `automation:` group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationSettings {
    /// Backend name: "appium", "pyautogui" or "mock"
    pub backend: String,
    /// Seconds to wait after launching the app
    pub startup_wait: f64,
    /// Seconds to wait before each capture
    pub screenshot_delay: f64,
    /// Seconds a driver may poll for an element
    pub implicit_wait: f64,
    pub display_scale: DisplayScale,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            backend: config::get().backend.clone(),
            startup_wait: 3.0,
            screenshot_delay: 1.0,
            implicit_wait: 10.0,
            display_scale: DisplayScale::IDENTITY,
        }
    }
}

/// A named group of steps with its own coordinate namespace and default crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Crop inherited by steps that declare none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Region>,

    /// Symbolic name to logical point
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub coordinates: IndexMap<String, Point>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// `documentation:` group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentationSettings {
    pub title: String,
    pub description: String,
    pub output_format: String,
    pub embed_images: bool,
    /// Maximum rendered screenshot height in the guide
    pub screenshot_max_height: u32,
    pub troubleshooting: String,
    /// Sections in declaration order
    pub sections: IndexMap<String, SectionConfig>,
}

impl Default for DocumentationSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            output_format: "markdown".to_string(),
            embed_images: true,
            screenshot_max_height: 600,
            troubleshooting: String::new(),
            sections: IndexMap::new(),
        }
    }
}

/// `build:` group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildInfo {
    pub source_url: String,
    pub build_instructions: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigDocument {
    wallet: WalletInfo,
    automation: AutomationSettings,
    documentation: DocumentationSettings,
    build: BuildInfo,
}

/// Configuration for one wallet documentation project
#[derive(Debug, Clone, PartialEq)]
pub struct WalletConfig {
    pub wallet: WalletInfo,
    pub automation: AutomationSettings,
    pub documentation: DocumentationSettings,
    pub build: BuildInfo,

    /// Published guide directory
    pub output_dir: PathBuf,
    /// Published screenshots directory
    pub screenshots_dir: PathBuf,
    /// Review area for a run before it is approved
    pub staging_dir: PathBuf,
}

impl WalletConfig {
    /// Create a configuration with defaults for everything but the name
    pub fn new(name: impl Into<String>) -> Self {
        let wallet = WalletInfo {
            name: name.into(),
            ..Default::default()
        };
        Self::from_document(ConfigDocument {
            wallet,
            ..Default::default()
        })
    }

    /// Parse a YAML document
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let document: ConfigDocument = serde_yaml::from_str(text)?;
        Ok(Self::from_document(document))
    }

    /// Load a YAML document from disk
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    fn from_document(mut document: ConfigDocument) -> Self {
        if document.documentation.title.is_empty() {
            document.documentation.title = format!("{} Wallet User Guide", document.wallet.name);
        }
        for (key, section) in document.documentation.sections.iter_mut() {
            if section.title.is_empty() {
                section.title = title_case(key);
            }
        }

        let settings = config::get();
        if let Some(scale) = settings.display_scale_override {
            document.automation.display_scale = DisplayScale::new(scale);
        }

        let root = PathBuf::from(&settings.output_root);
        let slug = slugify(&document.wallet.name);
        let output_dir = root.join(&slug);
        let screenshots_dir = output_dir.join("screenshots");
        let staging_dir = root.join("staging").join(&slug);

        Self {
            wallet: document.wallet,
            automation: document.automation,
            documentation: document.documentation,
            build: document.build,
            output_dir,
            screenshots_dir,
            staging_dir,
        }
    }

    /// Re-root all output paths under `root`
    pub fn with_output_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let slug = self.slug();
        self.output_dir = root.join(&slug);
        self.screenshots_dir = self.output_dir.join("screenshots");
        self.staging_dir = root.join("staging").join(&slug);
        self
    }

    pub fn name(&self) -> &str {
        &self.wallet.name
    }

    /// Directory-safe wallet name
    pub fn slug(&self) -> String {
        slugify(&self.wallet.name)
    }

    pub fn display_scale(&self) -> DisplayScale {
        self.automation.display_scale
    }

    pub fn sections(&self) -> &IndexMap<String, SectionConfig> {
        &self.documentation.sections
    }

    /// Application path for `platform`, or for the running OS when `None`
    pub fn app_path(&self, platform: Option<&str>) -> String {
        let platform = match platform {
            Some(p) => p.to_lowercase(),
            None => current_platform().to_string(),
        };
        self.wallet.app_paths.get(&platform).cloned().unwrap_or_default()
    }

    /// Create output, screenshot and staging directories
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        fs::create_dir_all(&self.screenshots_dir)?;
        fs::create_dir_all(&self.staging_dir)?;
        Ok(())
    }

    /// Serialize back to the four-group YAML layout
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let document = ConfigDocument {
            wallet: self.wallet.clone(),
            automation: self.automation.clone(),
            documentation: self.documentation.clone(),
            build: self.build.clone(),
        };
        Ok(serde_yaml::to_string(&document)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}

fn current_platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "macos",
        "windows" => "windows",
        "linux" => "linux",
        other => other,
    }
}

/// Lowercase and replace spaces with underscores
pub(crate) fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// "wallet_setup" -> "Wallet Setup"
pub(crate) fn title_case(key: &str) -> String {
    key.split(|c: char| c == '_' || c == ' ' || c == '-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
