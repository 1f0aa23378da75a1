//! Backend selection.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use super::AutomationDriver;
use super::mock::MockDriver;
use crate::project::{ConfigError, ConfigResult, WalletConfig};

/// Automation backends a configuration may name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Accessibility-tree driver; locates elements by selector
    Accessibility,
    /// Coordinate replay driver; clicks recorded positions
    Coordinate,
    /// In-process framebuffer, for tests and dry runs
    Mock,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Accessibility, Backend::Coordinate, Backend::Mock];

    /// Name used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Accessibility => "appium",
            Backend::Coordinate => "pyautogui",
            Backend::Mock => "mock",
        }
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Backend::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownBackend(name.to_string()))
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds a driver for a project
pub type DriverFactory = Box<dyn Fn(&WalletConfig) -> Box<dyn AutomationDriver>>;

/// Maps backends to driver constructors
pub struct DriverRegistry {
    factories: HashMap<Backend, DriverFactory>,
}

impl DriverRegistry {
    /// Registry with nothing registered
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the drivers built into this crate
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Backend::Mock, |config| {
            Box::new(MockDriver::from_config(config))
        });
        registry
    }

    /// Register (or replace) the constructor for `backend`
    pub fn register<F>(&mut self, backend: Backend, factory: F)
    where
        F: Fn(&WalletConfig) -> Box<dyn AutomationDriver> + 'static,
    {
        self.factories.insert(backend, Box::new(factory));
    }

    pub fn is_available(&self, backend: Backend) -> bool {
        self.factories.contains_key(&backend)
    }

    /// Backends with a registered constructor
    pub fn available(&self) -> Vec<Backend> {
        Backend::ALL
            .into_iter()
            .filter(|b| self.is_available(*b))
            .collect()
    }

    pub fn create(
        &self,
        backend: Backend,
        config: &WalletConfig,
    ) -> ConfigResult<Box<dyn AutomationDriver>> {
        let factory = self
            .factories
            .get(&backend)
            .ok_or_else(|| ConfigError::BackendUnavailable(backend.to_string()))?;
        debug!(%backend, wallet = config.name(), "creating driver");
        Ok(factory(config))
    }

    /// Parse `name` and create the matching driver
    pub fn create_named(
        &self,
        name: &str,
        config: &WalletConfig,
    ) -> ConfigResult<Box<dyn AutomationDriver>> {
        self.create(name.parse()?, config)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_names() {
        assert_eq!("appium".parse::<Backend>().unwrap(), Backend::Accessibility);
        assert_eq!("PyAutoGUI".parse::<Backend>().unwrap(), Backend::Coordinate);
        assert_eq!(" mock ".parse::<Backend>().unwrap(), Backend::Mock);
        assert_eq!(Backend::Coordinate.to_string(), "pyautogui");
    }

    #[test]
    fn test_unknown_backend_is_config_error() {
        let err = "selenium".parse::<Backend>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBackend(name) if name == "selenium"));
    }

    #[test]
    fn test_defaults_register_mock_only() {
        let registry = DriverRegistry::with_defaults();
        assert_eq!(registry.available(), vec![Backend::Mock]);

        let config = WalletConfig::new("Sparrow");
        let driver = registry.create_named("mock", &config).unwrap();
        assert_eq!(driver.backend(), Backend::Mock);

        let err = registry.create(Backend::Accessibility, &config).err().unwrap();
        assert!(matches!(err, ConfigError::BackendUnavailable(name) if name == "appium"));
        assert!(matches!(
            registry.create_named("xdotool", &config).err().unwrap(),
            ConfigError::UnknownBackend(_)
        ));
    }

    #[test]
    fn test_register_replaces_constructor() {
        let mut registry = DriverRegistry::new();
        assert!(!registry.is_available(Backend::Coordinate));
        registry.register(Backend::Coordinate, |config| {
            Box::new(MockDriver::from_config(config))
        });
        assert!(registry.is_available(Backend::Coordinate));
    }
}
