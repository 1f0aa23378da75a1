//! Wallet project configuration and step resolution.

pub mod resolve;
pub mod types;

pub use types::{
    AutomationSettings, BuildInfo, ConfigError, ConfigResult, DocumentationSettings,
    SectionConfig, WalletConfig, WalletInfo,
};
