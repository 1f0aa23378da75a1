//! Wallet Guide - screenshot-driven user guides for desktop wallets.
//!
//! This crate provides:
//! - YAML project configuration with per-section coordinates and crops
//! - A workflow runner that drives the app and captures screenshots
//! - An annotation engine (arrows, boxes, highlights, blurs, labels)
//! - Markdown guide generation with a staging/publish review flow
//! - A mock driver and framebuffer for dry runs and tests
//!
//! # Example
//!
//! ```rust,no_run
//! use wallet_guide::annotate::AnnotationEngine;
//! use wallet_guide::driver::DriverRegistry;
//! use wallet_guide::project::WalletConfig;
//! use wallet_guide::workflow::{RunOptions, Workflow};
//!
//! let config = WalletConfig::from_yaml_file("wallets/sparrow/config.yaml").unwrap();
//! let mut driver = DriverRegistry::with_defaults().create_named("mock", &config).unwrap();
//!
//! let mut workflow = Workflow::from_config(config.clone());
//! workflow.add_steps_from_config(None);
//! workflow.run(driver.as_mut(), RunOptions::default()).unwrap();
//!
//! let engine = AnnotationEngine::new(config.display_scale());
//! engine.batch_annotate(workflow.steps_mut(), &config.staging_dir.join("screenshots"));
//! wallet_guide::docs::generate(&config, workflow.get_steps(false, None), true, None).unwrap();
//! ```

pub mod annotate;
pub mod config;
pub mod docs;
pub mod driver;
pub mod geometry;
pub mod project;
pub mod session;
pub mod workflow;

// Re-export core types
pub use annotate::{AnnotateError, AnnotationEngine};
pub use driver::{AutomationDriver, Backend, DriverError, DriverRegistry, MockDriver, MockFramebuffer};
pub use geometry::{Bounds, DisplayScale, Point, Region};
pub use project::{ConfigError, WalletConfig};
pub use session::Session;
pub use workflow::{
    Action, Annotation, AnnotationKind, RunOptions, RunSummary, Step, Target, Workflow,
    WorkflowError,
};

// Re-export documentation entry points
pub use docs::{DocsError, GuideData, PublishReport, approve, generate, list_staged};
