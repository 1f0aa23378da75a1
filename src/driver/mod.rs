//! Automation drivers.
//!
//! A driver executes step actions against the wallet application and captures the
//! screen. Concrete platform drivers (accessibility tree, coordinate replay) plug
//! in through [`DriverRegistry`]; the crate ships a [`MockDriver`] that renders
//! into a [`MockFramebuffer`].
//!
//! | Backend | Config name | Targets |
//! |---------|-------------|---------|
//! | [`Backend::Accessibility`] | `appium` | selectors |
//! | [`Backend::Coordinate`] | `pyautogui` | recorded coordinates |
//! | [`Backend::Mock`] | `mock` | both |

pub mod backend;
pub mod mock;

pub use backend::{Backend, DriverFactory, DriverRegistry};
pub use mock::{MockDriver, MockFramebuffer};

use image::DynamicImage;

use crate::geometry::Bounds;
use crate::workflow::Step;

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Error types for driver operations
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Selector did not match any element
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Driver used before `connect` or after `disconnect`
    #[error("Driver is not connected")]
    NotConnected,

    /// Step is missing something the action needs
    #[error("Invalid step: {0}")]
    InvalidStep(String),

    /// Backend cannot perform this action
    #[error("Unsupported action: {0}")]
    Unsupported(String),

    /// Screen capture failed
    #[error("Capture error: {0}")]
    Capture(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Interface every automation backend implements.
///
/// Coordinates exchanged with a driver are physical pixels.
pub trait AutomationDriver {
    /// Which backend this driver implements
    fn backend(&self) -> Backend;

    /// Launch or attach to the application
    fn connect(&mut self) -> DriverResult<()>;

    /// Release the application; safe to call when not connected
    fn disconnect(&mut self) -> DriverResult<()>;

    /// Perform a click or type step
    fn execute_step(&mut self, step: &Step) -> DriverResult<()>;

    /// Capture the full screen
    fn capture_screenshot(&mut self, step: &Step) -> DriverResult<DynamicImage>;

    /// Bounds of the element matching `selector`, if the backend can locate it
    fn element_bounds(&mut self, selector: &str) -> DriverResult<Option<Bounds>>;

    /// Bounds of the application window. Best effort.
    fn window_bounds(&mut self) -> Option<Bounds> {
        None
    }
}
