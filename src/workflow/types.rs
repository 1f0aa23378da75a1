use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::driver::DriverError;
use crate::geometry::{Bounds, Point, Region};
use crate::project::ConfigError;

/// What a step does when executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// App is launched by the driver's `connect`; nothing to do per step
    Launch,
    Click,
    Type,
    /// Sleep for `value` seconds (1.0 if unset)
    Wait,
    /// Capture only
    Screenshot,
    /// Manual action described in the step notes
    Custom,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Launch => "launch",
            Action::Click => "click",
            Action::Type => "type",
            Action::Wait => "wait",
            Action::Screenshot => "screenshot",
            Action::Custom => "custom",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step target: recorded coordinates or an accessibility selector.
///
/// In configuration a string may also name a section coordinate, which the
/// resolver replaces with the point it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Coordinates(Point),
    Selector(String),
}

impl Target {
    pub fn as_selector(&self) -> Option<&str> {
        match self {
            Target::Selector(s) => Some(s),
            Target::Coordinates(_) => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Target::Coordinates(p) => Some(*p),
            Target::Selector(_) => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Coordinates(p) => write!(f, "({}, {})", p.x, p.y),
            Target::Selector(s) => f.write_str(s),
        }
    }
}

/// Annotation kinds; each one has its own drawing routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Arrow,
    Box,
    Highlight,
    Blur,
    Text,
    Number,
    Circle,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Arrow => "arrow",
            AnnotationKind::Box => "box",
            AnnotationKind::Highlight => "highlight",
            AnnotationKind::Blur => "blur",
            AnnotationKind::Text => "text",
            AnnotationKind::Number => "number",
            AnnotationKind::Circle => "circle",
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_thickness() -> i32 {
    2
}

/// A visual markup request attached to a step.
///
/// `region` and `position` are logical pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: AnnotationKind,

    /// Selector the annotation refers to (informational)
    #[serde(default)]
    pub target: Option<String>,

    /// Area for box, highlight and blur
    #[serde(default)]
    pub region: Option<Region>,

    /// Anchor point for text and circle
    #[serde(default)]
    pub position: Option<Point>,

    #[serde(default)]
    pub label: Option<String>,

    /// Palette key; each kind has its own default
    #[serde(default)]
    pub color: Option<String>,

    #[serde(default = "default_thickness")]
    pub thickness: i32,

    /// Circle radius; 30 when unset
    #[serde(default)]
    pub radius: Option<i32>,
}

impl Annotation {
    /// Create an annotation of `kind` with default styling
    pub fn new(kind: AnnotationKind) -> Self {
        Self {
            kind,
            target: None,
            region: None,
            position: None,
            label: None,
            color: None,
            thickness: default_thickness(),
            radius: None,
        }
    }

    pub fn arrow(label: Option<&str>) -> Self {
        let mut a = Self::new(AnnotationKind::Arrow);
        a.label = label.map(str::to_string);
        a
    }

    pub fn boxed(region: Region) -> Self {
        Self::new(AnnotationKind::Box).region(region).thickness(3)
    }

    pub fn highlight(region: Region) -> Self {
        Self::new(AnnotationKind::Highlight).region(region)
    }

    pub fn blur(region: Region) -> Self {
        Self::new(AnnotationKind::Blur).region(region)
    }

    pub fn text(label: impl Into<String>, position: Point) -> Self {
        let mut a = Self::new(AnnotationKind::Text);
        a.label = Some(label.into());
        a.position = Some(position);
        a
    }

    pub fn number(number: u32) -> Self {
        let mut a = Self::new(AnnotationKind::Number);
        a.label = Some(number.to_string());
        a
    }

    pub fn circle(position: Point) -> Self {
        let mut a = Self::new(AnnotationKind::Circle);
        a.position = Some(position);
        a
    }

    pub fn region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn thickness(mut self, thickness: i32) -> Self {
        self.thickness = thickness;
        self
    }

    pub fn radius(mut self, radius: i32) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

fn default_clicks() -> u32 {
    1
}

fn default_wait() -> f64 {
    0.5
}

/// One documented user action.
///
/// Configuration fills the declarative part. The runtime fields at the bottom are
/// written during a run: the workflow runner owns paths, bounds and timestamp,
/// the annotation engine owns `annotated_screenshot_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub action: Action,

    #[serde(default)]
    pub target: Option<Target>,

    #[serde(default = "default_clicks")]
    pub clicks: u32,

    /// Text to type, or wait duration in seconds
    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub screenshot: bool,

    /// Best-effort crop to the application window
    #[serde(default)]
    pub crop_to_window: bool,

    /// Explicit crop in logical pixels; wins over `crop_to_window`
    #[serde(default)]
    pub crop_region: Option<Region>,

    #[serde(default)]
    pub annotations: Vec<Annotation>,

    /// Labels such as "NEW", "CHANGED", "DEPRECATED"
    #[serde(default)]
    pub flags: Vec<String>,

    /// Seconds to wait before the action
    #[serde(default = "default_wait")]
    pub wait_before: f64,

    /// Seconds to wait after the action
    #[serde(default = "default_wait")]
    pub wait_after: f64,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub section: Option<String>,

    /// Executed but left out of generated documentation
    #[serde(default)]
    pub omit_from_output: bool,

    #[serde(skip_deserializing)]
    pub step_number: Option<usize>,

    #[serde(skip_deserializing)]
    pub screenshot_path: Option<PathBuf>,

    #[serde(skip_deserializing)]
    pub annotated_screenshot_path: Option<PathBuf>,

    /// Physical pixels, as reported by the driver
    #[serde(skip_deserializing)]
    pub element_bounds: Option<Bounds>,

    #[serde(skip_deserializing)]
    pub window_bounds: Option<Bounds>,

    #[serde(skip_deserializing)]
    pub timestamp: Option<DateTime<Local>>,
}

impl Step {
    pub fn new(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            action,
            target: None,
            clicks: default_clicks(),
            value: None,
            screenshot: false,
            crop_to_window: false,
            crop_region: None,
            annotations: Vec::new(),
            flags: Vec::new(),
            wait_before: default_wait(),
            wait_after: default_wait(),
            notes: String::new(),
            section: None,
            omit_from_output: false,
            step_number: None,
            screenshot_path: None,
            annotated_screenshot_path: None,
            element_bounds: None,
            window_bounds: None,
            timestamp: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_screenshot(mut self) -> Self {
        self.screenshot = true;
        self
    }

    pub fn crop(mut self, region: Region) -> Self {
        self.crop_region = Some(region);
        self
    }

    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    pub fn omit(mut self) -> Self {
        self.omit_from_output = true;
        self
    }

    /// Set both waits
    pub fn waits(mut self, before: f64, after: f64) -> Self {
        self.wait_before = before;
        self.wait_after = after;
        self
    }

    /// The image a guide should show for this step, if any
    pub fn rendered_screenshot(&self) -> Option<&PathBuf> {
        self.annotated_screenshot_path
            .as_ref()
            .or(self.screenshot_path.as_ref())
    }

    /// Append an error line to the step notes
    pub fn record_error(&mut self, message: &str) {
        self.notes.push_str("\nError: ");
        self.notes.push_str(message);
    }
}

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Error types for workflow operations
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Invalid or unusable configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Driver failed outside of a single step (connect)
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
