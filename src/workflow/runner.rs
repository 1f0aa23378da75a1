use chrono::{DateTime, Local};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::types::{Action, Step, Target, WorkflowResult};
use crate::driver::{AutomationDriver, DriverError, DriverResult};
use crate::geometry::{Bounds, DisplayScale};
use crate::project::WalletConfig;
use crate::session::{Session, screenshot_filename};

/// How a run is executed
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Write screenshots under the staging directory instead of the published one
    pub staging: bool,
    /// Only run steps belonging to these sections
    pub sections: Option<Vec<String>>,
    /// Capture screenshots for steps that request them
    pub capture_screenshots: bool,
    /// Honor configured waits
    pub pace: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            staging: true,
            sections: None,
            capture_screenshots: true,
            pace: true,
        }
    }
}

impl RunOptions {
    pub fn staging(mut self, staging: bool) -> Self {
        self.staging = staging;
        self
    }

    pub fn sections<I, S>(mut self, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections = Some(sections.into_iter().map(Into::into).collect());
        self
    }

    pub fn capture_screenshots(mut self, capture: bool) -> Self {
        self.capture_screenshots = capture;
        self
    }

    /// Skip every sleep; used for dry runs and tests
    pub fn without_pacing(mut self) -> Self {
        self.pace = false;
        self
    }
}

/// Outcome of a complete run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub wallet: String,
    pub version: String,
    pub session_id: String,
    pub steps_executed: usize,
    /// Steps whose notes received an error line
    pub steps_failed: usize,
    pub timestamp: DateTime<Local>,
    pub output_dir: PathBuf,
    pub screenshots_dir: PathBuf,
}

/// An ordered list of steps for one wallet, executed against a driver
#[derive(Debug, Clone)]
pub struct Workflow {
    name: String,
    app_path: String,
    version: String,
    config: WalletConfig,
    steps: Vec<Step>,
    session: Session,
    last_run_sections: Option<Vec<String>>,
}

impl Workflow {
    pub fn new(
        name: impl Into<String>,
        app_path: impl Into<String>,
        version: impl Into<String>,
        config: WalletConfig,
    ) -> Self {
        let session = Session::new(config.staging_dir.join("screenshots"));
        Self {
            name: name.into(),
            app_path: app_path.into(),
            version: version.into(),
            config,
            steps: Vec::new(),
            session,
            last_run_sections: None,
        }
    }

    /// Build a workflow named after the configured wallet
    pub fn from_config(config: WalletConfig) -> Self {
        let name = config.name().to_string();
        let app_path = config.app_path(None);
        let version = config.wallet.version.clone();
        Self::new(name, app_path, version, config)
    }

    /// Append a step, numbering it by position
    pub fn add_step(&mut self, mut step: Step) -> &mut Self {
        step.step_number = Some(self.steps.len() + 1);
        self.steps.push(step);
        self
    }

    /// Append the resolved steps of one section, or of every section
    pub fn add_steps_from_config(&mut self, section: Option<&str>) -> &mut Self {
        let steps = match section {
            Some(name) => self.config.section_steps(name),
            None => self.config.all_steps(),
        };
        for step in steps {
            self.add_step(step);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access for post-processing such as annotation
    pub fn steps_mut(&mut self) -> &mut [Step] {
        &mut self.steps
    }

    /// Execute the steps in order.
    ///
    /// A step that fails gets the error appended to its notes and the run moves on.
    /// Only a failed connect aborts the run. The driver is always disconnected.
    pub fn run(
        &mut self,
        driver: &mut dyn AutomationDriver,
        options: RunOptions,
    ) -> WorkflowResult<RunSummary> {
        self.last_run_sections = options.sections.clone();

        let screenshots_dir = if options.staging {
            self.config.staging_dir.join("screenshots")
        } else {
            self.config.screenshots_dir.clone()
        };
        self.session = self.session.clone().in_dir(&screenshots_dir);
        self.session.init(self.config.name())?;

        info!(
            wallet = %self.name,
            version = %self.version,
            session = %self.session.id,
            backend = %driver.backend(),
            steps = self.steps.len(),
            mode = if options.staging { "staging" } else { "production" },
            "starting automation"
        );

        driver.connect()?;

        let ctx = StepContext {
            session: &self.session,
            scale: self.config.display_scale(),
            screenshot_delay: self.config.automation.screenshot_delay,
            options: &options,
        };

        let mut executed = 0;
        let mut failed = 0;
        for step in self
            .steps
            .iter_mut()
            .filter(|s| in_sections(s, options.sections.as_deref()))
        {
            executed += 1;
            if let Err(e) = execute_step(driver, step, &ctx) {
                warn!(step = %step.name, error = %e, "step failed");
                step.record_error(&e.to_string());
                failed += 1;
            }
        }

        if let Err(e) = driver.disconnect() {
            warn!(error = %e, "error during disconnect");
        }

        info!(
            executed,
            failed,
            screenshots = %screenshots_dir.display(),
            "automation complete"
        );

        Ok(RunSummary {
            wallet: self.name.clone(),
            version: self.version.clone(),
            session_id: self.session.id.clone(),
            steps_executed: executed,
            steps_failed: failed,
            timestamp: Local::now(),
            output_dir: self.config.output_dir.clone(),
            screenshots_dir,
        })
    }

    /// Steps for documentation.
    ///
    /// `sections` defaults to the filter of the last run. Omitted steps are
    /// dropped unless `include_omitted` is set.
    pub fn get_steps(&self, include_omitted: bool, sections: Option<&[String]>) -> Vec<&Step> {
        let filter = sections.or(self.last_run_sections.as_deref());
        self.steps
            .iter()
            .filter(|s| in_sections(s, filter))
            .filter(|s| include_omitted || !s.omit_from_output)
            .collect()
    }

    /// Point steps at captures left on disk by an earlier run.
    ///
    /// `recorded` maps `(section, name)` to a path exported with the run; other
    /// steps fall back to `<section>_<name>.png` in `screenshots_dir`. Steps that
    /// do not take a screenshot are never attached. Returns how many were found.
    pub fn attach_captures(
        &mut self,
        screenshots_dir: &Path,
        recorded: &HashMap<(Option<String>, String), PathBuf>,
        sections: Option<&[String]>,
    ) -> usize {
        let mut found = 0;
        for step in self
            .steps
            .iter_mut()
            .filter(|s| s.screenshot && in_sections(s, sections))
        {
            let key = (step.section.clone(), step.name.clone());
            let path = recorded.get(&key).cloned().unwrap_or_else(|| {
                screenshots_dir.join(screenshot_filename(
                    step.section.as_deref(),
                    &step.name,
                ))
            });
            if path.exists() {
                step.screenshot_path = Some(path);
                found += 1;
            }
        }
        debug!(found, dir = %screenshots_dir.display(), "attached existing captures");
        found
    }

    /// Wallet, session and per-step summary as JSON
    pub fn export_metadata(&self) -> serde_json::Value {
        let steps: Vec<serde_json::Value> = self
            .steps
            .iter()
            .map(|step| {
                let annotations: Vec<serde_json::Value> = step
                    .annotations
                    .iter()
                    .map(|a| {
                        serde_json::json!({
                            "type": a.kind,
                            "target": a.target,
                            "label": a.label,
                            "color": a.color,
                        })
                    })
                    .collect();
                serde_json::json!({
                    "number": step.step_number,
                    "name": step.name,
                    "description": step.description,
                    "action": step.action,
                    "section": step.section,
                    "omit_from_output": step.omit_from_output,
                    "screenshot": step.screenshot_path.as_ref().map(|p| p.display().to_string()),
                    "annotated_screenshot": step
                        .annotated_screenshot_path
                        .as_ref()
                        .map(|p| p.display().to_string()),
                    "annotations": annotations,
                    "flags": step.flags,
                    "notes": step.notes,
                })
            })
            .collect();

        serde_json::json!({
            "wallet": {
                "name": self.name,
                "version": self.version,
                "app_path": self.app_path,
            },
            "session": {
                "id": self.session.id,
                "timestamp": Local::now().to_rfc3339(),
            },
            "steps": steps,
        })
    }
}

fn in_sections(step: &Step, sections: Option<&[String]>) -> bool {
    match sections {
        None => true,
        Some(sections) => step
            .section
            .as_deref()
            .is_some_and(|name| sections.iter().any(|s| s == name)),
    }
}

/// Read-only state shared by every step of a run
struct StepContext<'a> {
    session: &'a Session,
    scale: DisplayScale,
    screenshot_delay: f64,
    options: &'a RunOptions,
}

impl StepContext<'_> {
    fn pause(&self, seconds: f64) {
        if self.options.pace && seconds.is_finite() && seconds > 0.0 {
            thread::sleep(Duration::from_secs_f64(seconds));
        }
    }
}

fn execute_step(
    driver: &mut dyn AutomationDriver,
    step: &mut Step,
    ctx: &StepContext<'_>,
) -> DriverResult<()> {
    info!(
        number = step.step_number.unwrap_or_default(),
        step = %step.name,
        action = %step.action,
        "executing step"
    );

    ctx.pause(step.wait_before);

    // Capture before the action: the guide shows what the user is about to interact with
    if step.screenshot && ctx.options.capture_screenshots {
        ctx.pause(ctx.screenshot_delay);
        capture(driver, step, ctx)?;
    }

    match step.action {
        Action::Launch | Action::Screenshot => {}
        Action::Wait => {
            let seconds = match step.value.as_deref() {
                Some(v) => v.trim().parse::<f64>().map_err(|_| {
                    DriverError::InvalidStep(format!("invalid wait duration '{v}'"))
                })?,
                None => 1.0,
            };
            ctx.pause(seconds);
        }
        Action::Custom => info!(step = %step.name, notes = %step.notes, "manual action"),
        Action::Click | Action::Type => driver.execute_step(step)?,
    }

    ctx.pause(step.wait_after);

    if !step.annotations.is_empty() {
        if let Some(Target::Selector(selector)) = &step.target {
            match driver.element_bounds(selector) {
                Ok(bounds) => step.element_bounds = bounds,
                Err(e) => warn!(step = %step.name, error = %e, "could not get element bounds"),
            }
        }
    }

    step.timestamp = Some(Local::now());
    Ok(())
}

fn capture(
    driver: &mut dyn AutomationDriver,
    step: &mut Step,
    ctx: &StepContext<'_>,
) -> DriverResult<()> {
    let screenshot = driver.capture_screenshot(step)?;

    let area = match step.crop_region {
        Some(region) => Some(ctx.scale.region(region)),
        None if step.crop_to_window => {
            step.window_bounds = driver.window_bounds();
            if step.window_bounds.is_none() {
                warn!(step = %step.name, "could not find app window, using full screenshot");
            }
            step.window_bounds
        }
        None => None,
    };
    let screenshot = crop(screenshot, area);

    let path = ctx
        .session
        .screenshot_path(step.section.as_deref(), &step.name);
    screenshot.save(&path)?;
    debug!(
        path = %path.display(),
        width = screenshot.width(),
        height = screenshot.height(),
        "screenshot saved"
    );
    step.screenshot_path = Some(path);
    Ok(())
}

/// Crop to `area` clamped to the image; an area entirely outside keeps the full image
pub fn crop(image: DynamicImage, area: Option<Bounds>) -> DynamicImage {
    let Some(area) = area else {
        return image;
    };
    match area.clamp_to(image.width(), image.height()) {
        Some(c) => image.crop_imm(c.x as u32, c.y as u32, c.width as u32, c.height as u32),
        None => {
            warn!(?area, "crop region lies outside the screenshot");
            image
        }
    }
}
