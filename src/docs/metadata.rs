//! Guide data shared by the Markdown renderer and the `metadata.json` sidecar.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{DocsResult, METADATA_FILE};
use crate::project::WalletConfig;
use crate::workflow::Step;

/// Section key for steps that declare none
pub const DEFAULT_SECTION: &str = "main";

/// One documented step as rendered in a guide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepData {
    pub number: Option<usize>,
    pub name: String,
    pub description: String,
    pub section: Option<String>,
    pub flags: Vec<String>,
    pub notes: String,
    /// Annotated screenshot if there is one, else the raw capture
    pub screenshot: Option<PathBuf>,
    /// `screenshot` relative to the guide's directory
    pub screenshot_relative: Option<String>,
}

impl StepData {
    /// Describe `step` for a guide written into `base_dir`
    pub fn from_step(step: &Step, base_dir: &Path) -> Self {
        let screenshot = step.rendered_screenshot().cloned();
        let screenshot_relative = screenshot.as_deref().map(|path| relative_to(path, base_dir));
        Self {
            number: step.step_number,
            name: step.name.clone(),
            description: step.description.clone(),
            section: step.section.clone(),
            flags: step.flags.clone(),
            notes: step.notes.clone(),
            screenshot,
            screenshot_relative,
        }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// Everything needed to render a guide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideData {
    pub title: String,
    pub wallet_name: String,
    pub description: String,
    /// `YYYY-MM-DD`
    pub generated_date: String,
    pub steps: Vec<StepData>,
    /// Steps grouped by section, in first-seen order
    pub sections: IndexMap<String, Vec<StepData>>,
    pub has_sections: bool,
    pub total_steps: usize,
    pub new_features: Vec<StepData>,
    pub changed_features: Vec<StepData>,
    pub has_new_features: bool,
    pub has_changed_features: bool,
    pub source_url: String,
    pub build_instructions: String,
    pub screenshot_max_height: u32,
    pub troubleshooting: String,
}

impl GuideData {
    /// Collect guide data for `steps`, skipping the ones omitted from output
    pub fn prepare<'a>(
        config: &WalletConfig,
        steps: impl IntoIterator<Item = &'a Step>,
        base_dir: &Path,
        generated_date: impl Into<String>,
    ) -> Self {
        let steps: Vec<StepData> = steps
            .into_iter()
            .filter(|s| !s.omit_from_output)
            .map(|s| StepData::from_step(s, base_dir))
            .collect();

        let mut sections: IndexMap<String, Vec<StepData>> = IndexMap::new();
        for step in &steps {
            let key = step.section.as_deref().unwrap_or(DEFAULT_SECTION);
            sections.entry(key.to_string()).or_default().push(step.clone());
        }

        let flagged = |flag: &str| -> Vec<StepData> {
            steps.iter().filter(|s| s.has_flag(flag)).cloned().collect()
        };
        let new_features = flagged("NEW");
        let changed_features = flagged("CHANGED");

        Self {
            title: config.documentation.title.clone(),
            wallet_name: config.name().to_string(),
            description: config.documentation.description.clone(),
            generated_date: generated_date.into(),
            has_sections: sections.len() > 1,
            total_steps: steps.len(),
            has_new_features: !new_features.is_empty(),
            has_changed_features: !changed_features.is_empty(),
            new_features,
            changed_features,
            sections,
            steps,
            source_url: config.build.source_url.clone(),
            build_instructions: config.build.build_instructions.clone(),
            screenshot_max_height: config.documentation.screenshot_max_height,
            troubleshooting: config.documentation.troubleshooting.clone(),
        }
    }
}

/// Path of `path` relative to `base`, or `screenshots/<file name>` when it lies outside
fn relative_to(path: &Path, base: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("screenshots/{name}")
        }
    }
}

/// Write `metadata.json` into `dir`
pub fn write_metadata(dir: &Path, data: &GuideData) -> DocsResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(METADATA_FILE);
    fs::write(&path, serde_json::to_string_pretty(data)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Action;
    use pretty_assertions::assert_eq;

    fn step(name: &str, section: Option<&str>) -> Step {
        let mut step = Step::new(name, Action::Screenshot);
        step.section = section.map(str::to_string);
        step
    }

    #[test]
    fn test_relative_paths() {
        let base = Path::new("/out/staging/sparrow");
        assert_eq!(
            relative_to(Path::new("/out/staging/sparrow/screenshots/a.png"), base),
            "screenshots/a.png"
        );
        assert_eq!(
            relative_to(Path::new("/elsewhere/b_annotated.png"), base),
            "screenshots/b_annotated.png"
        );
    }

    #[test]
    fn test_prepare_groups_and_filters() {
        let config = WalletConfig::new("Sparrow");
        let mut first = step("Open", Some("setup")).flag("NEW");
        first.step_number = Some(1);
        first.screenshot_path = Some(PathBuf::from("/base/screenshots/setup_open.png"));
        first.annotated_screenshot_path =
            Some(PathBuf::from("/base/screenshots/setup_open_annotated.png"));
        let hidden = step("Dismiss", Some("setup")).omit();
        let second = step("Receive", Some("receive")).flag("CHANGED");
        let third = step("Back", Some("setup"));
        let steps = vec![first, hidden, second, third];

        let data = GuideData::prepare(&config, &steps, Path::new("/base"), "2025-01-14");

        assert_eq!(data.total_steps, 3);
        assert!(data.has_sections);
        let keys: Vec<&str> = data.sections.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["setup", "receive"]);
        assert_eq!(data.sections["setup"].len(), 2);
        assert_eq!(data.new_features.len(), 1);
        assert_eq!(data.changed_features[0].name, "Receive");
        assert_eq!(
            data.steps[0].screenshot_relative.as_deref(),
            Some("screenshots/setup_open_annotated.png")
        );
        assert_eq!(data.title, "Sparrow Wallet User Guide");
    }

    #[test]
    fn test_unsectioned_steps_fall_into_main() {
        let config = WalletConfig::new("Sparrow");
        let steps = vec![step("Only", None)];
        let data = GuideData::prepare(&config, &steps, Path::new("/base"), "2025-01-14");
        assert!(!data.has_sections);
        assert!(data.sections.contains_key(DEFAULT_SECTION));
        assert!(!data.has_new_features);
    }

    #[test]
    fn test_write_metadata_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let config = WalletConfig::new("Sparrow");
        let data = GuideData::prepare(&config, &[step("Only", None)], tmp.path(), "2025-01-14");
        let path = write_metadata(tmp.path(), &data).unwrap();
        let back: GuideData = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, data);
    }
}
