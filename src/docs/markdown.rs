//! Markdown rendering for guides and section files.
//!
//! A full guide lives at `<dir>/user-guide.md` with images under `screenshots/`.
//! Section files live one level down in `<dir>/sections/`, so their image links
//! start with `../screenshots/`; the master guide rebuilt from them rewrites those
//! links back to `screenshots/`.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::metadata::{GuideData, StepData};
use super::{DocsResult, GUIDE_FILE, SECTIONS_DIR};
use crate::project::WalletConfig;

/// Header, feature callouts and build notes
fn render_preamble(out: &mut String, data: &GuideData) {
    out.push_str(&format!("# {}\n\n", data.title));
    if !data.description.is_empty() {
        out.push_str(&format!("{}\n\n", data.description.trim()));
    }
    out.push_str(&format!(
        "*{} guide generated on {}*\n\n",
        data.wallet_name, data.generated_date
    ));

    if data.has_new_features {
        out.push_str("> **New in this release**\n>\n");
        for step in &data.new_features {
            out.push_str(&format!("> - {}\n", step.name));
        }
        out.push('\n');
    }
    if data.has_changed_features {
        out.push_str("> **Changed in this release**\n>\n");
        for step in &data.changed_features {
            out.push_str(&format!("> - {}\n", step.name));
        }
        out.push('\n');
    }

    if !data.source_url.is_empty() || !data.build_instructions.is_empty() {
        out.push_str("## Building from Source\n\n");
        if !data.source_url.is_empty() {
            out.push_str(&format!("Source: <{}>\n\n", data.source_url));
        }
        if !data.build_instructions.is_empty() {
            out.push_str(&format!("{}\n\n", data.build_instructions.trim()));
        }
    }
}

fn render_troubleshooting(out: &mut String, data: &GuideData) {
    if !data.troubleshooting.trim().is_empty() {
        out.push_str("## Troubleshooting\n\n");
        out.push_str(&format!("{}\n", data.troubleshooting.trim()));
    }
}

/// One numbered step; `image_prefix` is prepended to the relative screenshot path
fn render_step(out: &mut String, index: usize, step: &StepData, image_prefix: &str, max_height: u32) {
    out.push_str(&format!("### Step {}: {}", index, step.name));
    for flag in &step.flags {
        out.push_str(&format!(" `{flag}`"));
    }
    out.push_str("\n\n");

    if !step.description.is_empty() {
        out.push_str(&format!("{}\n\n", step.description.trim()));
    }

    if let Some(rel) = &step.screenshot_relative {
        out.push_str(&format!(
            "<img src=\"{}{}\" alt=\"{}\" style=\"max-height: {}px;\">\n\n",
            image_prefix, rel, step.name, max_height
        ));
    }

    let notes = step.notes.trim();
    if !notes.is_empty() {
        out.push_str("> **Note:**");
        for line in notes.lines() {
            out.push_str(&format!(" {}\n>", line.trim()));
        }
        out.pop();
        out.push('\n');
    }
}

fn anchor(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' | '-' => Some('-'),
            c if c.is_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

fn section_title(config: &WalletConfig, name: &str) -> String {
    config
        .sections()
        .get(name)
        .map(|s| s.title.clone())
        .unwrap_or_else(|| crate::project::types::title_case(name))
}

/// Complete guide in one document
pub fn render_guide(data: &GuideData, config: &WalletConfig) -> String {
    let mut out = String::new();
    render_preamble(&mut out, data);
    let max_height = data.screenshot_max_height;

    if data.has_sections {
        out.push_str("## Contents\n\n");
        for name in data.sections.keys() {
            let title = section_title(config, name);
            out.push_str(&format!("- [{}](#{})\n", title, anchor(&title)));
        }
        out.push('\n');

        for (name, steps) in &data.sections {
            out.push_str(&format!("## {}\n\n", section_title(config, name)));
            if let Some(section) = config.sections().get(name) {
                if !section.description.is_empty() {
                    out.push_str(&format!("{}\n\n", section.description.trim()));
                }
            }
            for (i, step) in steps.iter().enumerate() {
                render_step(&mut out, i + 1, step, "", max_height);
            }
        }
    } else {
        out.push_str("## Steps\n\n");
        for (i, step) in data.steps.iter().enumerate() {
            render_step(&mut out, i + 1, step, "", max_height);
        }
    }

    render_troubleshooting(&mut out, data);
    out
}

/// Standalone file for one section, for `sections/<name>.md`
pub fn render_section(
    config: &WalletConfig,
    name: &str,
    steps: &[StepData],
    max_height: u32,
) -> String {
    let mut out = format!("## {}\n\n", section_title(config, name));
    if let Some(section) = config.sections().get(name) {
        if !section.description.is_empty() {
            out.push_str(&format!("{}\n\n", section.description.trim()));
        }
    }
    for (i, step) in steps.iter().enumerate() {
        render_step(&mut out, i + 1, step, "../", max_height);
    }
    out
}

/// Write `sections/<name>.md` for each requested section that has steps
pub fn generate_sections(
    config: &WalletConfig,
    data: &GuideData,
    output_dir: &Path,
    sections: &[String],
) -> DocsResult<Vec<PathBuf>> {
    let sections_dir = output_dir.join(SECTIONS_DIR);
    fs::create_dir_all(&sections_dir)?;

    let mut written = Vec::new();
    for name in sections {
        let Some(steps) = data.sections.get(name) else {
            warn!(section = %name, "no steps found for section");
            continue;
        };
        let path = sections_dir.join(format!("{name}.md"));
        fs::write(
            &path,
            render_section(config, name, steps, data.screenshot_max_height),
        )?;
        info!(file = %path.display(), "generated section");
        written.push(path);
    }
    Ok(written)
}

/// Rebuild `user-guide.md` from the section files present on disk.
///
/// Sections follow configuration order; without configured sections the files are
/// taken alphabetically.
pub fn rebuild_master(config: &WalletConfig, output_dir: &Path, data: &GuideData) -> DocsResult<PathBuf> {
    let sections_dir = output_dir.join(SECTIONS_DIR);

    let order: Vec<String> = if config.sections().is_empty() {
        let mut names = Vec::new();
        if sections_dir.exists() {
            for entry in fs::read_dir(&sections_dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|e| e == "md") {
                    if let Some(stem) = path.file_stem() {
                        names.push(stem.to_string_lossy().into_owned());
                    }
                }
            }
        }
        names.sort();
        names
    } else {
        config.sections().keys().cloned().collect()
    };

    let mut out = String::new();
    render_preamble(&mut out, data);

    let present: Vec<(String, String)> = order
        .into_iter()
        .filter_map(|name| {
            let content = fs::read_to_string(sections_dir.join(format!("{name}.md"))).ok()?;
            Some((name, content.replace("src=\"../screenshots/", "src=\"screenshots/")))
        })
        .collect();

    if present.len() > 1 {
        out.push_str("## Contents\n\n");
        for (name, _) in &present {
            let title = section_title(config, name);
            out.push_str(&format!("- [{}](#{})\n", title, anchor(&title)));
        }
        out.push('\n');
    }
    for (_, content) in &present {
        out.push_str(content.trim_end());
        out.push_str("\n\n");
    }

    render_troubleshooting(&mut out, data);

    let path = output_dir.join(GUIDE_FILE);
    fs::write(&path, out)?;
    info!(sections = present.len(), file = %path.display(), "rebuilt master guide");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Action, Step};

    fn config() -> WalletConfig {
        WalletConfig::from_yaml_str(
            r#"
wallet:
  name: Sparrow
documentation:
  description: Getting started with silent payments
  troubleshooting: Restart the app if the sync stalls.
  screenshot_max_height: 480
  sections:
    setup:
      title: Wallet Setup
      description: Create a new wallet.
    receive: {}
"#,
        )
        .unwrap()
    }

    fn steps(base: &Path) -> Vec<Step> {
        let mut open = Step::new("Open wallet", Action::Click).section("setup").flag("NEW");
        open.screenshot_path = Some(base.join("screenshots/setup_open_wallet.png"));
        open.notes = "Check the fee\nError: element not found".to_string();
        let receive = Step::new("Show address", Action::Click).section("receive");
        vec![open, receive]
    }

    #[test]
    fn test_render_guide_with_sections() {
        let base = Path::new("/staging/sparrow");
        let config = config();
        let data = GuideData::prepare(&config, &steps(base), base, "2025-01-14");
        let md = render_guide(&data, &config);

        assert!(md.starts_with("# Sparrow Wallet User Guide\n"));
        assert!(md.contains("- [Wallet Setup](#wallet-setup)"));
        assert!(md.contains("## Receive"));
        assert!(md.contains("### Step 1: Open wallet `NEW`"));
        assert!(md.contains(
            "<img src=\"screenshots/setup_open_wallet.png\" alt=\"Open wallet\" style=\"max-height: 480px;\">"
        ));
        assert!(md.contains("> **Note:** Check the fee\n> Error: element not found\n"));
        assert!(md.contains("> - Open wallet"));
        assert!(md.trim_end().ends_with("Restart the app if the sync stalls."));
    }

    #[test]
    fn test_section_files_and_master_rebuild() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config();
        let data = GuideData::prepare(&config, &steps(tmp.path()), tmp.path(), "2025-01-14");

        let written =
            generate_sections(&config, &data, tmp.path(), &["setup".to_string(), "nope".to_string()])
                .unwrap();
        assert_eq!(written.len(), 1);
        let section = fs::read_to_string(&written[0]).unwrap();
        assert!(section.contains("src=\"../screenshots/setup_open_wallet.png\""));

        let master = rebuild_master(&config, tmp.path(), &data).unwrap();
        let text = fs::read_to_string(master).unwrap();
        assert!(text.contains("src=\"screenshots/setup_open_wallet.png\""));
        assert!(!text.contains("../screenshots/"));
        assert!(text.contains("## Wallet Setup"));
        assert!(!text.contains("## Receive"));
    }
}
