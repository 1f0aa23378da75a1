//! Review and publication of staged guides.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{DocsError, DocsResult, GUIDE_FILE, INDEX_FILE, METADATA_FILE, SCREENSHOTS_DIR};
use crate::project::WalletConfig;

/// Outcome of approving one staged guide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    pub wallet: String,
    pub from: PathBuf,
    pub to: PathBuf,
    pub screenshots_copied: usize,
    pub screenshots_skipped: usize,
}

/// One row of the published index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub description: String,
    pub doc_path: String,
    pub last_updated: String,
    pub total_steps: usize,
    pub platform: String,
    pub version: Option<String>,
}

/// Wallet directories under `staging_root` that contain a guide, sorted by name
pub fn list_staged(staging_root: &Path) -> DocsResult<Vec<PathBuf>> {
    if !staging_root.exists() {
        return Ok(Vec::new());
    }
    let mut staged = Vec::new();
    for entry in fs::read_dir(staging_root)? {
        let path = entry?.path();
        if path.is_dir() && path.join(GUIDE_FILE).exists() {
            staged.push(path);
        }
    }
    staged.sort();
    Ok(staged)
}

/// File names of the screenshots a `metadata.json` sidecar links to.
///
/// A missing or unreadable sidecar yields an empty set.
pub fn referenced_screenshots(metadata_path: &Path) -> BTreeSet<String> {
    let raw = match fs::read_to_string(metadata_path) {
        Ok(raw) => raw,
        Err(_) => return BTreeSet::new(),
    };
    let metadata: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(path = %metadata_path.display(), error = %e, "could not parse metadata");
            return BTreeSet::new();
        }
    };

    metadata["steps"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|step| step["screenshot_relative"].as_str())
        .filter(|rel| !rel.is_empty())
        .filter_map(|rel| Path::new(rel).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect()
}

/// Copy a staged guide into the published tree.
///
/// Only screenshots referenced by the staged `metadata.json` are copied; other
/// directories are copied recursively and plain files as-is.
pub fn approve(wallet: &str, staging_root: &Path, output_root: &Path) -> DocsResult<PublishReport> {
    let from = staging_root.join(wallet);
    let to = output_root.join(wallet);
    if !from.is_dir() {
        return Err(DocsError::NotStaged(wallet.to_string()));
    }
    fs::create_dir_all(&to)?;

    let used = referenced_screenshots(&from.join(METADATA_FILE));
    let mut report = PublishReport {
        wallet: wallet.to_string(),
        from: from.clone(),
        to: to.clone(),
        screenshots_copied: 0,
        screenshots_skipped: 0,
    };

    for entry in fs::read_dir(&from)? {
        let item = entry?.path();
        let Some(name) = item.file_name() else {
            continue;
        };
        let dest = to.join(name);

        if item.is_dir() && name == SCREENSHOTS_DIR {
            fs::create_dir_all(&dest)?;
            for shot in fs::read_dir(&item)? {
                let shot = shot?.path();
                let Some(shot_name) = shot.file_name() else {
                    continue;
                };
                if shot.is_file() && used.contains(&*shot_name.to_string_lossy()) {
                    fs::copy(&shot, dest.join(shot_name))?;
                    report.screenshots_copied += 1;
                } else {
                    report.screenshots_skipped += 1;
                }
            }
        } else if item.is_dir() {
            copy_dir(&item, &dest)?;
        } else {
            fs::copy(&item, &dest)?;
        }
    }

    info!(
        wallet,
        copied = report.screenshots_copied,
        skipped = report.screenshots_skipped,
        to = %to.display(),
        "published"
    );
    Ok(report)
}

fn copy_dir(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let path = entry?.path();
        if let Some(name) = path.file_name() {
            if path.is_dir() {
                copy_dir(&path, &to.join(name))?;
            } else {
                fs::copy(&path, to.join(name))?;
            }
        }
    }
    Ok(())
}

fn platform_label(platform: &str) -> String {
    match platform.to_lowercase().as_str() {
        "macos" => "MacOS".to_string(),
        "windows" => "Windows".to_string(),
        "linux" => "Linux".to_string(),
        "ios" => "iOS".to_string(),
        "android" => "Android".to_string(),
        other => crate::project::types::title_case(other),
    }
}

/// Collect index rows for every published guide under `output_root`.
///
/// `config_root` holds `<wallet>/config.yaml` files used for names, platforms
/// and versions; guides without one get a name derived from the directory.
pub fn collect_index(output_root: &Path, config_root: &Path) -> DocsResult<Vec<IndexEntry>> {
    let mut wallets = Vec::new();
    if !output_root.exists() {
        return Ok(wallets);
    }

    for entry in fs::read_dir(output_root)? {
        let dir = entry?.path();
        let Some(dir_name) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if !dir.is_dir() || dir_name == "staging" || dir_name.starts_with('.') {
            continue;
        }
        if !dir.join(GUIDE_FILE).exists() {
            continue;
        }

        let mut row = IndexEntry {
            name: crate::project::types::title_case(&dir_name),
            description: String::new(),
            doc_path: format!("{dir_name}/{GUIDE_FILE}"),
            last_updated: Local::now().format("%Y-%m-%d").to_string(),
            total_steps: 0,
            platform: String::new(),
            version: None,
        };
        row.description = format!("User guide for {}", row.name);

        let config_path = config_root.join(&dir_name).join("config.yaml");
        if let Ok(config) = WalletConfig::from_yaml_file(&config_path) {
            row.name = config.name().to_string();
            row.description = config.documentation.description.clone();
            row.platform = config
                .wallet
                .platforms
                .iter()
                .map(|p| platform_label(p))
                .collect::<Vec<_>>()
                .join(", ");
            row.version = Some(config.wallet.version.clone());
        }

        if let Ok(raw) = fs::read_to_string(dir.join(METADATA_FILE)) {
            if let Ok(meta) = serde_json::from_str::<serde_json::Value>(&raw) {
                if let Some(date) = meta["generated_date"].as_str().filter(|d| !d.is_empty()) {
                    row.last_updated = date.to_string();
                }
                row.total_steps = meta["total_steps"].as_u64().unwrap_or(0) as usize;
            }
        }
        wallets.push(row);
    }

    wallets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(wallets)
}

/// Markdown index of published guides
pub fn render_index(wallets: &[IndexEntry], generated_date: &str) -> String {
    let mut out = String::from("# Bitcoin Wallet Documentation\n\n");
    out.push_str(&format!(
        "{} wallet guide(s), updated {}\n\n",
        wallets.len(),
        generated_date
    ));
    out.push_str("| Wallet | Platform | Version | Steps | Last updated |\n");
    out.push_str("|--------|----------|---------|-------|--------------|\n");
    for w in wallets {
        out.push_str(&format!(
            "| [{}]({}) | {} | {} | {} | {} |\n",
            w.name,
            w.doc_path,
            w.platform,
            w.version.as_deref().unwrap_or(""),
            w.total_steps,
            w.last_updated
        ));
    }
    out.push('\n');
    for w in wallets.iter().filter(|w| !w.description.is_empty()) {
        out.push_str(&format!("- **{}**: {}\n", w.name, w.description.trim()));
    }
    out
}

/// Write `README.md` indexing every published guide; `None` when nothing is published
pub fn generate_index(output_root: &Path, config_root: &Path) -> DocsResult<Option<PathBuf>> {
    let wallets = collect_index(output_root, config_root)?;
    if wallets.is_empty() {
        info!("no published documentation to index");
        return Ok(None);
    }
    let path = output_root.join(INDEX_FILE);
    let date = Local::now().format("%Y-%m-%d").to_string();
    fs::write(&path, render_index(&wallets, &date))?;
    info!(wallets = wallets.len(), file = %path.display(), "updated index");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stage(root: &Path, wallet: &str) -> PathBuf {
        let dir = root.join("staging").join(wallet);
        fs::create_dir_all(dir.join("screenshots")).unwrap();
        fs::create_dir_all(dir.join("sections")).unwrap();
        fs::write(dir.join(GUIDE_FILE), "# Guide\n").unwrap();
        fs::write(dir.join("sections/setup.md"), "## Setup\n").unwrap();
        fs::write(dir.join("screenshots/setup_open.png"), b"png").unwrap();
        fs::write(dir.join("screenshots/setup_open_annotated.png"), b"png").unwrap();
        fs::write(dir.join("screenshots/stale.png"), b"png").unwrap();
        let meta = serde_json::json!({
            "generated_date": "2025-01-14",
            "total_steps": 1,
            "steps": [
                {"name": "Open", "screenshot_relative": "screenshots/setup_open_annotated.png"},
                {"name": "Skip", "screenshot_relative": null}
            ]
        });
        fs::write(dir.join(METADATA_FILE), meta.to_string()).unwrap();
        dir
    }

    #[test]
    fn test_list_staged_requires_guide() {
        let tmp = tempfile::tempdir().unwrap();
        stage(tmp.path(), "sparrow");
        fs::create_dir_all(tmp.path().join("staging/empty")).unwrap();
        let staged = list_staged(&tmp.path().join("staging")).unwrap();
        assert_eq!(staged, vec![tmp.path().join("staging/sparrow")]);
        assert!(list_staged(&tmp.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_referenced_screenshots() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = stage(tmp.path(), "sparrow");
        let used = referenced_screenshots(&dir.join(METADATA_FILE));
        assert_eq!(
            used.into_iter().collect::<Vec<_>>(),
            vec!["setup_open_annotated.png".to_string()]
        );
        assert!(referenced_screenshots(&dir.join("nope.json")).is_empty());
    }

    #[test]
    fn test_approve_copies_only_referenced_screenshots() {
        let tmp = tempfile::tempdir().unwrap();
        stage(tmp.path(), "sparrow");
        let report = approve("sparrow", &tmp.path().join("staging"), tmp.path()).unwrap();

        assert_eq!(report.screenshots_copied, 1);
        assert_eq!(report.screenshots_skipped, 2);
        let out = tmp.path().join("sparrow");
        assert!(out.join(GUIDE_FILE).exists());
        assert!(out.join(METADATA_FILE).exists());
        assert!(out.join("sections/setup.md").exists());
        assert!(out.join("screenshots/setup_open_annotated.png").exists());
        assert!(!out.join("screenshots/setup_open.png").exists());
        assert!(!out.join("screenshots/stale.png").exists());
    }

    #[test]
    fn test_approve_unknown_wallet() {
        let tmp = tempfile::tempdir().unwrap();
        let err = approve("ghost", &tmp.path().join("staging"), tmp.path()).unwrap_err();
        assert!(matches!(err, DocsError::NotStaged(w) if w == "ghost"));
    }

    #[test]
    fn test_generate_index() {
        let tmp = tempfile::tempdir().unwrap();
        stage(tmp.path(), "blind_bit");
        approve("blind_bit", &tmp.path().join("staging"), tmp.path()).unwrap();

        let configs = tmp.path().join("wallets");
        let readme = generate_index(tmp.path(), &configs).unwrap().unwrap();
        let text = fs::read_to_string(readme).unwrap();
        assert!(text.contains("| [Blind Bit](blind_bit/user-guide.md) |  |  | 1 | 2025-01-14 |"));
        assert!(!text.contains("staging"));
    }

    #[test]
    fn test_platform_labels() {
        assert_eq!(platform_label("macos"), "MacOS");
        assert_eq!(platform_label("ios"), "iOS");
        assert_eq!(platform_label("haiku"), "Haiku");
    }
}
