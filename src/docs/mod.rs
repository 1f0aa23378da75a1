//! Guide generation and publication.
//!
//! Layout of one guide directory (staging or published):
//!
//! | Path | Written by |
//! |------|------------|
//! | `user-guide.md` | [`generate`] or [`markdown::rebuild_master`] |
//! | `sections/<name>.md` | [`markdown::generate_sections`] |
//! | `screenshots/` | the workflow runner and annotation engine |
//! | `metadata.json` | [`metadata::write_metadata`] |
//!
//! [`publish::approve`] mirrors a staged directory into the published tree.

pub mod markdown;
pub mod metadata;
pub mod publish;

pub use markdown::{generate_sections, rebuild_master, render_guide, render_section};
pub use metadata::{GuideData, StepData, write_metadata};
pub use publish::{
    IndexEntry, PublishReport, approve, collect_index, generate_index, list_staged,
    referenced_screenshots,
};

use chrono::Local;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::project::WalletConfig;
use crate::workflow::Step;

pub const GUIDE_FILE: &str = "user-guide.md";
pub const METADATA_FILE: &str = "metadata.json";
pub const INDEX_FILE: &str = "README.md";
pub const SECTIONS_DIR: &str = "sections";
pub const SCREENSHOTS_DIR: &str = "screenshots";

/// Result type for documentation operations
pub type DocsResult<T> = Result<T, DocsError>;

/// Error types for documentation operations
#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Wallet not found in staging: {0}")]
    NotStaged(String),
}

/// Write the guide and its metadata sidecar.
///
/// With `sections_only`, only those section files are regenerated and the master
/// guide is rebuilt from every section file on disk.
pub fn generate<'a>(
    config: &WalletConfig,
    steps: impl IntoIterator<Item = &'a Step>,
    staging: bool,
    sections_only: Option<&[String]>,
) -> DocsResult<PathBuf> {
    let output_dir = if staging {
        &config.staging_dir
    } else {
        &config.output_dir
    };
    fs::create_dir_all(output_dir)?;

    let date = Local::now().format("%Y-%m-%d").to_string();
    let data = GuideData::prepare(config, steps, output_dir, date);

    let guide = match sections_only {
        Some(sections) if !sections.is_empty() => {
            generate_sections(config, &data, output_dir, sections)?;
            rebuild_master(config, output_dir, &data)?
        }
        _ => {
            let path = output_dir.join(GUIDE_FILE);
            fs::write(&path, render_guide(&data, config))?;
            path
        }
    };

    write_metadata(output_dir, &data)?;
    info!(guide = %guide.display(), steps = data.total_steps, "documentation generated");
    Ok(guide)
}
