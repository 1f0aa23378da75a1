//! Capture sessions.
//!
//! A session is one automation run. Its id stamps the exported metadata and its
//! directory receives every screenshot the run captures:
//! - Ids are local timestamps (`20250114_093012`)
//! - Screenshot files are named `<section>_<step>.png` after sanitizing both parts
//! - `.session.json` records when and for which wallet the run happened

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Maximum length of one sanitized filename component
pub const MAX_NAME_LEN: usize = 50;

/// One automation run and the directory its screenshots land in
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session ID
    pub id: String,
    /// When the session was created
    pub started: DateTime<Local>,
    /// Screenshot directory for this run
    pub dir: PathBuf,
}

impl Session {
    /// Create a session writing into `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let started = Local::now();
        Self {
            id: session_id(&started),
            started,
            dir: dir.into(),
        }
    }

    /// Point an existing session at a different directory
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Create the session directory and its metadata file
    pub fn init(&self, wallet: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let metadata = serde_json::json!({
            "id": self.id,
            "wallet": wallet,
            "created": self.started.to_rfc3339(),
        });
        let metadata_path = self.dir.join(".session.json");
        fs::write(metadata_path, serde_json::to_string_pretty(&metadata)?)?;

        Ok(())
    }

    /// Where the screenshot for a step is written
    pub fn screenshot_path(&self, section: Option<&str>, step_name: &str) -> PathBuf {
        self.dir.join(screenshot_filename(section, step_name))
    }

    /// List all PNG files in the session directory
    pub fn list_captures(&self) -> std::io::Result<Vec<PathBuf>> {
        list_pngs(&self.dir)
    }
}

fn session_id(at: &DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Lowercase, replace spaces and slashes with `_`, keep at most 50 characters
pub fn sanitize_filename(name: &str) -> String {
    name.to_lowercase()
        .replace([' ', '/'], "_")
        .chars()
        .take(MAX_NAME_LEN)
        .collect()
}

/// `<section>_<step>.png`, or `<step>.png` when the step has no section
pub fn screenshot_filename(section: Option<&str>, step_name: &str) -> String {
    match section {
        Some(section) => format!(
            "{}_{}.png",
            sanitize_filename(section),
            sanitize_filename(step_name)
        ),
        None => format!("{}.png", sanitize_filename(step_name)),
    }
}

fn list_pngs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut captures = Vec::new();
    if dir.exists() {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "png").unwrap_or(false) {
                captures.push(path);
            }
        }
    }
    captures.sort();
    Ok(captures)
}
