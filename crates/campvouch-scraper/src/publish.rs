//! Snapshot publishing
//!
//! Writes the aggregated snapshot to a timestamped file — the durable record
//! of a run — and mirrors it to `latest.json` for polling consumers. Both
//! writes go through a temp-file-then-rename step so a crash mid-write can
//! never leave a truncated artifact; at worst `latest.json` lags one run
//! behind, which [`SnapshotPublisher::regenerate_latest`] repairs.

use crate::error::Result;
use campvouch_common::snapshot::Snapshot;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Prefix of timestamped snapshot files
const SNAPSHOT_PREFIX: &str = "stats_";

/// Writes snapshots into the data directory
pub struct SnapshotPublisher {
    data_dir: PathBuf,
}

impl SnapshotPublisher {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path of the mutable "latest" pointer artifact
    pub fn latest_path(&self) -> PathBuf {
        self.data_dir.join("latest.json")
    }

    /// Publish a snapshot: timestamped file first, then the latest pointer.
    /// Returns the path of the timestamped artifact.
    pub fn publish(&self, snapshot: &Snapshot) -> Result<PathBuf> {
        fs::create_dir_all(&self.data_dir)?;

        let json = serde_json::to_string_pretty(snapshot)?;

        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let timestamped = self
            .data_dir
            .join(format!("{SNAPSHOT_PREFIX}{stamp}.json"));

        write_atomic(&timestamped, &json)?;
        info!(path = %timestamped.display(), "Saved snapshot");

        write_atomic(&self.latest_path(), &json)?;
        info!("Updated latest.json");

        Ok(timestamped)
    }

    /// Recovery pass: rewrite `latest.json` from the newest timestamped
    /// snapshot. Returns the source path, or `None` when no snapshot exists.
    pub fn regenerate_latest(&self) -> Result<Option<PathBuf>> {
        let mut newest: Option<PathBuf> = None;

        if self.data_dir.is_dir() {
            for entry in fs::read_dir(&self.data_dir)? {
                let path = entry?.path();
                let name = match path.file_name().and_then(|n| n.to_str()) {
                    Some(name) => name,
                    None => continue,
                };
                if !name.starts_with(SNAPSHOT_PREFIX) || !name.ends_with(".json") {
                    continue;
                }
                // Timestamps sort lexicographically.
                if newest.as_ref().is_none_or(|cur| path > *cur) {
                    newest = Some(path);
                }
            }
        }

        let Some(source) = newest else {
            warn!(dir = %self.data_dir.display(), "No timestamped snapshot found, latest.json left untouched");
            return Ok(None);
        };

        let content = fs::read_to_string(&source)?;
        write_atomic(&self.latest_path(), &content)?;
        info!(source = %source.display(), "Regenerated latest.json");

        Ok(Some(source))
    }
}

/// Write `content` to a sibling temp file, then rename it into place
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)
}
