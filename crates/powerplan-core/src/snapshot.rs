// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of PowerPlan.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Result persistence: one timestamped snapshot per cycle plus an
//! atomically-replaced `latest.json` pointer file.

use anyhow::{Context, Result};
use powerplan_types::Solution;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const LATEST_FILE: &str = "latest.json";

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the timestamped snapshot, then replaces `latest.json` via a
    /// temp file and rename so readers never observe a half-written file.
    pub fn save(&self, solution: &Solution) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create snapshot dir {}", self.dir.display()))?;

        let json = serde_json::to_string_pretty(solution).context("failed to serialize plan")?;

        let name = format!(
            "result_{}.json",
            solution.generated_at.format("%Y%m%d_%H%M%S")
        );
        let path = self.dir.join(name);
        fs::write(&path, &json)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;

        let latest = self.dir.join(LATEST_FILE);
        let tmp = latest.with_extension("tmp");
        fs::write(&tmp, &json)
            .with_context(|| format!("failed to write temp file {}", tmp.display()))?;
        fs::rename(&tmp, &latest)
            .with_context(|| format!("failed to replace {}", latest.display()))?;

        info!(path = %path.display(), "plan snapshot stored");
        Ok(path)
    }

    /// `Ok(None)` when no cycle has ever completed; a corrupt pointer file
    /// is an error, not a silent reset.
    pub fn load_latest(&self) -> Result<Option<Solution>> {
        let latest = self.dir.join(LATEST_FILE);
        if !latest.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&latest)
            .with_context(|| format!("failed to read {}", latest.display()))?;
        let solution = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", latest.display()))?;
        Ok(Some(solution))
    }
}
