// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of evsched.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Schedule queue persistence

use crate::error::{EvsError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ordered queue of directive lines, head first
pub trait ScheduleStore: Send + Sync {
    /// Every line of the queue, terminators stripped
    fn load(&self) -> Result<Vec<String>>;

    /// Drop the head line and persist the rest unchanged
    fn consume_head(&self) -> Result<()>;
}

/// Plain text schedule file, one directive per line
#[derive(Debug, Clone)]
pub struct FileScheduleStore {
    path: PathBuf,
}

impl FileScheduleStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling of the schedule with `.tmp` appended to the full file name
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|source| EvsError::ScheduleIo {
            path: self.path.clone(),
            source,
        })
    }
}

impl ScheduleStore for FileScheduleStore {
    fn load(&self) -> Result<Vec<String>> {
        let content = self.read()?;
        Ok(content.lines().map(str::to_owned).collect())
    }

    fn consume_head(&self) -> Result<()> {
        let content = self.read()?;
        let rest = content.split_once('\n').map_or("", |(_, rest)| rest);

        let rewrite_error = |source| EvsError::ScheduleRewrite {
            path: self.path.clone(),
            source,
        };

        // Temp file + rename, so readers see the old or the new queue
        let temp_path = self.temp_path();
        std::fs::write(&temp_path, rest).map_err(rewrite_error)?;
        std::fs::rename(&temp_path, &self.path).map_err(rewrite_error)?;

        debug!(
            "Removed head directive from {}, {} line(s) left",
            self.path.display(),
            rest.lines().count()
        );
        Ok(())
    }
}
