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

//! Log output setup.
//!
//! Without a log file everything goes to stdout. With one, records are
//! written through a [`SizeCappedWriter`] that empties the file once it
//! would grow past the cap, so a cron job never fills the disk. An optional
//! second file receives ERROR records only.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Append-only file writer that truncates once the next write would exceed the cap
#[derive(Debug)]
pub struct SizeCappedWriter {
    file: File,
    written: u64,
    max_bytes: u64,
}

impl SizeCappedWriter {
    pub fn open(path: &Path, max_bytes: u64) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            file,
            written,
            max_bytes,
        })
    }

    fn truncate(&mut self) -> io::Result<()> {
        self.file.set_len(0)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for SizeCappedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.max_bytes > 0
            && self.written > 0
            && self.written + buf.len() as u64 > self.max_bytes
        {
            self.truncate()?;
        }

        let written = self.file.write(buf)?;
        self.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Holds the background writer threads; logs are flushed when dropped
#[derive(Debug)]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// Install the global subscriber. Respects `RUST_LOG`, defaulting to `info`.
pub fn init_logging(
    log_file: Option<&Path>,
    error_file: Option<&Path>,
    max_bytes: u64,
) -> Result<LogGuards> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let mut guards = Vec::new();

    let main_layer = if let Some(path) = log_file {
        println!("Logging to {}", path.display());
        let writer = SizeCappedWriter::open(path, max_bytes)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(writer);
        guards.push(guard);
        fmt::layer()
            .with_ansi(false)
            .with_writer(non_blocking)
            .boxed()
    } else {
        fmt::layer().boxed()
    };

    let error_layer = match error_file {
        Some(path) => {
            println!("Logging errors to {}", path.display());
            let writer = SizeCappedWriter::open(path, max_bytes)
                .with_context(|| format!("Failed to open error log {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(writer);
            guards.push(guard);
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking)
                    .with_filter(LevelFilter::ERROR)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(main_layer)
        .with(error_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(LogGuards { _guards: guards })
}
