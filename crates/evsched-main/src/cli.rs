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

//! CLI argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "evsched")]
#[command(author, version, about = "Start or stop EV charging from a schedule file")]
#[command(
    long_about = "Evaluates the first line of a schedule file and starts or stops EV charging.\n\
    \nRun it from cron or a systemd timer every few minutes.\n\
    \nSchedule lines:\n  \
    15p          charge while the unit price is at or below 15p\n  \
    9-17         charge between 09:00 and 17:00\n  \
    22:30-23:45  minutes are optional, ':' or '.' separate them\n\
    \nA time window is removed from the file once it has finished."
)]
pub struct Cli {
    /// API key for the charger cloud API
    #[arg(short = 'k', long, alias = "api_key", env = "EVSCHED_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// UUID of the charger to control. If omitted, every eligible charger is controlled
    #[arg(short = 'c', long, alias = "charger_uuid")]
    pub charger_uuid: Option<String>,

    /// The schedule file
    #[arg(short = 'f', long, default_value = "schedule.txt")]
    pub file: PathBuf,

    /// The price database, required for price directives
    #[arg(short = 'd', long)]
    pub database: Option<PathBuf>,

    /// Log file. If provided, logs go here instead of stdout
    #[arg(short = 'l', long)]
    pub log: Option<PathBuf>,

    /// Additional log file receiving errors only
    #[arg(short = 'e', long)]
    pub error: Option<PathBuf>,

    /// Optional TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Decide and log without sending commands or editing the schedule
    #[arg(long)]
    pub dry_run: bool,
}
