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

//! Optional TOML configuration

use chrono::{DateTime, Local, TimeDelta, Utc};
use chrono_tz::Tz;
use evsched_core::{DEFAULT_GRACE_MINUTES, EvsError, Now, Result};
use evsched_givenergy::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_10() -> u64 {
    10
}

fn default_grace() -> i64 {
    DEFAULT_GRACE_MINUTES
}

fn default_log_max_bytes() -> u64 {
    1024 * 1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Charger API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// HTTP timeout per request (seconds)
    #[serde(default = "default_10")]
    pub request_timeout_secs: u64,

    /// Minutes after a window's end in which it is still stopped and removed
    #[serde(default = "default_grace")]
    pub grace_minutes: i64,

    /// IANA timezone for window times; system local time when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Size cap of each log file (bytes); the file starts over when reached
    #[serde(default = "default_log_max_bytes")]
    pub log_max_bytes: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: 10,
            grace_minutes: DEFAULT_GRACE_MINUTES,
            timezone: None,
            log_max_bytes: default_log_max_bytes(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grace_minutes <= 0 || self.grace_minutes >= 24 * 60 {
            return Err(EvsError::Config(format!(
                "grace_minutes must be between 1 and 1439, got {}",
                self.grace_minutes
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(EvsError::Config(
                "request_timeout_secs must be positive".to_owned(),
            ));
        }
        self.zone()?;
        Ok(())
    }

    pub fn zone(&self) -> Result<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|e| EvsError::Config(format!("Unknown timezone '{name}': {e}")))
            })
            .transpose()
    }

    pub fn grace(&self) -> TimeDelta {
        TimeDelta::minutes(self.grace_minutes)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Evaluation instant in the configured timezone
    pub fn now(&self, instant: DateTime<Utc>) -> Result<Now> {
        Ok(match self.zone()? {
            Some(zone) => Now::in_zone(instant, &zone),
            None => Now::in_zone(instant, &Local),
        })
    }
}

/// Load the config file, or defaults when no file is given
pub fn load_config(path: Option<&Path>) -> Result<SchedulerConfig> {
    let config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                EvsError::Config(format!("Failed to read {}: {e}", path.display()))
            })?;
            toml::from_str(&content)
                .map_err(|e| EvsError::Config(format!("Failed to parse config: {e}")))?
        }
        None => SchedulerConfig::default(),
    };

    config.validate()?;
    Ok(config)
}
