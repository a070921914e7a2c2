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

//! Error types for a schedule evaluation run

use crate::directive::DirectiveParseError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvsError {
    #[error("failed to read schedule {}: {source}", path.display())]
    ScheduleIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schedule directive: {0}")]
    Parse(#[from] DirectiveParseError),

    #[error("price unavailable: {0}")]
    PriceUnavailable(String),

    #[error("device listing failed: {0}")]
    DeviceListing(String),

    #[error("failed to rewrite schedule {}: {source}", path.display())]
    ScheduleRewrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EvsError>;
