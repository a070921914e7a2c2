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

use crate::error::{EvsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One tariff slot, price in pence per kWh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub valid_from: DateTime<Utc>,
    pub price: f64,
}

/// Source of unit prices (the tariff database in production)
pub trait PriceSource: Send + Sync {
    /// Up to `count` points that started at or before `now`, newest first
    fn latest(&self, count: usize, now: DateTime<Utc>) -> anyhow::Result<Vec<PricePoint>>;
}

/// Most recent known unit price.
///
/// A lookup error, an empty result or a non-finite price are all reported as
/// [`EvsError::PriceUnavailable`] so callers never mistake a missing price for
/// one above the ceiling.
pub fn current_price(source: &dyn PriceSource, now: DateTime<Utc>) -> Result<f64> {
    let points = source
        .latest(1, now)
        .map_err(|e| EvsError::PriceUnavailable(format!("{e:#}")))?;

    let point = points
        .into_iter()
        .next()
        .ok_or_else(|| EvsError::PriceUnavailable("no price data at or before now".to_owned()))?;

    if !point.price.is_finite() {
        return Err(EvsError::PriceUnavailable(format!(
            "price for slot {} is not a number",
            point.valid_from
        )));
    }

    debug!("Price slot {} = {}p", point.valid_from, point.price);
    Ok(point.price)
}
