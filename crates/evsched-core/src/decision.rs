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

//! Charge decisions for the head directive
//!
//! The action and the queue consumption flag are produced together as one
//! [`Decision`]; nothing else decides when a window is consumed.

use crate::directive::ScheduleDirective;
use crate::error::{EvsError, Result};
use crate::prices::{PriceSource, current_price};
use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Minutes after a window's end during which a late run still stops and consumes it
pub const DEFAULT_GRACE_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeAction {
    Start,
    Stop,
    NoAction,
}

impl fmt::Display for ChargeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::NoAction => "no action",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: ChargeAction,
    /// Drop the head directive from the queue once this run is done
    pub consume: bool,
}

impl Decision {
    pub fn idle() -> Self {
        Self {
            action: ChargeAction::NoAction,
            consume: false,
        }
    }

    fn act(action: ChargeAction) -> Self {
        Self {
            action,
            consume: false,
        }
    }
}

/// The evaluation instant: UTC for price lookups, local time of day for windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Now {
    pub instant: DateTime<Utc>,
    pub time_of_day: NaiveTime,
}

impl Now {
    pub fn in_zone<Tz: TimeZone>(instant: DateTime<Utc>, zone: &Tz) -> Self {
        Self {
            instant,
            time_of_day: instant.with_timezone(zone).time(),
        }
    }
}

/// Decide what to do for the head directive at `now`.
///
/// Prices are only fetched for a price directive. `grace` is the tail after a
/// window's end in which the window is stopped and consumed.
pub fn evaluate(
    directive: Option<&ScheduleDirective>,
    prices: Option<&dyn PriceSource>,
    now: Now,
    grace: TimeDelta,
) -> Result<Decision> {
    match directive {
        None => {
            info!("No schedule");
            Ok(Decision::idle())
        }
        Some(&ScheduleDirective::PriceThreshold { ceiling_pence }) => {
            let source = prices.ok_or_else(|| {
                EvsError::PriceUnavailable("no price database provided".to_owned())
            })?;
            let price = current_price(source, now.instant)?;
            let decision = decide_price(ceiling_pence, price);

            let should_charge = decision.action == ChargeAction::Start;
            info!(
                "Current price {}p {} {}p, should{} charge",
                price,
                if should_charge { "<=" } else { ">" },
                ceiling_pence,
                if should_charge { "" } else { " not" }
            );
            Ok(decision)
        }
        Some(&ScheduleDirective::TimeWindow { start, end }) => {
            let decision = decide_window(start, end, now.time_of_day, grace);
            info!(
                "Window {}-{} at {}: {}{}",
                start.format("%H:%M"),
                end.format("%H:%M"),
                now.time_of_day.format("%H:%M:%S"),
                decision.action,
                if decision.consume {
                    ", window finished"
                } else {
                    ""
                }
            );
            Ok(decision)
        }
    }
}

/// Price rules start at or below the ceiling and stop above it. Never consumed.
pub fn decide_price(ceiling_pence: u32, price: f64) -> Decision {
    if price <= f64::from(ceiling_pence) {
        Decision::act(ChargeAction::Start)
    } else {
        Decision::act(ChargeAction::Stop)
    }
}

/// Time window rule.
///
/// Inside `[start, end]` charging runs. In the grace tail after `end` the window
/// is stopped and consumed. The tail is measured on the same day as `end` and
/// does not wrap past midnight.
pub fn decide_window(
    start: NaiveTime,
    end: NaiveTime,
    now: NaiveTime,
    grace: TimeDelta,
) -> Decision {
    if start <= now && now <= end {
        return Decision::act(ChargeAction::Start);
    }

    if end < now && now.signed_duration_since(end) < grace {
        return Decision {
            action: ChargeAction::Stop,
            consume: true,
        };
    }

    Decision::idle()
}
