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

//! One evaluation run: load, parse, decide, resolve, dispatch, consume

use crate::decision::{ChargeAction, DEFAULT_GRACE_MINUTES, Decision, Now, evaluate};
use crate::devices::{DeviceControl, resolve_targets};
use crate::directive::{ScheduleDirective, parse_head};
use crate::dispatch::{CommandOutcome, dispatch};
use crate::error::Result;
use crate::prices::PriceSource;
use crate::store::ScheduleStore;
use chrono::TimeDelta;
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Act on this charger only, whatever its status
    pub explicit_device: Option<String>,
    pub grace: TimeDelta,
    /// Decide and log, but send nothing and leave the queue alone
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            explicit_device: None,
            grace: TimeDelta::minutes(DEFAULT_GRACE_MINUTES),
            dry_run: false,
        }
    }
}

/// What a run did
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub directive: Option<ScheduleDirective>,
    pub decision: Decision,
    pub targets: Vec<String>,
    pub outcomes: Vec<CommandOutcome>,
    /// The head directive was removed from the queue
    pub consumed: bool,
}

impl RunReport {
    fn idle(directive: Option<ScheduleDirective>, decision: Decision) -> Self {
        Self {
            directive,
            decision,
            targets: Vec::new(),
            outcomes: Vec::new(),
            consumed: false,
        }
    }

    pub fn failed_commands(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }
}

/// Wires the collaborators of a single run together
pub struct Evaluator<'a> {
    store: &'a dyn ScheduleStore,
    prices: Option<&'a dyn PriceSource>,
    control: &'a dyn DeviceControl,
    options: RunOptions,
}

impl std::fmt::Debug for Evaluator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("has_prices", &self.prices.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> Evaluator<'a> {
    pub fn new(
        store: &'a dyn ScheduleStore,
        prices: Option<&'a dyn PriceSource>,
        control: &'a dyn DeviceControl,
        options: RunOptions,
    ) -> Self {
        Self {
            store,
            prices,
            control,
            options,
        }
    }

    /// Evaluate the head directive at `now` and act on it.
    ///
    /// Errors end the run before any command is sent: unreadable or malformed
    /// schedule, unavailable price, failed charger listing. Individual command
    /// failures are reported in [`RunReport::outcomes`] instead, and do not
    /// prevent a finished window from being consumed. A failed rewrite is
    /// logged and reported as `consumed: false`; the next run retries it.
    pub async fn run_once(&self, now: Now) -> Result<RunReport> {
        let lines = self.store.load()?;
        let directive = parse_head(&lines)?;
        if let Some(ref directive) = directive {
            info!("Active directive: {}", directive);
        }

        let decision = evaluate(directive.as_ref(), self.prices, now, self.options.grace)?;
        if decision.action == ChargeAction::NoAction {
            return Ok(RunReport::idle(directive, decision));
        }

        let targets = resolve_targets(
            self.control,
            decision.action,
            self.options.explicit_device.as_deref(),
        )
        .await?;

        let outcomes = if targets.is_empty() {
            info!("No available chargers to control");
            Vec::new()
        } else if self.options.dry_run {
            info!(
                "Dry run: would {} charging on {}",
                decision.action,
                targets.join(", ")
            );
            Vec::new()
        } else {
            dispatch(self.control, &targets, decision.action).await
        };

        let mut report = RunReport {
            directive,
            decision,
            targets,
            outcomes,
            consumed: false,
        };

        if report.failed_commands() > 0 {
            warn!(
                "{}/{} charger command(s) failed",
                report.failed_commands(),
                report.outcomes.len()
            );
        }

        if decision.consume {
            if self.options.dry_run {
                info!("Dry run: leaving finished window in the schedule");
            } else {
                match self.store.consume_head() {
                    Ok(()) => {
                        info!("Finished window removed from the schedule");
                        report.consumed = true;
                    }
                    Err(e) => error!("Error updating schedule: {}", e),
                }
            }
        }

        Ok(report)
    }
}
