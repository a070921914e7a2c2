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

//! evsched - one-shot EV charging schedule evaluator.
//!
//! Meant to be invoked periodically. Each run reads the head of the
//! schedule file, decides whether chargers should start or stop and sends
//! the commands. Evaluation failures are logged and the process still
//! exits successfully so the scheduler keeps calling it.

mod cli;
mod config;
mod logging;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use evsched_core::{ChargeAction, Evaluator, FileScheduleStore, PriceSource, RunOptions, RunReport};
use evsched_givenergy::GivEnergyClient;
use evsched_prices::SqlitePriceSource;
use tracing::{debug, error, info};

use cli::Cli;
use config::SchedulerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;
    let _log_guards =
        logging::init_logging(cli.log.as_deref(), cli.error.as_deref(), config.log_max_bytes)?;

    debug!("evsched {} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&cli, &config).await {
        error!("Error processing schedule: {e:#}");
    }

    Ok(())
}

async fn run(cli: &Cli, config: &SchedulerConfig) -> Result<()> {
    let client = GivEnergyClient::new(
        config.api_base_url.as_str(),
        cli.api_key.as_str(),
        config.request_timeout(),
    )?;
    let store = FileScheduleStore::new(&cli.file);
    let prices = cli.database.as_deref().map(SqlitePriceSource::new);

    let options = RunOptions {
        explicit_device: cli.charger_uuid.clone(),
        grace: config.grace(),
        dry_run: cli.dry_run,
    };
    let now = config.now(Utc::now())?;

    let evaluator = Evaluator::new(
        &store,
        prices.as_ref().map(|p| p as &dyn PriceSource),
        &client,
        options,
    );
    let report = evaluator.run_once(now).await?;
    log_summary(&report);

    Ok(())
}

fn log_summary(report: &RunReport) {
    match (&report.directive, report.decision.action) {
        (None, _) => {}
        (Some(directive), ChargeAction::NoAction) => {
            debug!("Directive {} requires no action", directive);
        }
        (Some(_), action) => {
            info!(
                "Run finished: {} on {} charger(s), {} failed, directive consumed: {}",
                action,
                report.targets.len(),
                report.failed_commands(),
                report.consumed
            );
        }
    }

    if let Ok(json) = serde_json::to_string(report) {
        debug!("Run report: {}", json);
    }
}
