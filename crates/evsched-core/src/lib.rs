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

//! evsched core - one-shot evaluation of an EV charging schedule
//!
//! Each invocation reads the head directive of a schedule queue, decides whether
//! chargers should be charging right now, sends start/stop commands to the
//! eligible chargers and, once a time window has closed, drops it from the queue.
//! The charger API and the price database sit behind the [`DeviceControl`] and
//! [`PriceSource`] traits.

pub mod decision;
pub mod devices;
pub mod directive;
pub mod dispatch;
pub mod error;
pub mod prices;
pub mod runner;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use decision::{ChargeAction, DEFAULT_GRACE_MINUTES, Decision, Now, evaluate};
pub use devices::{ChargeCommand, Device, DeviceControl, DeviceStatus, resolve_targets};
pub use directive::{DirectiveParseError, ScheduleDirective, parse_head, parse_line};
pub use dispatch::{CommandOutcome, dispatch};
pub use error::{EvsError, Result};
pub use prices::{PricePoint, PriceSource, current_price};
pub use runner::{Evaluator, RunOptions, RunReport};
pub use store::{FileScheduleStore, ScheduleStore};
