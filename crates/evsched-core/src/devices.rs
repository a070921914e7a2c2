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

//! Chargers as reported by the remote control API, and target selection

use crate::decision::ChargeAction;
use crate::error::{EvsError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Connector state reported by the charger (OCPP status names)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceStatus {
    Preparing,
    SuspendedEvse,
    Charging,
    Other(String),
}

impl DeviceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Preparing => "Preparing",
            Self::SuspendedEvse => "SuspendedEVSE",
            Self::Charging => "Charging",
            Self::Other(status) => status,
        }
    }

    /// Whether a charger in this state can usefully receive `action`
    pub fn accepts(&self, action: ChargeAction) -> bool {
        match action {
            ChargeAction::Start => matches!(self, Self::Preparing | Self::SuspendedEvse),
            ChargeAction::Stop => matches!(self, Self::Charging),
            ChargeAction::NoAction => false,
        }
    }
}

impl From<String> for DeviceStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "Preparing" => Self::Preparing,
            "SuspendedEVSE" => Self::SuspendedEvse,
            "Charging" => Self::Charging,
            _ => Self::Other(status),
        }
    }
}

impl From<DeviceStatus> for String {
    fn from(status: DeviceStatus) -> Self {
        match status {
            DeviceStatus::Other(status) => status,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub uuid: String,
    #[serde(default)]
    pub alias: String,
    pub status: DeviceStatus,
}

/// Remote charger command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChargeCommand {
    StartCharge,
    StopCharge,
}

impl ChargeCommand {
    pub fn for_action(action: ChargeAction) -> Option<Self> {
        match action {
            ChargeAction::Start => Some(Self::StartCharge),
            ChargeAction::Stop => Some(Self::StopCharge),
            ChargeAction::NoAction => None,
        }
    }

    /// Path segment used by the charger API
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartCharge => "start-charge",
            Self::StopCharge => "stop-charge",
        }
    }
}

impl fmt::Display for ChargeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote charger control API
#[async_trait]
pub trait DeviceControl: Send + Sync {
    /// Snapshot of every charger on the account
    async fn list_devices(&self) -> anyhow::Result<Vec<Device>>;

    /// Send a command and return the decoded response body
    async fn send_command(
        &self,
        device_id: &str,
        command: ChargeCommand,
    ) -> anyhow::Result<serde_json::Value>;
}

/// Pick the chargers to act on.
///
/// An explicit device id is returned as-is without looking at its status.
/// Otherwise only chargers whose status accepts `action` are kept; an empty
/// result means there is nothing to do.
pub async fn resolve_targets(
    control: &dyn DeviceControl,
    action: ChargeAction,
    explicit_device: Option<&str>,
) -> Result<Vec<String>> {
    if let Some(device_id) = explicit_device {
        debug!("Using explicit charger {}", device_id);
        return Ok(vec![device_id.to_owned()]);
    }

    let devices = control
        .list_devices()
        .await
        .map_err(|e| EvsError::DeviceListing(format!("{e:#}")))?;

    let mut targets = Vec::new();
    for device in devices {
        if device.status.accepts(action) {
            targets.push(device.uuid);
        } else {
            info!(
                "Skipping charger {} (UUID: {}) - Status: {}",
                device.alias, device.uuid, device.status
            );
        }
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeControl, device};

    fn mixed_fleet() -> FakeControl {
        FakeControl::new(vec![
            device("a", "Preparing"),
            device("b", "SuspendedEVSE"),
            device("c", "Charging"),
            device("d", "Available"),
            device("e", "SuspendedEV"),
            device("f", "Faulted"),
        ])
    }

    #[test]
    fn test_status_from_api_strings() {
        assert_eq!(
            DeviceStatus::from("SuspendedEVSE".to_owned()),
            DeviceStatus::SuspendedEvse
        );
        assert_eq!(
            DeviceStatus::from("Finishing".to_owned()),
            DeviceStatus::Other("Finishing".to_owned())
        );
        assert_eq!(String::from(DeviceStatus::SuspendedEvse), "SuspendedEVSE");
    }

    #[test]
    fn test_device_deserializes_from_api_shape() {
        let device: Device = serde_json::from_value(serde_json::json!({
            "uuid": "9e1f",
            "alias": "Driveway",
            "status": "Charging",
            "serial_number": "GE123",
        }))
        .unwrap();
        assert_eq!(device.status, DeviceStatus::Charging);
        assert_eq!(device.alias, "Driveway");
    }

    #[test]
    fn test_command_path_segments() {
        assert_eq!(
            ChargeCommand::for_action(ChargeAction::Start).map(ChargeCommand::as_str),
            Some("start-charge")
        );
        assert_eq!(
            ChargeCommand::for_action(ChargeAction::Stop).map(ChargeCommand::as_str),
            Some("stop-charge")
        );
        assert_eq!(ChargeCommand::for_action(ChargeAction::NoAction), None);
    }

    #[tokio::test]
    async fn test_start_selects_preparing_and_suspended_evse() {
        let control = mixed_fleet();
        let targets = resolve_targets(&control, ChargeAction::Start, None)
            .await
            .unwrap();
        assert_eq!(targets, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_stop_selects_charging_only() {
        let control = mixed_fleet();
        let targets = resolve_targets(&control, ChargeAction::Stop, None)
            .await
            .unwrap();
        assert_eq!(targets, vec!["c"]);
    }

    #[tokio::test]
    async fn test_explicit_device_bypasses_status_filter() {
        let control = mixed_fleet();
        let targets = resolve_targets(&control, ChargeAction::Stop, Some("f"))
            .await
            .unwrap();
        assert_eq!(targets, vec!["f"]);
        assert_eq!(control.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_nothing_eligible_is_empty_not_error() {
        let control = FakeControl::new(vec![device("a", "Available")]);
        let targets = resolve_targets(&control, ChargeAction::Start, None)
            .await
            .unwrap();
        assert!(targets.is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure() {
        let control = FakeControl::failing_list("401 Unauthorized");
        let result = resolve_targets(&control, ChargeAction::Start, None).await;
        assert!(matches!(result, Err(EvsError::DeviceListing(_))));
    }
}
