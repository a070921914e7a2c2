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

use crate::decision::ChargeAction;
use crate::devices::{ChargeCommand, DeviceControl};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

/// Result of sending one command to one charger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub device_id: String,
    pub action: ChargeAction,
    pub succeeded: bool,
    /// Raw response body on a completed call, error text otherwise
    pub detail: String,
}

/// Send `action` to every device, one at a time.
///
/// A device failing never stops the remaining devices from being tried, and
/// nothing is retried. `NoAction` sends nothing.
pub async fn dispatch(
    control: &dyn DeviceControl,
    device_ids: &[String],
    action: ChargeAction,
) -> Vec<CommandOutcome> {
    let Some(command) = ChargeCommand::for_action(action) else {
        return Vec::new();
    };

    let mut outcomes = Vec::with_capacity(device_ids.len());
    for device_id in device_ids {
        let outcome = match control.send_command(device_id, command).await {
            Ok(body) => {
                let succeeded = body.pointer("/data/success").is_some_and(is_truthy);
                let detail = body.to_string();
                if succeeded {
                    info!("Command {} sent to {}. Response: {}", command, device_id, detail);
                } else {
                    error!(
                        "Failed to send command {} to {}. Response: {}",
                        command, device_id, detail
                    );
                }
                CommandOutcome {
                    device_id: device_id.clone(),
                    action,
                    succeeded,
                    detail,
                }
            }
            Err(e) => {
                error!(
                    "Failed to send command {} to {}. Error: {:#}",
                    command, device_id, e
                );
                CommandOutcome {
                    device_id: device_id.clone(),
                    action,
                    succeeded: false,
                    detail: format!("{e:#}"),
                }
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}

/// Loose truthiness of the API's success flag (`true`, `1`, `"ok"` all count)
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeControl, device};
    use serde_json::json;

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| (*id).to_owned()).collect()
    }

    #[tokio::test]
    async fn test_failure_on_one_device_does_not_stop_the_next() {
        let control = FakeControl::new(vec![device("a", "Charging"), device("b", "Charging")])
            .with_command_error("a", "connection reset by peer");

        let outcomes = dispatch(&control, &ids(&["a", "b"]), ChargeAction::Stop).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].device_id, "a");
        assert!(!outcomes[0].succeeded);
        assert!(outcomes[0].detail.contains("connection reset"));
        assert_eq!(outcomes[1].device_id, "b");
        assert!(outcomes[1].succeeded);
        assert_eq!(
            control.commands(),
            vec![
                ("a".to_owned(), ChargeCommand::StopCharge),
                ("b".to_owned(), ChargeCommand::StopCharge),
            ]
        );
    }

    #[tokio::test]
    async fn test_success_flag_must_be_truthy() {
        let control = FakeControl::new(Vec::new())
            .with_command_response("ok", json!({"data": {"success": true, "message": "queued"}}))
            .with_command_response("no", json!({"data": {"success": false}}))
            .with_command_response("missing", json!({"data": {}}))
            .with_command_response("flat", json!({"success": true}));

        let outcomes = dispatch(
            &control,
            &ids(&["ok", "no", "missing", "flat"]),
            ChargeAction::Start,
        )
        .await;

        let succeeded: Vec<bool> = outcomes.iter().map(|o| o.succeeded).collect();
        assert_eq!(succeeded, vec![true, false, false, false]);
        assert!(outcomes[0].detail.contains("queued"));
        assert!(outcomes.iter().all(|o| o.action == ChargeAction::Start));
    }

    #[tokio::test]
    async fn test_no_action_sends_nothing() {
        let control = FakeControl::new(Vec::new());
        let outcomes = dispatch(&control, &ids(&["a"]), ChargeAction::NoAction).await;
        assert!(outcomes.is_empty());
        assert!(control.commands().is_empty());
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!([])));
    }
}
