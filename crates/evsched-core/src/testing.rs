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

//! In-memory collaborators for unit tests

use crate::devices::{ChargeCommand, Device, DeviceControl};
use crate::prices::{PricePoint, PriceSource};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) fn device(uuid: &str, status: &str) -> Device {
    Device {
        uuid: uuid.to_owned(),
        alias: format!("Charger {uuid}"),
        status: status.to_owned().into(),
    }
}

#[derive(Debug)]
pub(crate) struct FakePrices {
    prices: Vec<f64>,
    error: Option<String>,
    calls: AtomicUsize,
}

impl FakePrices {
    /// Newest first
    pub(crate) fn with_prices(prices: &[f64]) -> Self {
        Self {
            prices: prices.to_vec(),
            error: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            prices: Vec::new(),
            error: Some(message.to_owned()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PriceSource for FakePrices {
    fn latest(&self, count: usize, now: DateTime<Utc>) -> anyhow::Result<Vec<PricePoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = self.error {
            anyhow::bail!("{message}");
        }

        let slot = TimeDelta::minutes(30);
        Ok(self
            .prices
            .iter()
            .zip(0_i32..)
            .take(count)
            .map(|(price, age)| PricePoint {
                valid_from: now - slot * age,
                price: *price,
            })
            .collect())
    }
}

#[derive(Debug)]
pub(crate) struct FakeControl {
    devices: Vec<Device>,
    list_error: Option<String>,
    responses: HashMap<String, Value>,
    command_errors: HashMap<String, String>,
    list_calls: AtomicUsize,
    commands: Mutex<Vec<(String, ChargeCommand)>>,
}

impl FakeControl {
    pub(crate) fn new(devices: Vec<Device>) -> Self {
        Self {
            devices,
            list_error: None,
            responses: HashMap::new(),
            command_errors: HashMap::new(),
            list_calls: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_list(message: &str) -> Self {
        let mut control = Self::new(Vec::new());
        control.list_error = Some(message.to_owned());
        control
    }

    pub(crate) fn with_command_response(mut self, device_id: &str, body: Value) -> Self {
        self.responses.insert(device_id.to_owned(), body);
        self
    }

    pub(crate) fn with_command_error(mut self, device_id: &str, message: &str) -> Self {
        self.command_errors
            .insert(device_id.to_owned(), message.to_owned());
        self
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn commands(&self) -> Vec<(String, ChargeCommand)> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceControl for FakeControl {
    async fn list_devices(&self) -> anyhow::Result<Vec<Device>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        match self.list_error {
            Some(ref message) => anyhow::bail!("{message}"),
            None => Ok(self.devices.clone()),
        }
    }

    async fn send_command(
        &self,
        device_id: &str,
        command: ChargeCommand,
    ) -> anyhow::Result<Value> {
        self.commands
            .lock()
            .unwrap()
            .push((device_id.to_owned(), command));

        if let Some(message) = self.command_errors.get(device_id) {
            anyhow::bail!("{message}");
        }

        Ok(self
            .responses
            .get(device_id)
            .cloned()
            .unwrap_or_else(|| json!({"data": {"success": true, "message": "ok"}})))
    }
}
