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

//! SQLite tariff database.
//!
//! Prices live in a `prices` table keyed by slot start (`ts`, unix seconds)
//! with the unit price in pence per kWh. The database is filled by a separate
//! tariff importer; this crate only reads it, apart from [`SqlitePriceSource::store`]
//! which that importer and the tests use.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use evsched_core::{PricePoint, PriceSource};
use rusqlite::{Connection, OpenFlags, params};
use tracing::debug;

const CREATE_PRICES: &str = "CREATE TABLE IF NOT EXISTS prices (
    ts INTEGER PRIMARY KEY,
    price REAL NOT NULL
)";

#[derive(Debug, Clone)]
pub struct SqlitePriceSource {
    db_path: PathBuf,
}

impl SqlitePriceSource {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    /// Read-only, so a wrong path fails instead of creating an empty database
    fn connect(&self) -> Result<Connection> {
        Connection::open_with_flags(&self.db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open database at {}", self.db_path.display()))
    }

    /// Insert or replace price slots, creating the table if needed
    pub fn store(&self, points: &[PricePoint]) -> Result<usize> {
        let mut conn = Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open database at {}", self.db_path.display()))?;
        conn.execute(CREATE_PRICES, [])?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT OR REPLACE INTO prices (ts, price) VALUES (?1, ?2)")?;
            for point in points {
                stmt.execute(params![point.valid_from.timestamp(), point.price])?;
            }
        }
        tx.commit()?;

        Ok(points.len())
    }
}

impl PriceSource for SqlitePriceSource {
    fn latest(&self, count: usize, now: DateTime<Utc>) -> Result<Vec<PricePoint>> {
        let conn = self.connect()?;
        let limit = i64::try_from(count).unwrap_or(i64::MAX);

        let mut stmt = conn
            .prepare(
                "SELECT ts, price FROM prices
                 WHERE ts <= ?1
                 ORDER BY ts DESC
                 LIMIT ?2",
            )
            .context("Failed to query prices table")?;

        let points = stmt
            .query_map(params![now.timestamp(), limit], |row| {
                let ts: i64 = row.get(0)?;
                Ok(PricePoint {
                    valid_from: Utc.timestamp_opt(ts, 0).single().unwrap_or_default(),
                    price: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(
            "Loaded {} price point(s) from {}",
            points.len(),
            self.db_path.display()
        );
        Ok(points)
    }
}
