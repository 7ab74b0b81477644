//! SQLite snapshot log for Seawatch.
//!
//! # What is stored
//!
//! One summary row per published snapshot:
//!
//! - `cycle`, `ts`: refresh cycle number and generation time (Unix seconds)
//! - `latitude`, `longitude`: the evaluated position
//! - `overall_status`, `environmental_risk`, `data_source`: wire labels
//! - `vessels_found`, `collision_alerts`, `closest_vessel_km`: counts
//!
//! Vessel lists are not stored. The log is best effort: the monitor keeps
//! working when writes fail, and nothing in the refresh path reads from it
//! except the start-up seed of the last known position.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::model::{Position, SafetySnapshot};

/// A logged snapshot summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub cycle: u64,
    pub generated_at: DateTime<Utc>,
    pub position: Position,
    pub overall_status: String,
    pub environmental_risk: String,
    pub data_source: String,
    pub vessels_found: u64,
    pub collision_alerts: u64,
    pub closest_vessel_km: f64,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Create a new storage instance and initialize the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:seawatch.db" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Every in-memory connection is its own database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    async fn initialize_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS snapshot_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cycle INTEGER NOT NULL,
                ts INTEGER NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                overall_status TEXT NOT NULL,
                environmental_risk TEXT NOT NULL,
                data_source TEXT NOT NULL,
                vessels_found INTEGER NOT NULL,
                collision_alerts INTEGER NOT NULL,
                closest_vessel_km REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_snapshot_log_ts
            ON snapshot_log(ts)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append a snapshot summary to the log.
    pub async fn record_snapshot(&self, snapshot: &SafetySnapshot) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO snapshot_log (
                cycle, ts, latitude, longitude, overall_status, environmental_risk,
                data_source, vessels_found, collision_alerts, closest_vessel_km
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(snapshot.cycle as i64)
        .bind(snapshot.generated_at.timestamp())
        .bind(snapshot.position.latitude)
        .bind(snapshot.position.longitude)
        .bind(snapshot.overall_status.label())
        .bind(snapshot.environmental.risk_tier.label())
        .bind(snapshot.data_source.as_str())
        .bind(snapshot.vessels_found as i64)
        .bind(snapshot.collision_alert_count as i64)
        .bind(snapshot.closest_vessel_distance_km)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent log records, newest first.
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum number of records to return
    pub async fn recent_snapshots(&self, limit: u32) -> anyhow::Result<Vec<SnapshotRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT cycle, ts, latitude, longitude, overall_status, environmental_risk,
                   data_source, vessels_found, collision_alerts, closest_vessel_km
            FROM snapshot_log
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let ts: i64 = row.get("ts");
                let generated_at = Utc
                    .timestamp_opt(ts, 0)
                    .single()
                    .ok_or_else(|| anyhow::anyhow!("invalid timestamp {} in snapshot log", ts))?;
                let cycle: i64 = row.get("cycle");
                let vessels_found: i64 = row.get("vessels_found");
                let collision_alerts: i64 = row.get("collision_alerts");

                Ok(SnapshotRecord {
                    cycle: cycle.max(0) as u64,
                    generated_at,
                    position: Position::new(row.get("latitude"), row.get("longitude")),
                    overall_status: row.get("overall_status"),
                    environmental_risk: row.get("environmental_risk"),
                    data_source: row.get("data_source"),
                    vessels_found: vessels_found.max(0) as u64,
                    collision_alerts: collision_alerts.max(0) as u64,
                    closest_vessel_km: row.get("closest_vessel_km"),
                })
            })
            .collect()
    }

    /// Position of the most recently logged snapshot, if any.
    pub async fn last_known_position(&self) -> anyhow::Result<Option<Position>> {
        let row = sqlx::query(
            r#"
            SELECT latitude, longitude
            FROM snapshot_log
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|r| Position::new(r.get("latitude"), r.get("longitude")))
            .filter(Position::is_valid))
    }
}
