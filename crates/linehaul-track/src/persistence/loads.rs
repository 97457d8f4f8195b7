//! Load and status-history persistence operations.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use linehaul_core::models::{Coordinate, Load, LoadStatus, LoadStatusHistory, Stop, StopType};

/// Load all active loads with an assigned vehicle for one company,
/// with stops ordered by sequence.
pub async fn active_loads_with_vehicles(pool: &SqlitePool, company_id: &str) -> Result<Vec<Load>> {
    // The IN list comes from the status enum itself, never from input.
    let active: Vec<String> = LoadStatus::ALL
        .into_iter()
        .filter(LoadStatus::is_active)
        .map(|s| format!("'{}'", s.as_str()))
        .collect();
    let query = format!(
        r#"
        SELECT id, load_number, status, vehicle_id, total_miles, route_polyline
        FROM loads
        WHERE company_id = ?1
          AND status IN ({})
          AND vehicle_id IS NOT NULL
          AND deleted_at IS NULL
        "#,
        active.join(", ")
    );
    let rows = sqlx::query_as::<_, LoadRow>(&query)
        .bind(company_id)
        .fetch_all(pool)
        .await?;

    let mut loads = Vec::with_capacity(rows.len());
    for row in rows {
        let stops = load_stops(pool, &row.id).await?;
        loads.push(row.into_load(stops)?);
    }
    Ok(loads)
}

async fn load_stops(pool: &SqlitePool, load_id: &str) -> Result<Vec<Stop>> {
    let rows = sqlx::query_as::<_, StopRow>(
        r#"
        SELECT id, stop_type, sequence, city, state, address, lat, lng
        FROM stops WHERE load_id = ?1 ORDER BY sequence ASC
        "#,
    )
    .bind(load_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(|r| r.into_stop()).collect()
}

/// Atomically update a load's status and append the matching audit row.
/// Both writes commit together or not at all.
pub async fn apply_status_transition(
    pool: &SqlitePool,
    load_id: &str,
    status: LoadStatus,
    notes: &str,
    location: Option<Coordinate>,
    created_by: &str,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE loads SET status = ?1 WHERE id = ?2")
        .bind(status.as_str())
        .bind(load_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO load_status_history (id, load_id, status, notes, lat, lng, created_by, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(load_id)
    .bind(status.as_str())
    .bind(notes)
    .bind(location.map(|l| l.lat))
    .bind(location.map(|l| l.lng))
    .bind(created_by)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Audit rows for one load, oldest first.
pub async fn load_status_history(pool: &SqlitePool, load_id: &str) -> Result<Vec<LoadStatusHistory>> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        r#"
        SELECT id, load_id, status, notes, lat, lng, created_by, created_at
        FROM load_status_history WHERE load_id = ?1 ORDER BY created_at ASC
        "#,
    )
    .bind(load_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(|r| r.into_history()).collect()
}

/// Companies with an active telemetry integration.
pub async fn telemetry_enabled_companies(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT company_id FROM company_integrations WHERE provider = 'TELEMATICS' AND active = 1",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

// Internal row types for SQLx

#[derive(sqlx::FromRow)]
struct LoadRow {
    id: String,
    load_number: String,
    status: String,
    vehicle_id: Option<String>,
    total_miles: Option<f64>,
    route_polyline: Option<String>,
}

impl LoadRow {
    fn into_load(self, stops: Vec<Stop>) -> Result<Load> {
        let status: LoadStatus = self.status.parse()?;
        Ok(Load {
            id: self.id,
            load_number: self.load_number,
            status,
            vehicle_id: self.vehicle_id,
            total_miles: self.total_miles,
            route_polyline: self.route_polyline,
            stops,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StopRow {
    id: String,
    stop_type: String,
    sequence: i64,
    city: String,
    state: String,
    address: String,
    lat: Option<f64>,
    lng: Option<f64>,
}

impl StopRow {
    fn into_stop(self) -> Result<Stop> {
        let stop_type: StopType = self.stop_type.parse()?;
        Ok(Stop {
            id: self.id,
            stop_type,
            sequence: self.sequence,
            city: self.city,
            state: self.state,
            address: self.address,
            lat: self.lat,
            lng: self.lng,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: String,
    load_id: String,
    status: String,
    notes: String,
    lat: Option<f64>,
    lng: Option<f64>,
    created_by: String,
    created_at: String,
}

impl HistoryRow {
    fn into_history(self) -> Result<LoadStatusHistory> {
        let status: LoadStatus = self.status.parse()?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| anyhow!("bad created_at in history {}: {e}", self.id))?
            .with_timezone(&Utc);
        Ok(LoadStatusHistory {
            id: self.id,
            load_id: self.load_id,
            status,
            notes: self.notes,
            lat: self.lat,
            lng: self.lng,
            created_by: self.created_by,
            created_at,
        })
    }
}
