use anyhow::Result;
use sqlx::PgPool;
use time::{Date, OffsetDateTime};

use crate::domain::ConsumptionEntry;

#[derive(Debug, Clone, sqlx::FromRow)]
struct ConsumptionRow {
    id: i64,
    device_id: i64,
    date: Date,
    hours_used: f64,
    energy_kwh: f64,
    cost_lps: f64,
    created_at: OffsetDateTime,
}

impl From<ConsumptionRow> for ConsumptionEntry {
    fn from(r: ConsumptionRow) -> Self {
        ConsumptionEntry {
            id: r.id,
            device_id: r.device_id,
            date: r.date,
            hours_used: r.hours_used,
            energy_kwh: r.energy_kwh,
            cost_lps: r.cost_lps,
            created_at: r.created_at,
        }
    }
}

pub async fn insert_entry(
    pool: &PgPool,
    device_id: i64,
    date: Date,
    hours_used: f64,
    energy_kwh: f64,
    cost_lps: f64,
) -> Result<ConsumptionEntry> {
    let row = sqlx::query_as::<_, ConsumptionRow>(
        r#"
        INSERT INTO consumption_entries (device_id, date, hours_used, energy_kwh, cost_lps)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, device_id, date, hours_used, energy_kwh, cost_lps, created_at
        "#,
    )
    .bind(device_id)
    .bind(date)
    .bind(hours_used)
    .bind(energy_kwh)
    .bind(cost_lps)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Logged entries for one device, most recent first.
pub async fn entries_for_device(pool: &PgPool, device_id: i64) -> Result<Vec<ConsumptionEntry>> {
    let rows = sqlx::query_as::<_, ConsumptionRow>(
        r#"
        SELECT id, device_id, date, hours_used, energy_kwh, cost_lps, created_at
        FROM consumption_entries
        WHERE device_id = $1
        ORDER BY date DESC, id DESC
        "#,
    )
    .bind(device_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}
