use anyhow::Result;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::domain::{Device, DeviceCategory, DevicePatch, NewDevice};

const DEVICE_COLUMNS: &str = "id, user_id, name, power_watts, category, daily_use_hours, created_at";

#[derive(Debug, Clone, sqlx::FromRow)]
struct DeviceRow {
    id: i64,
    user_id: i64,
    name: String,
    power_watts: Option<f64>,
    category: String,
    daily_use_hours: f64,
    created_at: OffsetDateTime,
}

impl From<DeviceRow> for Device {
    fn from(r: DeviceRow) -> Self {
        Device {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            // Rows written by older revisions may carry labels outside the
            // closed set; map those to Other instead of failing the read.
            category: DeviceCategory::parse_lenient(&r.category),
            power_watts: r.power_watts,
            daily_use_hours: r.daily_use_hours,
            created_at: r.created_at,
        }
    }
}

pub async fn insert_device(pool: &PgPool, new: &NewDevice) -> Result<Device> {
    let row = sqlx::query_as::<_, DeviceRow>(
        r#"
        INSERT INTO devices (user_id, name, power_watts, category, daily_use_hours)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, name, power_watts, category, daily_use_hours, created_at
        "#,
    )
    .bind(new.user_id)
    .bind(&new.name)
    .bind(new.power_watts)
    .bind(new.category.label())
    .bind(new.daily_use_hours)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

pub async fn device_by_id(pool: &PgPool, id: i64) -> Result<Option<Device>> {
    let row = sqlx::query_as::<_, DeviceRow>(&format!(
        "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}

/// All devices owned by a user, oldest first.
pub async fn devices_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<Device>> {
    let rows = sqlx::query_as::<_, DeviceRow>(&format!(
        "SELECT {DEVICE_COLUMNS} FROM devices WHERE user_id = $1 ORDER BY created_at, id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Apply a sparse patch; untouched fields keep their stored value.
///
/// Returns the updated device, or `None` when the id does not exist. The
/// caller must not pass an empty patch.
pub async fn update_device(pool: &PgPool, id: i64, patch: &DevicePatch) -> Result<Option<Device>> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE devices SET ");
    let mut sets = builder.separated(", ");

    if let Some(name) = &patch.name {
        sets.push("name = ");
        sets.push_bind_unseparated(name.clone());
    }
    if let Some(power) = patch.power_watts {
        sets.push("power_watts = ");
        sets.push_bind_unseparated(power);
    }
    if let Some(category) = patch.category {
        sets.push("category = ");
        sets.push_bind_unseparated(category.label());
    }
    if let Some(hours) = patch.daily_use_hours {
        sets.push("daily_use_hours = ");
        sets.push_bind_unseparated(hours);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING id, user_id, name, power_watts, category, daily_use_hours, created_at");

    let row = builder
        .build_query_as::<DeviceRow>()
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Into::into))
}

/// Delete a device together with its consumption entries.
///
/// The schema also carries ON DELETE CASCADE; deleting the entries explicitly
/// keeps the invariant visible and independent of the deployed schema
/// revision. Returns false when the id does not exist.
pub async fn delete_device(pool: &PgPool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM consumption_entries WHERE device_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM devices WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(deleted > 0)
}
