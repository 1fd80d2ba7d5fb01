use async_trait::async_trait;
use device_client::db::{consumption_queries, device_queries, session_queries};
use device_client::domain::{ConsumptionEntry, Device, DevicePatch, NewDevice};
use sqlx::PgPool;
use time::Date;

use crate::api::auth::IdentityResolver;
use crate::devices::DeviceStore;

/// Production [`DeviceStore`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PgDeviceStore {
    pool: PgPool,
}

impl PgDeviceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceStore for PgDeviceStore {
    async fn insert_device(&self, new: NewDevice) -> anyhow::Result<Device> {
        device_queries::insert_device(&self.pool, &new).await
    }

    async fn device_by_id(&self, id: i64) -> anyhow::Result<Option<Device>> {
        device_queries::device_by_id(&self.pool, id).await
    }

    async fn devices_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Device>> {
        device_queries::devices_by_user(&self.pool, user_id).await
    }

    async fn update_device(&self, id: i64, patch: DevicePatch) -> anyhow::Result<Option<Device>> {
        device_queries::update_device(&self.pool, id, &patch).await
    }

    async fn delete_device(&self, id: i64) -> anyhow::Result<bool> {
        device_queries::delete_device(&self.pool, id).await
    }

    async fn insert_entry(
        &self,
        device_id: i64,
        date: Date,
        hours_used: f64,
        energy_kwh: f64,
        cost_lps: f64,
    ) -> anyhow::Result<ConsumptionEntry> {
        consumption_queries::insert_entry(&self.pool, device_id, date, hours_used, energy_kwh, cost_lps)
            .await
    }

    async fn entries_for_device(&self, device_id: i64) -> anyhow::Result<Vec<ConsumptionEntry>> {
        consumption_queries::entries_for_device(&self.pool, device_id).await
    }
}

/// Resolves bearer tokens against the sessions table written by the account
/// service.
#[derive(Clone)]
pub struct SessionIdentityResolver {
    pool: PgPool,
}

impl SessionIdentityResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityResolver for SessionIdentityResolver {
    async fn resolve(&self, token: &str) -> anyhow::Result<Option<i64>> {
        session_queries::user_id_for_token(&self.pool, token).await
    }
}
