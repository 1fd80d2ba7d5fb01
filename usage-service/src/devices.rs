use std::sync::Arc;

use async_trait::async_trait;
use device_client::domain::{
    ConsumptionEntry, Device, DeviceCategory, DevicePatch, NewDevice, DEFAULT_DAILY_USE_HOURS,
};
use time::Date;
use tracing::{debug, info};

use crate::consumption;
use crate::error::{ServiceError, ServiceResult};

/// Storage collaborator for devices and their consumption entries.
///
/// Deleting a device must also remove its consumption entries.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn insert_device(&self, new: NewDevice) -> anyhow::Result<Device>;
    async fn device_by_id(&self, id: i64) -> anyhow::Result<Option<Device>>;
    async fn devices_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Device>>;
    async fn update_device(&self, id: i64, patch: DevicePatch) -> anyhow::Result<Option<Device>>;
    async fn delete_device(&self, id: i64) -> anyhow::Result<bool>;
    async fn insert_entry(
        &self,
        device_id: i64,
        date: Date,
        hours_used: f64,
        energy_kwh: f64,
        cost_lps: f64,
    ) -> anyhow::Result<ConsumptionEntry>;
    async fn entries_for_device(&self, device_id: i64) -> anyhow::Result<Vec<ConsumptionEntry>>;
}

/// Fields accepted when registering a device.
#[derive(Debug, Clone)]
pub struct CreateDevice {
    pub name: String,
    pub power_watts: Option<f64>,
    pub category: DeviceCategory,
    pub daily_use_hours: Option<f64>,
}

/// A device together with its derived monthly figures.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSummary {
    pub device: Device,
    pub monthly_energy_kwh: f64,
    pub monthly_cost_lps: f64,
}

/// Owner-scoped device management.
///
/// Every operation takes the already-authenticated caller's user id; the
/// ownership check always runs before any mutation.
pub struct DeviceService {
    store: Arc<dyn DeviceStore>,
    rate_lps_per_kwh: f64,
}

fn validate_power(power_watts: Option<f64>) -> ServiceResult<()> {
    if let Some(watts) = power_watts {
        if watts < 0.0 || !watts.is_finite() {
            return Err(ServiceError::Validation(
                "potencia_watts must be a non-negative number".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_hours(hours: f64, field: &str) -> ServiceResult<()> {
    if !(hours > 0.0 && hours <= 24.0) {
        return Err(ServiceError::Validation(format!(
            "{field} must be between 0 and 24 hours"
        )));
    }
    Ok(())
}

impl DeviceService {
    pub fn new(store: Arc<dyn DeviceStore>, rate_lps_per_kwh: f64) -> Self {
        Self {
            store,
            rate_lps_per_kwh,
        }
    }

    fn summarize(&self, device: Device) -> DeviceSummary {
        let monthly_energy_kwh =
            consumption::monthly_energy_kwh(device.power_watts, device.daily_use_hours);
        let monthly_cost_lps = consumption::cost_lps(monthly_energy_kwh, self.rate_lps_per_kwh);
        DeviceSummary {
            device,
            monthly_energy_kwh,
            monthly_cost_lps,
        }
    }

    /// Fetch a device and verify the caller owns it.
    async fn owned_device(&self, user_id: i64, device_id: i64) -> ServiceResult<Device> {
        let device = self
            .store
            .device_by_id(device_id)
            .await?
            .ok_or(ServiceError::NotFound(device_id))?;

        if device.user_id != user_id {
            return Err(ServiceError::Forbidden);
        }
        Ok(device)
    }

    pub async fn create(&self, user_id: i64, input: CreateDevice) -> ServiceResult<DeviceSummary> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation(
                "nombre must not be empty".to_string(),
            ));
        }
        validate_power(input.power_watts)?;

        // Missing hours means "assume the default", substituted explicitly
        // here rather than somewhere down in the storage layer.
        let daily_use_hours = input.daily_use_hours.unwrap_or(DEFAULT_DAILY_USE_HOURS);
        validate_hours(daily_use_hours, "horas_uso_dia")?;

        let device = self
            .store
            .insert_device(NewDevice {
                user_id,
                name,
                power_watts: input.power_watts,
                category: input.category,
                daily_use_hours,
            })
            .await?;

        info!(device_id = device.id, user_id, "device registered");
        Ok(self.summarize(device))
    }

    pub async fn list(&self, user_id: i64) -> ServiceResult<Vec<DeviceSummary>> {
        let devices = self.store.devices_by_user(user_id).await?;
        debug!(user_id, count = devices.len(), "listed devices");
        Ok(devices.into_iter().map(|d| self.summarize(d)).collect())
    }

    pub async fn get(&self, user_id: i64, device_id: i64) -> ServiceResult<DeviceSummary> {
        let device = self.owned_device(user_id, device_id).await?;
        Ok(self.summarize(device))
    }

    pub async fn update(
        &self,
        user_id: i64,
        device_id: i64,
        patch: DevicePatch,
    ) -> ServiceResult<DeviceSummary> {
        let current = self.owned_device(user_id, device_id).await?;

        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(ServiceError::Validation(
                    "nombre must not be empty".to_string(),
                ));
            }
        }
        validate_power(patch.power_watts)?;
        if let Some(hours) = patch.daily_use_hours {
            validate_hours(hours, "horas_uso_dia")?;
        }

        if patch.is_empty() {
            return Ok(self.summarize(current));
        }

        let updated = self
            .store
            .update_device(device_id, patch)
            .await?
            .ok_or(ServiceError::NotFound(device_id))?;

        info!(device_id, user_id, "device updated");
        Ok(self.summarize(updated))
    }

    pub async fn delete(&self, user_id: i64, device_id: i64) -> ServiceResult<()> {
        self.owned_device(user_id, device_id).await?;

        if !self.store.delete_device(device_id).await? {
            return Err(ServiceError::NotFound(device_id));
        }

        info!(device_id, user_id, "device deleted");
        Ok(())
    }

    /// Record a usage event, freezing energy and cost from the device's
    /// current wattage.
    pub async fn log_usage(
        &self,
        user_id: i64,
        device_id: i64,
        date: Option<Date>,
        hours_used: f64,
    ) -> ServiceResult<ConsumptionEntry> {
        validate_hours(hours_used, "horas_uso")?;
        let device = self.owned_device(user_id, device_id).await?;

        let date = date.unwrap_or_else(|| time::OffsetDateTime::now_utc().date());
        let energy_kwh = consumption::energy_kwh(device.power_watts, hours_used);
        let cost_lps = consumption::cost_lps(energy_kwh, self.rate_lps_per_kwh);

        let entry = self
            .store
            .insert_entry(device_id, date, hours_used, energy_kwh, cost_lps)
            .await?;

        debug!(device_id, user_id, energy_kwh, "usage logged");
        Ok(entry)
    }

    pub async fn list_usage(
        &self,
        user_id: i64,
        device_id: i64,
    ) -> ServiceResult<Vec<ConsumptionEntry>> {
        self.owned_device(user_id, device_id).await?;
        Ok(self.store.entries_for_device(device_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use time::macros::date;

    #[derive(Default)]
    struct MemStore {
        devices: Mutex<HashMap<i64, Device>>,
        entries: Mutex<HashMap<i64, ConsumptionEntry>>,
        next_id: Mutex<i64>,
    }

    impl MemStore {
        fn next(&self) -> i64 {
            let mut id = self.next_id.lock().unwrap();
            *id += 1;
            *id
        }

        fn device(&self, id: i64) -> Option<Device> {
            self.devices.lock().unwrap().get(&id).cloned()
        }

        fn entry_count_for(&self, device_id: i64) -> usize {
            self.entries
                .lock()
                .unwrap()
                .values()
                .filter(|e| e.device_id == device_id)
                .count()
        }
    }

    #[async_trait]
    impl DeviceStore for MemStore {
        async fn insert_device(&self, new: NewDevice) -> anyhow::Result<Device> {
            let device = Device {
                id: self.next(),
                user_id: new.user_id,
                name: new.name,
                power_watts: new.power_watts,
                category: new.category,
                daily_use_hours: new.daily_use_hours,
                created_at: time::OffsetDateTime::UNIX_EPOCH,
            };
            self.devices
                .lock()
                .unwrap()
                .insert(device.id, device.clone());
            Ok(device)
        }

        async fn device_by_id(&self, id: i64) -> anyhow::Result<Option<Device>> {
            Ok(self.device(id))
        }

        async fn devices_by_user(&self, user_id: i64) -> anyhow::Result<Vec<Device>> {
            let mut devices: Vec<Device> = self
                .devices
                .lock()
                .unwrap()
                .values()
                .filter(|d| d.user_id == user_id)
                .cloned()
                .collect();
            devices.sort_by_key(|d| d.id);
            Ok(devices)
        }

        async fn update_device(
            &self,
            id: i64,
            patch: DevicePatch,
        ) -> anyhow::Result<Option<Device>> {
            let mut devices = self.devices.lock().unwrap();
            let Some(device) = devices.get_mut(&id) else {
                return Ok(None);
            };
            if let Some(name) = patch.name {
                device.name = name;
            }
            if let Some(power) = patch.power_watts {
                device.power_watts = Some(power);
            }
            if let Some(category) = patch.category {
                device.category = category;
            }
            if let Some(hours) = patch.daily_use_hours {
                device.daily_use_hours = hours;
            }
            Ok(Some(device.clone()))
        }

        async fn delete_device(&self, id: i64) -> anyhow::Result<bool> {
            let existed = self.devices.lock().unwrap().remove(&id).is_some();
            if existed {
                self.entries
                    .lock()
                    .unwrap()
                    .retain(|_, e| e.device_id != id);
            }
            Ok(existed)
        }

        async fn insert_entry(
            &self,
            device_id: i64,
            date: Date,
            hours_used: f64,
            energy_kwh: f64,
            cost_lps: f64,
        ) -> anyhow::Result<ConsumptionEntry> {
            let entry = ConsumptionEntry {
                id: self.next(),
                device_id,
                date,
                hours_used,
                energy_kwh,
                cost_lps,
                created_at: time::OffsetDateTime::UNIX_EPOCH,
            };
            self.entries.lock().unwrap().insert(entry.id, entry.clone());
            Ok(entry)
        }

        async fn entries_for_device(&self, device_id: i64) -> anyhow::Result<Vec<ConsumptionEntry>> {
            let mut entries: Vec<ConsumptionEntry> = self
                .entries
                .lock()
                .unwrap()
                .values()
                .filter(|e| e.device_id == device_id)
                .cloned()
                .collect();
            entries.sort_by_key(|e| e.id);
            Ok(entries)
        }
    }

    fn service() -> (Arc<MemStore>, DeviceService) {
        let store = Arc::new(MemStore::default());
        let service = DeviceService::new(store.clone(), consumption::DEFAULT_RATE_LPS_PER_KWH);
        (store, service)
    }

    fn plancha() -> CreateDevice {
        CreateDevice {
            name: "Plancha de ropa".to_string(),
            power_watts: Some(1200.0),
            category: DeviceCategory::Appliances,
            daily_use_hours: Some(0.5),
        }
    }

    #[tokio::test]
    async fn create_defaults_daily_hours() {
        let (_, service) = service();

        let summary = service
            .create(
                1,
                CreateDevice {
                    name: "Televisor".to_string(),
                    power_watts: Some(100.0),
                    category: DeviceCategory::Electronics,
                    daily_use_hours: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(summary.device.daily_use_hours, DEFAULT_DAILY_USE_HOURS);
        // 100 W * 6 h * 30 / 1000 = 18 kWh, at L3.70 = L66.60.
        assert_eq!(summary.monthly_energy_kwh, 18.0);
        assert!((summary.monthly_cost_lps - 66.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn create_rejects_empty_name() {
        let (_, service) = service();

        let result = service
            .create(
                1,
                CreateDevice {
                    name: "   ".to_string(),
                    power_watts: None,
                    category: DeviceCategory::Other,
                    daily_use_hours: None,
                },
            )
            .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn create_rejects_negative_power() {
        let (_, service) = service();

        let mut input = plancha();
        input.power_watts = Some(-5.0);
        let result = service.create(1, input).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_hours() {
        let (_, service) = service();

        let mut input = plancha();
        input.daily_use_hours = Some(25.0);
        assert!(matches!(
            service.create(1, input).await,
            Err(ServiceError::Validation(_))
        ));

        let mut input = plancha();
        input.daily_use_hours = Some(0.0);
        assert!(matches!(
            service.create(1, input).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn unresolved_power_yields_zero_consumption() {
        let (_, service) = service();

        let summary = service
            .create(
                1,
                CreateDevice {
                    name: "Aparato raro".to_string(),
                    power_watts: None,
                    category: DeviceCategory::Other,
                    daily_use_hours: Some(5.0),
                },
            )
            .await
            .unwrap();

        assert_eq!(summary.device.power_watts, None);
        assert_eq!(summary.monthly_energy_kwh, 0.0);
        assert_eq!(summary.monthly_cost_lps, 0.0);
    }

    #[tokio::test]
    async fn list_is_empty_for_new_user() {
        let (_, service) = service();

        assert!(service.list(42).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_by_other_user_is_forbidden_and_leaves_record_unmodified() {
        let (store, service) = service();
        let created = service.create(1, plancha()).await.unwrap();

        let result = service
            .update(
                2,
                created.device.id,
                DevicePatch {
                    name: Some("Ajena".to_string()),
                    ..DevicePatch::default()
                },
            )
            .await;

        assert!(matches!(result, Err(ServiceError::Forbidden)));
        assert_eq!(store.device(created.device.id).unwrap(), created.device);
    }

    #[tokio::test]
    async fn partial_update_touches_only_supplied_fields() {
        let (_, service) = service();
        let created = service.create(1, plancha()).await.unwrap();

        let updated = service
            .update(
                1,
                created.device.id,
                DevicePatch {
                    category: Some(DeviceCategory::Other),
                    ..DevicePatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.device.category, DeviceCategory::Other);
        assert_eq!(updated.device.power_watts, Some(1200.0));
        assert_eq!(updated.device.daily_use_hours, 0.5);
        assert_eq!(updated.device.name, "Plancha de ropa");
    }

    #[tokio::test]
    async fn update_unknown_device_is_not_found() {
        let (_, service) = service();

        let result = service
            .update(
                1,
                999,
                DevicePatch {
                    name: Some("Nada".to_string()),
                    ..DevicePatch::default()
                },
            )
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound(999))));
    }

    #[tokio::test]
    async fn delete_cascades_consumption_entries() {
        let (store, service) = service();
        let created = service.create(1, plancha()).await.unwrap();
        let id = created.device.id;

        service
            .log_usage(1, id, Some(date!(2025 - 11 - 03)), 1.0)
            .await
            .unwrap();
        service
            .log_usage(1, id, Some(date!(2025 - 11 - 04)), 2.0)
            .await
            .unwrap();
        assert_eq!(store.entry_count_for(id), 2);

        service.delete(1, id).await.unwrap();

        assert_eq!(store.entry_count_for(id), 0);
        assert!(store.device(id).is_none());
    }

    #[tokio::test]
    async fn delete_by_other_user_is_forbidden() {
        let (store, service) = service();
        let created = service.create(1, plancha()).await.unwrap();

        let result = service.delete(2, created.device.id).await;

        assert!(matches!(result, Err(ServiceError::Forbidden)));
        assert!(store.device(created.device.id).is_some());
    }

    #[tokio::test]
    async fn log_usage_freezes_energy_and_cost() {
        let (_, service) = service();
        let created = service.create(1, plancha()).await.unwrap();

        let entry = service
            .log_usage(1, created.device.id, Some(date!(2025 - 11 - 03)), 0.5)
            .await
            .unwrap();

        // 1200 W for half an hour is 0.6 kWh, at L3.70 = L2.22.
        assert!((entry.energy_kwh - 0.6).abs() < 1e-9);
        assert!((entry.cost_lps - 2.22).abs() < 1e-9);
        assert_eq!(entry.date, date!(2025 - 11 - 03));
    }

    #[tokio::test]
    async fn log_usage_on_unresolved_device_records_zero_energy() {
        let (_, service) = service();
        let created = service
            .create(
                1,
                CreateDevice {
                    name: "Aparato raro".to_string(),
                    power_watts: None,
                    category: DeviceCategory::Other,
                    daily_use_hours: None,
                },
            )
            .await
            .unwrap();

        let entry = service
            .log_usage(1, created.device.id, None, 3.0)
            .await
            .unwrap();

        assert_eq!(entry.energy_kwh, 0.0);
        assert_eq!(entry.cost_lps, 0.0);
    }

    #[tokio::test]
    async fn list_usage_requires_ownership() {
        let (_, service) = service();
        let created = service.create(1, plancha()).await.unwrap();

        let result = service.list_usage(2, created.device.id).await;
        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }
}
