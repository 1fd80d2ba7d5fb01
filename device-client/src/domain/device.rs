use time::OffsetDateTime;

use crate::domain::category::DeviceCategory;

/// A registered household device.
///
/// `power_watts == None` means the rating is unresolved (not yet known),
/// which is distinct from a device rated at 0 W.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub power_watts: Option<f64>,
    pub category: DeviceCategory,
    pub daily_use_hours: f64,
    pub created_at: OffsetDateTime,
}

/// Default daily usage assumed when a device is registered without one.
pub const DEFAULT_DAILY_USE_HOURS: f64 = 6.0;

/// Attributes of a device about to be created.
#[derive(Debug, Clone)]
pub struct NewDevice {
    pub user_id: i64,
    pub name: String,
    pub power_watts: Option<f64>,
    pub category: DeviceCategory,
    pub daily_use_hours: f64,
}

/// Sparse patch for an existing device. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub power_watts: Option<f64>,
    pub category: Option<DeviceCategory>,
    pub daily_use_hours: Option<f64>,
}

impl DevicePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.power_watts.is_none()
            && self.category.is_none()
            && self.daily_use_hours.is_none()
    }
}
