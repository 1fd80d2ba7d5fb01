pub mod category;
pub mod consumption;
pub mod device;

pub use category::{DeviceCategory, UnknownCategory};
pub use consumption::ConsumptionEntry;
pub use device::{Device, DevicePatch, NewDevice, DEFAULT_DAILY_USE_HOURS};
