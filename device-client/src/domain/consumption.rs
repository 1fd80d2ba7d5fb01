use time::{Date, OffsetDateTime};

/// One logged usage event for a device.
///
/// Energy and cost are computed from the device's stored wattage at log time
/// and frozen into the entry; later edits to the device do not rewrite
/// history. Entries are removed together with their owning device.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionEntry {
    pub id: i64,
    pub device_id: i64,
    pub date: Date,
    pub hours_used: f64,
    pub energy_kwh: f64,
    pub cost_lps: f64,
    pub created_at: OffsetDateTime,
}
