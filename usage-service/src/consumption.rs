//! Derived consumption and cost figures.
//!
//! These are total pure functions: an unresolved wattage yields 0 rather
//! than an error, and no clamping happens here. Input validation (negative
//! wattage, out-of-range hours) is the service boundary's job.

/// Residential tariff in Lempiras per kWh.
pub const DEFAULT_RATE_LPS_PER_KWH: f64 = 3.70;

/// Billing months are normalized to 30 days.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Estimated monthly energy in kWh for a device used `hours_per_day` daily.
pub fn monthly_energy_kwh(power_watts: Option<f64>, hours_per_day: f64) -> f64 {
    match power_watts {
        Some(watts) => watts * hours_per_day * DAYS_PER_MONTH / 1000.0,
        None => 0.0,
    }
}

/// Energy in kWh for a single usage event of `hours` duration.
pub fn energy_kwh(power_watts: Option<f64>, hours: f64) -> f64 {
    match power_watts {
        Some(watts) => watts * hours / 1000.0,
        None => 0.0,
    }
}

/// Cost in Lempiras for the given energy at the given tariff.
pub fn cost_lps(energy_kwh: f64, rate_per_kwh: f64) -> f64 {
    energy_kwh * rate_per_kwh
}
