use std::sync::Arc;

use device_client::domain::DeviceCategory;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::{ServiceError, ServiceResult};
use crate::estimation::WattageEstimator;

/// Names shorter than this (after trimming) are rejected before the cascade.
pub const MIN_NAME_CHARS: usize = 3;

/// Which tier of the cascade produced a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Catalog,
    Estimation,
    Default,
}

/// A wattage/category suggestion for a device name. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub power_watts: Option<f64>,
    pub category: DeviceCategory,
    pub provenance: Provenance,
}

/// Three-tier resolution cascade: cheap deterministic catalog lookup first,
/// the estimation service second, a safe default last.
///
/// Past input validation this never fails; estimation faults are absorbed
/// into the default tier and only show up in logs and metrics.
pub struct Resolver {
    catalog: Arc<Catalog>,
    estimator: Arc<dyn WattageEstimator>,
}

impl Resolver {
    pub fn new(catalog: Arc<Catalog>, estimator: Arc<dyn WattageEstimator>) -> Self {
        Self { catalog, estimator }
    }

    pub async fn suggest(&self, name: &str) -> ServiceResult<Suggestion> {
        let trimmed = name.trim();
        if trimmed.chars().count() < MIN_NAME_CHARS {
            return Err(ServiceError::Validation(format!(
                "device name must have at least {MIN_NAME_CHARS} characters"
            )));
        }

        metrics::counter!("suggest_requests_total").increment(1);

        if let Some(hit) = self.catalog.lookup(trimmed) {
            metrics::counter!("suggest_catalog_hits_total").increment(1);
            return Ok(Suggestion {
                power_watts: Some(hit.power_watts),
                category: hit.category,
                provenance: Provenance::Catalog,
            });
        }

        match self.estimator.estimate(trimmed).await {
            Ok(est) => {
                metrics::counter!("suggest_estimation_hits_total").increment(1);
                Ok(Suggestion {
                    power_watts: Some(est.power_watts),
                    category: est.category,
                    provenance: Provenance::Estimation,
                })
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kind = e.kind(),
                    device_name = trimmed,
                    "estimation failed, falling back to default suggestion"
                );
                metrics::counter!("estimation_failures_total", "kind" => e.kind()).increment(1);
                Ok(Suggestion {
                    power_watts: None,
                    category: DeviceCategory::Other,
                    provenance: Provenance::Default,
                })
            }
        }
    }
}
