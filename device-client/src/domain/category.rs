use std::fmt;
use std::str::FromStr;

/// Closed set of device categories.
///
/// The wire labels are the Spanish ones the product vocabulary uses; the
/// enum keeps category-based logic exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCategory {
    Lighting,
    Climate,
    Appliances,
    Electronics,
    Other,
}

impl DeviceCategory {
    pub const ALL: [DeviceCategory; 5] = [
        DeviceCategory::Lighting,
        DeviceCategory::Climate,
        DeviceCategory::Appliances,
        DeviceCategory::Electronics,
        DeviceCategory::Other,
    ];

    /// The label stored in the database and sent over the wire.
    pub fn label(&self) -> &'static str {
        match self {
            DeviceCategory::Lighting => "Iluminación",
            DeviceCategory::Climate => "Climatización",
            DeviceCategory::Appliances => "Electrodomésticos",
            DeviceCategory::Electronics => "Electrónica",
            DeviceCategory::Other => "Otros",
        }
    }

    /// Parse a label, mapping anything unrecognized to `Other`.
    ///
    /// Used at boundaries where the input is untrusted (stored rows written
    /// by older revisions, estimation-service replies).
    pub fn parse_lenient(s: &str) -> DeviceCategory {
        s.parse().unwrap_or(DeviceCategory::Other)
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown device category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for DeviceCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accent-less spellings show up in hand-typed input; accept both.
        match s.trim().to_lowercase().as_str() {
            "iluminación" | "iluminacion" => Ok(DeviceCategory::Lighting),
            "climatización" | "climatizacion" => Ok(DeviceCategory::Climate),
            "electrodomésticos" | "electrodomesticos" => Ok(DeviceCategory::Appliances),
            "electrónica" | "electronica" => Ok(DeviceCategory::Electronics),
            "otros" => Ok(DeviceCategory::Other),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}
