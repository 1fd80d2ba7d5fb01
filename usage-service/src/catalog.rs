use device_client::domain::DeviceCategory;

/// One static mapping from a device-name fragment to default attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub match_term: &'static str,
    pub power_watts: f64,
    pub category: DeviceCategory,
}

/// Read-only table mapping device-name fragments to typical wattages.
///
/// Built once at startup and shared by reference; lookups walk the table in
/// definition order and the first matching entry wins, so behavior is fully
/// deterministic. Keep more specific terms ahead of the generic ones they
/// contain (e.g. "aire acondicionado" before "aire").
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

fn entry(match_term: &'static str, power_watts: f64, category: DeviceCategory) -> CatalogEntry {
    CatalogEntry {
        match_term,
        power_watts,
        category,
    }
}

impl Catalog {
    /// The built-in table of common household devices.
    pub fn builtin() -> Self {
        use DeviceCategory::*;

        Self {
            entries: vec![
                entry("aire acondicionado", 1500.0, Climate),
                entry("ventilador", 75.0, Climate),
                entry("calentador", 1200.0, Climate),
                entry("calefactor", 1500.0, Climate),
                entry("refrigerador", 150.0, Appliances),
                entry("congelador", 200.0, Appliances),
                entry("microondas", 1100.0, Appliances),
                entry("lavadora", 500.0, Appliances),
                entry("secadora", 3000.0, Appliances),
                entry("licuadora", 400.0, Appliances),
                entry("cafetera", 800.0, Appliances),
                entry("plancha", 1200.0, Appliances),
                entry("estufa", 1500.0, Appliances),
                entry("lámpara", 40.0, Lighting),
                entry("lampara", 40.0, Lighting),
                entry("foco", 10.0, Lighting),
                entry("bombillo", 10.0, Lighting),
                entry("led", 8.0, Lighting),
                entry("televisor", 100.0, Electronics),
                entry("tv", 100.0, Electronics),
                entry("computadora", 200.0, Electronics),
                entry("laptop", 65.0, Electronics),
                entry("monitor", 30.0, Electronics),
                entry("consola", 150.0, Electronics),
                entry("router", 10.0, Electronics),
                entry("cargador", 20.0, Electronics),
            ],
        }
    }

    /// First entry whose term occurs in the normalized name, or `None`.
    pub fn lookup(&self, name: &str) -> Option<&CatalogEntry> {
        let normalized = name.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        self.entries
            .iter()
            .find(|e| normalized.contains(e.match_term))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_and_trims() {
        let catalog = Catalog::builtin();

        let hit = catalog.lookup("  Refrigerador Samsung  ").unwrap();
        assert_eq!(hit.match_term, "refrigerador");
        assert_eq!(hit.category, DeviceCategory::Appliances);
    }

    #[test]
    fn lookup_matches_term_inside_longer_name() {
        let catalog = Catalog::builtin();

        // "refrigerador" is a substring of "refrigeradora".
        let hit = catalog.lookup("refrigeradora de dos puertas").unwrap();
        assert_eq!(hit.match_term, "refrigerador");
    }

    #[test]
    fn first_match_wins_in_table_order() {
        let catalog = Catalog::builtin();

        // Matches both "lámpara" and "led"; table order pins the winner.
        let hit = catalog.lookup("lámpara led de escritorio").unwrap();
        assert_eq!(hit.match_term, "lámpara");
        assert_eq!(hit.power_watts, 40.0);
    }

    #[test]
    fn lookup_is_deterministic() {
        let catalog = Catalog::builtin();

        let a = catalog.lookup("televisor 40 pulgadas").cloned();
        let b = catalog.lookup("televisor 40 pulgadas").cloned();
        assert_eq!(a, b);
        assert!(a.is_some());
    }

    #[test]
    fn blank_input_matches_nothing() {
        let catalog = Catalog::builtin();

        assert!(catalog.lookup("").is_none());
        assert!(catalog.lookup("   ").is_none());
    }

    #[test]
    fn unknown_name_misses() {
        let catalog = Catalog::builtin();

        assert!(catalog.lookup("artefacto misterioso xyz").is_none());
    }
}
