//! Fixture catalog filtering helpers, shared by the registry's `listBy` family.

use crate::config::{Brand, FixtureRecord};

/// Options narrowing a `listBy` query.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    /// When true, only fixtures passing [`FixtureRecord::is_configured`] are returned.
    pub require_configured: bool,
}

/// Returns fixtures matching `brand` and, when `zone` is set, that zone too.
#[must_use]
pub fn list_by<'a>(
    fixtures: &'a [FixtureRecord],
    brand: Option<Brand>,
    zone: Option<&str>,
    options: ListOptions,
) -> Vec<&'a FixtureRecord> {
    fixtures
        .iter()
        .filter(|f| f.enabled)
        .filter(|f| brand.map_or(true, |b| f.brand == b))
        .filter(|f| zone.map_or(true, |z| f.zone == z))
        .filter(|f| !options.require_configured || f.is_configured())
        .collect()
}

/// Fixtures the reactive engine may target.
#[must_use]
pub fn list_engine_by<'a>(
    fixtures: &'a [FixtureRecord],
    brand: Option<Brand>,
    zone: Option<&str>,
    options: ListOptions,
) -> Vec<&'a FixtureRecord> {
    list_by(fixtures, brand, zone, options)
        .into_iter()
        .filter(|f| f.engine_enabled)
        .collect()
}

/// Fixtures Twitch chat color commands may target.
#[must_use]
pub fn list_twitch_by<'a>(
    fixtures: &'a [FixtureRecord],
    brand: Option<Brand>,
    zone: Option<&str>,
    options: ListOptions,
) -> Vec<&'a FixtureRecord> {
    list_by(fixtures, brand, zone, options)
        .into_iter()
        .filter(|f| f.twitch_enabled)
        .collect()
}

/// Fixtures the standalone animator may target.
#[must_use]
pub fn list_custom_by<'a>(
    fixtures: &'a [FixtureRecord],
    brand: Option<Brand>,
    zone: Option<&str>,
    options: ListOptions,
) -> Vec<&'a FixtureRecord> {
    list_by(fixtures, brand, zone, options)
        .into_iter()
        .filter(|f| f.custom_enabled)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FixtureAddressing;

    fn fixture(id: &str, brand: Brand, engine: bool, configured: bool) -> FixtureRecord {
        FixtureRecord {
            id: id.to_string(),
            brand,
            zone: "living-room".to_string(),
            enabled: true,
            engine_enabled: engine,
            twitch_enabled: false,
            custom_enabled: false,
            addressing: FixtureAddressing {
                host: configured.then(|| "192.168.1.10".to_string()),
                port: configured.then_some(443),
                username: configured.then(|| "abc".to_string()),
                light_id: configured.then(|| "1".to_string()),
                entertainment_area_id: None,
                client_key_hex: None,
            },
        }
    }

    #[test]
    fn list_engine_by_filters_on_engine_enabled() {
        let fixtures = vec![
            fixture("a", Brand::Hub, true, true),
            fixture("b", Brand::Hub, false, true),
        ];
        let result = list_engine_by(&fixtures, Some(Brand::Hub), None, ListOptions::default());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "a");
    }

    #[test]
    fn require_configured_drops_unaddressed_fixtures() {
        let fixtures = vec![
            fixture("a", Brand::Hub, true, true),
            fixture("b", Brand::Hub, true, false),
        ];
        let result = list_by(
            &fixtures,
            None,
            None,
            ListOptions { require_configured: true },
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "a");
    }
}
