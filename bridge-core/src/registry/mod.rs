//! Fixture Registry & Routing (C7): a versioned catalog plus intent→zone resolution.

pub mod fixture;
pub mod routes;
pub mod zone;

pub use fixture::ListOptions;

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;

use crate::config::{Brand, FixtureRecord, FixturesConfig, IntentKind};

struct RegistryState {
    version: u64,
    intent_routes: HashMap<String, String>,
    fixtures: Vec<FixtureRecord>,
}

/// Summary view returned by `summary()`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySummary {
    /// Current catalog version.
    pub version: u64,
    /// Count of enabled hub fixtures.
    pub hue: usize,
    /// Count of enabled UDP fixtures.
    pub wiz: usize,
    /// Current route table.
    pub routes: HashMap<String, String>,
}

/// Owns the fixture catalog and route table; bumps `version` on every write.
///
/// Readers get copy-on-write snapshots (`Vec<FixtureRecord>` clones); writes
/// go through the single internal lock, matching §5's "single mutation gate"
/// concurrency model.
pub struct FixtureRegistry {
    state: RwLock<RegistryState>,
}

impl FixtureRegistry {
    /// Builds a registry from a loaded [`FixturesConfig`].
    #[must_use]
    pub fn from_config(config: FixturesConfig) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                version: config.version,
                intent_routes: config.intent_routes,
                fixtures: config.fixtures,
            }),
        }
    }

    /// Empty registry, useful for tests and as a pre-load placeholder.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_config(FixturesConfig::default())
    }

    /// Full catalog snapshot.
    #[must_use]
    pub fn get_fixtures(&self) -> Vec<FixtureRecord> {
        self.state.read().fixtures.clone()
    }

    /// Filtered view by brand/zone.
    #[must_use]
    pub fn list_by(&self, brand: Option<Brand>, zone: Option<&str>, options: ListOptions) -> Vec<FixtureRecord> {
        let state = self.state.read();
        fixture::list_by(&state.fixtures, brand, zone, options)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Fixtures the reactive engine may target.
    #[must_use]
    pub fn list_engine_by(&self, brand: Option<Brand>, zone: Option<&str>, options: ListOptions) -> Vec<FixtureRecord> {
        let state = self.state.read();
        fixture::list_engine_by(&state.fixtures, brand, zone, options)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Fixtures Twitch chat color commands may target.
    #[must_use]
    pub fn list_twitch_by(&self, brand: Option<Brand>, zone: Option<&str>, options: ListOptions) -> Vec<FixtureRecord> {
        let state = self.state.read();
        fixture::list_twitch_by(&state.fixtures, brand, zone, options)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Fixtures the standalone animator may target.
    #[must_use]
    pub fn list_custom_by(&self, brand: Option<Brand>, zone: Option<&str>, options: ListOptions) -> Vec<FixtureRecord> {
        let state = self.state.read();
        fixture::list_custom_by(&state.fixtures, brand, zone, options)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Inserts or updates a fixture by id, bumping the catalog version.
    pub fn upsert_fixture(&self, record: FixtureRecord) {
        let mut state = self.state.write();
        if let Some(existing) = state.fixtures.iter_mut().find(|f| f.id == record.id) {
            *existing = record;
        } else {
            state.fixtures.push(record);
        }
        state.version += 1;
    }

    /// Removes a fixture by id, bumping the catalog version if it existed.
    pub fn remove_fixture(&self, id: &str) -> bool {
        let mut state = self.state.write();
        let before = state.fixtures.len();
        state.fixtures.retain(|f| f.id != id);
        let removed = state.fixtures.len() != before;
        if removed {
            state.version += 1;
        }
        removed
    }

    /// Sets the route for `kind` to `zone`, bumping the catalog version.
    pub fn set_intent_route(&self, kind: IntentKind, zone: impl Into<String>) {
        let mut state = self.state.write();
        state.intent_routes.insert(kind.route_key().to_string(), zone.into());
        state.version += 1;
    }

    /// Current route table snapshot.
    #[must_use]
    pub fn get_intent_routes(&self) -> HashMap<String, String> {
        self.state.read().intent_routes.clone()
    }

    /// Resolves `kind` (with an optional intent-carried zone override) to its
    /// destination fixtures, per §4.7.
    #[must_use]
    pub fn resolve_zone(&self, kind: IntentKind, intent_zone: Option<&str>) -> Vec<FixtureRecord> {
        let state = self.state.read();
        routes::resolve_zone(&state.intent_routes, kind, intent_zone, &state.fixtures)
            .into_iter()
            .cloned()
            .collect()
    }

    /// `{version, hue:N, wiz:N, routes}`.
    #[must_use]
    pub fn summary(&self) -> RegistrySummary {
        let state = self.state.read();
        RegistrySummary {
            version: state.version,
            hue: state.fixtures.iter().filter(|f| f.enabled && f.brand == Brand::Hub).count(),
            wiz: state.fixtures.iter().filter(|f| f.enabled && f.brand == Brand::Udp).count(),
            routes: state.intent_routes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FixtureAddressing;

    fn fixture(id: &str, brand: Brand) -> FixtureRecord {
        FixtureRecord {
            id: id.to_string(),
            brand,
            zone: "living-room".to_string(),
            enabled: true,
            engine_enabled: true,
            twitch_enabled: false,
            custom_enabled: false,
            addressing: FixtureAddressing {
                host: None,
                port: None,
                username: None,
                light_id: None,
                entertainment_area_id: None,
                client_key_hex: None,
            },
        }
    }

    #[test]
    fn upsert_bumps_version_and_summary_counts_by_brand() {
        let registry = FixtureRegistry::empty();
        registry.upsert_fixture(fixture("a", Brand::Hub));
        registry.upsert_fixture(fixture("b", Brand::Udp));
        let summary = registry.summary();
        assert_eq!(summary.version, 2);
        assert_eq!(summary.hue, 1);
        assert_eq!(summary.wiz, 1);
    }

    #[test]
    fn remove_nonexistent_fixture_does_not_bump_version() {
        let registry = FixtureRegistry::empty();
        registry.upsert_fixture(fixture("a", Brand::Hub));
        let version_before = registry.summary().version;
        assert!(!registry.remove_fixture("does-not-exist"));
        assert_eq!(registry.summary().version, version_before);
    }

    #[test]
    fn set_intent_route_is_reflected_in_resolve_zone() {
        let registry = FixtureRegistry::empty();
        registry.upsert_fixture(fixture("a", Brand::Hub));
        registry.set_intent_route(IntentKind::HubState, "living-room");
        let resolved = registry.resolve_zone(IntentKind::HubState, None);
        assert_eq!(resolved.len(), 1);
    }
}
