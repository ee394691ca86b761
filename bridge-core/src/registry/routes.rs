//! Route table operations: `setIntentRoute`, `getIntentRoutes`, `resolveZone`.

use std::collections::HashMap;

use crate::config::{FixtureRecord, IntentKind};

use super::zone::{resolve_fixtures, resolve_raw_zone};

/// Resolves an intent kind to its destination fixtures, combining the route
/// table lookup (§4.7 step 1) with token matching (steps 2-5).
#[must_use]
pub fn resolve_zone<'a>(
    route_table: &HashMap<String, String>,
    kind: IntentKind,
    intent_zone: Option<&str>,
    fixtures: &'a [FixtureRecord],
) -> Vec<&'a FixtureRecord> {
    let raw = resolve_raw_zone(intent_zone, route_table, kind);
    resolve_fixtures(&raw, kind, fixtures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Brand, FixtureAddressing};

    fn fixture(id: &str, zone: &str) -> FixtureRecord {
        FixtureRecord {
            id: id.to_string(),
            brand: Brand::Hub,
            zone: zone.to_string(),
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
    fn falls_back_to_route_table_then_brand_default() {
        let fixtures = vec![fixture("a", "living-room")];
        let mut routes = HashMap::new();
        routes.insert("hubState".to_string(), "living-room".to_string());

        let result = resolve_zone(&routes, IntentKind::HubState, None, &fixtures);
        assert_eq!(result.len(), 1);

        let result = resolve_zone(&HashMap::new(), IntentKind::HubState, None, &fixtures);
        // Falls back to brand default "hue", which every hub fixture aliases.
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn explicit_intent_zone_overrides_the_route_table() {
        let fixtures = vec![fixture("a", "living-room"), fixture("b", "bedroom")];
        let mut routes = HashMap::new();
        routes.insert("hubState".to_string(), "living-room".to_string());

        let result = resolve_zone(&routes, IntentKind::HubState, Some("bedroom"), &fixtures);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "b");
    }
}
