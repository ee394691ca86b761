//! Zone resolution algorithm (§4.7): intent → zone tokens → matching fixtures.

use crate::config::{Brand, FixtureRecord, IntentKind};

/// Splits a raw route value into deduplicated tokens on `[,;|]`.
fn split_tokens(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for token in raw.split([',', ';', '|']) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let token = token.to_string();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// Resolves the raw zone expression for an intent, per §4.7 step 1:
/// `intent.zone` if set, else the route table entry, else the brand default.
#[must_use]
pub fn resolve_raw_zone<'a>(
    intent_zone: Option<&'a str>,
    route_table: &'a std::collections::HashMap<String, String>,
    kind: IntentKind,
) -> String {
    if let Some(zone) = intent_zone {
        return zone.to_string();
    }
    if let Some(routed) = route_table.get(kind.route_key()) {
        return routed.clone();
    }
    match kind.brand() {
        Brand::Hub => "hue".to_string(),
        Brand::Udp | Brand::Mod => "wiz".to_string(),
    }
}

/// Resolves an intent to the set of fixtures it should reach, per §4.7.
///
/// Returns an empty vector if no token matched any fixture — callers are
/// responsible for the throttled "no targets" warning (see `DispatchError`).
#[must_use]
pub fn resolve_fixtures<'a>(
    raw_zone: &str,
    kind: IntentKind,
    fixtures: &'a [FixtureRecord],
) -> Vec<&'a FixtureRecord> {
    let brand = kind.brand();
    let chat = kind.is_chat();
    let routed: Vec<&FixtureRecord> = fixtures
        .iter()
        .filter(|f| f.enabled && f.brand == brand && if chat { f.twitch_enabled } else { f.engine_enabled })
        .collect();

    let tokens = split_tokens(raw_zone);
    if tokens.iter().any(|t| t == "*" || t == "all") {
        let mut zones: Vec<&FixtureRecord> = routed;
        zones.sort_by(|a, b| a.id.cmp(&b.id));
        return zones;
    }

    let mut matched = Vec::new();
    for fixture in routed {
        let aliases = fixture.alias_set();
        if tokens
            .iter()
            .any(|token| &fixture.zone == token || aliases.iter().any(|a| a == token))
        {
            matched.push(fixture);
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FixtureAddressing;

    fn fixture(id: &str, zone: &str, brand: Brand, custom_enabled: bool) -> FixtureRecord {
        FixtureRecord {
            id: id.to_string(),
            brand,
            zone: zone.to_string(),
            enabled: true,
            engine_enabled: true,
            twitch_enabled: false,
            custom_enabled,
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
    fn all_token_expands_to_every_routed_fixture() {
        let fixtures = vec![
            fixture("a", "living-room", Brand::Hub, false),
            fixture("b", "bedroom", Brand::Hub, false),
        ];
        let matches = resolve_fixtures("all", IntentKind::HubState, &fixtures);
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn explicit_zone_token_matches_only_that_zone() {
        let fixtures = vec![
            fixture("a", "living-room", Brand::Hub, false),
            fixture("b", "bedroom", Brand::Hub, false),
        ];
        let matches = resolve_fixtures("bedroom", IntentKind::HubState, &fixtures);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "b");
    }

    #[test]
    fn brand_alias_matches_hub_fixtures_via_hue_token() {
        let fixtures = vec![fixture("a", "living-room", Brand::Hub, false)];
        let matches = resolve_fixtures("hue", IntentKind::HubState, &fixtures);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn custom_token_only_matches_custom_enabled_udp_fixtures() {
        let fixtures = vec![
            fixture("a", "living-room", Brand::Udp, true),
            fixture("b", "bedroom", Brand::Udp, false),
        ];
        let matches = resolve_fixtures("custom", IntentKind::UdpPulse, &fixtures);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "a");
    }

    #[test]
    fn chat_intent_routes_on_twitch_enabled_not_engine_enabled() {
        let mut engine_only = fixture("a", "living-room", Brand::Hub, false);
        engine_only.twitch_enabled = false;
        let mut twitch_only = fixture("b", "living-room", Brand::Hub, false);
        twitch_only.engine_enabled = false;
        twitch_only.twitch_enabled = true;
        let fixtures = vec![engine_only, twitch_only];

        let matches = resolve_fixtures("all", IntentKind::ChatHubState, &fixtures);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "b");

        let matches = resolve_fixtures("all", IntentKind::HubState, &fixtures);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "a");
    }

    #[test]
    fn no_match_yields_empty_result() {
        let fixtures = vec![fixture("a", "living-room", Brand::Hub, false)];
        let matches = resolve_fixtures("garage", IntentKind::HubState, &fixtures);
        assert!(matches.is_empty());
    }

    #[test]
    fn tokens_are_split_and_deduplicated() {
        assert_eq!(split_tokens("a,a;b|c"), vec!["a", "b", "c"]);
    }
}
