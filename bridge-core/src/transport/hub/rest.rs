//! Hub REST mode: serialized per-fixture PUT pipeline with LIFO coalescing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;

use super::dns_shim::HubDnsShim;
use crate::error::TransportError;
use crate::runtime::TaskSpawner;

const REST_TIMEOUT: Duration = Duration::from_millis(1_500);

/// Identifies one hub light's PUT endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HubRestTarget {
    /// Hub LAN host or resolved IP.
    pub host: String,
    /// API username/application key.
    pub username: String,
    /// Hub-local light id.
    pub light_id: String,
}

impl HubRestTarget {
    fn url(&self) -> String {
        format!(
            "http://{}/api/{}/lights/{}/state",
            self.host, self.username, self.light_id
        )
    }
}

/// Body of a hub light state PUT.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HubWireState {
    /// Whether the light should be on.
    pub on: bool,
    /// Hue, 0-65535.
    pub hue: u16,
    /// Saturation, 0-254.
    pub sat: u8,
    /// Brightness, 0-254.
    pub bri: u8,
    /// CIE xy chromaticity, when the caller prefers it over hue/sat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy: Option<(f32, f32)>,
    /// Mired color temperature, for CT-capable fixtures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<u32>,
    /// Transition time in 100ms units, per the hub's REST API convention.
    #[serde(rename = "transitiontime")]
    pub transition_time: u16,
}

/// Per-fixture serialized REST dispatcher.
///
/// Each target gets a background task fed through a `watch` channel: a new
/// state replaces any not-yet-sent pending state (LIFO coalescing), and the
/// caller never blocks on the in-flight HTTP request.
pub struct HubRestClient {
    client: reqwest::Client,
    senders: Mutex<HashMap<HubRestTarget, watch::Sender<HubWireState>>>,
    spawner: Arc<dyn TaskSpawner>,
}

impl HubRestClient {
    /// Builds a REST client, optionally routed through a DNS shim for
    /// hostname-preserving IP rewriting.
    pub fn new(spawner: Arc<dyn TaskSpawner>, dns_shim: &HubDnsShim) -> Result<Self, TransportError> {
        let builder = reqwest::Client::builder().timeout(REST_TIMEOUT);
        let builder = dns_shim.apply(builder);
        let client = builder.build()?;
        Ok(Self {
            client,
            senders: Mutex::new(HashMap::new()),
            spawner,
        })
    }

    /// Queues `state` for `target`. Returns immediately; the actual PUT
    /// happens on the target's background dispatcher task.
    pub fn send(&self, target: HubRestTarget, state: HubWireState) {
        let mut senders = self.senders.lock();
        if let Some(tx) = senders.get(&target) {
            let _ = tx.send(state);
            return;
        }

        let (tx, mut rx) = watch::channel(state);
        // The constructor call already observed the initial value; mark it
        // seen so the dispatcher's first `changed()` wait doesn't skip it.
        rx.borrow_and_update();
        let client = self.client.clone();
        let url = target.url();
        self.spawner.spawn(async move {
            // Deliver the initial state immediately, then follow updates.
            loop {
                let state = *rx.borrow();
                if let Err(err) = put_state(&client, &url, state).await {
                    tracing::warn!(%url, error = %err, "hub REST PUT failed");
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
        senders.insert(target, tx);
    }
}

async fn put_state(client: &reqwest::Client, url: &str, state: HubWireState) -> Result<(), TransportError> {
    client.put(url).json(&state).send().await?.error_for_status()?;
    Ok(())
}
