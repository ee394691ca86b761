//! Thin status surface (§10.3): `GET /healthz` and `GET /status`.
//!
//! This module only reads telemetry already exposed by the dispatcher,
//! transports, and registry; it owns no domain state of its own.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::audio::AudioTelemetry;
use crate::bootstrap::BootstrappedServices;
use crate::dispatch::SchedulerTelemetrySnapshot;
use crate::registry::RegistrySummary;
use crate::transport::hub::HubTransportState;

/// Builds the status router over a shared [`BootstrappedServices`] handle.
#[must_use]
pub fn router(services: Arc<BootstrappedServices>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(status))
        .with_state(services)
}

async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Aggregate status response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    registry: RegistrySummary,
    hub_transport: HubTransportState,
    audio: AudioTelemetry,
    schedulers: SchedulerTelemetrySnapshot,
}

async fn status(State(services): State<Arc<BootstrappedServices>>) -> impl IntoResponse {
    let body = StatusResponse {
        registry: services.registry.summary(),
        hub_transport: services.hub_transport.state(),
        audio: services.audio.get_telemetry(),
        schedulers: services.dispatcher.scheduler_telemetry(),
    };
    Json(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{bootstrap_services, BootstrapConfig};

    fn services() -> Arc<BootstrappedServices> {
        bootstrap_services(BootstrapConfig::default()).expect("bootstrap should succeed")
    }

    async fn spawn(app: Router) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        addr
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let addr = spawn(router(services())).await;
        let response = reqwest::get(format!("http://{addr}/healthz")).await.unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn status_reports_registry_and_transport_telemetry() {
        let addr = spawn(router(services())).await;
        let response = reqwest::get(format!("http://{addr}/status")).await.unwrap();
        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body.get("registry").is_some());
        assert!(body.get("hubTransport").is_some());
    }
}
