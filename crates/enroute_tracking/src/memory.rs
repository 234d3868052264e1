//! Process-local backend for development and tests.

use async_trait::async_trait;
use bytes::Bytes;
use fxhash::FxHashMap;
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;

use crate::{
    bypass::{BypassReport, Evidence},
    event::RouteEvent,
    order::{Order, OrderId, UserId},
    store::{
        Authenticator, BypassReportStore, EvidenceStore, OrderDirectory, RouteEventLog,
        StoreError,
    },
};

const PUBLIC_URL_PREFIX: &str = "memory://evidence";

#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub sessions: Vec<SeedSession>,
}

#[derive(Debug, Deserialize)]
pub struct SeedSession {
    pub token: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Default)]
pub struct InMemoryBackend {
    sessions: RwLock<FxHashMap<String, UserId>>,
    orders: RwLock<FxHashMap<OrderId, Order>>,
    events: Mutex<Vec<RouteEvent>>,
    blobs: RwLock<FxHashMap<String, StoredBlob>>,
    reports: Mutex<Vec<BypassReport>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: Seed) -> Self {
        let backend = Self::new();

        for order in seed.orders {
            backend.insert_order(order);
        }

        for session in seed.sessions {
            backend.insert_session(session.token, session.user_id);
        }

        backend
    }

    pub fn insert_order(&self, order: Order) {
        self.orders.write().insert(order.id.clone(), order);
    }

    pub fn insert_session(&self, token: impl Into<String>, user_id: UserId) {
        self.sessions.write().insert(token.into(), user_id);
    }

    pub fn events(&self) -> Vec<RouteEvent> {
        self.events.lock().clone()
    }

    pub fn events_for(&self, order_id: &OrderId) -> Vec<RouteEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| &event.order_id == order_id)
            .cloned()
            .collect()
    }

    pub fn reports(&self) -> Vec<BypassReport> {
        self.reports.lock().clone()
    }

    pub fn blob_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.blobs.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn blob(&self, path: &str) -> Option<StoredBlob> {
        self.blobs.read().get(path).cloned()
    }
}

#[async_trait]
impl Authenticator for InMemoryBackend {
    async fn authenticate(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        Ok(self.sessions.read().get(token).cloned())
    }
}

#[async_trait]
impl OrderDirectory for InMemoryBackend {
    async fn find_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().get(order_id).cloned())
    }
}

#[async_trait]
impl RouteEventLog for InMemoryBackend {
    async fn append(&self, event: &RouteEvent) -> Result<(), StoreError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl EvidenceStore for InMemoryBackend {
    async fn put(&self, path: &str, evidence: &Evidence) -> Result<(), StoreError> {
        self.blobs.write().insert(
            path.to_string(),
            StoredBlob {
                content_type: evidence.content_type().to_string(),
                bytes: evidence.bytes.clone(),
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{PUBLIC_URL_PREFIX}/{path}")
    }
}

#[async_trait]
impl BypassReportStore for InMemoryBackend {
    async fn insert(&self, report: &BypassReport) -> Result<(), StoreError> {
        self.reports.lock().push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_backend() {
        let seed: Seed = serde_json::from_str(
            r#"{
                "orders": [
                    {"id": "order-1", "driver_id": "driver-1", "route_polyline": "_p~iF~ps|U"},
                    {"id": "order-2"}
                ],
                "sessions": [{"token": "secret", "user_id": "driver-1"}]
            }"#,
        )
        .unwrap();
        let backend = InMemoryBackend::from_seed(seed);

        assert_eq!(
            backend.authenticate("secret").await.unwrap(),
            Some(UserId::from("driver-1"))
        );
        assert_eq!(backend.authenticate("other").await.unwrap(), None);

        let order = backend
            .find_order(&OrderId::from("order-2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.driver_id, None);
        assert_eq!(order.route_polyline, None);

        assert!(
            backend
                .find_order(&OrderId::from("order-3"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_evidence_round_trip() {
        let backend = InMemoryBackend::new();
        let evidence = Evidence {
            file_name: Some("a.png".to_string()),
            content_type: Some("image/png".to_string()),
            bytes: Bytes::from_static(b"png"),
        };

        backend.put("order-1/a.png", &evidence).await.unwrap();

        assert_eq!(backend.blob_paths(), vec!["order-1/a.png".to_string()]);

        let blob = backend.blob("order-1/a.png").unwrap();
        assert_eq!(blob.content_type, "image/png");
        assert_eq!(blob.bytes, Bytes::from_static(b"png"));
        assert_eq!(
            backend.public_url("order-1/a.png"),
            "memory://evidence/order-1/a.png"
        );
    }
}
