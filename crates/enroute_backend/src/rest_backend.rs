use async_trait::async_trait;
use enroute_tracking::{
    bypass::{BypassReport, Evidence},
    event::RouteEvent,
    order::{Order, OrderId, UserId},
    store::{
        Authenticator, BypassReportStore, EvidenceStore, OrderDirectory, RouteEventLog,
        StoreError,
    },
};
use reqwest::{Method, RequestBuilder, StatusCode, header::CONTENT_TYPE};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const AUTH_USER_PATH: &str = "/auth/v1/user";
pub const REST_API_PATH: &str = "/rest/v1";
pub const STORAGE_OBJECT_PATH: &str = "/storage/v1/object";

pub const ORDERS_TABLE: &str = "orders";
pub const ROUTE_EVENTS_TABLE: &str = "route_events";
pub const BYPASS_REPORTS_TABLE: &str = "bypass_reports";

const ORDER_COLUMNS: &str = "id,driver_id,route_polyline";

#[derive(Debug, Error)]
pub enum RestBackendError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error during {operation}: {status} - {message}")]
    Api {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl From<RestBackendError> for StoreError {
    fn from(error: RestBackendError) -> Self {
        match error {
            RestBackendError::Request(error) => StoreError::Transport(Box::new(error)),
            RestBackendError::Api {
                operation,
                status,
                message,
            } => StoreError::Rejected {
                operation,
                status,
                message,
            },
            RestBackendError::Deserialize(error) => StoreError::Decode(error.to_string()),
        }
    }
}

pub struct RestBackendParams {
    /// Project URL, e.g. `https://project.example.co`
    pub base_url: String,

    /// Service key, sent both as `apikey` and as bearer token on table and
    /// storage calls.
    pub api_key: String,

    /// Bucket receiving bypass evidence. Must allow public reads for the
    /// stored evidence URL to resolve.
    pub evidence_bucket: String,
}

#[derive(Deserialize)]
struct AuthUser {
    id: UserId,
}

pub struct RestBackend {
    params: RestBackendParams,
    client: reqwest::Client,
}

impl RestBackend {
    pub fn new(params: RestBackendParams) -> Self {
        Self {
            params,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.params.base_url.trim_end_matches('/'), path)
    }

    fn table_url(&self, table: &str) -> String {
        self.url(&format!("{REST_API_PATH}/{table}"))
    }

    fn object_url(&self, path: &str) -> String {
        self.url(&format!(
            "{STORAGE_OBJECT_PATH}/{}/{}",
            self.params.evidence_bucket, path
        ))
    }

    fn public_object_url(&self, path: &str) -> String {
        self.url(&format!(
            "{STORAGE_OBJECT_PATH}/public/{}/{}",
            self.params.evidence_bucket, path
        ))
    }

    fn service_request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.params.api_key)
            .bearer_auth(&self.params.api_key)
    }

    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, RestBackendError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(RestBackendError::Api {
                operation,
                status,
                message,
            })
        }
    }

    async fn insert_row<T>(
        &self,
        table: &str,
        row: &T,
        operation: &'static str,
    ) -> Result<(), RestBackendError>
    where
        T: serde::Serialize + ?Sized,
    {
        let response = self
            .service_request(Method::POST, self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;

        Self::ensure_success(response, operation).await?;

        debug!("RestBackend: Inserted row into {}", table);

        Ok(())
    }

    async fn fetch_user(&self, token: &str) -> Result<Option<UserId>, RestBackendError> {
        let response = self
            .client
            .get(self.url(AUTH_USER_PATH))
            .header("apikey", &self.params.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        let response = Self::ensure_success(response, "authenticate").await?;
        let body = response.text().await?;
        let user: AuthUser = serde_json::from_str(&body)?;

        Ok(Some(user.id))
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, RestBackendError> {
        let response = self
            .service_request(Method::GET, self.table_url(ORDERS_TABLE))
            .query(&[
                ("id", format!("eq.{order_id}")),
                ("select", ORDER_COLUMNS.to_string()),
            ])
            .send()
            .await?;

        let response = Self::ensure_success(response, "find order").await?;
        let body = response.text().await?;
        let rows: Vec<Order> = serde_json::from_str(&body)?;

        debug!("RestBackend: Fetched {} rows for order {}", rows.len(), order_id);

        Ok(rows.into_iter().next())
    }

    async fn upload_object(&self, path: &str, evidence: &Evidence) -> Result<(), RestBackendError> {
        let response = self
            .service_request(Method::POST, self.object_url(path))
            .header(CONTENT_TYPE, evidence.content_type())
            .header("x-upsert", "false")
            .body(evidence.bytes.clone())
            .send()
            .await?;

        Self::ensure_success(response, "upload evidence").await?;

        debug!(
            "RestBackend: Uploaded {} bytes to {}",
            evidence.bytes.len(),
            path
        );

        Ok(())
    }
}

#[async_trait]
impl Authenticator for RestBackend {
    async fn authenticate(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        Ok(self.fetch_user(token).await?)
    }
}

#[async_trait]
impl OrderDirectory for RestBackend {
    async fn find_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.fetch_order(order_id).await?)
    }
}

#[async_trait]
impl RouteEventLog for RestBackend {
    async fn append(&self, event: &RouteEvent) -> Result<(), StoreError> {
        Ok(self
            .insert_row(ROUTE_EVENTS_TABLE, event, "append route event")
            .await?)
    }
}

#[async_trait]
impl EvidenceStore for RestBackend {
    async fn put(&self, path: &str, evidence: &Evidence) -> Result<(), StoreError> {
        Ok(self.upload_object(path, evidence).await?)
    }

    fn public_url(&self, path: &str) -> String {
        self.public_object_url(path)
    }
}

#[async_trait]
impl BypassReportStore for RestBackend {
    async fn insert(&self, report: &BypassReport) -> Result<(), StoreError> {
        Ok(self
            .insert_row(BYPASS_REPORTS_TABLE, report, "insert bypass report")
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: &str) -> RestBackend {
        RestBackend::new(RestBackendParams {
            base_url: base_url.to_string(),
            api_key: "service-key".to_string(),
            evidence_bucket: "bypass-evidence".to_string(),
        })
    }

    #[test]
    fn test_urls() {
        let backend = backend("https://project.example.co/");

        assert_eq!(
            backend.table_url(ROUTE_EVENTS_TABLE),
            "https://project.example.co/rest/v1/route_events"
        );
        assert_eq!(
            backend.object_url("order-1/report.jpg"),
            "https://project.example.co/storage/v1/object/bypass-evidence/order-1/report.jpg"
        );
        assert_eq!(
            backend.public_url("order-1/report.jpg"),
            "https://project.example.co/storage/v1/object/public/bypass-evidence/order-1/report.jpg"
        );
    }

    #[test]
    fn test_api_error_maps_to_rejection() {
        let error: StoreError = RestBackendError::Api {
            operation: "find order",
            status: 500,
            message: "boom".to_string(),
        }
        .into();

        assert!(matches!(
            error,
            StoreError::Rejected {
                operation: "find order",
                status: 500,
                ..
            }
        ));
    }

    #[test]
    fn test_order_rows() {
        let rows: Vec<Order> = serde_json::from_str(
            r#"[{"id": "o-1", "driver_id": "d-1", "route_polyline": "_p~iF~ps|U"}]"#,
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].driver_id, Some(UserId::from("d-1")));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // port 9 (discard) on localhost is expected to refuse connections
        let backend = backend("http://127.0.0.1:9");

        let result = backend.find_order(&OrderId::from("o-1")).await;

        assert!(matches!(result, Err(StoreError::Transport(_))));
    }
}
