//! Collaborators owned by the hosting platform. The tracker only calls into
//! them; how they persist or authenticate is up to the implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    bypass::{BypassReport, Evidence},
    event::RouteEvent,
    order::{Order, OrderId, UserId},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Backend request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Backend rejected {operation}: {status} - {message}")]
    Rejected {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("Unexpected backend response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolves a bearer token to the caller, `None` when the token is not
    /// a valid session.
    async fn authenticate(&self, token: &str) -> Result<Option<UserId>, StoreError>;
}

#[async_trait]
pub trait OrderDirectory: Send + Sync {
    async fn find_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;
}

/// Append-only.
#[async_trait]
pub trait RouteEventLog: Send + Sync {
    async fn append(&self, event: &RouteEvent) -> Result<(), StoreError>;
}

#[async_trait]
pub trait EvidenceStore: Send + Sync {
    async fn put(&self, path: &str, evidence: &Evidence) -> Result<(), StoreError>;

    fn public_url(&self, path: &str) -> String;
}

#[async_trait]
pub trait BypassReportStore: Send + Sync {
    async fn insert(&self, report: &BypassReport) -> Result<(), StoreError>;
}

/// A backend that provides every collaborator.
pub trait TrackingBackend:
    Authenticator + OrderDirectory + RouteEventLog + EvidenceStore + BypassReportStore
{
}

impl<T> TrackingBackend for T where
    T: Authenticator + OrderDirectory + RouteEventLog + EvidenceStore + BypassReportStore
{
}
