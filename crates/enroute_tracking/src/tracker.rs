use std::sync::Arc;

use jiff::Timestamp;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    bypass::{BypassReport, BypassSubmission, evidence_path},
    deviation::{PlannedRoute, RouteCheck},
    error::TrackingError,
    event::RouteEvent,
    geometry::DistanceMode,
    geopoint::GeoPoint,
    order::{Order, OrderId, UserId},
    store::{BypassReportStore, EvidenceStore, OrderDirectory, RouteEventLog, TrackingBackend},
};

#[derive(Debug, Clone)]
pub struct PositionUpdate {
    pub order_id: OrderId,
    pub position: GeoPoint,
}

/// Runs the route tracking operations for an already authenticated caller.
///
/// Every call is independent: the tracker keeps no state between calls, and
/// concurrent calls for the same order append events in the order the
/// event log receives them.
pub struct RouteTracker {
    orders: Arc<dyn OrderDirectory>,
    events: Arc<dyn RouteEventLog>,
    evidence: Arc<dyn EvidenceStore>,
    reports: Arc<dyn BypassReportStore>,
    distance_mode: DistanceMode,
}

impl RouteTracker {
    pub fn new<B>(backend: Arc<B>, distance_mode: DistanceMode) -> Self
    where
        B: TrackingBackend + 'static,
    {
        Self {
            orders: backend.clone(),
            events: backend.clone(),
            evidence: backend.clone(),
            reports: backend,
            distance_mode,
        }
    }

    pub fn from_collaborators(
        orders: Arc<dyn OrderDirectory>,
        events: Arc<dyn RouteEventLog>,
        evidence: Arc<dyn EvidenceStore>,
        reports: Arc<dyn BypassReportStore>,
        distance_mode: DistanceMode,
    ) -> Self {
        Self {
            orders,
            events,
            evidence,
            reports,
            distance_mode,
        }
    }

    pub fn distance_mode(&self) -> DistanceMode {
        self.distance_mode
    }

    /// Classifies a live position against the order's planned route and
    /// appends one `on_route` / `off_route` event.
    ///
    /// If the event cannot be appended the whole call fails with
    /// [`TrackingError::Dependency`], even though the classification itself
    /// succeeded.
    pub async fn update_position(
        &self,
        caller: &UserId,
        update: PositionUpdate,
    ) -> Result<RouteCheck, TrackingError> {
        let order = self.authorize(caller, &update.order_id).await?;

        if !update.position.is_valid() {
            return Err(TrackingError::Validation(format!(
                "position {} is outside the valid coordinate range",
                update.position
            )));
        }

        let Some(route) = PlannedRoute::from_stored(order.route_polyline.as_deref()) else {
            info!(order_id = %order.id, "Order has no planned route");
            return Ok(RouteCheck::no_route());
        };

        let check = route.check(&update.position, self.distance_mode);

        if let Some(event) = RouteEvent::from_check(&order.id, caller, &update.position, &check)
        {
            if let Err(err) = self.events.append(&event).await {
                error!(
                    order_id = %order.id,
                    status = ?check.status,
                    distance = ?check.distance.map(f64::from),
                    "Failed to record route event: {}",
                    err
                );
                return Err(err.into());
            }
        }

        info!(
            order_id = %order.id,
            driver_id = %caller,
            status = ?check.status,
            distance = ?check.distance.map(f64::from),
            "Checked driver position"
        );

        Ok(check)
    }

    /// Stores the evidence, records the report and appends a
    /// `bypass_submitted` event, in that order.
    pub async fn submit_bypass(
        &self,
        caller: &UserId,
        submission: BypassSubmission,
    ) -> Result<BypassReport, TrackingError> {
        let order = self.authorize(caller, &submission.order_id).await?;
        submission.validate()?;

        let report_id = Uuid::new_v4();
        let path = evidence_path(&order.id, &report_id, &submission.evidence);

        if let Err(err) = self.evidence.put(&path, &submission.evidence).await {
            error!(order_id = %order.id, path = %path, "Failed to store bypass evidence: {}", err);
            return Err(err.into());
        }

        let report = BypassReport {
            id: report_id,
            order_id: order.id.clone(),
            driver_id: caller.clone(),
            reason: submission.reason.trim().to_string(),
            notes: submission.notes(),
            evidence_url: self.evidence.public_url(&path),
            lat: submission.position.map(|p| p.lat),
            lng: submission.position.map(|p| p.lng),
            created_at: Timestamp::now(),
        };

        if let Err(err) = self.reports.insert(&report).await {
            error!(order_id = %order.id, report_id = %report.id, "Failed to record bypass report: {}", err);
            return Err(err.into());
        }

        if let Err(err) = self
            .events
            .append(&RouteEvent::bypass_submitted(&report))
            .await
        {
            error!(order_id = %order.id, report_id = %report.id, "Failed to record bypass event: {}", err);
            return Err(err.into());
        }

        info!(
            order_id = %order.id,
            driver_id = %caller,
            report_id = %report.id,
            "Bypass report submitted"
        );

        Ok(report)
    }

    async fn authorize(&self, caller: &UserId, order_id: &OrderId) -> Result<Order, TrackingError> {
        let order = self
            .orders
            .find_order(order_id)
            .await?
            .ok_or_else(|| TrackingError::OrderNotFound(order_id.clone()))?;

        if !order.is_assigned_to(caller) {
            warn!(order_id = %order_id, caller = %caller, "Caller is not the assigned driver");
            return Err(TrackingError::Forbidden(order_id.clone()));
        }

        Ok(order)
    }
}
