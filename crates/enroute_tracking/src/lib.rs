//! Driver route-deviation tracking.
//!
//! A driver's live position is checked against the order's planned route,
//! stored as an encoded polyline. Positions further than
//! [`deviation::OFF_ROUTE_THRESHOLD`] from the route are off route, and every
//! check of an order with a route is appended to the route event log.
//!
//! The platform collaborators (sessions, orders, event log, blob storage,
//! bypass reports) are the traits in [`store`]. [`memory::InMemoryBackend`]
//! implements all of them in process.

pub mod bypass;
pub mod deviation;
pub mod distance;
pub mod error;
pub mod event;
pub mod geometry;
pub mod geopoint;
pub mod memory;
pub mod order;
pub mod polyline;
pub mod store;
pub mod tracker;
