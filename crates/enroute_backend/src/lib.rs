//! Tracking collaborators backed by a hosted backend: a PostgREST table API,
//! a session endpoint and an object storage API behind one base URL.

pub mod rest_backend;
