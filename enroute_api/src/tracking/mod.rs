pub mod bypass;
pub mod routes;
pub mod update_position;
