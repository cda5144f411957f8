pub mod assets;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod server;
