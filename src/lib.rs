pub mod config;
pub mod database;
pub mod errors;
pub mod services;
pub mod sources;

#[cfg(feature = "server")]
pub mod server;
