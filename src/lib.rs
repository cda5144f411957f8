pub mod backup;
pub mod cli;
pub mod cli_handlers;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod intake;
pub mod logging;
pub mod records;
pub mod search;
pub mod stats;
pub mod store;
pub mod time_utils;
pub mod uploads;
