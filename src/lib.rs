pub mod analytics;
pub mod config;
pub mod error;
pub mod filters;
pub mod fingerprint;
pub mod listing;
pub mod selection;
pub mod storage;
pub mod types;
