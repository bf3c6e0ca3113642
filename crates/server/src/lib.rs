pub mod api;
pub mod bundle;
pub mod config;
pub mod error;
pub mod ingest;
pub mod resolve;
pub mod storage;
