pub mod app;
pub mod config;
pub mod export;
pub mod ingest;
pub mod prune;
pub mod report;
pub mod runs;
pub mod stats;
pub mod tracking;
