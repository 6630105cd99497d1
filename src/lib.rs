//! Incident report normalization and deduplication.
//!
//! Turns raw community-reported enforcement activity from heterogeneous
//! feeds into a single deduplicated, confidence-scored incident set,
//! partitioned by date and by region.

pub mod analysis;
pub mod config;
pub mod confidence;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod regions;
pub mod store;
pub mod timestamps;
