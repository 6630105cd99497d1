//! Analysis over normalized incidents.
//!
//! Submodules:
//! - `similarity`: distance and description similarity measures.
//! - `dedup`: greedy duplicate collapse across sources.
//! - `groupings`: organizes the deduplicated set by date and by region.

pub mod dedup;
pub mod groupings;
pub mod similarity;
