//! # epigis Algorithms
//!
//! Geoprivacy algorithms for epigis.
//!
//! ## Available Algorithm Categories
//!
//! - **blurring**: randomized displacement of sensitive points behind
//!   buffer polygons, with optional envelope masks
//! - **vector**: circle buffers and bounding-box spatial indexing
//! - **statistics**: descriptive summaries and anonymity assessment of
//!   blurred layers against a reference layer

pub mod blurring;
pub mod statistics;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::blurring::{
        random_point_in_disk, Blur, BlurBatch, BlurFailure, BlurParams, CentroidSource,
    };
    pub use crate::statistics::{
        assess, intersection_counts, summarize, summarize_with, AnonymityReport, CountBatch,
        Ddof, StatsSummary,
    };
    pub use crate::vector::{circle_polygon, PolygonIndex, SpatialIndex};
    pub use epigis_core::prelude::*;
}
