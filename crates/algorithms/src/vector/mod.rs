//! Vector geometry utilities
//!
//! - Buffer: circle polygons standing in for disks around points
//! - Index: bounding-box candidate retrieval over geometry sets

mod buffer;
mod index;

pub use buffer::circle_polygon;
pub use index::{PolygonIndex, SpatialIndex};
