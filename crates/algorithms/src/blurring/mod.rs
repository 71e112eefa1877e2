//! Point blurring
//!
//! Displaces sensitive point locations behind uncertainty polygons so
//! exact positions cannot be re-identified when a layer is shared. The
//! algorithm is a randomized two-stage buffering: a uniform random
//! offset within a disk picks a displaced center, then a disk-sized
//! buffer around that center becomes the published geometry. An
//! optional envelope mask constrains where displaced centers may fall.

mod blur;
mod sampler;

pub use blur::{Blur, BlurBatch, BlurFailure, BlurParams, CentroidSource};
pub use sampler::random_point_in_disk;
