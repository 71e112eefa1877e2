//! Circle buffers
//!
//! A buffer is the polygon standing in for the disk of a given radius
//! around a center point; `segments` controls boundary fidelity.

use geo::{Coord, LineString, Point, Polygon};
use std::f64::consts::TAU;

/// Approximate the disk of `radius` around `center` as a closed polygon
/// ring with `segments` boundary vertices.
///
/// The ring is counter-clockwise and explicitly closed. Radius
/// validation is the caller's job; a segment count below 3 cannot form
/// a ring and is bumped up to 3.
pub fn circle_polygon(center: Point<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(3);
    let mut ring = Vec::with_capacity(n + 1);
    for i in 0..n {
        let angle = TAU * i as f64 / n as f64;
        ring.push(Coord {
            x: center.x() + radius * angle.cos(),
            y: center.y() + radius * angle.sin(),
        });
    }
    ring.push(ring[0]);

    Polygon::new(LineString::new(ring), vec![])
}
