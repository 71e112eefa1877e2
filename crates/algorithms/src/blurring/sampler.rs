//! Random offsets within a disk
//!
//! Drawing the radius as r·√u keeps the samples uniform over the disk
//! *area*; drawing it linearly would crowd points toward the center.

use geo::Point;
use rand::Rng;
use std::f64::consts::TAU;

/// Draw a point uniformly distributed over the disk of `radius` around
/// `center`.
///
/// Pure function of (center, radius, RNG state): a seeded generator
/// reproduces the same sequence of offsets. Radius validation is the
/// caller's job.
pub fn random_point_in_disk<R: Rng + ?Sized>(
    rng: &mut R,
    center: Point<f64>,
    radius: f64,
) -> Point<f64> {
    let rho = radius * rng.gen::<f64>().sqrt();
    let theta = TAU * rng.gen::<f64>();
    Point::new(
        center.x() + rho * theta.cos(),
        center.y() + rho * theta.sin(),
    )
}
