//! Blur engine
//!
//! Randomized two-stage buffering: draw a displaced center within
//! `radius` of the source point, then buffer the displaced center by
//! the same radius. The source point always lies inside the output
//! polygon, and no part of the output lies farther than 2·radius from
//! it (up to the thin polygonization margin of the ring) — the
//! displacement bound surfaced to users. With an envelope mask,
//! displaced centers are re-drawn until one falls inside the mask or
//! the attempt budget runs out.

use geo::{Geometry, Point};
use rand::Rng;

use epigis_core::{AttributeValue, Error, Feature, Feedback, Result};

use crate::blurring::sampler::random_point_in_disk;
use crate::vector::{circle_polygon, PolygonIndex};

/// Which point the exported `X_centroid` / `Y_centroid` attributes
/// record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentroidSource {
    /// The accepted displaced center — safe to publish alongside the
    /// blurred geometry.
    Displaced,
    /// The original location. Output carrying this must never leave the
    /// trusted environment; it exists for internal audit pipelines.
    Original,
}

/// Parameters for the blur engine
#[derive(Debug, Clone)]
pub struct BlurParams {
    /// Blur radius in map units; must be positive and finite
    pub radius: f64,
    /// Sampling attempts per point before the envelope gives up
    pub max_attempts: u32,
    /// Vertices approximating each buffer circle
    pub segments: usize,
    /// Attach a `Radius` attribute to each output feature
    pub export_radius: bool,
    /// Attach `X_centroid` / `Y_centroid` attributes
    pub export_centroid: Option<CentroidSource>,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            radius: 500.0,
            max_attempts: 50,
            segments: 36,
            export_radius: false,
            export_centroid: None,
        }
    }
}

/// One skipped point in a batch
#[derive(Debug, Clone)]
pub struct BlurFailure {
    /// Position of the feature in the input
    pub index: usize,
    /// Feature id, if the source carried one
    pub feature_id: Option<String>,
    /// Draws spent before giving up
    pub attempts: u32,
}

/// Outcome of [`Blur::blur_all`]
#[derive(Debug, Default)]
pub struct BlurBatch {
    /// Blurred features, in input order (failed points skipped)
    pub features: Vec<Feature>,
    /// Points whose displaced centers never landed inside the envelope
    pub failures: Vec<BlurFailure>,
    /// True when the batch stopped early on a cancellation request
    pub cancelled: bool,
}

/// Point-blurring engine.
///
/// Holds the validated parameters and the optional envelope mask for
/// one run. Every draw comes from an explicit RNG passed by the caller,
/// so concurrent workers can keep independent generators; the envelope
/// index is read-only and shared.
#[derive(Debug)]
pub struct Blur {
    params: BlurParams,
    envelope: Option<PolygonIndex>,
}

impl Blur {
    /// Validate parameters and bind an optional envelope mask.
    pub fn new(params: BlurParams, envelope: Option<PolygonIndex>) -> Result<Self> {
        if !params.radius.is_finite() || params.radius <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "radius",
                value: params.radius.to_string(),
                reason: "must be a positive, finite distance".to_string(),
            });
        }
        if params.segments < 3 {
            return Err(Error::InvalidParameter {
                name: "segments",
                value: params.segments.to_string(),
                reason: "a polygon ring needs at least 3 vertices".to_string(),
            });
        }
        if params.max_attempts == 0 {
            return Err(Error::InvalidParameter {
                name: "max_attempts",
                value: "0".to_string(),
                reason: "at least one sampling attempt is required".to_string(),
            });
        }
        Ok(Self { params, envelope })
    }

    pub fn params(&self) -> &BlurParams {
        &self.params
    }

    /// Blur a single point feature.
    ///
    /// Fails with `InvalidParameter` when the feature has no point
    /// geometry and with `PointOutsideEnvelope` when the attempt budget
    /// runs out against the envelope.
    pub fn blur<R: Rng + ?Sized>(&self, rng: &mut R, feature: &Feature) -> Result<Feature> {
        self.blur_indexed(rng, feature, 0)
    }

    fn blur_indexed<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        feature: &Feature,
        index: usize,
    ) -> Result<Feature> {
        let point = feature.point().ok_or_else(|| Error::InvalidParameter {
            name: "feature",
            value: feature.label(index),
            reason: "blurring requires point geometry".to_string(),
        })?;
        if !point.x().is_finite() || !point.y().is_finite() {
            return Err(Error::InvalidParameter {
                name: "feature",
                value: feature.label(index),
                reason: "non-finite coordinates".to_string(),
            });
        }

        let center = self.displaced_center(rng, point, feature, index)?;
        // Ring vertices sit at the circumscribed radius so the polygon
        // covers the entire uncertainty disk: the source point can never
        // fall in the sliver between a chord and its arc.
        let ring_radius =
            self.params.radius / (std::f64::consts::PI / self.params.segments as f64).cos();
        let polygon = circle_polygon(center, ring_radius, self.params.segments);

        let mut out = Feature::new(Geometry::Polygon(polygon));
        out.id = feature.id.clone();
        out.attributes = feature.attributes.clone();
        if self.params.export_radius {
            out.set_attribute("Radius", AttributeValue::Float(self.params.radius));
        }
        if let Some(source) = self.params.export_centroid {
            let exported = match source {
                CentroidSource::Displaced => center,
                CentroidSource::Original => point,
            };
            out.set_attribute("X_centroid", AttributeValue::Float(exported.x()));
            out.set_attribute("Y_centroid", AttributeValue::Float(exported.y()));
        }
        Ok(out)
    }

    /// Sample a displaced center, enforcing the envelope when present.
    fn displaced_center<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        point: Point<f64>,
        feature: &Feature,
        index: usize,
    ) -> Result<Point<f64>> {
        let Some(envelope) = &self.envelope else {
            return Ok(random_point_in_disk(rng, point, self.params.radius));
        };

        for _ in 0..self.params.max_attempts {
            let candidate = random_point_in_disk(rng, point, self.params.radius);
            if envelope.intersects_point(&candidate) {
                return Ok(candidate);
            }
        }

        // An envelope disjoint from the reachable disk always lands
        // here: the point cannot be hidden inside the requested mask.
        Err(Error::PointOutsideEnvelope {
            feature: feature.label(index),
            attempts: self.params.max_attempts,
        })
    }

    /// Blur every feature of a batch.
    ///
    /// Sequential and order-preserving. Points the envelope never
    /// accepts are recorded in the failure list and skipped; the batch
    /// itself keeps going. Malformed input (non-point geometry) aborts
    /// the whole batch. Progress is reported after each item, the
    /// cancel flag is checked before each item, and a cancelled batch
    /// returns what it already produced.
    pub fn blur_all<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        features: &[Feature],
        feedback: &Feedback,
    ) -> Result<BlurBatch> {
        let mut batch = BlurBatch {
            features: Vec::with_capacity(features.len()),
            ..Default::default()
        };
        let total = features.len();

        for (index, feature) in features.iter().enumerate() {
            if feedback.is_cancelled() {
                batch.cancelled = true;
                break;
            }
            match self.blur_indexed(rng, feature, index) {
                Ok(blurred) => batch.features.push(blurred),
                Err(Error::PointOutsideEnvelope { attempts, .. }) => {
                    batch.failures.push(BlurFailure {
                        index,
                        feature_id: feature.id.clone(),
                        attempts,
                    });
                }
                Err(fatal) => return Err(fatal),
            }
            feedback.report((index + 1) as f64 / total as f64);
        }

        Ok(batch)
    }
}
