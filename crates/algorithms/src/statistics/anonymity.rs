//! Anonymity assessment
//!
//! Measures how many reference units (buildings, parcels, dwellings)
//! each blurred region covers — the de-facto anonymity-set size
//! achieved by a released layer. A distribution minimum of 1 means at
//! least one region likely fails to hide its subject; that is a quality
//! signal about the chosen radius and envelope, not a processing error.

use geo::Polygon;
use serde::Serialize;

use epigis_core::{Error, Feedback, Result};

use crate::statistics::descriptive::{format_value, summarize, StatsSummary};
use crate::vector::PolygonIndex;

/// Intersection counts for a batch, in input order
#[derive(Debug, Clone)]
pub struct CountBatch {
    pub counts: Vec<usize>,
    /// True when counting stopped early on a cancellation request
    pub cancelled: bool,
}

/// Quality report for one blurred layer against one reference layer
#[derive(Debug, Clone, Serialize)]
pub struct AnonymityReport {
    pub blurred_count: usize,
    pub reference_count: usize,
    /// Reference units intersecting each blurred region, input order
    pub counts: Vec<usize>,
    pub summary: StatsSummary,
    /// True when the report covers a cancelled, partial count run
    pub cancelled: bool,
}

/// Count, for each blurred polygon, the reference polygons
/// intersecting it.
///
/// Candidates come from the reference index by bounding box and each is
/// re-checked with an exact intersection test. Output order matches
/// input order; cancellation keeps the counts already produced.
pub fn intersection_counts(
    blurred: &[Polygon<f64>],
    reference: &PolygonIndex,
    feedback: &Feedback,
) -> CountBatch {
    let total = blurred.len();
    let mut counts = Vec::with_capacity(total);

    for (i, polygon) in blurred.iter().enumerate() {
        if feedback.is_cancelled() {
            return CountBatch {
                counts,
                cancelled: true,
            };
        }
        counts.push(reference.count_intersections(polygon));
        feedback.report((i + 1) as f64 / total as f64);
    }

    CountBatch {
        counts,
        cancelled: false,
    }
}

/// Assess a blurred layer against a reference layer.
///
/// Builds the reference index once, counts intersections per blurred
/// polygon and summarizes the distribution. The minimum of the
/// distribution is the worst-case anonymity-set size for the chosen
/// radius and envelope.
pub fn assess(
    blurred: &[Polygon<f64>],
    reference: Vec<Polygon<f64>>,
    feedback: &Feedback,
) -> Result<AnonymityReport> {
    if blurred.is_empty() {
        return Err(Error::InvalidParameter {
            name: "blurred",
            value: "0 features".to_string(),
            reason: "nothing to assess".to_string(),
        });
    }
    if reference.is_empty() {
        return Err(Error::InvalidParameter {
            name: "reference",
            value: "0 features".to_string(),
            reason: "an empty reference layer cannot measure anonymity".to_string(),
        });
    }

    let reference_count = reference.len();
    let index = PolygonIndex::build(reference)?;
    let batch = intersection_counts(blurred, &index, feedback);

    let values: Vec<f64> = batch.counts.iter().map(|&c| c as f64).collect();
    let summary = summarize(&values)?;

    Ok(AnonymityReport {
        blurred_count: blurred.len(),
        reference_count,
        counts: batch.counts,
        summary,
        cancelled: batch.cancelled,
    })
}

impl AnonymityReport {
    /// Worst-case anonymity-set size over the assessed regions.
    pub fn worst_case(&self) -> usize {
        self.counts.iter().copied().min().unwrap_or(0)
    }

    /// Key–value rows in the layout of the assessment table.
    pub fn rows(&self) -> Vec<(String, String)> {
        vec![
            ("Count(blurred)".to_string(), self.blurred_count.to_string()),
            (
                "Count(reference)".to_string(),
                self.reference_count.to_string(),
            ),
            ("Min".to_string(), format_value(self.summary.min)),
            ("Average".to_string(), format!("{:.6}", self.summary.mean)),
            ("Max".to_string(), format_value(self.summary.max)),
            ("Median".to_string(), format!("{:.6}", self.summary.median)),
            ("Range".to_string(), format_value(self.summary.range)),
            (
                "Variance".to_string(),
                format!("{:.6}", self.summary.variance),
            ),
            (
                "Standard deviation".to_string(),
                format!("{:.6}", self.summary.std_dev),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    fn square(min_x: f64, min_y: f64, side: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (min_x, min_y),
                (min_x + side, min_y),
                (min_x + side, min_y + side),
                (min_x, min_y + side),
                (min_x, min_y),
            ]),
            vec![],
        )
    }

    /// 3x3 grid of disjoint "building" squares, one per 10x10 cell.
    fn building_grid() -> Vec<Polygon<f64>> {
        let mut buildings = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                buildings.push(square(col as f64 * 10.0 + 2.0, row as f64 * 10.0 + 2.0, 4.0));
            }
        }
        buildings
    }

    #[test]
    fn test_counts_per_region() {
        // One region covering the whole grid, one covering a single
        // cell, one far away from everything.
        let blurred = vec![
            square(-5.0, -5.0, 40.0),
            square(1.0, 1.0, 6.0),
            square(100.0, 100.0, 5.0),
        ];

        let report = assess(&blurred, building_grid(), &Feedback::new()).unwrap();

        assert_eq!(report.counts, vec![9, 1, 0]);
        assert_eq!(report.blurred_count, 3);
        assert_eq!(report.reference_count, 9);
        assert_eq!(report.worst_case(), 0);
        assert!(!report.cancelled);
    }

    #[test]
    fn test_summary_over_counts() {
        let blurred = vec![square(-5.0, -5.0, 40.0), square(100.0, 100.0, 5.0)];
        let report = assess(&blurred, building_grid(), &Feedback::new()).unwrap();

        assert_eq!(report.summary.count, 2);
        assert_eq!(report.summary.min, 0.0);
        assert_eq!(report.summary.max, 9.0);
        assert_eq!(report.summary.mean, 4.5);
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let region = vec![square(0.0, 0.0, 1.0)];
        assert!(assess(&[], building_grid(), &Feedback::new()).is_err());
        assert!(assess(&region, Vec::new(), &Feedback::new()).is_err());
    }

    #[test]
    fn test_counts_preserve_order() {
        let blurred: Vec<Polygon<f64>> = (0..3)
            .map(|i| square(i as f64 * 10.0, 0.0, 9.0))
            .collect();
        let reference = PolygonIndex::build(building_grid()).unwrap();

        let batch = intersection_counts(&blurred, &reference, &Feedback::new());
        assert_eq!(batch.counts.len(), 3);
        // Each probe overlaps exactly the bottom-row building of its column
        assert_eq!(batch.counts, vec![1, 1, 1]);
    }

    #[test]
    fn test_cancelled_counts_are_partial() {
        let blurred = vec![square(0.0, 0.0, 5.0); 10];
        let reference = PolygonIndex::build(building_grid()).unwrap();
        let feedback = Feedback::new();
        feedback.cancel();

        let batch = intersection_counts(&blurred, &reference, &feedback);
        assert!(batch.cancelled);
        assert!(batch.counts.is_empty());
    }

    #[test]
    fn test_report_rows() {
        let blurred = vec![square(-5.0, -5.0, 40.0), square(100.0, 100.0, 5.0)];
        let report = assess(&blurred, building_grid(), &Feedback::new()).unwrap();
        let rows = report.rows();

        assert_eq!(rows[0], ("Count(blurred)".to_string(), "2".to_string()));
        assert_eq!(rows[1], ("Count(reference)".to_string(), "9".to_string()));
        assert_eq!(rows[2], ("Min".to_string(), "0".to_string()));
        assert_eq!(rows[3], ("Average".to_string(), "4.500000".to_string()));
        assert_eq!(rows[4], ("Max".to_string(), "9".to_string()));
    }
}
