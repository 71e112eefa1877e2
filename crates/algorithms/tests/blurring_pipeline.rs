//! Integration tests for the full blur → assess pipeline.
//!
//! Exercises the published guarantees end to end: containment of the
//! original point, the 2·radius displacement bound, envelope
//! enforcement over a batch, and the anonymity numbers a released
//! layer achieves against a reference grid.

use geo::{Centroid, Geometry, Intersects, LineString, Point, Polygon};
use rand::rngs::StdRng;
use rand::SeedableRng;

use epigis_algorithms::blurring::{Blur, BlurParams, CentroidSource};
use epigis_algorithms::statistics::{assess, summarize};
use epigis_algorithms::vector::PolygonIndex;
use epigis_core::{AttributeValue, Feature, Feedback};

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

fn polygon_of(feature: &Feature) -> &Polygon<f64> {
    match &feature.geometry {
        Some(Geometry::Polygon(p)) => p,
        other => panic!("expected polygon geometry, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Published displacement guarantees
// ---------------------------------------------------------------------------

#[test]
fn origin_point_radius_100_stays_within_bounds() {
    let params = BlurParams {
        radius: 100.0,
        ..Default::default()
    };
    let blur = Blur::new(params, None).unwrap();
    let mut rng = StdRng::seed_from_u64(2024);
    let origin = Feature::from_point(0.0, 0.0);

    for _ in 0..1000 {
        let blurred = blur.blur(&mut rng, &origin).unwrap();
        let polygon = polygon_of(&blurred);

        // The polygon centroid is the displaced center: within radius
        let centroid = polygon.centroid().unwrap();
        let centroid_dist = (centroid.x().powi(2) + centroid.y().powi(2)).sqrt();
        assert!(centroid_dist <= 100.0 + 1e-6);

        // The original point is always covered
        assert!(polygon.intersects(&Point::new(0.0, 0.0)));

        // No vertex escapes twice the radius, beyond the thin
        // polygonization margin of the circumscribed ring
        let bound = 100.0 + 100.0 / (std::f64::consts::PI / 36.0).cos() + 1e-6;
        for coord in polygon.exterior().0.iter() {
            let dist = (coord.x * coord.x + coord.y * coord.y).sqrt();
            assert!(dist <= bound, "vertex at distance {dist}");
        }
    }
}

// ---------------------------------------------------------------------------
// Batch with an envelope mask
// ---------------------------------------------------------------------------

#[test]
fn masked_batch_keeps_order_and_reports_unmaskable_points() {
    // A coastal strip: only x >= 0 is acceptable. The second point
    // sits far inland on the wrong side and can never be masked.
    let mask = square(0.0, -1000.0, 2000.0);
    let envelope = PolygonIndex::build(vec![mask.clone()]).unwrap();

    let params = BlurParams {
        radius: 100.0,
        export_centroid: Some(CentroidSource::Displaced),
        ..Default::default()
    };
    let blur = Blur::new(params, Some(envelope)).unwrap();

    let mut unmaskable = Feature::from_point(-5000.0, 0.0);
    unmaskable.id = Some("inland".to_string());
    let features = vec![
        Feature::from_point(10.0, 0.0),
        unmaskable,
        Feature::from_point(30.0, 250.0),
    ];

    let mut rng = StdRng::seed_from_u64(7);
    let batch = blur.blur_all(&mut rng, &features, &Feedback::new()).unwrap();

    assert_eq!(batch.features.len(), 2);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].index, 1);
    assert_eq!(batch.failures[0].feature_id.as_deref(), Some("inland"));

    // Every accepted center intersects the mask
    for feature in &batch.features {
        let x = feature.attribute("X_centroid").unwrap().as_f64().unwrap();
        let y = feature.attribute("Y_centroid").unwrap().as_f64().unwrap();
        assert!(mask.intersects(&Point::new(x, y)));
    }

    // Output pairs with input by order: first result near the first
    // input, second near the third.
    let c0 = polygon_of(&batch.features[0]).centroid().unwrap();
    let c1 = polygon_of(&batch.features[1]).centroid().unwrap();
    assert!((c0.x() - 10.0).powi(2) + c0.y().powi(2) <= 100.0_f64.powi(2) + 1e-6);
    assert!((c1.x() - 30.0).powi(2) + (c1.y() - 250.0).powi(2) <= 100.0_f64.powi(2) + 1e-6);
}

// ---------------------------------------------------------------------------
// Blur then assess
// ---------------------------------------------------------------------------

#[test]
fn released_layer_assessed_against_building_grid() {
    // 20x20 grid of buildings, 50 units apart, 10 units wide
    let mut buildings = Vec::new();
    for row in 0..20 {
        for col in 0..20 {
            buildings.push(square(col as f64 * 50.0, row as f64 * 50.0, 10.0));
        }
    }

    // Case points scattered over the inner part of the grid
    let cases: Vec<Feature> = (0..40)
        .map(|i| {
            let x = 100.0 + ((i * 137) % 700) as f64;
            let y = 100.0 + ((i * 211) % 700) as f64;
            let mut f = Feature::from_point(x, y);
            f.set_attribute("case_id", AttributeValue::Int(i));
            f
        })
        .collect();

    let params = BlurParams {
        radius: 120.0,
        export_radius: true,
        ..Default::default()
    };
    let blur = Blur::new(params, None).unwrap();
    let mut rng = StdRng::seed_from_u64(31);
    let batch = blur.blur_all(&mut rng, &cases, &Feedback::new()).unwrap();
    assert_eq!(batch.features.len(), 40);
    assert!(batch.failures.is_empty());

    let blurred: Vec<Polygon<f64>> = batch
        .features
        .iter()
        .map(|f| polygon_of(f).clone())
        .collect();

    let report = assess(&blurred, buildings, &Feedback::new()).unwrap();

    assert_eq!(report.blurred_count, 40);
    assert_eq!(report.reference_count, 400);
    assert_eq!(report.counts.len(), 40);

    // A disk of radius 120 over this grid always covers several
    // buildings: the worst case cannot be a singleton region.
    assert!(report.worst_case() >= 2, "worst case {}", report.worst_case());
    assert!(report.summary.max <= 400.0);
    assert_eq!(report.summary.count, 40);

    // The report summary is the summary of the raw counts
    let values: Vec<f64> = report.counts.iter().map(|&c| c as f64).collect();
    assert_eq!(summarize(&values).unwrap(), report.summary);
}

// ---------------------------------------------------------------------------
// Progress and cancellation across the pipeline
// ---------------------------------------------------------------------------

#[test]
fn cancellation_mid_batch_keeps_partial_output() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let blur = Blur::new(BlurParams::default(), None).unwrap();
    let features: Vec<Feature> = (0..100)
        .map(|i| Feature::from_point(i as f64, i as f64))
        .collect();

    // The progress listener cancels its own run after the 10th item
    let feedback = Feedback::new();
    let trigger = feedback.clone();
    let done = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&done);
    let feedback = feedback.on_progress(move |_| {
        if counter.fetch_add(1, Ordering::Relaxed) + 1 == 10 {
            trigger.cancel();
        }
    });

    let batch = blur
        .blur_all(&mut StdRng::seed_from_u64(1), &features, &feedback)
        .unwrap();

    assert!(batch.cancelled);
    assert_eq!(batch.features.len(), 10);
    assert_eq!(done.load(Ordering::Relaxed), 10);
}

#[test]
fn determinism_across_identical_runs() {
    let blur = Blur::new(BlurParams::default(), None).unwrap();
    let features: Vec<Feature> = (0..20)
        .map(|i| Feature::from_point(i as f64 * 13.0, i as f64 * 7.0))
        .collect();

    let a = blur
        .blur_all(&mut StdRng::seed_from_u64(555), &features, &Feedback::new())
        .unwrap();
    let b = blur
        .blur_all(&mut StdRng::seed_from_u64(555), &features, &Feedback::new())
        .unwrap();

    assert_eq!(a.features.len(), b.features.len());
    for (fa, fb) in a.features.iter().zip(b.features.iter()) {
        assert_eq!(polygon_of(fa).exterior().0, polygon_of(fb).exterior().0);
    }
}
