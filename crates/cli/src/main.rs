//! epigis CLI - privacy-preserving blurring of point layers

mod layers;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use epigis_algorithms::blurring::{Blur, BlurParams, CentroidSource};
use epigis_algorithms::statistics::assess;
use epigis_algorithms::vector::PolygonIndex;
use epigis_core::Feedback;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "epigis")]
#[command(author, version, about = "Privacy-preserving spatial analysis tools", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Blur a point layer behind randomized buffer polygons
    Blur {
        /// Input point layer (GeoJSON)
        input: PathBuf,
        /// Output polygon layer (GeoJSON)
        output: PathBuf,
        /// Blur radius in map units
        #[arg(short, long, default_value = "500.0")]
        radius: f64,
        /// Polygon mask the displaced centers must fall inside
        #[arg(short, long)]
        envelope: Option<PathBuf>,
        /// Sampling attempts per point before giving up on the mask
        #[arg(long, default_value = "50")]
        max_attempts: u32,
        /// Vertices approximating each buffer circle
        #[arg(long, default_value = "36")]
        segments: usize,
        /// Seed for a reproducible run (entropy-seeded otherwise)
        #[arg(long)]
        seed: Option<u64>,
        /// Add a Radius attribute to the output
        #[arg(long)]
        export_radius: bool,
        /// Add X_centroid/Y_centroid attributes: displaced or original
        #[arg(long)]
        export_centroid: Option<String>,
    },
    /// Measure the anonymity-set sizes a blurred layer achieves
    Assess {
        /// Blurred polygon layer (GeoJSON)
        blurred: PathBuf,
        /// Reference polygon layer, e.g. buildings (GeoJSON)
        reference: PathBuf,
        /// Write the per-feature intersection counts as CSV
        #[arg(long)]
        counts: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.green}] {percent}%")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.set_message(msg.to_string());
    pb
}

fn percent_feedback(pb: &ProgressBar) -> Feedback {
    let pb = pb.clone();
    Feedback::with_progress(move |fraction| pb.set_position((fraction * 100.0).round() as u64))
}

fn parse_centroid_source(s: &str) -> Result<CentroidSource> {
    match s.to_lowercase().as_str() {
        "displaced" | "d" => Ok(CentroidSource::Displaced),
        "original" | "o" => Ok(CentroidSource::Original),
        _ => bail!("Unknown centroid source: {}. Use displaced or original.", s),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Blur {
            input,
            output,
            radius,
            envelope,
            max_attempts,
            segments,
            seed,
            export_radius,
            export_centroid,
        } => {
            let export_centroid = export_centroid
                .as_deref()
                .map(parse_centroid_source)
                .transpose()?;

            let layer = layers::read_features(&input)?;
            if layer.is_empty() {
                bail!("{}: no features to blur", input.display());
            }
            info!("Input: {} point features", layer.len());

            let envelope_index = match &envelope {
                Some(path) => {
                    let (polygons, envelope_crs) = layers::read_polygons(path)?;
                    if let (Some(a), Some(b)) = (&layer.crs, &envelope_crs) {
                        a.ensure_matches(b)
                            .context("input and envelope layers must share one CRS")?;
                    }
                    info!("Envelope: {} polygons", polygons.len());
                    Some(PolygonIndex::build(polygons)?)
                }
                None => None,
            };

            let params = BlurParams {
                radius,
                max_attempts,
                segments,
                export_radius,
                export_centroid,
            };
            let blur = Blur::new(params, envelope_index)?;

            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy(),
            };

            let pb = progress_bar("Blurring");
            let feedback = percent_feedback(&pb);
            let start = Instant::now();
            let batch = blur.blur_all(&mut rng, &layer.features, &feedback)?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            for failure in &batch.failures {
                let label = failure
                    .feature_id
                    .clone()
                    .unwrap_or_else(|| format!("#{}", failure.index));
                warn!(
                    "Feature {}: outside the envelope after {} attempts, skipped",
                    label, failure.attempts
                );
            }

            layers::write_features(&output, &batch.features, layer.crs.as_ref())?;

            println!("Blurred layer saved to: {}", output.display());
            println!(
                "  Features: {} blurred, {} skipped",
                batch.features.len(),
                batch.failures.len()
            );
            println!("  Processing time: {:.2?}", elapsed);
        }

        Commands::Assess {
            blurred,
            reference,
            counts,
        } => {
            let (blurred_polygons, blurred_crs) = layers::read_polygons(&blurred)?;
            let (reference_polygons, reference_crs) = layers::read_polygons(&reference)?;
            if let (Some(a), Some(b)) = (&blurred_crs, &reference_crs) {
                a.ensure_matches(b)
                    .context("blurred and reference layers must share one CRS")?;
            }
            info!(
                "Assessing {} blurred regions against {} reference features",
                blurred_polygons.len(),
                reference_polygons.len()
            );

            let pb = progress_bar("Assessing");
            let feedback = percent_feedback(&pb);
            let start = Instant::now();
            let report = assess(&blurred_polygons, reference_polygons, &feedback)?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            println!("Anonymity assessment");
            for (key, value) in report.rows() {
                println!("  {:<20} {}", key, value);
            }
            println!("  Processing time: {:.2?}", elapsed);

            if report.worst_case() <= 1 {
                warn!(
                    "At least one released region covers {} reference unit(s); \
                     it may fail to anonymize its subject",
                    report.worst_case()
                );
            }

            if let Some(path) = counts {
                let mut csv = String::from("count\n");
                for count in &report.counts {
                    csv.push_str(&count.to_string());
                    csv.push('\n');
                }
                std::fs::write(&path, csv)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Counts saved to: {}", path.display());
            }
        }
    }

    Ok(())
}
