//! Statistical analysis
//!
//! - **descriptive**: generic numeric summaries
//! - **anonymity**: intersection counts of blurred regions against a
//!   reference layer — the achieved anonymity-set sizes

pub mod anonymity;
pub mod descriptive;

pub use anonymity::{assess, intersection_counts, AnonymityReport, CountBatch};
pub use descriptive::{summarize, summarize_with, Ddof, StatsSummary};
