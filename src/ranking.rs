//! Turns a sample record into ranked taxon observations for the charts.
//!
//! Everything here is pure: inputs are borrowed, outputs are freshly owned,
//! and failures are returned rather than logged.

use crate::domain::{SampleRecord, TaxonObservation};
use crate::error::DashError;

pub const DEFAULT_TOP_K: usize = 10;

pub fn to_observations(sample: &SampleRecord) -> Result<Vec<TaxonObservation>, DashError> {
    let len = sample.otu_ids.len();
    if sample.otu_labels.len() != len || sample.sample_values.len() != len {
        return Err(DashError::ShapeMismatch {
            id: sample.id.to_string(),
            otu_ids: len,
            otu_labels: sample.otu_labels.len(),
            sample_values: sample.sample_values.len(),
        });
    }

    Ok(sample
        .otu_ids
        .iter()
        .zip(&sample.otu_labels)
        .zip(&sample.sample_values)
        .map(|((id, label), value)| TaxonObservation::new(*id, label.clone(), *value))
        .collect())
}

/// Sorts by `otu_value`, largest first. Equal values keep their input order.
pub fn rank_descending(observations: &[TaxonObservation]) -> Vec<TaxonObservation> {
    let mut ranked = observations.to_vec();
    // sort_by is stable; total_cmp gives NaN a fixed place instead of panicking.
    ranked.sort_by(|a, b| b.otu_value.total_cmp(&a.otu_value));
    ranked
}

pub fn top_k(ranked: &[TaxonObservation], k: usize) -> Vec<TaxonObservation> {
    ranked[..k.min(ranked.len())].to_vec()
}

/// Top `k` observations in ascending order.
///
/// The bar chart's category axis is drawn smallest first, so the largest
/// value is the last element. Renderers rely on this orientation; do not
/// return the descending order here.
pub fn for_bar_chart(sample: &SampleRecord, k: usize) -> Result<Vec<TaxonObservation>, DashError> {
    let ranked = rank_descending(&to_observations(sample)?);
    let mut top = top_k(&ranked, k);
    top.reverse();
    Ok(top)
}

/// Every observation, largest first.
pub fn for_bubble_chart(sample: &SampleRecord) -> Result<Vec<TaxonObservation>, DashError> {
    Ok(rank_descending(&to_observations(sample)?))
}
