use std::fmt;

use serde::Serialize;

use crate::document::Document;
use crate::domain::{MetadataRecord, SubjectId, TaxonObservation};
use crate::error::DashError;
use crate::ranking::{self, DEFAULT_TOP_K};
use crate::selector;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataLine {
    pub label: String,
    pub value: String,
}

impl fmt::Display for MetadataLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

pub fn metadata_lines(record: &MetadataRecord) -> Vec<MetadataLine> {
    record
        .fields()
        .iter()
        .map(|(key, value)| MetadataLine {
            label: capitalize(key),
            value: value.to_string(),
        })
        .collect()
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub top_k: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Everything the dashboard shows for one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub subject: SubjectId,
    pub metadata: Vec<MetadataLine>,
    /// Ascending; the largest value is last.
    pub bar: Vec<TaxonObservation>,
    /// Descending, untruncated.
    pub bubble: Vec<TaxonObservation>,
}

pub fn render(
    document: &Document,
    subject: &SubjectId,
    options: &RenderOptions,
) -> Result<RenderPlan, DashError> {
    let metadata = selector::find_metadata(document, subject)?;
    let sample = selector::find_sample(document, subject)?;
    Ok(RenderPlan {
        subject: subject.clone(),
        metadata: metadata_lines(metadata),
        bar: ranking::for_bar_chart(sample, options.top_k)?,
        bubble: ranking::for_bubble_chart(sample)?,
    })
}

pub trait ChartRenderer {
    fn draw_metadata(&mut self, lines: &[MetadataLine]) -> Result<(), DashError>;
    fn draw_bar_chart(&mut self, observations: &[TaxonObservation]) -> Result<(), DashError>;
    fn draw_bubble_chart(&mut self, observations: &[TaxonObservation]) -> Result<(), DashError>;
}

pub fn present(plan: &RenderPlan, renderer: &mut dyn ChartRenderer) -> Result<(), DashError> {
    renderer.draw_metadata(&plan.metadata)?;
    renderer.draw_bar_chart(&plan.bar)?;
    renderer.draw_bubble_chart(&plan.bubble)?;
    Ok(())
}

/// Value axis of the bar chart: `[0, max value]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarBounds {
    pub max_value: f64,
}

impl BarBounds {
    pub fn of(observations: &[TaxonObservation]) -> Self {
        Self {
            max_value: max_value(observations).max(0.0),
        }
    }
}

const BUBBLE_X_PADDING: f64 = 100.0;
const BUBBLE_Y_PADDING: f64 = 100.0;
const BUBBLE_Y_FLOOR: f64 = -50.0;

/// Axes of the bubble chart: otu id on x, abundance on y, with headroom so
/// the largest bubbles are not clipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleBounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
    pub max_value: f64,
}

impl BubbleBounds {
    pub fn of(observations: &[TaxonObservation]) -> Self {
        let max_id = observations
            .iter()
            .map(|obs| obs.otu_id)
            .max()
            .unwrap_or(0) as f64;
        let max_value = max_value(observations);
        let min_value = observations
            .iter()
            .map(|obs| obs.otu_value)
            .fold(BUBBLE_Y_FLOOR, f64::min);
        Self {
            x: [0.0, max_id.max(0.0) + BUBBLE_X_PADDING],
            y: [min_value, max_value.max(0.0) + BUBBLE_Y_PADDING],
            max_value,
        }
    }

    /// Relative bubble radius in `[0, 1]`, proportional to the square root of
    /// the value so bubble area tracks abundance.
    pub fn radius(&self, value: f64) -> f64 {
        if self.max_value <= 0.0 || value <= 0.0 {
            return 0.0;
        }
        (value / self.max_value).sqrt().min(1.0)
    }
}

fn max_value(observations: &[TaxonObservation]) -> f64 {
    observations
        .iter()
        .map(|obs| obs.otu_value)
        .fold(0.0, f64::max)
}
