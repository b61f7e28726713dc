use std::io::{self, Write};

use camino::Utf8Path;
use serde::Serialize;
use tempfile::Builder;

use crate::domain::{SubjectId, TaxonObservation};
use crate::error::DashError;
use crate::render::{ChartRenderer, MetadataLine, RenderPlan};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_subjects(subjects: &[SubjectId]) -> io::Result<()> {
        Self::print_json(subjects)
    }

    pub fn print_plan(plan: &RenderPlan) -> io::Result<()> {
        Self::print_json(plan)
    }

    pub fn print_metadata(lines: &[MetadataLine]) -> io::Result<()> {
        Self::print_json(lines)
    }

    pub fn print_observations(observations: &[TaxonObservation]) -> io::Result<()> {
        Self::print_json(observations)
    }

    fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        write_json(&mut io::stdout(), value)
    }

    /// Writes the plan next to `path` and renames it into place, so readers
    /// never see a half-written file.
    pub fn export_plan(plan: &RenderPlan, path: &Utf8Path) -> Result<(), DashError> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        std::fs::create_dir_all(parent.as_std_path())
            .map_err(|err| DashError::Filesystem(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix("otu-dash-export")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| DashError::Filesystem(err.to_string()))?;
        write_json(temp.as_file_mut(), plan).map_err(|err| DashError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| DashError::Filesystem(err.to_string()))?;
        tracing::info!(path = %path, subject = %plan.subject, "plan exported");
        Ok(())
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[derive(Serialize)]
struct Panel<'a, T: Serialize> {
    panel: &'static str,
    items: &'a [T],
}

/// Renders each panel as one compact JSON line: `{"panel": ..., "items": [...]}`.
pub struct JsonRenderer<W: Write> {
    writer: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn panel<T: Serialize>(&mut self, panel: &'static str, items: &[T]) -> Result<(), DashError> {
        serde_json::to_writer(&mut self.writer, &Panel { panel, items })
            .map_err(|err| DashError::Filesystem(err.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|err| DashError::Filesystem(err.to_string()))
    }
}

impl<W: Write> ChartRenderer for JsonRenderer<W> {
    fn draw_metadata(&mut self, lines: &[MetadataLine]) -> Result<(), DashError> {
        self.panel("metadata", lines)
    }

    fn draw_bar_chart(&mut self, observations: &[TaxonObservation]) -> Result<(), DashError> {
        self.panel("bar", observations)
    }

    fn draw_bubble_chart(&mut self, observations: &[TaxonObservation]) -> Result<(), DashError> {
        self.panel("bubble", observations)
    }
}
