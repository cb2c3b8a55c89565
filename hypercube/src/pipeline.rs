use std::{io::Write, path::Path};

use rustc_hash::FxHashSet;
use strum_macros::EnumIter;

use crate::{
    aggregate::{aggregate, Aggregate},
    discovery::discover,
    error::{Error, Result},
    render::{PlotJob, Renderer},
    report::{parameter_slices, true_value_slices, Slice, Style},
    settings::ReportSettings,
};

/// Paths of non-resampled results, left out of parameter reports.
pub const NOT_RESAMPLED_MARKER: &str = "sample/n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ReportMode {
    /// Parameter vs MSE tables printed as CSV blocks.
    Stdout,
    /// Parameter vs MSE tables written as files and plotted.
    Plots,
    /// True value vs MSE tables written as files and plotted.
    TrueValue,
}

impl std::str::FromStr for ReportMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(ReportMode::Stdout),
            "plots" => Ok(ReportMode::Plots),
            "true-value" | "true_value" => Ok(ReportMode::TrueValue),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

impl ReportMode {
    pub fn default_exclude(&self) -> Option<&'static str> {
        match self {
            ReportMode::Stdout | ReportMode::Plots => Some(NOT_RESAMPLED_MARKER),
            ReportMode::TrueValue => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tables: usize,
    pub rendered: usize,
    pub render_failures: usize,
}

/// Runs discovery, parsing, aggregation and reporting once.
///
/// `out` receives the tables in [`ReportMode::Stdout`]. The file modes
/// recreate the output root and hand every table to `renderer`, if any.
pub fn run<W: Write>(
    mode: ReportMode,
    settings: &ReportSettings,
    renderer: Option<&dyn Renderer>,
    out: &mut W,
) -> Result<RunSummary> {
    let exclude = settings
        .exclude
        .as_deref()
        .or_else(|| mode.default_exclude());
    let discovered = discover(&settings.input_root, exclude);
    if discovered.is_empty() {
        tracing::warn!("No inputs under {}", settings.input_root.display());
    }
    let agg = aggregate(&settings.input_root, &discovered);

    let summary = report(mode, &agg, &settings.output_root, renderer, out)?;
    tracing::info!(
        "Report completed: {} tables, {} plots rendered, {} plot failures",
        summary.tables,
        summary.rendered,
        summary.render_failures
    );
    Ok(summary)
}

pub fn report<W: Write>(
    mode: ReportMode,
    agg: &Aggregate,
    output_root: &Path,
    renderer: Option<&dyn Renderer>,
    out: &mut W,
) -> Result<RunSummary> {
    match mode {
        ReportMode::Stdout => print_slices(&parameter_slices(agg, Style::Plain), out),
        ReportMode::Plots => save_slices(
            &parameter_slices(agg, Style::Plot),
            output_root,
            renderer,
        ),
        ReportMode::TrueValue => save_slices(&true_value_slices(agg), output_root, renderer),
    }
}

fn print_slices<W: Write>(slices: &[Slice], out: &mut W) -> Result<RunSummary> {
    for slice in slices {
        writeln!(out, "{}", slice.table.title).map_err(|e| Error::io("<stdout>", e))?;
        slice.table.write_csv(&mut *out)?;
        writeln!(out).map_err(|e| Error::io("<stdout>", e))?;
    }
    out.flush().map_err(|e| Error::io("<stdout>", e))?;
    Ok(RunSummary {
        tables: slices.len(),
        ..Default::default()
    })
}

fn save_slices(
    slices: &[Slice],
    output_root: &Path,
    renderer: Option<&dyn Renderer>,
) -> Result<RunSummary> {
    recreate_dir(output_root)?;

    let mut summary = RunSummary::default();
    let mut written = FxHashSet::default();
    for slice in slices {
        if !written.insert(slice.name.as_str()) {
            tracing::warn!(
                "{} is written more than once, the earlier table is overwritten",
                slice.name
            );
        }
        let csv_path = output_root.join(format!("{}.csv", slice.name));
        let png_path = output_root.join(format!("{}.png", slice.name));
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        slice.table.save(&csv_path)?;
        summary.tables += 1;
        tracing::info!("Saved {}", csv_path.display());

        let Some(renderer) = renderer else {
            continue;
        };
        let job = PlotJob {
            csv_path: &csv_path,
            png_path: &png_path,
            title: &slice.table.title,
            num_series: slice.table.num_columns() - 1,
            axis: slice.axis.as_ref(),
        };
        match renderer.render(&job) {
            Ok(()) => summary.rendered += 1,
            Err(e) => {
                summary.render_failures += 1;
                tracing::warn!("Failed to plot {}: {}", csv_path.display(), e);
            }
        }
    }
    Ok(summary)
}

fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}
