use std::{path::Path, process::Command};

use crate::{
    error::{Error, Result},
    report::CategoricalAxis,
    settings::RendererSettings,
};

/// Everything needed to draw one report table.
#[derive(Debug, Clone, Copy)]
pub struct PlotJob<'a> {
    pub csv_path: &'a Path,
    pub png_path: &'a Path,
    pub title: &'a str,
    /// Number of data columns after the label column.
    pub num_series: usize,
    pub axis: Option<&'a CategoricalAxis>,
}

pub trait Renderer {
    fn render(&self, job: &PlotJob<'_>) -> Result<()>;
}

/// Renders through `gnuplot -e <script>`, one process per plot.
pub struct Gnuplot {
    settings: RendererSettings,
}

impl Gnuplot {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn script(&self, job: &PlotJob<'_>) -> String {
        let csv = quote(&job.csv_path.display().to_string());
        let mut script = format!(
            "set title \"{}\" font \"{}\"; set datafile separator \",\"; \
             set terminal png size {},{}; set output \"{}\"; ",
            escape(job.title),
            escape(&self.settings.title_font),
            self.settings.width,
            self.settings.height,
            escape(&job.png_path.display().to_string()),
        );

        if let Some(axis) = job.axis.filter(|axis| !axis.is_empty()) {
            let tics = axis
                .tics()
                .map(|(label, code)| format!("\"{}\" {}", escape(label), code))
                .collect::<Vec<_>>()
                .join(", ");
            script.push_str(&format!(
                "set xtics ({}); set xrange [-0.5:{}]; ",
                tics,
                axis.len() as f64 - 0.5
            ));
        }

        let series = (2..job.num_series + 2)
            .map(|col| format!("{csv} using 1:{col} title columnheader({col})"))
            .collect::<Vec<_>>()
            .join(", ");
        script.push_str(&format!("plot {series};"));
        script
    }
}

impl Renderer for Gnuplot {
    fn render(&self, job: &PlotJob<'_>) -> Result<()> {
        let program = &self.settings.program;
        let status = Command::new(program)
            .arg("-e")
            .arg(self.script(job))
            .status()
            .map_err(|e| Error::Render {
                program: program.clone(),
                reason: e.to_string(),
            })?;
        if !status.success() {
            return Err(Error::Render {
                program: program.clone(),
                reason: status.to_string(),
            });
        }
        Ok(())
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn quote(text: &str) -> String {
    format!("\"{}\"", escape(text))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn job<'a>(
        csv: &'a Path,
        png: &'a Path,
        num_series: usize,
        axis: Option<&'a CategoricalAxis>,
    ) -> PlotJob<'a> {
        PlotJob {
            csv_path: csv,
            png_path: png,
            title: "Town (ss=100,rr=1.0)",
            num_series,
            axis,
        }
    }

    #[test]
    fn script_plots_every_sampler_column() {
        let gnuplot = Gnuplot::new(RendererSettings::default());
        let csv = PathBuf::from("plots/town/1.0-100.csv");
        let png = PathBuf::from("plots/town/1.0-100.png");
        let script = gnuplot.script(&job(&csv, &png, 3, None));

        assert_eq!(
            script,
            "set title \"Town (ss=100,rr=1.0)\" font \"sans, 18\"; \
             set datafile separator \",\"; set terminal png size 1400,1000; \
             set output \"plots/town/1.0-100.png\"; \
             plot \"plots/town/1.0-100.csv\" using 1:2 title columnheader(2), \
             \"plots/town/1.0-100.csv\" using 1:3 title columnheader(3), \
             \"plots/town/1.0-100.csv\" using 1:4 title columnheader(4);"
        );
    }

    #[test]
    fn script_labels_categorical_axis() {
        let gnuplot = Gnuplot::new(RendererSettings::default());
        let axis = CategoricalAxis::from_values(["low", "high"]);
        let csv = PathBuf::from("a.csv");
        let png = PathBuf::from("a.png");
        let script = gnuplot.script(&job(&csv, &png, 1, Some(&axis)));

        assert!(script.contains("set xtics (\"high\" 0, \"low\" 1); set xrange [-0.5:1.5];"));
        assert!(script.ends_with("plot \"a.csv\" using 1:2 title columnheader(2);"));
    }

    #[test]
    fn empty_axis_sets_no_tics() {
        let gnuplot = Gnuplot::new(RendererSettings::default());
        let axis = CategoricalAxis::from_values(std::iter::empty::<&str>());
        let csv = PathBuf::from("a.csv");
        let png = PathBuf::from("a.png");
        let script = gnuplot.script(&job(&csv, &png, 1, Some(&axis)));

        assert!(!script.contains("xtics"));
        assert!(!script.contains("xrange"));
    }

    #[test]
    fn missing_program_is_an_error() {
        let gnuplot = Gnuplot::new(RendererSettings {
            program: "hypercube-no-such-renderer".to_string(),
            ..RendererSettings::default()
        });
        let csv = PathBuf::from("a.csv");
        let png = PathBuf::from("a.png");
        assert!(matches!(
            gnuplot.render(&job(&csv, &png, 1, None)),
            Err(Error::Render { .. })
        ));
    }
}
