// std
use std::path::PathBuf;
// crates
use clap::Parser;
// internal
use hypercube::{
    pipeline::{self, ReportMode},
    render::{Gnuplot, Renderer},
    settings::{load_json_from_file, ReportSettings},
};

mod log;

/// Builds MSE reports from a tree of sampling simulation results
#[derive(Parser)]
#[command(name = "hypercube")]
pub struct ReportApp {
    /// One of `stdout`, `plots` or `true-value`
    #[clap(long, short, default_value = "stdout")]
    mode: ReportMode,
    /// Json file path, on `ReportSettings` format
    #[clap(long, short)]
    settings: Option<PathBuf>,
    /// Directory holding `<index>/...` simulation outputs
    #[clap(long, short)]
    input_root: Option<PathBuf>,
    /// Directory that is recreated for the file-based reports
    #[clap(long, short)]
    output_root: Option<PathBuf>,
    /// Skip every path containing this string (empty to keep everything)
    #[clap(long, short)]
    exclude: Option<String>,
    /// Write tables without invoking the plot renderer
    #[clap(long)]
    no_render: bool,
    #[clap(long, default_value = "plain")]
    log_format: log::LogFormat,
    /// `stdout`, `stderr` or a file path. Defaults to stderr in `stdout` mode.
    #[clap(long)]
    log_to: Option<log::LogOutput>,
}

impl ReportApp {
    fn log_output(&self) -> log::LogOutput {
        match (&self.log_to, self.mode) {
            (Some(log_to), _) => log_to.clone(),
            (None, ReportMode::Stdout) => log::LogOutput::StdErr,
            (None, _) => log::LogOutput::StdOut,
        }
    }

    pub fn run(self) -> anyhow::Result<()> {
        let Self {
            mode,
            settings,
            input_root,
            output_root,
            exclude,
            no_render,
            log_format: _,
            log_to: _,
        } = self;

        let mut settings: ReportSettings = match settings {
            Some(path) => load_json_from_file(&path)?,
            None => ReportSettings::default(),
        };
        if let Some(input_root) = input_root {
            settings.input_root = input_root;
        }
        if let Some(output_root) = output_root {
            settings.output_root = output_root;
        }
        if exclude.is_some() {
            settings.exclude = exclude;
        }
        if no_render {
            settings.renderer.enabled = false;
        }
        tracing::info!("Mode: {:?}, settings: {:?}", mode, settings);

        let gnuplot = Gnuplot::new(settings.renderer.clone());
        let renderer: Option<&dyn Renderer> = if settings.renderer.enabled {
            Some(&gnuplot)
        } else {
            None
        };

        let stdout = std::io::stdout();
        pipeline::run(mode, &settings, renderer, &mut stdout.lock())?;
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let app = ReportApp::parse();
    let guard = log::config_tracing(app.log_format, &app.log_output())?;

    if let Err(e) = app.run() {
        tracing::error!("error: {}", e);
        drop(guard);
        std::process::exit(1);
    }
    Ok(())
}
