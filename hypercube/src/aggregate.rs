use std::path::Path;

use rustc_hash::FxHashMap;
use strum_macros::{Display, EnumIter};

use crate::{
    discovery::Discovered,
    ordered::OrderedSet,
    parse::{
        parse_config, parse_config_path, parse_result, parse_result_path, ConfigRecord,
        ExperimentIdx, PopulationRow, RelativeRisk, ResampleType, ResultFileKey, ResultRecord,
        SampleSize,
    },
};

/// Mean squared error of an estimate: squared bias plus variance.
pub fn mse(truth: f64, estimate: f64, stdev: f64) -> f64 {
    (truth - estimate) * (truth - estimate) + stdev * stdev
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum Metric {
    #[strum(serialize = "prevalence")]
    Prevalence,
    #[strum(serialize = "rr")]
    RelativeRisk,
}

impl Metric {
    /// Label of the true-value column.
    pub fn heading(&self) -> &'static str {
        match self {
            Metric::Prevalence => "Prevalence",
            Metric::RelativeRisk => "RR",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Metric::Prevalence => "Prevalence",
            Metric::RelativeRisk => "Relative Risk",
        }
    }

    pub fn true_value(&self, row: &PopulationRow) -> Option<f64> {
        match self {
            Metric::Prevalence => Some(row.true_mean),
            Metric::RelativeRisk => row.true_rr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub metric: Metric,
    pub sampler: String,
    pub size: SampleSize,
    pub rr: RelativeRisk,
    pub experiment: ExperimentIdx,
    pub resample: ResampleType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Value(f64),
    Missing,
}

impl Cell {
    pub fn value(&self) -> Option<f64> {
        match self {
            Cell::Value(v) => Some(*v),
            Cell::Missing => None,
        }
    }
}

/// MSE values of every parsed result file, plus the axes they were seen on.
#[derive(Debug, Clone, Default)]
pub struct MseTable {
    cells: FxHashMap<CellKey, f64>,
    truths: FxHashMap<(ExperimentIdx, RelativeRisk), PopulationRow>,
    experiments: OrderedSet<ExperimentIdx>,
    samplers: OrderedSet<String>,
    sizes: OrderedSet<SampleSize>,
    rrs: OrderedSet<RelativeRisk>,
    resample_types: OrderedSet<ResampleType>,
}

impl MseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, key: &ResultFileKey, record: &ResultRecord) {
        self.experiments.insert(key.experiment);
        self.samplers.insert(key.sampler.clone());
        self.sizes.insert(key.size);
        self.resample_types.insert(key.resample);

        for (rr, truth) in record.population.iter() {
            self.rrs.insert(rr.clone());
            self.truths.insert((key.experiment, rr.clone()), *truth);

            let Some(sample) = record.sample.get(rr) else {
                continue;
            };
            let cell_key = |metric| CellKey {
                metric,
                sampler: key.sampler.clone(),
                size: key.size,
                rr: rr.clone(),
                experiment: key.experiment,
                resample: key.resample,
            };

            self.cells.insert(
                cell_key(Metric::Prevalence),
                mse(truth.true_mean, sample.mean, sample.stdev),
            );
            if let (Some(true_rr), Some(est_rr), Some(rr_stdev)) =
                (truth.true_rr, sample.rr, sample.rr_stdev)
            {
                self.cells
                    .insert(cell_key(Metric::RelativeRisk), mse(true_rr, est_rr, rr_stdev));
            }
        }
    }

    pub fn get(&self, key: &CellKey) -> Cell {
        match self.cells.get(key) {
            Some(v) => Cell::Value(*v),
            None => Cell::Missing,
        }
    }

    /// Ground truth of an experiment at one relative risk. When several
    /// result files carry it, the last one read wins.
    pub fn truth(&self, experiment: ExperimentIdx, rr: &RelativeRisk) -> Option<&PopulationRow> {
        self.truths.get(&(experiment, rr.clone()))
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn experiments(&self) -> &OrderedSet<ExperimentIdx> {
        &self.experiments
    }

    pub fn samplers(&self) -> &OrderedSet<String> {
        &self.samplers
    }

    pub fn sizes(&self) -> &OrderedSet<SampleSize> {
        &self.sizes
    }

    pub fn rrs(&self) -> &OrderedSet<RelativeRisk> {
        &self.rrs
    }

    pub fn resample_types(&self) -> &OrderedSet<ResampleType> {
        &self.resample_types
    }
}

/// Configuration values of the parameters that vary between experiments.
#[derive(Debug, Clone, Default)]
pub struct ParameterTable {
    experiments: OrderedSet<ExperimentIdx>,
    names: Vec<String>,
    values: FxHashMap<(String, ExperimentIdx), String>,
}

impl ParameterTable {
    /// Builds the table and drops every parameter that has a single distinct
    /// value across all experiments defining it.
    pub fn build<I>(configs: I) -> Self
    where
        I: IntoIterator<Item = (ExperimentIdx, ConfigRecord)>,
    {
        let mut experiments = OrderedSet::new();
        let mut names = OrderedSet::new();
        let mut values = FxHashMap::default();
        for (experiment, record) in configs {
            experiments.insert(experiment);
            for (name, value) in record.iter() {
                if !is_plain_name(name) {
                    tracing::warn!(
                        "Skipped parameter {:?} of experiment {}: not usable as a file name",
                        name,
                        experiment
                    );
                    continue;
                }
                names.insert(name.to_string());
                values.insert((name.to_string(), experiment), value.to_string());
            }
        }

        let names = names
            .iter()
            .filter(|name| {
                let distinct: OrderedSet<&str> = experiments
                    .iter()
                    .filter_map(|exp| values.get(&((*name).clone(), *exp)))
                    .map(String::as_str)
                    .collect();
                distinct.len() > 1
            })
            .cloned()
            .collect::<Vec<_>>();
        values.retain(|(name, _), _| names.contains(name));

        Self {
            experiments,
            names,
            values,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn experiments(&self) -> &OrderedSet<ExperimentIdx> {
        &self.experiments
    }

    pub fn value(&self, name: &str, experiment: ExperimentIdx) -> Option<&str> {
        self.values
            .get(&(name.to_string(), experiment))
            .map(String::as_str)
    }

    /// Values of a parameter in experiment order, skipping experiments
    /// that do not define it.
    pub fn values_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.experiments
            .iter()
            .filter_map(move |exp| self.value(name, *exp))
    }
}

/// Everything the reporters need from one input tree.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    pub parameters: ParameterTable,
    pub mse: MseTable,
}

/// Parameter names become directories under the output root, so they must
/// be a single path component.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Reads and parses every discovered file. Files that cannot be read or
/// whose path does not follow the naming scheme are skipped.
pub fn aggregate(root: &Path, discovered: &Discovered) -> Aggregate {
    let configs = discovered
        .config_files
        .iter()
        .filter_map(|path| {
            let Some(experiment) = parse_config_path(root, path) else {
                tracing::debug!("Skipped config file {}", path.display());
                return None;
            };
            let text = read_input(path)?;
            let record = parse_config(&text);
            if record.is_empty() {
                tracing::debug!("No parameters in {}", path.display());
            }
            Some((experiment, record))
        })
        .collect::<Vec<_>>();
    let parameters = ParameterTable::build(configs);

    let mut mse = MseTable::new();
    for path in discovered.result_files.iter() {
        let Some(key) = parse_result_path(root, path) else {
            tracing::debug!("Skipped result file {}", path.display());
            continue;
        };
        if let Some(text) = read_input(path) {
            mse.add_result(&key, &parse_result(&text));
        }
    }

    tracing::info!(
        "Aggregated {} varying parameters over {} experiments and {} MSE cells",
        parameters.names.len(),
        parameters.experiments.len(),
        mse.num_cells()
    );
    Aggregate { parameters, mse }
}

fn read_input(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            None
        }
    }
}
