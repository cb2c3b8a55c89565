use std::{
    fmt::Display,
    hash::{Hash, Hasher},
    path::Path,
};

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString};

use crate::ordered::OrderedSet;

pub type ExperimentIdx = u32;
pub type SampleSize = u32;

const SAMPLER_SUFFIX: &str = "_sample";
const POPULATION_PREFIX: &str = "population,child,";
const SAMPLE_PREFIX: &str = "sample,child,";

static RESULT_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+)/([a-z_]+)/([nr])(s[0-9]\.)?([0-9]+)\.csv$").unwrap()
});
static CONFIG_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)/.+\.conf$").unwrap());
static POPULATION_WITH_RR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^population,child,([0-9.]+),.*,([0-9.]+),([0-9.]+)$").unwrap()
});
static POPULATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^population,child,([0-9.]+),.*,([0-9.]+)$").unwrap());
static SAMPLE_WITH_RR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^sample,child,([0-9.]+),.*,([0-9.]+),([0-9.]+),([0-9.]+),([0-9.]+)$").unwrap()
});
static SAMPLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^sample,child,([0-9.]+),.*,([0-9.]+),([0-9.]+)$").unwrap());

/// Whether the towns of a sample were drawn again for every iteration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumString, StrumDisplay,
)]
pub enum ResampleType {
    #[strum(serialize = "n")]
    NotResampled,
    #[strum(serialize = "r")]
    Resampled,
}

impl ResampleType {
    pub fn description(&self) -> &'static str {
        match self {
            ResampleType::NotResampled => "Towns not resampled",
            ResampleType::Resampled => "Towns resampled",
        }
    }
}

/// A relative-risk value as written in a result file.
///
/// Equality and hashing use the exact text, so `0.1` and `0.10` are distinct
/// keys. The parsed value is only used for display.
#[derive(Debug, Clone)]
pub struct RelativeRisk {
    text: String,
    value: f64,
}

impl RelativeRisk {
    pub fn parse(text: &str) -> Option<Self> {
        let value = text.parse::<f64>().ok()?;
        Some(Self {
            text: text.to_string(),
            value,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// One-decimal form used in titles and output file names.
    pub fn label(&self) -> String {
        format!("{:.1}", self.value)
    }
}

impl PartialEq for RelativeRisk {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for RelativeRisk {}

impl Hash for RelativeRisk {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl Display for RelativeRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Identity of one result file, taken from its path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultFileKey {
    pub experiment: ExperimentIdx,
    pub sampler: String,
    pub size: SampleSize,
    pub resample: ResampleType,
}

/// Parses `<index>/<sampler_dir>/<type><resample_param?><size>.csv` relative to `root`.
pub fn parse_result_path(root: &Path, path: &Path) -> Option<ResultFileKey> {
    let rel = relative_str(root, path)?;
    let caps = RESULT_PATH.captures(&rel)?;

    let experiment = caps[1].parse::<ExperimentIdx>().ok()?;
    let mut sampler = caps[2].replace(SAMPLER_SUFFIX, "");
    if let Some(param) = caps.get(4) {
        let param = param.as_str();
        sampler = format!("{}-{}", sampler, &param[..param.len() - 1]);
    }
    let resample = caps[3].parse::<ResampleType>().ok()?;
    let size = caps[5].parse::<SampleSize>().ok()?;

    Some(ResultFileKey {
        experiment,
        sampler,
        size,
        resample,
    })
}

/// Experiment index of a `<index>/<name>.conf` path relative to `root`.
pub fn parse_config_path(root: &Path, path: &Path) -> Option<ExperimentIdx> {
    let rel = relative_str(root, path)?;
    CONFIG_PATH.captures(&rel)?[1].parse().ok()
}

fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Parameter name/value pairs of one experiment, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigRecord(Vec<(String, String)>);

impl ConfigRecord {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn parse_config(text: &str) -> ConfigRecord {
    let mut params = Vec::new();
    for line in text.lines() {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once(": ") {
            Some((name, value)) => params.push((name.to_string(), value.to_string())),
            None => tracing::debug!("Skipped config line: {line}"),
        }
    }
    ConfigRecord(params)
}

/// Ground truth for one relative-risk value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationRow {
    pub true_mean: f64,
    pub true_rr: Option<f64>,
}

/// Sampled estimate for one relative-risk value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRow {
    pub mean: f64,
    pub stdev: f64,
    pub rr: Option<f64>,
    pub rr_stdev: Option<f64>,
}

/// Rows keyed by relative risk. Iteration follows first appearance; a
/// repeated key replaces the earlier row.
#[derive(Debug, Clone)]
pub struct RowMap<R> {
    order: OrderedSet<RelativeRisk>,
    rows: FxHashMap<RelativeRisk, R>,
}

impl<R> RowMap<R> {
    pub fn new() -> Self {
        Self {
            order: OrderedSet::new(),
            rows: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, rr: RelativeRisk, row: R) {
        self.order.insert(rr.clone());
        self.rows.insert(rr, row);
    }

    pub fn get(&self, rr: &RelativeRisk) -> Option<&R> {
        self.rows.get(rr)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RelativeRisk, &R)> {
        self.order
            .iter()
            .filter_map(|rr| self.rows.get(rr).map(|row| (rr, row)))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R> Default for RowMap<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultRecord {
    pub population: RowMap<PopulationRow>,
    pub sample: RowMap<SampleRow>,
}

pub fn parse_result(text: &str) -> ResultRecord {
    let mut record = ResultRecord::default();
    for line in text.lines() {
        if line.starts_with(POPULATION_PREFIX) {
            match parse_population_line(line) {
                Some((rr, row)) => record.population.insert(rr, row),
                None => tracing::debug!("Skipped population line: {line}"),
            }
        } else if line.starts_with(SAMPLE_PREFIX) {
            match parse_sample_line(line) {
                Some((rr, row)) => record.sample.insert(rr, row),
                None => tracing::debug!("Skipped sample line: {line}"),
            }
        }
    }
    record
}

fn parse_population_line(line: &str) -> Option<(RelativeRisk, PopulationRow)> {
    if let Some(caps) = POPULATION_WITH_RR.captures(line) {
        let rr = RelativeRisk::parse(&caps[1])?;
        let row = PopulationRow {
            true_rr: Some(caps[2].parse().ok()?),
            true_mean: caps[3].parse().ok()?,
        };
        return Some((rr, row));
    }

    let caps = POPULATION.captures(line)?;
    let rr = RelativeRisk::parse(&caps[1])?;
    let row = PopulationRow {
        true_rr: None,
        true_mean: caps[2].parse().ok()?,
    };
    Some((rr, row))
}

fn parse_sample_line(line: &str) -> Option<(RelativeRisk, SampleRow)> {
    if let Some(caps) = SAMPLE_WITH_RR.captures(line) {
        let rr = RelativeRisk::parse(&caps[1])?;
        let row = SampleRow {
            rr_stdev: Some(caps[2].parse().ok()?),
            rr: Some(caps[3].parse().ok()?),
            mean: caps[4].parse().ok()?,
            stdev: caps[5].parse().ok()?,
        };
        return Some((rr, row));
    }

    let caps = SAMPLE.captures(line)?;
    let rr = RelativeRisk::parse(&caps[1])?;
    let row = SampleRow {
        rr_stdev: None,
        rr: None,
        mean: caps[2].parse().ok()?,
        stdev: caps[3].parse().ok()?,
    };
    Some((rr, row))
}
