use std::{collections::BTreeMap, io::Write, path::Path};

use strum::IntoEnumIterator;

use crate::{
    aggregate::{Aggregate, Cell, CellKey, Metric},
    error::{Error, Result},
    parse::ResampleType,
};

/// One rectangular CSV table: a header and rows of `header.len()` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn num_columns(&self) -> usize {
        self.header.len()
    }

    /// Writes the header and rows (not the title) as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(false)
            .from_writer(writer);
        wtr.write_record(&self.header)?;
        for row in self.rows.iter() {
            wtr.write_record(row)?;
        }
        wtr.flush().map_err(|e| Error::Csv(e.into()))?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
        self.write_csv(file)
    }
}

/// Integer codes for the values of a non-numeric parameter, assigned in
/// lexicographic order starting at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalAxis {
    codes: BTreeMap<String, usize>,
}

impl CategoricalAxis {
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut codes: BTreeMap<String, usize> = values
            .into_iter()
            .map(|value| (value.to_string(), 0))
            .collect();
        codes
            .values_mut()
            .enumerate()
            .for_each(|(code, slot)| *slot = code);
        Self { codes }
    }

    pub fn code(&self, value: &str) -> Option<usize> {
        self.codes.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Tick labels in code order.
    pub fn tics(&self) -> impl Iterator<Item = (&str, usize)> {
        self.codes.iter().map(|(value, code)| (value.as_str(), *code))
    }
}

/// A value is categorical if it has any character other than ASCII digits and `.`.
pub fn is_categorical(value: &str) -> bool {
    value.chars().any(|c| !(c.is_ascii_digit() || c == '.'))
}

/// `arc_epi-s1` -> `Arc Epi-s1`
pub fn title_case(name: &str) -> String {
    name.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn format_cell(cell: Cell) -> String {
    cell.value().map(|v| v.to_string()).unwrap_or_default()
}

/// A table together with where it goes and how it is plotted.
#[derive(Debug, Clone)]
pub struct Slice {
    /// Output path relative to the output root, without extension.
    pub name: String,
    pub table: ReportTable,
    pub axis: Option<CategoricalAxis>,
}

/// Labeling of parameter reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Raw names and values, for reading on a terminal.
    Plain,
    /// Title-cased names and categorical codes, for plotting.
    Plot,
}

/// Parameter vs MSE tables, one per (parameter, size, relative risk), with a
/// row per configured experiment. Only resampled result files contribute.
pub fn parameter_slices(agg: &Aggregate, style: Style) -> Vec<Slice> {
    let params = &agg.parameters;
    let mse = &agg.mse;
    let samplers = mse.samplers().iter().collect::<Vec<_>>();

    let mut slices = Vec::new();
    for param in params.names() {
        let axis = match style {
            Style::Plot => params
                .values_of(param)
                .next()
                .filter(|first| is_categorical(first))
                .map(|_| CategoricalAxis::from_values(params.values_of(param))),
            Style::Plain => None,
        };

        for size in mse.sizes().iter() {
            for rr in mse.rrs().iter() {
                let (title, mut header) = match style {
                    Style::Plain => (
                        format!("{} (ss={},rr={})", param, size, rr.label()),
                        vec!["param".to_string()],
                    ),
                    Style::Plot => (
                        format!("{} (ss={},rr={})", title_case(param), size, rr.label()),
                        vec!["Param".to_string()],
                    ),
                };
                header.extend(samplers.iter().map(|sampler| match style {
                    Style::Plain => sampler.to_string(),
                    Style::Plot => title_case(sampler),
                }));

                let rows = params
                    .experiments()
                    .iter()
                    .map(|experiment| {
                        let value = params.value(param, *experiment).unwrap_or_default();
                        let label = match &axis {
                            Some(axis) => axis
                                .code(value)
                                .map(|code| code.to_string())
                                .unwrap_or_default(),
                            None => value.to_string(),
                        };
                        let mut row = vec![label];
                        row.extend(samplers.iter().map(|sampler| {
                            format_cell(mse.get(&CellKey {
                                metric: Metric::Prevalence,
                                sampler: sampler.to_string(),
                                size: *size,
                                rr: rr.clone(),
                                experiment: *experiment,
                                resample: ResampleType::Resampled,
                            }))
                        }));
                        row
                    })
                    .collect();

                slices.push(Slice {
                    name: format!("{}/{}-{}", param, rr.label(), size),
                    table: ReportTable {
                        title,
                        header,
                        rows,
                    },
                    axis: axis.clone(),
                });
            }
        }
    }
    slices
}

/// True value vs MSE tables for both metrics, one per (resample type,
/// relative risk, size), with a row per experiment labeled by its true value.
pub fn true_value_slices(agg: &Aggregate) -> Vec<Slice> {
    let mse = &agg.mse;
    let samplers = mse.samplers().iter().collect::<Vec<_>>();

    let mut slices = Vec::new();
    for resample in mse.resample_types().iter() {
        for rr in mse.rrs().iter() {
            for size in mse.sizes().iter() {
                for metric in Metric::iter() {
                    let title = format!(
                        "{} (True vs MSE): {}, RR={}, size={}",
                        metric.title(),
                        resample.description(),
                        rr.label(),
                        size
                    );
                    let mut header = vec![metric.heading().to_string()];
                    header.extend(samplers.iter().map(|sampler| title_case(sampler)));

                    let rows = mse
                        .experiments()
                        .iter()
                        .map(|experiment| {
                            let label = mse
                                .truth(*experiment, rr)
                                .and_then(|truth| metric.true_value(truth))
                                .map(|v| v.to_string())
                                .unwrap_or_default();
                            let mut row = vec![label];
                            row.extend(samplers.iter().map(|sampler| {
                                format_cell(mse.get(&CellKey {
                                    metric,
                                    sampler: sampler.to_string(),
                                    size: *size,
                                    rr: rr.clone(),
                                    experiment: *experiment,
                                    resample: *resample,
                                }))
                            }));
                            row
                        })
                        .collect();

                    slices.push(Slice {
                        name: format!("{}_{}_{}_{}", metric, resample, rr.label(), size),
                        table: ReportTable {
                            title,
                            header,
                            rows,
                        },
                        axis: None,
                    });
                }
            }
        }
    }
    slices
}
