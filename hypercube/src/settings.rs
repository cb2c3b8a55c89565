use std::{
    fs::File,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Deserialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    /// Paths containing this string are skipped. `None` falls back to the
    /// default of the report mode.
    pub exclude: Option<String>,
    pub renderer: RendererSettings,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("links"),
            output_root: PathBuf::from("plots"),
            exclude: None,
            renderer: RendererSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub enabled: bool,
    pub program: String,
    pub width: u32,
    pub height: u32,
    pub title_font: String,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "gnuplot".to_string(),
            width: 1400,
            height: 1000,
            title_font: "sans, 18".to_string(),
        }
    }
}

/// Generically load a json file
pub fn load_json_from_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_reader(f).map_err(|source| Error::Settings {
        path: path.to_path_buf(),
        source,
    })
}
