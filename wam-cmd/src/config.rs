//! Model run configuration, read from a JSON file.
//!
//! Each optional section switches one pipeline stage on. Relative paths are
//! resolved against `work_dir`, which is itself relative to the directory
//! holding the configuration file.
//!
//! ```json
//! {
//!   "work_dir": "model",
//!   "start_date": "2016-07-01",
//!   "end_date": "2017-06-30",
//!   "depletion": { "wells_csv": "wells.csv", "pumping_csv": "pumping.csv" },
//!   "consents": { "consents_csv": "consents.csv", "consumption_csv": "consumption.csv" },
//!   "bands": { "bands_csv": "bands.csv", "band_links": { "69505": "69505_bands.csv" } },
//!   "expressions": { "demand": "restriction", "low_flow_site": "69505" }
//! }
//! ```

use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(default)]
    pub work_dir: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub depletion: Option<DepletionConfig>,
    pub consents: Option<ConsentsConfig>,
    pub bands: Option<BandsConfig>,
    pub expressions: Option<ExpressionsConfig>,
}

/// Stream depletion of groundwater takes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepletionConfig {
    pub wells_csv: PathBuf,
    pub pumping_csv: PathBuf,
    #[serde(default = "DepletionConfig::default_output")]
    pub output_csv: PathBuf,
    #[serde(default = "default_true")]
    pub with_total: bool,
    #[serde(default = "default_true")]
    pub check_consistency: bool,
    /// Give the `_SD` demand nodes a demand of 0 instead of reading the table
    #[serde(default)]
    pub zero_sd: bool,
}

impl DepletionConfig {
    fn default_output() -> PathBuf {
        PathBuf::from("stream_depletion.csv")
    }
}

/// An allow-list CSV and the column holding the ids.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllowList {
    pub path: PathBuf,
    pub column: String,
}

/// Consent cleanup and activity series.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsentsConfig {
    pub consents_csv: PathBuf,
    pub consumption_csv: Option<PathBuf>,
    pub groundwater_waps: Option<AllowList>,
    pub surface_water_waps: Option<AllowList>,
    pub divert_waps: Option<AllowList>,
    pub discharge_consents: Option<AllowList>,
    #[serde(default)]
    pub output_dir: PathBuf,
}

/// Low-flow band preparation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BandsConfig {
    pub bands_csv: PathBuf,
    /// Band link table per site id
    pub band_links: BTreeMap<String, PathBuf>,
    /// Daily flow records; writes one `<site>_IRF.csv` per site when present
    pub flows_csv: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: PathBuf,
}

/// What drives take demand in the generated expressions.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandConfig {
    #[default]
    Restriction,
    Zero,
    Series { path: PathBuf },
}

/// Expression generation from the prepared consents and bands.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpressionsConfig {
    #[serde(default = "ExpressionsConfig::default_output")]
    pub output_csv: PathBuf,
    #[serde(default)]
    pub demand: DemandConfig,
    #[serde(default = "default_true")]
    pub restrict_links: bool,
    /// Site id whose bands restrict the consents
    pub low_flow_site: Option<String>,
    /// IRF branch per site id; sites not listed read the `database` branch
    #[serde(default)]
    pub irf_sources: BTreeMap<String, String>,
}

impl ExpressionsConfig {
    fn default_output() -> PathBuf {
        PathBuf::from("expressions.csv")
    }
}

impl ModelConfig {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config = Self::from_json(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        if config.work_dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            config.work_dir = base.join(&config.work_dir);
        }
        Ok(config)
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: ModelConfig = serde_json::from_str(text)?;
        if config.end_date < config.start_date {
            anyhow::bail!(
                "end_date {} is before start_date {}",
                config.end_date,
                config.start_date
            );
        }
        if config.expressions.is_some()
            && config.depletion.is_none()
            && config.consents.is_none()
            && config.bands.is_none()
        {
            anyhow::bail!("expressions need a depletion, consents or bands section");
        }
        Ok(config)
    }

    /// `path` relative to the working directory, unless absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }
}
