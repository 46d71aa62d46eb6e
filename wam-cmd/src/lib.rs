//! Command implementations for the water allocation model CLI.
//!
//! One-off subcommands run a single stage from command line flags; `run`
//! builds everything a configuration file asks for.

use chrono::NaiveDate;
use clap::Subcommand;
use std::path::{Path, PathBuf};

pub mod bands;
pub mod config;
pub mod consents;
pub mod depletion;
pub mod expressions;
mod files;
pub mod pipeline;

use config::{BandsConfig, ConsentsConfig, DemandConfig, ExpressionsConfig, ModelConfig};
use depletion::DepletionRun;

/// Parse a `SITE=PATH` pair.
fn parse_site_path(s: &str) -> Result<(String, PathBuf), String> {
    let (site, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SITE=PATH, got '{}'", s))?;
    Ok((site.trim().to_string(), PathBuf::from(path.trim())))
}

#[derive(Subcommand)]
pub enum Command {
    /// Stream depletion factor L²S/T of a well
    Sdf {
        /// Distance from the well to the stream (m)
        #[arg(short = 'l', long)]
        distance: f64,
        #[arg(short = 's', long)]
        storage_coefficient: f64,
        /// Transmissivity (m²/day)
        #[arg(short = 't', long)]
        transmissivity: f64,
    },

    /// Stream depletion after pumping at a constant rate
    Theis {
        #[arg(short = 'l', long)]
        distance: f64,
        #[arg(short = 's', long)]
        storage_coefficient: f64,
        #[arg(short = 't', long)]
        transmissivity: f64,
        /// Pumping rate, any unit
        #[arg(short = 'q', long)]
        rate: f64,
        /// Days of pumping
        #[arg(short = 'd', long)]
        days: f64,
    },

    /// Stream depletion of every well in a wide pumping table
    Deplete {
        /// Well properties CSV
        #[arg(short = 'w', long)]
        wells_csv: String,
        /// Wide daily pumping CSV
        #[arg(short = 'p', long)]
        pumping_csv: String,
        /// Output depletion CSV (day-first dates)
        #[arg(short = 'o', long)]
        output_csv: String,
        /// Leave out the per-date Total column
        #[arg(long)]
        no_total: bool,
        /// Compare batch and step-by-step results
        #[arg(long)]
        check: bool,
        /// Write per-WAP pumping and depletion totals as JSON
        #[arg(long)]
        summary_json: Option<String>,
    },

    /// Consent and consent/WAP active series from a cleaned consent table
    ActiveSeries {
        #[arg(short = 'c', long)]
        consents_csv: String,
        /// Model start date; series begin one year earlier
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(short = 'o', long)]
        output_dir: String,
    },

    /// Model band table, IRF series and low-flow expressions
    Bands {
        #[arg(short = 'b', long)]
        bands_csv: String,
        /// Band link table of a site, as SITE=PATH (repeatable)
        #[arg(short = 'k', long = "link", value_parser = parse_site_path)]
        links: Vec<(String, PathBuf)>,
        /// Daily flows for the IRF series
        #[arg(long)]
        flows_csv: Option<String>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(short = 'o', long)]
        output_dir: String,
        /// Also write the low-flow expressions
        #[arg(long)]
        expressions_csv: Option<String>,
    },

    /// Clean consents, write activity series and consent expressions
    Consents {
        #[arg(short = 'c', long)]
        consents_csv: String,
        /// Consumption fraction per use type
        #[arg(long)]
        consumption_csv: Option<String>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(short = 'o', long)]
        output_dir: String,
        /// Also write the consent expressions
        #[arg(long)]
        expressions_csv: Option<String>,
        /// Set take demand to zero instead of the restriction volume
        #[arg(long)]
        zero_demand: bool,
        /// Do not restrict transmission links and diversions
        #[arg(long)]
        no_link_restriction: bool,
    },

    /// Build everything a JSON configuration file asks for
    Run {
        #[arg(short = 'c', long)]
        config: String,
    },
}

fn one_off_config(start: NaiveDate, end: NaiveDate) -> ModelConfig {
    ModelConfig {
        work_dir: PathBuf::new(),
        start_date: start,
        end_date: end,
        depletion: None,
        consents: None,
        bands: None,
        expressions: None,
    }
}

fn expressions_section(output_csv: Option<String>, demand: DemandConfig, restrict_links: bool) -> Option<ExpressionsConfig> {
    output_csv.map(|output_csv| ExpressionsConfig {
        output_csv: PathBuf::from(output_csv),
        demand,
        restrict_links,
        low_flow_site: None,
        irf_sources: Default::default(),
    })
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Sdf {
            distance,
            storage_coefficient,
            transmissivity,
        } => depletion::run_sdf(distance, storage_coefficient, transmissivity),
        Command::Theis {
            distance,
            storage_coefficient,
            transmissivity,
            rate,
            days,
        } => depletion::run_theis(distance, storage_coefficient, transmissivity, rate, days),
        Command::Deplete {
            wells_csv,
            pumping_csv,
            output_csv,
            no_total,
            check,
            summary_json,
        } => depletion::run_deplete_command(
            DepletionRun {
                wells_csv: Path::new(&wells_csv),
                pumping_csv: Path::new(&pumping_csv),
                output_csv: Path::new(&output_csv),
                with_total: !no_total,
                check_consistency: check,
            },
            summary_json.as_deref().map(Path::new),
        ),
        Command::ActiveSeries {
            consents_csv,
            start,
            end,
            output_dir,
        } => consents::run_active_series(Path::new(&consents_csv), start, end, Path::new(&output_dir)),
        Command::Bands {
            bands_csv,
            links,
            flows_csv,
            start,
            end,
            output_dir,
            expressions_csv,
        } => {
            let mut config = one_off_config(start, end);
            config.bands = Some(BandsConfig {
                bands_csv: PathBuf::from(bands_csv),
                band_links: links.into_iter().collect(),
                flows_csv: flows_csv.map(PathBuf::from),
                output_dir: PathBuf::from(output_dir),
            });
            config.expressions = expressions_section(expressions_csv, DemandConfig::Zero, false);
            pipeline::run_model(&config)
        }
        Command::Consents {
            consents_csv,
            consumption_csv,
            start,
            end,
            output_dir,
            expressions_csv,
            zero_demand,
            no_link_restriction,
        } => {
            let mut config = one_off_config(start, end);
            config.consents = Some(ConsentsConfig {
                consents_csv: PathBuf::from(consents_csv),
                consumption_csv: consumption_csv.map(PathBuf::from),
                groundwater_waps: None,
                surface_water_waps: None,
                divert_waps: None,
                discharge_consents: None,
                output_dir: PathBuf::from(output_dir),
            });
            let demand = if zero_demand {
                DemandConfig::Zero
            } else {
                DemandConfig::Restriction
            };
            config.expressions = expressions_section(expressions_csv, demand, !no_link_restriction);
            pipeline::run_model(&config)
        }
        Command::Run { config } => pipeline::run_config(Path::new(&config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_site_path() {
        assert_eq!(
            parse_site_path("69505=links/69505.csv").unwrap(),
            ("69505".to_string(), PathBuf::from("links/69505.csv"))
        );
        assert!(parse_site_path("69505").is_err());
    }
}
