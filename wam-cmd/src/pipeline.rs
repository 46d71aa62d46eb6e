//! The full model build: every configured stage in order.

use crate::config::ModelConfig;
use crate::depletion::{run_depletion, DepletionRun};
use crate::{bands, consents, expressions};
use log::info;
use std::path::Path;

/// Run every stage switched on in `config`.
pub fn run_model(config: &ModelConfig) -> anyhow::Result<()> {
    info!(
        "Model run {} to {} in {}",
        config.start_date,
        config.end_date,
        config.work_dir.display()
    );

    let stream_depletion = match &config.depletion {
        Some(section) => {
            let wells_csv = config.resolve(&section.wells_csv);
            let pumping_csv = config.resolve(&section.pumping_csv);
            let output_csv = config.resolve(&section.output_csv);
            let output = run_depletion(DepletionRun {
                wells_csv: &wells_csv,
                pumping_csv: &pumping_csv,
                output_csv: &output_csv,
                with_total: section.with_total,
                check_consistency: section.check_consistency,
            })?;
            Some(output.series)
        }
        None => None,
    };

    let prepared_consents = match &config.consents {
        Some(section) => Some(consents::prepare(config, section)?),
        None => None,
    };
    let prepared_bands = match &config.bands {
        Some(section) => Some(bands::prepare(config, section)?),
        None => None,
    };

    if let Some(section) = &config.expressions {
        expressions::write(
            config,
            section,
            stream_depletion.as_ref(),
            prepared_consents.as_ref(),
            prepared_bands.as_ref(),
        )?;
    }
    info!("Model run complete");
    Ok(())
}

/// Load a configuration file and run it.
pub fn run_config(path: &Path) -> anyhow::Result<()> {
    let config = ModelConfig::load(path)?;
    run_model(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::{write_output, ScratchDir};

    const CONSENTS: &str = "\
crc,wap,wap_name,wap_name_long,Activity,fmDate,toDate,from_month,to_month,wap_max_rate [l/s],wap_max_rate_pro_rata [l/s],wap_max_vol_pro_rata [m3],wap_return_period [d],crc_vol_return_period [m3],crc_return_period [d],crc_ann_vol [m3],crc_ann_vol_combined [m3],associated_crcs,lowflow_restriction,BandNo,use_type
CRC1,L36/0001,L36_0001_GW,,Take Groundwater,01/07/2015,30/06/2030,1,12,10,,,,5000,7,,,,1,2,Irrigation
CRC2,SW01,SW01_SW,,Take Surface Water,01/07/2015,30/06/2030,10,4,5,,2000,1,,,100000,,,1,9,Irrigation
CRC5,OUT1,OUT1,,Discharge water to water,01/07/2015,30/06/2030,1,12,1,,,,,,,,,0,,Other
";

    const BANDS: &str = "\
site,date,band_num,waterway,location,min_trig,max_trig
69505,01/01/2015,1,Opihi River,SH1,1000,2000
69505,01/01/2015,2,Opihi River,SH1,2000,3000
";

    const WELLS: &str = "\
wap,distance_m,storage_coefficient,transmissivity_m2d
L36_0001_GW,500,0.002,300
";

    const PUMPING: &str = "\
Date,L36_0001_GW
01/07/2016,10
02/07/2016,10
";

    const FLOWS: &str = "\
site,date,flow
69505,30/06/2016,1500
69505,01/07/2016,1400
";

    #[test]
    fn test_run_model_end_to_end() {
        let scratch = ScratchDir::new("pipeline");
        let dir = scratch.path();
        write_output(&dir.join("consents.csv"), CONSENTS).unwrap();
        write_output(&dir.join("consumption.csv"), "use_type,consumption\nIrrigation,0.8\nOther,0.5\n").unwrap();
        write_output(&dir.join("bands.csv"), BANDS).unwrap();
        write_output(&dir.join("69505_links.csv"), "BandNo,BandDesc\n1,Band 1\n2,Band 2\n").unwrap();
        write_output(&dir.join("flows.csv"), FLOWS).unwrap();
        write_output(&dir.join("wells.csv"), WELLS).unwrap();
        write_output(&dir.join("pumping.csv"), PUMPING).unwrap();

        let json = format!(
            r#"{{
                "work_dir": "{}",
                "start_date": "2016-07-01",
                "end_date": "2016-07-10",
                "depletion": {{ "wells_csv": "wells.csv", "pumping_csv": "pumping.csv",
                                "output_csv": "out/stream_depletion.csv", "with_total": true }},
                "consents": {{ "consents_csv": "consents.csv", "consumption_csv": "consumption.csv", "output_dir": "out" }},
                "bands": {{ "bands_csv": "bands.csv", "band_links": {{ "69505": "69505_links.csv" }},
                            "flows_csv": "flows.csv", "output_dir": "out" }},
                "expressions": {{ "output_csv": "out/expressions.csv", "low_flow_site": "69505" }}
            }}"#,
            dir.display()
        );
        let config = ModelConfig::from_json(&json).unwrap();
        run_model(&config).unwrap();

        let out = dir.join("out");
        let crc_active = std::fs::read_to_string(out.join(consents::CRC_ACTIVE_CSV)).unwrap();
        assert_eq!(crc_active.lines().next(), Some("Date,CRC1,CRC2,CRC5"));
        assert!(crc_active.lines().nth(1).unwrap().starts_with("01/07/2015,"));
        // current-accounts year plus ten model days
        assert_eq!(crc_active.lines().count(), 1 + 366 + 10);

        let crc_wap_active = std::fs::read_to_string(out.join(consents::CRC_WAP_ACTIVE_CSV)).unwrap();
        assert_eq!(crc_wap_active.lines().next(), Some("Date,CRC1_L36_0001_GW,CRC2_SW01_SW"));

        let bands = std::fs::read_to_string(out.join(bands::MODEL_BANDS_CSV)).unwrap();
        assert_eq!(bands.lines().count(), 3);
        assert!(out.join(bands::IRF_DIR).join("69505_IRF.csv").exists());

        let expressions = std::fs::read_to_string(out.join("expressions.csv")).unwrap();
        assert!(expressions.starts_with("branch,variable,expression"));
        assert!(expressions.contains(r"\Key Assumptions\Low Flows\Opihi River at SH1\band_num_2\Ballocated"));
        assert!(expressions.contains("ReadFromFile("));
        // band 9 of CRC2 is unknown at the site
        assert!(!expressions.contains("band_num_9"));
        let sd_csv = out.join("stream_depletion.csv");
        assert!(expressions.contains(&format!(
            r#"\Demand Sites and Catchments\L36_0001_GW_SD,Daily Demand,"ReadFromFile({}, 1, , , , Interpolate)""#,
            sd_csv.display()
        )));
        assert!(!expressions.contains("Total_SD"));
    }

    #[test]
    fn test_run_model_zero_stream_depletion() {
        let scratch = ScratchDir::new("pipeline-zero-sd");
        let dir = scratch.path();
        write_output(&dir.join("wells.csv"), WELLS).unwrap();
        write_output(&dir.join("pumping.csv"), PUMPING).unwrap();
        let json = format!(
            r#"{{
                "work_dir": "{}",
                "start_date": "2016-07-01",
                "end_date": "2016-07-10",
                "depletion": {{ "wells_csv": "wells.csv", "pumping_csv": "pumping.csv",
                                "output_csv": "stream_depletion.csv", "zero_sd": true }},
                "expressions": {{ "output_csv": "expressions.csv" }}
            }}"#,
            dir.display()
        );
        run_model(&ModelConfig::from_json(&json).unwrap()).unwrap();

        let expressions = std::fs::read_to_string(dir.join("expressions.csv")).unwrap();
        assert!(expressions.contains(r"\Demand Sites and Catchments\L36_0001_GW_SD,Daily Demand,0"));
        assert!(!expressions.contains("ReadFromFile("));
    }
}
