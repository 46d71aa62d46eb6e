use crate::error::{CoreError, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use wam_depletion::AquiferGeometry;

/// Aquifer properties of a groundwater take point, as listed in the
/// well-properties table.
///
/// Expected CSV columns: wap, distance_m, storage_coefficient, transmissivity_m2d
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Well {
    /// WAP identifier, also the column name in pumping tables
    #[serde(rename = "wap", alias = "well", alias = "WAP")]
    pub well_id: String,
    /// Shortest distance from the well to the stream (m)
    #[serde(rename = "distance_m", alias = "L")]
    pub distance: f64,
    /// Storage coefficient (-)
    #[serde(rename = "storage_coefficient", alias = "S")]
    pub storage_coefficient: f64,
    /// Transmissivity (m²/day)
    #[serde(rename = "transmissivity_m2d", alias = "T")]
    pub transmissivity: f64,
}

impl Well {
    /// Validated depletion geometry for this well.
    pub fn geometry(&self) -> Result<AquiferGeometry> {
        AquiferGeometry::new(self.distance, self.storage_coefficient, self.transmissivity).map_err(
            |source| CoreError::Geometry {
                well: self.well_id.clone(),
                source,
            },
        )
    }

    /// Parse a CSV string of well properties into a vector of Wells.
    pub fn parse_well_csv(csv_object: &str) -> Result<Vec<Well>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_object.as_bytes());
        let mut wells: Vec<Well> = Vec::new();
        for row in rdr.deserialize() {
            let well: Well = row?;
            if wells.iter().any(|w| w.well_id == well.well_id) {
                return Err(CoreError::InvalidFormat(format!(
                    "well '{}' is listed more than once",
                    well.well_id
                )));
            }
            wells.push(well);
        }
        Ok(wells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELLS: &str = "\
wap,distance_m,storage_coefficient,transmissivity_m2d
L36/0001,500,0.002,300
L36/0002, 1200 ,0.1,2500
";

    #[test]
    fn test_parse_well_csv() {
        let wells = Well::parse_well_csv(WELLS).unwrap();
        assert_eq!(wells.len(), 2);
        assert_eq!(wells[0].well_id, "L36/0001");
        assert_eq!(wells[1].distance, 1200.0);
        let sdf = wells[0].geometry().unwrap().stream_depletion_factor();
        assert!((sdf - 1.6667).abs() < 1e-3);
    }

    #[test]
    fn test_short_column_aliases() {
        let wells = Well::parse_well_csv("well,L,S,T\nW1,10,0.1,100\n").unwrap();
        assert_eq!(wells[0].transmissivity, 100.0);
    }

    #[test]
    fn test_invalid_geometry_names_the_well() {
        let wells = Well::parse_well_csv("wap,distance_m,storage_coefficient,transmissivity_m2d\nBAD,0,0.1,100\n").unwrap();
        let err = wells[0].geometry().unwrap_err();
        assert!(err.to_string().starts_with("Well 'BAD'"));
    }

    #[test]
    fn test_duplicate_well_rejected() {
        let csv = "wap,distance_m,storage_coefficient,transmissivity_m2d\nW1,1,1,1\nW1,2,2,2\n";
        assert!(Well::parse_well_csv(csv).is_err());
    }
}
