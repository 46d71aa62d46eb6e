use crate::error::{DepletionError, Result};
use crate::geometry::AquiferGeometry;
use serde::Serialize;

/// Response of a stream to a single constant pumping pulse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TheisResponse {
    /// Stream depletion factor (days)
    pub sdf: f64,
    /// Fraction of the pumping rate taken from the stream, 0..1
    pub connection: f64,
    /// Stream depletion rate, in the unit of the pumping rate
    pub depletion: f64,
}

/// Stream depletion after pumping at a constant `rate` for `days` days.
///
/// The depletion carries the unit of `rate`: l/s in gives l/s out,
/// m³/d in gives m³/d out.
pub fn theis(geometry: &AquiferGeometry, rate: f64, days: f64) -> Result<TheisResponse> {
    if !(days.is_finite() && days > 0.0) {
        return Err(DepletionError::InvalidDuration(days));
    }
    let connection = geometry.connection(days);
    Ok(TheisResponse {
        sdf: geometry.stream_depletion_factor(),
        connection,
        depletion: connection * rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example() {
        let g = AquiferGeometry::new(500.0, 0.002, 300.0).unwrap();
        let r = theis(&g, 10.0, 30.0).unwrap();
        assert!((r.sdf - 1.6667).abs() < 1e-3);
        assert!((r.connection - 0.867).abs() < 1e-3);
        assert!((r.depletion - 8.67).abs() < 1e-2);
    }

    #[test]
    fn matches_closed_form() {
        for &(l, s, t, q, d) in &[
            (50.0, 0.1, 1000.0, 25.0, 1.0),
            (1200.0, 0.05, 250.0, 3.5, 150.0),
            (300.0, 0.0005, 5000.0, 40.0, 7.0),
        ] {
            let g = AquiferGeometry::new(l, s, t).unwrap();
            let r = theis(&g, q, d).unwrap();
            let expected = libm::erfc((l * l * s / (t * 4.0 * d)).sqrt()) * q;
            assert!((r.depletion - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn connection_stays_in_unit_interval() {
        let g = AquiferGeometry::new(2000.0, 0.2, 10.0).unwrap();
        let early = theis(&g, 1.0, 1.0).unwrap();
        let late = theis(&g, 1.0, 1.0e9).unwrap();
        assert!(early.connection >= 0.0 && early.connection < 1e-6);
        assert!(late.connection <= 1.0 && late.connection > 0.99);
    }

    #[test]
    fn rejects_non_positive_duration() {
        let g = AquiferGeometry::new(500.0, 0.002, 300.0).unwrap();
        assert_eq!(theis(&g, 10.0, 0.0), Err(DepletionError::InvalidDuration(0.0)));
        assert!(theis(&g, 10.0, -3.0).is_err());
        assert!(theis(&g, 10.0, f64::NAN).is_err());
    }
}
