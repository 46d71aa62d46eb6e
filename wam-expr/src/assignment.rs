use crate::branch::BranchPath;
use crate::expr::Expr;
use csv::WriterBuilder;
use serde::Serialize;
use wam_core::error::{CoreError, Result};

/// Variable holding most Key/Other Assumption values.
pub const ANNUAL_ACTIVITY_LEVEL: &str = "Annual Activity Level";
pub const DAILY_DEMAND: &str = "Daily Demand";
pub const CONSUMPTION: &str = "Consumption";
/// Spelled with three spaces, as the host model names it.
pub const MAXIMUM_FLOW_VOLUME: &str = "Maximum Flow   Volume";
pub const MAXIMUM_DIVERSION: &str = "Maximum Diversion";

/// One expression to be set on a branch variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub branch: BranchPath,
    pub variable: &'static str,
    pub expression: Expr,
}

#[derive(Serialize)]
struct AssignmentRow<'a> {
    branch: String,
    variable: &'a str,
    expression: String,
}

impl Assignment {
    pub fn new(branch: BranchPath, variable: &'static str, expression: Expr) -> Self {
        Self {
            branch,
            variable,
            expression,
        }
    }

    /// An `Annual Activity Level` assignment.
    pub fn activity_level(branch: BranchPath, expression: Expr) -> Self {
        Self::new(branch, ANNUAL_ACTIVITY_LEVEL, expression)
    }

    /// Write assignments as a `branch,variable,expression` CSV.
    pub fn to_csv_string(assignments: &[Assignment]) -> Result<String> {
        let mut wtr = WriterBuilder::new().from_writer(Vec::new());
        for a in assignments {
            wtr.serialize(AssignmentRow {
                branch: a.branch.full_name(),
                variable: a.variable,
                expression: a.expression.to_string(),
            })?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| CoreError::InvalidFormat(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| CoreError::InvalidFormat(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_csv_string_quotes_expressions() {
        let assignments = vec![
            Assignment::activity_level(
                BranchPath::root("Key Assumptions").child("IRF").child("Opihi").child("database"),
                Expr::read_from_file("irf.csv", 1),
            ),
            Assignment::new(
                BranchPath::root("Supply and Resources").child("River").child("DV01_Divert"),
                MAXIMUM_DIVERSION,
                Expr::var("r") / Expr::num(86400.0),
            ),
        ];
        let csv = Assignment::to_csv_string(&assignments).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "branch,variable,expression");
        assert_eq!(
            lines[1],
            "\\Key Assumptions\\IRF\\Opihi\\database,Annual Activity Level,\"ReadFromFile(irf.csv, 1, , , , Interpolate)\""
        );
        assert_eq!(lines[2], "\\Supply and Resources\\River\\DV01_Divert,Maximum Diversion,r / 86400");
    }
}
