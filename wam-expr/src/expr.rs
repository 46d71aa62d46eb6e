//! Expression tree for the host model's formula language.
//!
//! Expressions are built as values and rendered once with [`fmt::Display`].
//! Parentheses come from operator precedence, so composing two expressions
//! never requires string surgery.

use crate::branch::BranchPath;
use std::fmt;
use std::ops;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    GreaterOrEqual,
}

impl Comparison {
    fn symbol(&self) -> &'static str {
        match self {
            Comparison::Equal => "=",
            Comparison::GreaterOrEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Reference to a sibling branch by name, e.g. `max_trig`
    Var(String),
    Branch(BranchPath),
    /// `Key\...` shorthand into the Key Assumptions tree
    Key(Vec<String>),
    /// A result variable of a node, `<path>:<variable>[<unit>]`
    Result {
        path: BranchPath,
        variable: String,
        unit: String,
    },
    Sum(Vec<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Ratio(Box<Expr>, Box<Expr>),
    Min(Vec<Expr>),
    Max(Vec<Expr>),
    If {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Compare {
        op: Comparison,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Step lookup over the months of the year; `None` renders empty
    MonthlyLookup(Vec<(u32, Option<f64>)>),
    ReadFromFile {
        path: String,
        column: usize,
    },
    /// Previous time step value, or the sum over the last `window - 1` steps
    PrevTsValue {
        value: Box<Expr>,
        window: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn num(value: f64) -> Self {
        Expr::Number(value)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn branch(path: &BranchPath) -> Self {
        Expr::Branch(path.clone())
    }

    pub fn key<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expr::Key(segments.into_iter().map(Into::into).collect())
    }

    pub fn result(path: BranchPath, variable: impl Into<String>, unit: impl Into<String>) -> Self {
        Expr::Result {
            path,
            variable: variable.into(),
            unit: unit.into(),
        }
    }

    /// Sum of the terms; an empty sum is `0` and a single term is itself.
    pub fn sum<I: IntoIterator<Item = Expr>>(terms: I) -> Self {
        let mut terms: Vec<Expr> = terms.into_iter().collect();
        match terms.len() {
            0 => Expr::Number(0.0),
            1 => terms.remove(0),
            _ => Expr::Sum(terms),
        }
    }

    pub fn min(a: Expr, b: Expr) -> Self {
        Expr::Min(vec![a, b])
    }

    pub fn max(a: Expr, b: Expr) -> Self {
        Expr::Max(vec![a, b])
    }

    pub fn if_else(condition: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::If {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn equal(lhs: Expr, rhs: Expr) -> Self {
        Expr::Compare {
            op: Comparison::Equal,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn at_least(lhs: Expr, rhs: Expr) -> Self {
        Expr::Compare {
            op: Comparison::GreaterOrEqual,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// A time series column read by the model, interpolated between dates.
    /// Columns are numbered from 1, not counting the date column.
    pub fn read_from_file(path: impl Into<String>, column: usize) -> Self {
        Expr::ReadFromFile {
            path: path.into(),
            column,
        }
    }

    pub fn prev_ts_value(value: Expr) -> Self {
        Expr::PrevTsValue {
            value: Box::new(value),
            window: None,
        }
    }

    pub fn prev_ts_sum(value: Expr, window: Expr) -> Self {
        Expr::PrevTsValue {
            value: Box::new(value),
            window: Some(Box::new(window)),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Compare { .. } => 0,
            Expr::Sum(terms) if terms.len() == 1 => terms[0].precedence(),
            Expr::Sum(terms) if terms.is_empty() => 3,
            Expr::Sum(_) | Expr::Sub(..) => 1,
            Expr::Number(v) if *v < 0.0 => 1,
            Expr::Mul(..) | Expr::Ratio(..) => 2,
            _ => 3,
        }
    }

    fn write_operand(&self, f: &mut fmt::Formatter<'_>, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, name: &str, args: &[Expr]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", arg)?;
    }
    f.write_str(")")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(v) => write!(f, "{}", v),
            Expr::Var(name) => f.write_str(name),
            Expr::Branch(path) => write!(f, "{}", path),
            Expr::Key(segments) => write!(f, "Key\\{}", segments.join("\\")),
            Expr::Result { path, variable, unit } => {
                write!(f, "{}:{}[{}]", path.relative_name(), variable, unit)
            }
            Expr::Sum(terms) => {
                if terms.is_empty() {
                    return f.write_str("0");
                }
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" + ")?;
                    }
                    term.write_operand(f, 1)?;
                }
                Ok(())
            }
            Expr::Sub(lhs, rhs) => {
                lhs.write_operand(f, 1)?;
                f.write_str(" - ")?;
                rhs.write_operand(f, 2)
            }
            Expr::Mul(lhs, rhs) => {
                lhs.write_operand(f, 2)?;
                f.write_str(" * ")?;
                rhs.write_operand(f, 2)
            }
            Expr::Ratio(lhs, rhs) => {
                lhs.write_operand(f, 2)?;
                f.write_str(" / ")?;
                rhs.write_operand(f, 3)
            }
            Expr::Min(args) => write_args(f, "Min", args),
            Expr::Max(args) => write_args(f, "Max", args),
            Expr::If { condition, then, otherwise } => {
                write!(f, "If({}, {}, {})", condition, then, otherwise)
            }
            Expr::Compare { op, lhs, rhs } => {
                lhs.write_operand(f, 1)?;
                f.write_str(op.symbol())?;
                rhs.write_operand(f, 1)
            }
            Expr::MonthlyLookup(points) => {
                f.write_str("Lookup(X, Y, Step, Month")?;
                for (month, value) in points {
                    match value {
                        Some(v) => write!(f, ", {}, {}", month, v)?,
                        None => write!(f, ", {}, ", month)?,
                    }
                }
                f.write_str(")")
            }
            Expr::ReadFromFile { path, column } => {
                write!(f, "ReadFromFile({}, {}, , , , Interpolate)", path, column)
            }
            Expr::PrevTsValue { value, window } => match window {
                None => write!(f, "PrevTSValue({})", value),
                Some(window) => {
                    write!(f, "PrevTSValue({}, 1, ", value)?;
                    window.write_operand(f, 1)?;
                    f.write_str(" - 1, Sum)")
                }
            },
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Number(value)
    }
}

impl From<BranchPath> for Expr {
    fn from(path: BranchPath) -> Self {
        Expr::Branch(path)
    }
}

impl ops::Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        let mut terms = match self {
            Expr::Sum(terms) => terms,
            other => vec![other],
        };
        match rhs {
            Expr::Sum(more) => terms.extend(more),
            other => terms.push(other),
        }
        Expr::Sum(terms)
    }
}

impl ops::Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(self), Box::new(rhs))
    }
}

impl ops::Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(Box::new(self), Box::new(rhs))
    }
}

impl ops::Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::Ratio(Box::new(self), Box::new(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str) -> Expr {
        Expr::var(name)
    }

    #[test]
    fn test_numbers() {
        assert_eq!(Expr::num(1.0).to_string(), "1");
        assert_eq!(Expr::num(0.25).to_string(), "0.25");
        assert_eq!(Expr::num(50000.0).to_string(), "50000");
    }

    #[test]
    fn test_precedence_parentheses() {
        assert_eq!((v("a") + v("b") * v("c")).to_string(), "a + b * c");
        assert_eq!(((v("a") + v("b")) * v("c")).to_string(), "(a + b) * c");
        assert_eq!((v("a") - (v("b") + v("c"))).to_string(), "a - (b + c)");
        assert_eq!((v("a") - v("b") * v("c")).to_string(), "a - b * c");
        assert_eq!(((v("a") - v("b")) / (v("c") - v("d"))).to_string(), "(a - b) / (c - d)");
        assert_eq!((v("a") / (v("b") * v("c"))).to_string(), "a / (b * c)");
        assert_eq!((v("a") * Expr::num(-2.0)).to_string(), "a * (-2)");
    }

    #[test]
    fn test_sum_flattens_and_collapses() {
        let sum = v("a") + v("b") + (v("c") + v("d"));
        assert_eq!(sum, Expr::Sum(vec![v("a"), v("b"), v("c"), v("d")]));
        assert_eq!(Expr::sum(Vec::new()).to_string(), "0");
        assert_eq!(Expr::sum(vec![v("a")]), v("a"));
        assert_eq!((v("x") * Expr::sum(vec![v("a")])).to_string(), "x * a");
    }

    #[test]
    fn test_functions() {
        let expr = Expr::if_else(
            Expr::equal(v("max_trig"), v("min_trig")),
            Expr::if_else(Expr::at_least(Expr::key(["IRF", "Opihi", "database"]), v("max_trig")), Expr::num(1.0), Expr::num(0.0)),
            Expr::max(Expr::num(0.0), Expr::min(Expr::num(1.0), v("q"))),
        );
        assert_eq!(
            expr.to_string(),
            "If(max_trig=min_trig, If(Key\\IRF\\Opihi\\database>=max_trig, 1, 0), Max(0, Min(1, q)))"
        );
    }

    #[test]
    fn test_monthly_lookup_renders_missing_months_empty() {
        let expr = Expr::MonthlyLookup(vec![(1, Some(1500.0)), (2, None), (3, Some(2.5))]);
        assert_eq!(expr.to_string(), "Lookup(X, Y, Step, Month, 1, 1500, 2, , 3, 2.5)");
    }

    #[test]
    fn test_read_from_file_and_prev_ts_value() {
        assert_eq!(
            Expr::read_from_file("C:\\model\\crc_active.csv", 3).to_string(),
            "ReadFromFile(C:\\model\\crc_active.csv, 3, , , , Interpolate)"
        );
        let delivered = Expr::result(
            BranchPath::root("Demand Sites and Catchments").child("SW01_SW"),
            "Supply Delivered",
            "m^3",
        );
        assert_eq!(
            Expr::prev_ts_value(delivered.clone()).to_string(),
            "PrevTSValue(Demand Sites and Catchments\\SW01_SW:Supply Delivered[m^3])"
        );
        assert_eq!(
            Expr::prev_ts_sum(delivered, Expr::num(366.0)).to_string(),
            "PrevTSValue(Demand Sites and Catchments\\SW01_SW:Supply Delivered[m^3], 1, 366 - 1, Sum)"
        );
    }
}
