// Formula evaluator - walks the parsed AST against a cell lookup
// Functions: SUM, AVERAGE, MIN, MAX, COUNT, COUNTA, IF

use std::cmp::Ordering;

use cellgrid_core::a1;

use super::parser::{self, Expr, Op};
use super::FormulaError;
use crate::cell::{parse_number, CellValue};

pub const ERR_NA: &str = "#N/A";
pub const ERR_NAME: &str = "#NAME?";
pub const ERR_DIV0: &str = "#DIV/0!";
pub const ERR_VALUE: &str = "#VALUE!";
pub const ERR_REF: &str = "#REF!";

const ERROR_SENTINELS: [&str; 5] = [ERR_NA, ERR_NAME, ERR_DIV0, ERR_VALUE, ERR_REF];

/// True if `s` is one of the error values the evaluator produces.
pub fn is_error_sentinel(s: &str) -> bool {
    ERROR_SENTINELS.contains(&s)
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult {
    Number(f64),
    Text(String),
    Boolean(bool),
    Empty,
    Error(&'static str),
}

impl EvalResult {
    fn from_cell(value: CellValue) -> Self {
        match value {
            CellValue::Empty => EvalResult::Empty,
            CellValue::Number(n) => EvalResult::Number(n),
            CellValue::Text(s) => match ERROR_SENTINELS.iter().copied().find(|e| *e == s) {
                Some(e) => EvalResult::Error(e),
                None => EvalResult::Text(s),
            },
        }
    }

    /// Convert result to a number (for arithmetic operations)
    pub fn to_number(&self) -> Result<f64, &'static str> {
        match self {
            EvalResult::Number(n) => Ok(*n),
            EvalResult::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            EvalResult::Empty => Ok(0.0),
            EvalResult::Text(s) => parse_number(s.trim()).ok_or(ERR_VALUE),
            EvalResult::Error(e) => Err(*e),
        }
    }

    /// Convert result to a boolean (for IF conditions)
    pub fn to_bool(&self) -> Result<bool, &'static str> {
        match self {
            EvalResult::Boolean(b) => Ok(*b),
            EvalResult::Number(n) => Ok(*n != 0.0),
            EvalResult::Empty => Ok(false),
            EvalResult::Text(s) => match s.to_uppercase().as_str() {
                "TRUE" => Ok(true),
                "FALSE" => Ok(false),
                _ => Err(ERR_VALUE),
            },
            EvalResult::Error(e) => Err(*e),
        }
    }

    /// The value a formula cell displays.
    pub fn into_cell_value(self) -> CellValue {
        match self {
            EvalResult::Number(n) => CellValue::Number(n),
            EvalResult::Text(s) => CellValue::Text(s),
            EvalResult::Boolean(b) => CellValue::Text(if b { "TRUE" } else { "FALSE" }.to_string()),
            // =A1 on an empty cell shows 0
            EvalResult::Empty => CellValue::Number(0.0),
            EvalResult::Error(e) => CellValue::Text(e.to_string()),
        }
    }
}

/// Evaluate `formula` (text beginning with `=`).
///
/// `get_cell_value` resolves an A1 address to the referenced cell's value.
/// Never fails: parse errors become `#N/A`, unknown functions `#NAME?`,
/// division by zero `#DIV/0!` and type mismatches `#VALUE!`.
pub fn evaluate<F>(formula: &str, get_cell_value: F) -> CellValue
where
    F: Fn(&str) -> CellValue,
{
    match parser::parse(formula) {
        Ok(expr) => evaluate_expr(&expr, &get_cell_value).into_cell_value(),
        Err(FormulaError::UnknownName(_)) => CellValue::Text(ERR_NAME.to_string()),
        Err(e) => {
            log::debug!("formula {:?} failed to parse: {}", formula, e);
            CellValue::Text(ERR_NA.to_string())
        }
    }
}

pub fn evaluate_expr<F>(expr: &Expr, lookup: &F) -> EvalResult
where
    F: Fn(&str) -> CellValue,
{
    match expr {
        Expr::Number(n) => EvalResult::Number(*n),
        Expr::Text(s) => EvalResult::Text(s.clone()),
        Expr::Boolean(b) => EvalResult::Boolean(*b),
        Expr::CellRef { row, col } => EvalResult::from_cell(lookup(&a1(*row, *col))),
        // A bare range outside a function
        Expr::Range { .. } => EvalResult::Error(ERR_VALUE),
        Expr::Neg(inner) => match evaluate_expr(inner, lookup).to_number() {
            Ok(n) => EvalResult::Number(-n),
            Err(e) => EvalResult::Error(e),
        },
        Expr::Function { name, args } => evaluate_function(name, args, lookup),
        Expr::BinaryOp { op, left, right } => {
            let left = evaluate_expr(left, lookup);
            let right = evaluate_expr(right, lookup);
            if let EvalResult::Error(e) = left {
                return EvalResult::Error(e);
            }
            if let EvalResult::Error(e) = right {
                return EvalResult::Error(e);
            }
            match op {
                Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Pow => arithmetic(*op, &left, &right),
                _ => EvalResult::Boolean(compare(*op, &left, &right)),
            }
        }
    }
}

fn arithmetic(op: Op, left: &EvalResult, right: &EvalResult) -> EvalResult {
    let (a, b) = match (left.to_number(), right.to_number()) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return EvalResult::Error(e),
    };
    let result = match op {
        Op::Add => a + b,
        Op::Sub => a - b,
        Op::Mul => a * b,
        Op::Div => {
            if b == 0.0 {
                return EvalResult::Error(ERR_DIV0);
            }
            a / b
        }
        Op::Pow => a.powf(b),
        _ => return EvalResult::Error(ERR_VALUE),
    };
    if result.is_finite() {
        EvalResult::Number(result)
    } else {
        EvalResult::Error(ERR_VALUE)
    }
}

// Numbers compare numerically, text case-insensitively, and any text sorts
// after any number. Empty compares as 0 against numbers and "" against text.
fn compare(op: Op, left: &EvalResult, right: &EvalResult) -> bool {
    let ordering = match (left, right) {
        (EvalResult::Text(a), EvalResult::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (EvalResult::Text(a), EvalResult::Empty) => "".cmp(a.as_str()).reverse(),
        (EvalResult::Empty, EvalResult::Text(b)) => "".cmp(b.as_str()),
        (EvalResult::Text(_), _) => Ordering::Greater,
        (_, EvalResult::Text(_)) => Ordering::Less,
        _ => {
            let a = left.to_number().unwrap_or(0.0);
            let b = right.to_number().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
    };
    match op {
        Op::Lt => ordering == Ordering::Less,
        Op::Gt => ordering == Ordering::Greater,
        Op::Eq => ordering == Ordering::Equal,
        Op::LtEq => ordering != Ordering::Greater,
        Op::GtEq => ordering != Ordering::Less,
        Op::NotEq => ordering != Ordering::Equal,
        _ => false,
    }
}

/// One argument flattened for an aggregate. Range cells keep their raw type;
/// direct arguments are coerced by the caller.
enum Arg {
    FromRange(EvalResult),
    Direct(EvalResult),
}

fn collect_args<F>(args: &[Expr], lookup: &F) -> Vec<Arg>
where
    F: Fn(&str) -> CellValue,
{
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Expr::Range { start_row, start_col, end_row, end_col } => {
                // Row-major over the normalized rectangle
                for r in *start_row.min(end_row)..=*start_row.max(end_row) {
                    for c in *start_col.min(end_col)..=*start_col.max(end_col) {
                        out.push(Arg::FromRange(EvalResult::from_cell(lookup(&a1(r, c)))));
                    }
                }
            }
            Expr::CellRef { row, col } => {
                // A single referenced cell behaves like a one-cell range
                out.push(Arg::FromRange(EvalResult::from_cell(lookup(&a1(*row, *col)))));
            }
            other => out.push(Arg::Direct(evaluate_expr(other, lookup))),
        }
    }
    out
}

/// Numbers an aggregate should see: range text/blanks are skipped, direct
/// arguments must coerce.
fn numeric_values<F>(args: &[Expr], lookup: &F) -> Result<Vec<f64>, &'static str>
where
    F: Fn(&str) -> CellValue,
{
    let mut nums = Vec::new();
    for arg in collect_args(args, lookup) {
        match arg {
            Arg::FromRange(EvalResult::Number(n)) => nums.push(n),
            Arg::FromRange(EvalResult::Error(e)) => return Err(e),
            Arg::FromRange(_) => {}
            Arg::Direct(EvalResult::Empty) => {}
            Arg::Direct(v) => nums.push(v.to_number()?),
        }
    }
    Ok(nums)
}

fn evaluate_function<F>(name: &str, args: &[Expr], lookup: &F) -> EvalResult
where
    F: Fn(&str) -> CellValue,
{
    match name {
        "SUM" => match numeric_values(args, lookup) {
            Ok(nums) => EvalResult::Number(nums.iter().sum()),
            Err(e) => EvalResult::Error(e),
        },
        "AVERAGE" => match numeric_values(args, lookup) {
            Ok(nums) if nums.is_empty() => EvalResult::Error(ERR_DIV0),
            Ok(nums) => EvalResult::Number(nums.iter().sum::<f64>() / nums.len() as f64),
            Err(e) => EvalResult::Error(e),
        },
        "MIN" => match numeric_values(args, lookup) {
            Ok(nums) if nums.is_empty() => EvalResult::Number(0.0),
            Ok(nums) => EvalResult::Number(nums.iter().copied().fold(f64::INFINITY, f64::min)),
            Err(e) => EvalResult::Error(e),
        },
        "MAX" => match numeric_values(args, lookup) {
            Ok(nums) if nums.is_empty() => EvalResult::Number(0.0),
            Ok(nums) => EvalResult::Number(nums.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            Err(e) => EvalResult::Error(e),
        },
        "COUNT" => {
            let count = collect_args(args, lookup)
                .into_iter()
                .filter(|arg| match arg {
                    Arg::FromRange(v) => matches!(v, EvalResult::Number(_)),
                    Arg::Direct(v) => !matches!(v, EvalResult::Empty) && v.to_number().is_ok(),
                })
                .count();
            EvalResult::Number(count as f64)
        }
        "COUNTA" => {
            let count = collect_args(args, lookup)
                .into_iter()
                .filter(|arg| match arg {
                    Arg::FromRange(v) | Arg::Direct(v) => match v {
                        EvalResult::Empty => false,
                        EvalResult::Text(s) => !s.is_empty(),
                        _ => true,
                    },
                })
                .count();
            EvalResult::Number(count as f64)
        }
        "IF" => {
            if args.len() < 2 || args.len() > 3 {
                return EvalResult::Error(ERR_NA);
            }
            match evaluate_expr(&args[0], lookup).to_bool() {
                Ok(true) => evaluate_expr(&args[1], lookup),
                Ok(false) => match args.get(2) {
                    Some(expr) => evaluate_expr(expr, lookup),
                    None => EvalResult::Boolean(false),
                },
                Err(e) => EvalResult::Error(e),
            }
        }
        _ => EvalResult::Error(ERR_NAME),
    }
}
