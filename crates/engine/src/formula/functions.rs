// Built-in formula functions

use crate::error::{CalcError, CalcResult};
use crate::loc::{col_to_letters, Coord};

use super::eval::Value;

/// The fixed function table. Unknown names are rejected while parsing, so
/// evaluation only ever dispatches on these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sum,
    Res,
    Mul,
    Div,
    Mod,
    Array,
    Sqrt,
    Character,
}

impl Func {
    /// Look up a parsed identifier. Names must be uppercase, as produced by
    /// the tokenizer.
    pub fn from_name(name: &str) -> Option<Func> {
        match name {
            "SUM" => Some(Func::Sum),
            "RES" => Some(Func::Res),
            "MUL" => Some(Func::Mul),
            "DIV" => Some(Func::Div),
            "MOD" => Some(Func::Mod),
            "ARRAY" => Some(Func::Array),
            "SQRT" => Some(Func::Sqrt),
            "CHARACTER" => Some(Func::Character),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Func::Sum => "SUM",
            Func::Res => "RES",
            Func::Mul => "MUL",
            Func::Div => "DIV",
            Func::Mod => "MOD",
            Func::Array => "ARRAY",
            Func::Sqrt => "SQRT",
            Func::Character => "CHARACTER",
        }
    }
}

/// One function operand: a value plus the cell it came from, when it came
/// from a cell. Operands spliced out of a range or a direct reference carry
/// their source; computed sub-expressions do not.
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub value: Value,
    pub source: Option<Coord>,
}

impl Operand {
    pub fn bare(value: Value) -> Self {
        Operand { value, source: None }
    }

    pub fn at(value: Value, source: Coord) -> Self {
        Operand {
            value,
            source: Some(source),
        }
    }
}

/// Flatten list-valued operands into their elements, recursively. Elements
/// pulled out of a list lose their source. An error value anywhere aborts
/// the whole call.
pub fn flatten(operands: Vec<Operand>) -> CalcResult<Vec<Operand>> {
    let mut flat = Vec::with_capacity(operands.len());
    for op in operands {
        match op.value {
            Value::List(items) => flatten_into(items, &mut flat)?,
            Value::Error(e) => return Err(e),
            _ => flat.push(op),
        }
    }
    Ok(flat)
}

fn flatten_into(items: Vec<Value>, out: &mut Vec<Operand>) -> CalcResult<()> {
    for item in items {
        match item {
            Value::List(nested) => flatten_into(nested, out)?,
            Value::Error(e) => return Err(e),
            value => out.push(Operand::bare(value)),
        }
    }
    Ok(())
}

fn numbers(ops: &[Operand]) -> CalcResult<Vec<f64>> {
    ops.iter().map(|op| op.value.to_number()).collect()
}

fn first_number(ops: &[Operand], func: &str) -> CalcResult<f64> {
    let op = ops
        .first()
        .ok_or_else(|| CalcError::Type(format!("{} needs an operand", func)))?;
    op.value.to_number()
}

// Every accumulator fold starts from zero, the first operand included:
// SUM(3,4) is 0+3+4, RES(3,2) is 0-3-2, and MUL of anything is 0.

pub fn sum(ops: &[Operand]) -> CalcResult<Value> {
    let nums = numbers(ops)?;
    Ok(Value::Number(nums.into_iter().fold(0.0, |acc, n| acc + n)))
}

pub fn res(ops: &[Operand]) -> CalcResult<Value> {
    let nums = numbers(ops)?;
    Ok(Value::Number(nums.into_iter().fold(0.0, |acc, n| acc - n)))
}

pub fn mul(ops: &[Operand]) -> CalcResult<Value> {
    let nums = numbers(ops)?;
    Ok(Value::Number(nums.into_iter().fold(0.0, |acc, n| acc * n)))
}

pub fn div(ops: &[Operand]) -> CalcResult<Value> {
    let nums = numbers(ops)?;
    let mut acc = 0.0;
    for n in nums {
        if n == 0.0 {
            return Err(CalcError::Arith("division by zero".to_string()));
        }
        acc /= n;
    }
    Ok(Value::Number(acc))
}

pub fn modulo(ops: &[Operand]) -> CalcResult<Value> {
    let nums = numbers(ops)?;
    let mut acc = 0.0;
    for n in nums {
        if n == 0.0 {
            return Err(CalcError::Arith("modulo by zero".to_string()));
        }
        acc %= n;
    }
    Ok(Value::Number(acc))
}

pub fn sqrt(ops: &[Operand]) -> CalcResult<Value> {
    let n = first_number(ops, "SQRT")?;
    if n < 0.0 {
        return Err(CalcError::Arith(format!("square root of negative: {}", n)));
    }
    Ok(Value::Number(n.sqrt()))
}

/// Column-letter encoding of the first operand: 0 is A, 25 is Z, 26 is AA.
pub fn character(ops: &[Operand]) -> CalcResult<Value> {
    let n = first_number(ops, "CHARACTER")?;
    if n < 0.0 {
        return Err(CalcError::Type(format!(
            "CHARACTER needs a non-negative number, got {}",
            n
        )));
    }
    Ok(Value::Text(col_to_letters(n as usize)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Operand {
        Operand::bare(Value::Number(n))
    }

    #[test]
    fn test_func_from_name() {
        assert_eq!(Func::from_name("SUM"), Some(Func::Sum));
        assert_eq!(Func::from_name("CHARACTER"), Some(Func::Character));
        assert_eq!(Func::from_name("AVERAGE"), None);
        assert_eq!(Func::from_name("sum"), None);
    }

    #[test]
    fn test_func_name_round_trips() {
        for func in [
            Func::Sum,
            Func::Res,
            Func::Mul,
            Func::Div,
            Func::Mod,
            Func::Array,
            Func::Sqrt,
            Func::Character,
        ] {
            assert_eq!(Func::from_name(func.name()), Some(func));
        }
    }

    #[test]
    fn test_sum_folds_from_zero() {
        assert_eq!(sum(&[num(3.0), num(4.0)]).unwrap(), Value::Number(7.0));
        assert_eq!(sum(&[]).unwrap(), Value::Number(0.0));
    }

    #[test]
    fn test_res_subtracts_everything_from_zero() {
        // RES(3,2) = 0-3-2
        assert_eq!(res(&[num(3.0), num(2.0)]).unwrap(), Value::Number(-5.0));
        assert_eq!(res(&[num(5.0)]).unwrap(), Value::Number(-5.0));
    }

    #[test]
    fn test_mul_zero_seed_swallows_operands() {
        assert_eq!(mul(&[num(3.0), num(4.0)]).unwrap(), Value::Number(0.0));
        assert_eq!(mul(&[num(100.0)]).unwrap(), Value::Number(0.0));
    }

    #[test]
    fn test_div_zero_seed_and_zero_operand() {
        assert_eq!(div(&[num(2.0), num(5.0)]).unwrap(), Value::Number(0.0));
        assert_eq!(
            div(&[num(0.0)]).unwrap_err(),
            CalcError::Arith("division by zero".to_string())
        );
    }

    #[test]
    fn test_modulo_zero_seed_and_zero_operand() {
        assert_eq!(modulo(&[num(3.0)]).unwrap(), Value::Number(0.0));
        assert!(matches!(
            modulo(&[num(7.0), num(0.0)]).unwrap_err(),
            CalcError::Arith(_)
        ));
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(sqrt(&[num(9.0)]).unwrap(), Value::Number(3.0));
        assert!(matches!(sqrt(&[num(-1.0)]).unwrap_err(), CalcError::Arith(_)));
        assert!(matches!(sqrt(&[]).unwrap_err(), CalcError::Type(_)));
    }

    #[test]
    fn test_character_encodes_column_letters() {
        assert_eq!(character(&[num(0.0)]).unwrap(), Value::Text("A".to_string()));
        assert_eq!(character(&[num(25.0)]).unwrap(), Value::Text("Z".to_string()));
        assert_eq!(character(&[num(26.0)]).unwrap(), Value::Text("AA".to_string()));
        assert_eq!(
            character(&[num(701.0)]).unwrap(),
            Value::Text("ZZ".to_string())
        );
        assert!(matches!(
            character(&[num(-1.0)]).unwrap_err(),
            CalcError::Type(_)
        ));
    }

    #[test]
    fn test_flatten_expands_lists() {
        let ops = vec![
            num(1.0),
            Operand::bare(Value::List(vec![
                Value::Number(2.0),
                Value::List(vec![Value::Number(3.0)]),
            ])),
        ];
        let flat = flatten(ops).unwrap();
        assert_eq!(
            flat.iter().map(|op| op.value.clone()).collect::<Vec<_>>(),
            vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]
        );
    }

    #[test]
    fn test_flatten_propagates_errors() {
        let ops = vec![
            num(1.0),
            Operand::bare(Value::Error(CalcError::Arith("division by zero".to_string()))),
        ];
        assert!(flatten(ops).is_err());
    }

    #[test]
    fn test_numeric_coercion_in_folds() {
        let ops = vec![
            Operand::bare(Value::Text("5".to_string())),
            Operand::bare(Value::Empty),
            num(2.0),
        ];
        assert_eq!(sum(&ops).unwrap(), Value::Number(7.0));

        let bad = vec![Operand::bare(Value::Text("pears".to_string()))];
        assert!(matches!(sum(&bad).unwrap_err(), CalcError::Type(_)));
    }
}
