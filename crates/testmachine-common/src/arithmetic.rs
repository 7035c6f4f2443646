//! Binary arithmetic over a numeric tag.
//!
//! Floats follow IEEE 754 (division by zero yields an infinity or NaN).
//! Integers use checked arithmetic: overflow and division by zero raise,
//! which the search reports as an operation error.
use testmachine_core::{ConfigurationError, Operation, Transform, TypeTag, Value, ValueKind};

use crate::qualified;

type FloatOp = fn(f64, f64) -> f64;
type IntOp = fn(i64, i64) -> Option<i64>;

fn float_ops() -> [(&'static str, &'static str, FloatOp); 4] {
    [
        ("add", "{0} + {1}", |a: f64, b: f64| a + b),
        ("sub", "{0} - {1}", |a: f64, b: f64| a - b),
        ("mul", "{0} * {1}", |a: f64, b: f64| a * b),
        ("div", "{0} / {1}", |a: f64, b: f64| a / b),
    ]
}

const INT_OPS: [(&str, &str, IntOp); 4] = [
    ("add", "{0} + {1}", i64::checked_add),
    ("sub", "{0} - {1}", i64::checked_sub),
    ("mul", "{0} * {1}", i64::checked_mul),
    ("div", "{0} / {1}", i64::checked_div),
];

/// `add`, `sub`, `mul` and `div` for a float or integer tag.
pub fn arithmetic_operations(tag: TypeTag) -> Result<Vec<Operation>, ConfigurationError> {
    let inputs = vec![tag.clone(), tag.clone()];
    let outputs = vec![tag.clone()];

    match tag.kind() {
        ValueKind::Float => Ok(float_ops()
            .into_iter()
            .map(|(name, notation, op)| {
                let transform = Transform::compute(
                    qualified(name, &tag),
                    inputs.clone(),
                    outputs.clone(),
                    move |args| {
                        let (a, b) = floats(args)?;
                        Ok(vec![Value::Float(op(a, b))])
                    },
                );
                Operation::from(transform.with_notation(notation))
            })
            .collect()),

        ValueKind::Integer => Ok(INT_OPS
            .into_iter()
            .map(|(name, notation, op)| {
                let transform = Transform::compute(
                    qualified(name, &tag),
                    inputs.clone(),
                    outputs.clone(),
                    move |args| {
                        let (a, b) = integers(args)?;
                        match op(a, b) {
                            Some(n) => Ok(vec![Value::Integer(n)]),
                            None if name == "div" && b == 0 => Err("division by zero".to_string()),
                            None => Err("integer overflow".to_string()),
                        }
                    },
                );
                Operation::from(transform.with_notation(notation))
            })
            .collect()),

        other => Err(ConfigurationError::InvalidOperation {
            name: qualified("arithmetic", &tag),
            reason: format!("arithmetic needs a float or integer tag, `{}` is {}", tag, other),
        }),
    }
}

fn floats(args: &[Value]) -> Result<(f64, f64), String> {
    match args {
        [Value::Float(a), Value::Float(b)] => Ok((*a, *b)),
        _ => Err(format!("expected two floats, got {:?}", args)),
    }
}

fn integers(args: &[Value]) -> Result<(i64, i64), String> {
    match args {
        [Value::Integer(a), Value::Integer(b)] => Ok((*a, *b)),
        _ => Err(format!("expected two integers, got {:?}", args)),
    }
}
