//! Numeric coercion and formatting.

use serde_json::{Number, Value};
use tessera_application::{ExtensionError, FilterDefinition, FilterRun};
use tessera_domain::ArgDefinition;

use super::{string_arg, text_of};

const OPERATIONS: [(&str, &str); 6] = [
    ("Fixed decimals", "fixed"),
    ("Round", "round"),
    ("Floor", "floor"),
    ("Ceil", "ceil"),
    ("Integer", "int"),
    ("Float", "float"),
];

/// `value | number("fixed", 2)`
#[must_use]
pub fn number_filter() -> FilterDefinition {
    FilterDefinition::new(
        "number",
        FilterRun::sync(|_, input, args| {
            let operation = string_arg(&args, 0).unwrap_or_else(|| "float".to_string());
            let digits = digits_arg(args.get(1))?;
            process(&input, &operation, digits)
        }),
    )
    .with_display_name("Number processing")
    .with_description("Coerce a value to a number and format it")
    .with_arg(ArgDefinition::enumeration("Operation", &OPERATIONS))
    .with_arg(
        ArgDefinition::number("Digits")
            .with_description("Decimal places for fixed and round")
            .with_hide(|values| {
                !matches!(
                    values.first().and_then(Value::as_str),
                    Some("fixed" | "round")
                )
            }),
    )
}

fn digits_arg(value: Option<&Value>) -> Result<u32, ExtensionError> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(0);
    };
    value
        .as_u64()
        .or_else(|| text_of(value).trim().parse().ok())
        .and_then(|d| u32::try_from(d).ok())
        .filter(|d| *d <= 20)
        .ok_or_else(|| ExtensionError::new(format!("invalid digit count: {}", text_of(value))))
}

fn coerce(input: &Value) -> Result<f64, ExtensionError> {
    match input {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
    .ok_or_else(|| ExtensionError::new(format!("not a number: {}", text_of(input))))
}

fn process(input: &Value, operation: &str, digits: u32) -> Result<Value, ExtensionError> {
    let number = coerce(input)?;
    match operation {
        "fixed" => Ok(Value::String(format!("{number:.prec$}", prec = digits as usize))),
        "round" => {
            let factor = 10f64.powi(i32::try_from(digits).unwrap_or(0));
            Ok(float((number * factor).round() / factor))
        }
        "floor" => Ok(integer(number.floor())),
        "ceil" => Ok(integer(number.ceil())),
        "int" => Ok(integer(number.trunc())),
        "float" => Ok(float(number)),
        other => Err(ExtensionError::new(format!("unknown number operation: {other}"))),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer(value: f64) -> Value {
    // Beyond 2^53 an f64 no longer maps onto a unique i64.
    if value.abs() < 9_007_199_254_740_992.0 {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

fn float(value: f64) -> Value {
    if value.fract() == 0.0 {
        integer(value)
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}
