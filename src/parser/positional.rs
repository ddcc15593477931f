//! Positional argument coercion (spec.md §4.5). Runs after the token
//! parser finishes and before action dispatch, turning the operand list
//! into one coerced `Value` per registered `Argument`.
//!
//! Grounded in the teacher's `expected_positional_args` counter
//! (`command::FliCommand::set_expected_positional_args` /
//! `get_expected_positional_args`), generalized from a bare count into
//! full per-slot `parse_arg`/variadic/default handling.

use crate::argument::Argument;
use crate::error::{Error, Result};
use crate::value::Value;

/// Coerces `args` (the operand tokens collected by the tokenizer) against
/// `registered`'s declared argument slots.
///
/// `allow_excess_arguments` suppresses the excess-arguments error when the
/// last registered argument is not variadic and more operands were
/// supplied than declared slots (spec.md §4.5 / §3 `allow_excess_arguments`).
pub fn coerce_arguments(
    registered: &[Argument],
    args: &[String],
    allow_excess_arguments: bool,
) -> Result<Vec<Value>> {
    for (i, arg) in registered.iter().enumerate() {
        if arg.required && args.get(i).is_none() {
            return Err(Error::missing_argument(format!(
                "missing required argument '{}'",
                arg.name
            )));
        }
    }

    let last_is_variadic = registered.last().map(|a| a.variadic).unwrap_or(false);
    if !last_is_variadic && !allow_excess_arguments && args.len() > registered.len() {
        return Err(Error::excess_arguments(format!(
            "expected {} argument(s), got {}",
            registered.len(),
            args.len()
        )));
    }

    let mut out = Vec::new();
    for (i, arg) in registered.iter().enumerate() {
        if arg.variadic {
            let remaining = args.get(i..).unwrap_or(&[]);
            out.push(coerce_variadic(arg, remaining)?);
            break;
        }

        match args.get(i) {
            Some(raw) => {
                let value = match arg.parse_arg {
                    Some(parser) => parser(raw, arg.default_value.as_ref())
                        .map_err(|msg| Error::invalid_argument(format!("error: {msg}")))?,
                    None => Value::Str(raw.clone()),
                };
                out.push(value);
            }
            None => {
                if let Some(default) = &arg.default_value {
                    out.push(default.clone());
                }
            }
        }
    }
    Ok(out)
}

fn coerce_variadic(arg: &Argument, remaining: &[String]) -> Result<Value> {
    if let Some(parser) = arg.parse_arg {
        let mut acc = arg.default_value.clone();
        for raw in remaining {
            let next = parser(raw, acc.as_ref())
                .map_err(|msg| Error::invalid_argument(format!("error: {msg}")))?;
            acc = Some(next);
        }
        return Ok(acc.unwrap_or_else(|| Value::List(Vec::new())));
    }

    if remaining.is_empty() {
        return Ok(arg.default_value.clone().unwrap_or_else(|| Value::List(Vec::new())));
    }
    Ok(Value::List(remaining.iter().map(|s| Value::Str(s.clone())).collect()))
}
