//! Bindings from the command line (`--bind name=value`) and from JSON files.

use javelin_core::{Bindings, Value, ast::Type};
use serde_json::Value as Json;
use std::path::Path;

use crate::config::{CliError, CliResult, read_json};

/// Reads a literal the way it would be written in Java: `42`, `42L`,
/// `1.5`, `true`, `'c'`, `"text"`. Anything else is taken as a string.
pub fn parse_literal(text: &str) -> Value {
    let text = text.trim();
    match text {
        "true" => return Value::Boolean(true),
        "false" => return Value::Boolean(false),
        _ => {}
    }
    if let Some(digits) = text.strip_suffix(['L', 'l']) {
        if let Ok(l) = digits.parse::<i64>() {
            return Value::Long(l);
        }
    }
    if let Ok(i) = text.parse::<i32>() {
        return Value::Int(i);
    }
    if let Ok(l) = text.parse::<i64>() {
        return Value::Long(l);
    }
    if text.contains(['.', 'e', 'E']) {
        if let Ok(d) = text.parse::<f64>() {
            return Value::Double(d);
        }
    }
    let mut chars = text.chars();
    if let (Some('\''), Some(c), Some('\''), None) =
        (chars.next(), chars.next(), chars.next(), chars.next())
    {
        return Value::Char(c);
    }
    match text
        .strip_prefix('"')
        .and_then(|quoted| quoted.strip_suffix('"'))
    {
        Some(inner) => Value::string(inner),
        None => Value::string(text),
    }
}

/// Splits `name=value`.
pub fn parse_binding(arg: &str) -> CliResult<(String, Value)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| CliError::Binding(format!("expected name=value, got '{}'", arg)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::Binding(format!("missing name in '{}'", arg)));
    }
    Ok((name.to_string(), parse_literal(value)))
}

fn element_type(values: &[Value]) -> Option<Type> {
    let mut types = values.iter().map(Value::static_type);
    let first = types.next().flatten()?;
    types.all(|ty| ty.as_ref() == Some(&first)).then_some(first)
}

/// Converts one JSON value. Whole numbers become `int` when they fit and
/// `long` otherwise; arrays must hold values of a single type.
pub fn from_json(name: &str, json: &Json) -> CliResult<Value> {
    let value = match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(l), _) => i32::try_from(l).map_or(Value::Long(l), Value::Int),
            (None, Some(d)) => Value::Double(d),
            (None, None) => {
                return Err(CliError::Binding(format!(
                    "'{}': number {} is out of range",
                    name, n
                )));
            }
        },
        Json::String(s) => Value::string(s),
        Json::Array(items) => {
            let items = items
                .iter()
                .map(|item| from_json(name, item))
                .collect::<CliResult<Vec<_>>>()?;
            let element = if items.is_empty() {
                Type::Int
            } else {
                element_type(&items).ok_or_else(|| {
                    CliError::Binding(format!("'{}': array elements must share one type", name))
                })?
            };
            Value::array(element, items)
        }
        Json::Object(_) => {
            return Err(CliError::Binding(format!(
                "'{}': objects cannot be bound",
                name
            )));
        }
    };
    Ok(value)
}

/// A JSON object of bindings, followed by `--bind` arguments, later ones
/// replacing earlier ones.
pub fn collect_bindings(file: Option<&Path>, args: &[String]) -> CliResult<Bindings> {
    let mut bindings = Bindings::new();
    if let Some(path) = file {
        let object: serde_json::Map<String, Json> = read_json(path)?;
        for (name, json) in &object {
            bindings.insert(name.clone(), from_json(name, json)?);
        }
    }
    for arg in args {
        let (name, value) = parse_binding(arg)?;
        bindings.insert(name, value);
    }
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal("42"), Value::Int(42));
        assert_eq!(parse_literal("-7"), Value::Int(-7));
        assert_eq!(parse_literal("42L"), Value::Long(42));
        assert_eq!(parse_literal("3000000000"), Value::Long(3_000_000_000));
        assert_eq!(parse_literal("1.5"), Value::Double(1.5));
        assert_eq!(parse_literal("true"), Value::Boolean(true));
        assert_eq!(parse_literal("'x'"), Value::Char('x'));
        assert_eq!(parse_literal("\"42\""), Value::string("42"));
        assert_eq!(parse_literal("hello"), Value::string("hello"));
    }

    #[test]
    fn test_parse_binding() {
        let (name, value) = parse_binding("a=2").unwrap();
        assert_eq!(name, "a");
        assert_eq!(value, Value::Int(2));

        let (_, value) = parse_binding("s=a=b").unwrap();
        assert_eq!(value, Value::string("a=b"));

        assert!(matches!(parse_binding("nothing"), Err(CliError::Binding(_))));
        assert!(matches!(parse_binding("=1"), Err(CliError::Binding(_))));
    }

    #[test]
    fn test_from_json() {
        assert_eq!(from_json("n", &json!(5)).unwrap(), Value::Int(5));
        assert_eq!(
            from_json("n", &json!(5_000_000_000i64)).unwrap(),
            Value::Long(5_000_000_000)
        );
        assert_eq!(from_json("d", &json!(0.5)).unwrap(), Value::Double(0.5));

        let array = from_json("xs", &json!([1, 2, 3])).unwrap();
        assert_eq!(
            array.static_type(),
            Some(Type::Array(Box::new(Type::Int)))
        );
        assert!(from_json("xs", &json!([1, "two"])).is_err());
        assert!(from_json("o", &json!({"a": 1})).is_err());
    }
}
