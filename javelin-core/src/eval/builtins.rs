//! Runtime behaviour of the [`Builtin`] methods.

use std::{cmp::Ordering, sync::Arc};

use dashmap::DashMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    ast::Type,
    builtins::Builtin,
    eval::{
        context::OutputBuffer,
        value::{StringValue, Value, char_from_code},
    },
};

/// Compiled patterns are cached up to this many entries.
const REGEX_CACHE_CAPACITY: usize = 128;

lazy_static! {
    static ref REGEX_CACHE: DashMap<String, Arc<Regex>> = DashMap::new();
}

/// An exception raised by a built-in. The interpreter attaches the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Thrown {
    pub class: &'static str,
    pub message: Option<String>,
}

impl Thrown {
    pub fn new(class: &'static str, message: impl Into<String>) -> Self {
        Self {
            class,
            message: Some(message.into()),
        }
    }

    pub fn null_receiver(class: &str, method: &str) -> Self {
        Self::new(
            "NullPointerException",
            format!(
                "Cannot invoke \"{}.{}()\" because value is null",
                class, method
            ),
        )
    }

    fn null_argument() -> Self {
        Self {
            class: "NullPointerException",
            message: None,
        }
    }

    fn number_format(input: &str) -> Self {
        Self::new(
            "NumberFormatException",
            format!("For input string: \"{}\"", input),
        )
    }

    fn string_index(index: i64, length: usize) -> Self {
        Self::new(
            "StringIndexOutOfBoundsException",
            format!("Index {} out of bounds for length {}", index, length),
        )
    }

    pub fn division_by_zero() -> Self {
        Self::new("ArithmeticException", "/ by zero")
    }

    pub fn out_of_memory() -> Self {
        Self::new("OutOfMemoryError", "Java heap space")
    }
}

/// Fails like an exhausted heap when a string of `len` bytes would exceed
/// `max_len`.
pub fn check_string_len(len: Option<usize>, max_len: usize) -> Result<(), Thrown> {
    match len {
        Some(len) if len <= max_len => Ok(()),
        _ => Err(Thrown::out_of_memory()),
    }
}

pub type BuiltinResult = Result<Value, Thrown>;

/// The Java name of an instance method, for null receiver messages.
pub fn method_name(builtin: Builtin) -> &'static str {
    use Builtin::*;
    match builtin {
        Length => "length",
        CharAt => "charAt",
        Substring => "substring",
        IndexOf => "indexOf",
        LastIndexOf => "lastIndexOf",
        Contains => "contains",
        Equals => "equals",
        EqualsIgnoreCase => "equalsIgnoreCase",
        IsEmpty => "isEmpty",
        IsBlank => "isBlank",
        ToUpperCase => "toUpperCase",
        ToLowerCase => "toLowerCase",
        Trim => "trim",
        StartsWith => "startsWith",
        EndsWith => "endsWith",
        Replace => "replace",
        Concat => "concat",
        CompareTo => "compareTo",
        Split => "split",
        ToCharArray => "toCharArray",
        Matches => "matches",
        Repeat => "repeat",
        GetMessage => "getMessage",
        _ => "call",
    }
}

/// Text printed for a value by `print`, `String.valueOf` and friends.
/// A `char[]` prints its characters.
pub fn print_text(value: &Value) -> String {
    match value {
        Value::Array(array) if *array.element_type() == Type::Char => array
            .to_vec()
            .iter()
            .filter_map(Value::as_char)
            .collect(),
        other => other.to_string(),
    }
}

/// Runs `builtin`. `receiver` is set for instance methods and is never
/// `null` here. Strings longer than `max_string_len` bytes are not built.
pub fn call(
    builtin: Builtin,
    receiver: Option<Value>,
    args: Vec<Value>,
    output: &mut OutputBuffer,
    max_string_len: usize,
) -> BuiltinResult {
    use Builtin::*;
    match builtin {
        Print | ErrPrint => {
            if let Some(value) = args.first() {
                output.write(&print_text(value));
            }
            Ok(Value::Void)
        }
        Println | ErrPrintln => {
            if let Some(value) = args.first() {
                output.write(&print_text(value));
            }
            output.write("\n");
            Ok(Value::Void)
        }
        Abs | Max | Min | Pow | Sqrt | Cbrt | Floor | Ceil | Round | FloorDiv | FloorMod
        | Hypot | Signum => math(builtin, &args),
        ParseInt | ParseLong | ParseDouble | ParseBoolean | ValueOf | NumberToString
        | ToBinaryString | ToHexString | StringValueOf => conversion(builtin, &args),
        IsDigit | IsLetter | IsLetterOrDigit | IsUpperCase | IsLowerCase | IsWhitespace
        | CharToUpperCase | CharToLowerCase | GetNumericValue => {
            let c = args.first().and_then(Value::as_char).unwrap_or('\0');
            Ok(character(builtin, c))
        }
        ArraysToString | ArraysSort | ArraysFill => arrays(builtin, args, max_string_len),
        GetMessage => match receiver {
            Some(Value::Exception(exception)) => Ok(exception
                .message
                .as_deref()
                .map_or(Value::Null, Value::string)),
            _ => Ok(Value::Null),
        },
        _ => match receiver {
            Some(Value::Str(s)) => string_method(builtin, &s, &args, max_string_len),
            _ => Err(Thrown::null_receiver("String", method_name(builtin))),
        },
    }
}

fn first_double(args: &[Value]) -> f64 {
    args.first().and_then(Value::as_double).unwrap_or(0.0)
}

fn second_double(args: &[Value]) -> f64 {
    args.get(1).and_then(Value::as_double).unwrap_or(0.0)
}

fn floor_div_i64(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a ^ b) < 0) {
        q - 1
    } else {
        q
    }
}

fn floor_mod_i64(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && ((r ^ b) < 0) { r + b } else { r }
}

fn java_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

fn java_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn math(builtin: Builtin, args: &[Value]) -> BuiltinResult {
    use Builtin::*;
    let value = match (builtin, args) {
        (Abs, [Value::Int(i)]) => Value::Int(i.wrapping_abs()),
        (Abs, [Value::Long(l)]) => Value::Long(l.wrapping_abs()),
        (Abs, _) => Value::Double(first_double(args).abs()),
        (Max, [Value::Int(a), Value::Int(b)]) => Value::Int(*a.max(b)),
        (Max, [Value::Long(a), Value::Long(b)]) => Value::Long(*a.max(b)),
        (Max, _) => Value::Double(java_max(first_double(args), second_double(args))),
        (Min, [Value::Int(a), Value::Int(b)]) => Value::Int(*a.min(b)),
        (Min, [Value::Long(a), Value::Long(b)]) => Value::Long(*a.min(b)),
        (Min, _) => Value::Double(java_min(first_double(args), second_double(args))),
        (FloorDiv | FloorMod, [Value::Int(a), Value::Int(b)]) => {
            if *b == 0 {
                return Err(Thrown::division_by_zero());
            }
            let (a, b) = (*a as i64, *b as i64);
            let result = if builtin == FloorDiv {
                floor_div_i64(a, b)
            } else {
                floor_mod_i64(a, b)
            };
            Value::Int(result as i32)
        }
        (FloorDiv | FloorMod, [Value::Long(a), Value::Long(b)]) => {
            if *b == 0 {
                return Err(Thrown::division_by_zero());
            }
            Value::Long(if builtin == FloorDiv {
                floor_div_i64(*a, *b)
            } else {
                floor_mod_i64(*a, *b)
            })
        }
        (Pow, _) => Value::Double(first_double(args).powf(second_double(args))),
        (Hypot, _) => Value::Double(first_double(args).hypot(second_double(args))),
        (Sqrt, _) => Value::Double(first_double(args).sqrt()),
        (Cbrt, _) => Value::Double(first_double(args).cbrt()),
        (Floor, _) => Value::Double(first_double(args).floor()),
        (Ceil, _) => Value::Double(first_double(args).ceil()),
        (Signum, _) => {
            let d = first_double(args);
            Value::Double(if d == 0.0 || d.is_nan() { d } else { d.signum() })
        }
        (Round, _) => {
            let d = first_double(args);
            // Half rounds up; NaN is 0 and out-of-range values saturate.
            Value::Long((d + 0.5).floor() as i64)
        }
        _ => Value::Void,
    };
    Ok(value)
}

fn parse_double(input: &str) -> Result<f64, Thrown> {
    let trimmed = input.trim_matches(|c: char| c <= ' ');
    if trimmed.is_empty() {
        return Err(Thrown::new("NumberFormatException", "empty String"));
    }
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    match unsigned {
        "NaN" => return Ok(f64::NAN),
        "Infinity" => return Ok(sign * f64::INFINITY),
        _ => {}
    }
    let digits = unsigned
        .strip_suffix(['d', 'D', 'f', 'F'])
        .unwrap_or(unsigned);
    let well_formed = !digits.is_empty()
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !well_formed {
        return Err(Thrown::number_format(input));
    }
    digits
        .parse::<f64>()
        .map(|d| sign * d)
        .map_err(|_| Thrown::number_format(input))
}

fn conversion(builtin: Builtin, args: &[Value]) -> BuiltinResult {
    use Builtin::*;
    let arg = args.first().cloned().unwrap_or(Value::Null);
    match builtin {
        ParseInt | ParseLong | ParseDouble => {
            let Some(text) = arg.as_str() else {
                return match builtin {
                    ParseDouble => Err(Thrown::null_argument()),
                    _ => Err(Thrown::new(
                        "NumberFormatException",
                        "Cannot parse null string: null",
                    )),
                };
            };
            match builtin {
                ParseInt => text
                    .parse::<i32>()
                    .map(Value::Int)
                    .map_err(|_| Thrown::number_format(text)),
                ParseLong => text
                    .parse::<i64>()
                    .map(Value::Long)
                    .map_err(|_| Thrown::number_format(text)),
                _ => parse_double(text).map(Value::Double),
            }
        }
        ParseBoolean => Ok(Value::Boolean(
            arg.as_str().is_some_and(|s| s.eq_ignore_ascii_case("true")),
        )),
        ValueOf => Ok(arg),
        NumberToString | StringValueOf => Ok(Value::string(&print_text(&arg))),
        ToBinaryString => Ok(Value::string(&format!(
            "{:b}",
            arg.as_int().unwrap_or(0) as u32
        ))),
        ToHexString => Ok(Value::string(&format!(
            "{:x}",
            arg.as_int().unwrap_or(0) as u32
        ))),
        _ => Ok(Value::Void),
    }
}

fn is_java_whitespace(c: char) -> bool {
    matches!(c, '\u{1c}'..='\u{1f}')
        || (c.is_whitespace() && !matches!(c, '\u{a0}' | '\u{2007}' | '\u{202f}'))
}

fn single_case(mut mapped: impl Iterator<Item = char>, original: char) -> char {
    match (mapped.next(), mapped.next()) {
        (Some(c), None) => c,
        _ => original,
    }
}

fn character(builtin: Builtin, c: char) -> Value {
    use Builtin::*;
    match builtin {
        IsDigit => Value::Boolean(c.is_ascii_digit() || (!c.is_ascii() && c.is_numeric())),
        IsLetter => Value::Boolean(c.is_alphabetic()),
        IsLetterOrDigit => Value::Boolean(c.is_alphanumeric()),
        IsUpperCase => Value::Boolean(c.is_uppercase()),
        IsLowerCase => Value::Boolean(c.is_lowercase()),
        IsWhitespace => Value::Boolean(is_java_whitespace(c)),
        CharToUpperCase => Value::Char(single_case(c.to_uppercase(), c)),
        CharToLowerCase => Value::Char(single_case(c.to_lowercase(), c)),
        GetNumericValue => Value::Int(c.to_digit(36).map_or(-1, |d| d as i32)),
        _ => Value::Void,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Long(a), Value::Long(b)) => a.cmp(b),
        (Value::Char(a), Value::Char(b)) => a.cmp(b),
        (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
        (Value::Str(a), Value::Str(b)) => a.as_str().cmp(b.as_str()),
        _ => Ordering::Equal,
    }
}

fn arrays(builtin: Builtin, args: Vec<Value>, max_string_len: usize) -> BuiltinResult {
    use Builtin::*;
    let mut args = args.into_iter();
    let target = args.next().unwrap_or(Value::Null);
    let array = match (builtin, target) {
        (ArraysToString, Value::Null) => return Ok(Value::string("null")),
        (_, Value::Array(array)) => array,
        _ => return Err(Thrown::null_argument()),
    };
    match builtin {
        ArraysToString => {
            let mut text = String::from("[");
            for (i, item) in array.to_vec().iter().enumerate() {
                let item = item.to_string();
                check_string_len(text.len().checked_add(item.len() + 3), max_string_len)?;
                if i > 0 {
                    text.push_str(", ");
                }
                text.push_str(&item);
            }
            text.push(']');
            Ok(Value::from(text))
        }
        ArraysSort => {
            let mut items = array.items();
            if items.iter().any(Value::is_null) {
                return Err(Thrown::null_argument());
            }
            items.sort_by(compare_values);
            Ok(Value::Void)
        }
        ArraysFill => {
            let value = args.next().unwrap_or(Value::Null);
            array.items().iter_mut().for_each(|slot| *slot = value.clone());
            Ok(Value::Void)
        }
        _ => Ok(Value::Void),
    }
}

fn cached_regex(pattern: &str) -> Result<Arc<Regex>, Thrown> {
    if let Some(regex) = REGEX_CACHE.get(pattern) {
        return Ok(regex.clone());
    }
    let regex = Regex::new(pattern)
        .map(Arc::new)
        .map_err(|e| Thrown::new("PatternSyntaxException", e.to_string()))?;
    if REGEX_CACHE.len() >= REGEX_CACHE_CAPACITY {
        REGEX_CACHE.clear();
    }
    REGEX_CACHE.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

/// `String.split`: trailing empty strings are dropped, and a zero-width
/// match at the start does not produce a leading empty string.
fn split(s: &str, pattern: &str) -> Result<Vec<String>, Thrown> {
    let regex = cached_regex(pattern)?;
    let mut parts = Vec::new();
    let mut last = 0;
    let mut matched = false;
    for m in regex.find_iter(s) {
        if m.end() == 0 {
            continue;
        }
        matched = true;
        parts.push(s[last..m.start()].to_string());
        last = m.end();
    }
    if !matched {
        return Ok(vec![s.to_string()]);
    }
    parts.push(s[last..].to_string());
    while parts.last().is_some_and(String::is_empty) {
        parts.pop();
    }
    Ok(parts)
}

fn string_arg(args: &[Value], index: usize) -> Result<&str, Thrown> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(Thrown::null_argument)
}

fn int_arg(args: &[Value], index: usize) -> i64 {
    args.get(index).and_then(Value::as_int).unwrap_or(0) as i64
}

/// The text an `indexOf` style argument searches for: a string or a char code.
fn needle(args: &[Value]) -> Result<String, Thrown> {
    match args.first() {
        Some(Value::Str(s)) => Ok(s.as_str().to_string()),
        Some(Value::Int(code)) => Ok(char_from_code(*code as u16).to_string()),
        Some(Value::Char(c)) => Ok(c.to_string()),
        _ => Err(Thrown::null_argument()),
    }
}

/// Byte length of `s.replace(from, to)`.
fn replaced_len(s: &str, from: &str, to: &str) -> Option<usize> {
    let matches = if from.is_empty() {
        s.chars().count() + 1
    } else {
        s.matches(from).count()
    };
    (s.len() - matches * from.len()).checked_add(matches.checked_mul(to.len())?)
}

fn string_method(
    builtin: Builtin,
    s: &StringValue,
    args: &[Value],
    max_len: usize,
) -> BuiltinResult {
    use Builtin::*;
    let value = match builtin {
        Length => Value::Int(s.len() as i32),
        CharAt => {
            let index = int_arg(args, 0);
            match usize::try_from(index).ok().and_then(|i| s.char_at(i)) {
                Some(c) => Value::Char(c),
                None => return Err(Thrown::string_index(index, s.len())),
            }
        }
        Substring => {
            let length = s.len() as i64;
            let begin = int_arg(args, 0);
            let end = if args.len() > 1 { int_arg(args, 1) } else { length };
            if begin < 0 || end > length || begin > end {
                return Err(Thrown::new(
                    "StringIndexOutOfBoundsException",
                    format!("begin {}, end {}, length {}", begin, end, length),
                ));
            }
            Value::from(s.slice(begin as usize, end as usize))
        }
        IndexOf => {
            let from = if args.len() > 1 { int_arg(args, 1) } else { 0 };
            Value::Int(s.index_of(&needle(args)?, from) as i32)
        }
        LastIndexOf => {
            let from = if args.len() > 1 {
                int_arg(args, 1)
            } else {
                s.len() as i64
            };
            Value::Int(s.last_index_of(&needle(args)?, from) as i32)
        }
        Contains => Value::Boolean(s.contains(string_arg(args, 0)?)),
        Equals => Value::Boolean(args.first().and_then(Value::as_str) == Some(s.as_str())),
        EqualsIgnoreCase => Value::Boolean(args.first().and_then(Value::as_str).is_some_and(
            |other| {
                s.chars().count() == other.chars().count()
                    && s.chars().zip(other.chars()).all(|(a, b)| {
                        a == b
                            || a.to_uppercase().eq(b.to_uppercase())
                            || a.to_lowercase().eq(b.to_lowercase())
                    })
            },
        )),
        IsEmpty => Value::Boolean(s.is_empty()),
        IsBlank => Value::Boolean(s.chars().all(is_java_whitespace)),
        ToUpperCase => Value::string(&s.to_uppercase()),
        ToLowerCase => Value::string(&s.to_lowercase()),
        Trim => Value::string(s.trim_matches(|c: char| c <= ' ')),
        StartsWith => Value::Boolean(s.starts_with(string_arg(args, 0)?)),
        EndsWith => Value::Boolean(s.ends_with(string_arg(args, 0)?)),
        Replace => match args {
            [Value::Char(from), Value::Char(to)] => {
                Value::string(&s.chars().map(|c| if c == *from { *to } else { c }).collect::<String>())
            }
            _ => {
                let (from, to) = (string_arg(args, 0)?, string_arg(args, 1)?);
                check_string_len(replaced_len(s, from, to), max_len)?;
                Value::from(s.replace(from, to))
            }
        },
        Concat => {
            let other = string_arg(args, 0)?;
            check_string_len(s.as_str().len().checked_add(other.len()), max_len)?;
            Value::from(format!("{}{}", s.as_str(), other))
        }
        CompareTo => {
            let other = string_arg(args, 0)?;
            let difference = s
                .chars()
                .zip(other.chars())
                .find(|(a, b)| a != b)
                .map(|(a, b)| a as i64 - b as i64)
                .unwrap_or(s.len() as i64 - other.chars().count() as i64);
            Value::Int(difference as i32)
        }
        Split => {
            let parts = split(s, string_arg(args, 0)?)?;
            Value::array(
                Type::String,
                parts.iter().map(|part| Value::string(part)).collect(),
            )
        }
        ToCharArray => Value::array(Type::Char, s.chars().map(Value::Char).collect()),
        Matches => {
            let pattern = format!("^(?:{})$", string_arg(args, 0)?);
            Value::Boolean(cached_regex(&pattern)?.is_match(s))
        }
        Repeat => {
            let count = int_arg(args, 0);
            if count < 0 {
                return Err(Thrown::new(
                    "IllegalArgumentException",
                    format!("count is negative: {}", count),
                ));
            }
            check_string_len(s.as_str().len().checked_mul(count as usize), max_len)?;
            Value::from(s.repeat(count as usize))
        }
        _ => Value::Void,
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MAX_STRING_LEN: usize = 64;

    fn run(builtin: Builtin, receiver: Option<Value>, args: Vec<Value>) -> BuiltinResult {
        let mut output = OutputBuffer::new(1000);
        call(builtin, receiver, args, &mut output, MAX_STRING_LEN)
    }

    fn on(s: &str, builtin: Builtin, args: Vec<Value>) -> BuiltinResult {
        run(builtin, Some(Value::string(s)), args)
    }

    fn strings(value: Value) -> Vec<String> {
        match value {
            Value::Array(array) => array.to_vec().iter().map(Value::to_string).collect(),
            other => panic!("expected an array, got {:?}", other),
        }
    }

    #[test]
    fn test_println_writes_char_arrays_as_text() {
        let mut output = OutputBuffer::new(100);
        let chars = Value::array(Type::Char, vec![Value::Char('h'), Value::Char('i')]);
        call(Builtin::Println, None, vec![chars], &mut output, MAX_STRING_LEN).unwrap();
        call(Builtin::Print, None, vec![Value::Double(4.0)], &mut output, MAX_STRING_LEN).unwrap();
        assert_eq!(output.as_str(), "hi\n4.0");
    }

    #[test]
    fn test_math() {
        assert_eq!(
            run(Builtin::Sqrt, None, vec![Value::Double(16.0)]),
            Ok(Value::Double(4.0))
        );
        assert_eq!(
            run(Builtin::Round, None, vec![Value::Double(-2.5)]),
            Ok(Value::Long(-2))
        );
        assert_eq!(
            run(Builtin::FloorMod, None, vec![Value::Int(-7), Value::Int(3)]),
            Ok(Value::Int(2))
        );
        assert_eq!(
            run(Builtin::FloorDiv, None, vec![Value::Int(-7), Value::Int(2)]),
            Ok(Value::Int(-4))
        );
        assert_eq!(
            run(Builtin::FloorMod, None, vec![Value::Int(1), Value::Int(0)]),
            Err(Thrown::division_by_zero())
        );
        assert_eq!(
            run(Builtin::Abs, None, vec![Value::Int(i32::MIN)]),
            Ok(Value::Int(i32::MIN))
        );
    }

    #[test]
    fn test_parse_errors() {
        let error = run(Builtin::ParseInt, None, vec![Value::string("abc")]).unwrap_err();
        assert_eq!(error.class, "NumberFormatException");
        assert_eq!(error.message.as_deref(), Some("For input string: \"abc\""));

        assert_eq!(
            run(Builtin::ParseDouble, None, vec![Value::string(" 2.5d ")]),
            Ok(Value::Double(2.5))
        );
        assert!(run(Builtin::ParseDouble, None, vec![Value::string("inf")]).is_err());
        assert_eq!(
            run(Builtin::ParseInt, None, vec![Value::string("-42")]),
            Ok(Value::Int(-42))
        );
    }

    #[test]
    fn test_substring_bounds() {
        assert_eq!(
            on("hello", Builtin::Substring, vec![Value::Int(1), Value::Int(3)]),
            Ok(Value::string("el"))
        );
        let error = on("abc", Builtin::Substring, vec![Value::Int(2), Value::Int(5)]).unwrap_err();
        assert_eq!(error.message.as_deref(), Some("begin 2, end 5, length 3"));

        let error = on("abc", Builtin::CharAt, vec![Value::Int(3)]).unwrap_err();
        assert_eq!(error.class, "StringIndexOutOfBoundsException");
    }

    #[test]
    fn test_index_of() {
        assert_eq!(
            on("banana", Builtin::IndexOf, vec![Value::string("an")]),
            Ok(Value::Int(1))
        );
        assert_eq!(
            on("banana", Builtin::IndexOf, vec![Value::string("an"), Value::Int(2)]),
            Ok(Value::Int(3))
        );
        assert_eq!(
            on("banana", Builtin::LastIndexOf, vec![Value::Int('a' as i32)]),
            Ok(Value::Int(5))
        );
        assert_eq!(
            on("banana", Builtin::IndexOf, vec![Value::string("x")]),
            Ok(Value::Int(-1))
        );
    }

    #[test]
    fn test_split_drops_trailing_empty_strings() {
        assert_eq!(
            strings(on("a,b,,c,,", Builtin::Split, vec![Value::string(",")]).unwrap()),
            vec!["a", "b", "", "c"]
        );
        assert_eq!(
            strings(on("abc", Builtin::Split, vec![Value::string("")]).unwrap()),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            strings(on("", Builtin::Split, vec![Value::string(",")]).unwrap()),
            vec![""]
        );
        assert_eq!(
            strings(on("one  two", Builtin::Split, vec![Value::string("\\s+")]).unwrap()),
            vec!["one", "two"]
        );
    }

    #[test]
    fn test_compare_to_and_matches() {
        assert_eq!(
            on("apple", Builtin::CompareTo, vec![Value::string("banana")]),
            Ok(Value::Int(-1))
        );
        assert_eq!(
            on("ab", Builtin::CompareTo, vec![Value::string("abcd")]),
            Ok(Value::Int(-2))
        );
        assert_eq!(
            on("abc123", Builtin::Matches, vec![Value::string("[a-z]+\\d+")]),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            on("abc123x", Builtin::Matches, vec![Value::string("[a-z]+\\d+")]),
            Ok(Value::Boolean(false))
        );
    }

    #[test]
    fn test_arrays() {
        let array = Value::array(Type::Int, vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
        run(Builtin::ArraysSort, None, vec![array.clone()]).unwrap();
        assert_eq!(
            run(Builtin::ArraysToString, None, vec![array.clone()]),
            Ok(Value::string("[1, 2, 3]"))
        );
        run(Builtin::ArraysFill, None, vec![array.clone(), Value::Int(7)]).unwrap();
        assert_eq!(
            run(Builtin::ArraysToString, None, vec![array]),
            Ok(Value::string("[7, 7, 7]"))
        );
        assert_eq!(
            run(Builtin::ArraysToString, None, vec![Value::Null]),
            Ok(Value::string("null"))
        );
    }

    #[test]
    fn test_character_and_conversions() {
        assert_eq!(
            run(Builtin::GetNumericValue, None, vec![Value::Char('7')]),
            Ok(Value::Int(7))
        );
        assert_eq!(
            run(Builtin::CharToUpperCase, None, vec![Value::Char('q')]),
            Ok(Value::Char('Q'))
        );
        assert_eq!(
            run(Builtin::ToBinaryString, None, vec![Value::Int(10)]),
            Ok(Value::string("1010"))
        );
        assert_eq!(
            run(Builtin::ToHexString, None, vec![Value::Int(-1)]),
            Ok(Value::string("ffffffff"))
        );
    }

    #[test]
    fn test_repeat_negative() {
        let error = on("ab", Builtin::Repeat, vec![Value::Int(-1)]).unwrap_err();
        assert_eq!(error.class, "IllegalArgumentException");
        assert_eq!(on("ab", Builtin::Repeat, vec![Value::Int(2)]), Ok(Value::string("abab")));
    }

    #[test]
    fn test_string_size_is_capped() {
        let out_of_memory = Err(Thrown::out_of_memory());
        assert_eq!(
            on("abcdefghijklmnop", Builtin::Repeat, vec![Value::Int(i32::MAX)]),
            out_of_memory
        );
        assert_eq!(on("abcd", Builtin::Repeat, vec![Value::Int(17)]), out_of_memory);
        assert_eq!(
            on("abcd", Builtin::Repeat, vec![Value::Int(16)]).map(|v| v.to_string().len()),
            Ok(64)
        );
        assert_eq!(
            on(
                "aaaaaaaa",
                Builtin::Replace,
                vec![Value::string("a"), Value::string("0123456789")]
            ),
            out_of_memory
        );
        assert_eq!(
            on("abc", Builtin::Replace, vec![Value::string(""), Value::string("-")]),
            Ok(Value::string("-a-b-c-"))
        );
        assert_eq!(
            on(&"x".repeat(40), Builtin::Concat, vec![Value::string(&"y".repeat(30))]),
            out_of_memory
        );
        let wide = Value::array(Type::String, vec![Value::string(&"z".repeat(40)); 2]);
        assert_eq!(run(Builtin::ArraysToString, None, vec![wide]), out_of_memory);
    }

    #[test]
    fn test_non_ascii_strings() {
        assert_eq!(on("héllo", Builtin::Length, vec![]), Ok(Value::Int(5)));
        assert_eq!(
            on("héllo", Builtin::CharAt, vec![Value::Int(1)]),
            Ok(Value::Char('é'))
        );
        assert_eq!(
            on("héllo", Builtin::Substring, vec![Value::Int(1), Value::Int(3)]),
            Ok(Value::string("él"))
        );
        assert_eq!(
            on("héllo", Builtin::IndexOf, vec![Value::Char('l')]),
            Ok(Value::Int(2))
        );
    }
}
