//! The library classes a program can use without declaring them.
//!
//! This module only knows names and signatures; the type checker asks it
//! which [`Builtin`] a call refers to and the interpreter runs it
//! (see [`crate::eval::builtins`]).

use crate::{ast::Type, eval::value::Value, type_checker::conversion::is_method_convertible};

/// Class names that resolve without an import and cannot be used as binding names.
pub const BUILTIN_CLASSES: &[&str] = &[
    "System",
    "Math",
    "Integer",
    "Long",
    "Double",
    "String",
    "Character",
    "Boolean",
    "Arrays",
];

/// Exception classes that may be created with `new` and thrown.
pub const EXCEPTION_CLASSES: &[&str] = &[
    "Exception",
    "RuntimeException",
    "Error",
    "Throwable",
    "ArithmeticException",
    "ArrayIndexOutOfBoundsException",
    "IndexOutOfBoundsException",
    "StringIndexOutOfBoundsException",
    "IllegalArgumentException",
    "IllegalStateException",
    "NullPointerException",
    "NumberFormatException",
    "NegativeArraySizeException",
    "UnsupportedOperationException",
    "AssertionError",
    "StackOverflowError",
];

pub fn is_builtin_class(name: &str) -> bool {
    BUILTIN_CLASSES.contains(&name)
}

pub fn is_exception_class(name: &str) -> bool {
    EXCEPTION_CLASSES.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Builtin {
    Print,
    Println,
    ErrPrint,
    ErrPrintln,
    // Math
    Abs,
    Max,
    Min,
    Pow,
    Sqrt,
    Cbrt,
    Floor,
    Ceil,
    Round,
    FloorDiv,
    FloorMod,
    Hypot,
    Signum,
    // Wrapper classes
    ParseInt,
    ParseLong,
    ParseDouble,
    ParseBoolean,
    ValueOf,
    NumberToString,
    ToBinaryString,
    ToHexString,
    StringValueOf,
    // Character
    IsDigit,
    IsLetter,
    IsLetterOrDigit,
    IsUpperCase,
    IsLowerCase,
    IsWhitespace,
    CharToUpperCase,
    CharToLowerCase,
    GetNumericValue,
    // Arrays
    ArraysToString,
    ArraysSort,
    ArraysFill,
    // String instance methods
    Length,
    CharAt,
    Substring,
    IndexOf,
    LastIndexOf,
    Contains,
    Equals,
    EqualsIgnoreCase,
    IsEmpty,
    IsBlank,
    ToUpperCase,
    ToLowerCase,
    Trim,
    StartsWith,
    EndsWith,
    Replace,
    Concat,
    CompareTo,
    Split,
    ToCharArray,
    Matches,
    Repeat,
    // Exception instance methods
    GetMessage,
}

/// A resolved call: arguments are converted to `params` before the call.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub builtin: Builtin,
    pub params: Vec<Type>,
    pub returns: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Signature),
    /// No method with that name.
    NoSuchMethod,
    /// The name exists but no overload accepts the arguments.
    WrongArguments,
}

fn sig(builtin: Builtin, params: &[Type], returns: Type) -> Signature {
    Signature {
        builtin,
        params: params.to_vec(),
        returns,
    }
}

fn array_of(ty: Type) -> Type {
    Type::Array(Box::new(ty))
}

/// Picks the first candidate the arguments convert to. Candidates are
/// listed from most to least specific.
fn select(candidates: Vec<Signature>, args: &[Type]) -> Lookup {
    if candidates.is_empty() {
        return Lookup::NoSuchMethod;
    }
    candidates
        .into_iter()
        .find(|candidate| {
            candidate.params.len() == args.len()
                && args
                    .iter()
                    .zip(&candidate.params)
                    .all(|(arg, param)| is_method_convertible(arg, param))
        })
        .map(Lookup::Found)
        .unwrap_or(Lookup::WrongArguments)
}

/// A method taking one argument of any non-void type, unchanged.
fn any_single(builtin: Builtin, args: &[Type], returns: Type) -> Vec<Signature> {
    match args {
        [arg] if *arg != Type::Void => vec![sig(builtin, args, returns)],
        // Keep the name known so that the arguments are what gets reported.
        _ => vec![sig(builtin, &[Type::Null], returns)],
    }
}

/// `System.out.print*` and `System.err.print*`.
pub fn resolve_print(stream: &str, method: &str, args: &[Type]) -> Lookup {
    let (print, println) = match stream {
        "out" => (Builtin::Print, Builtin::Println),
        "err" => (Builtin::ErrPrint, Builtin::ErrPrintln),
        _ => return Lookup::NoSuchMethod,
    };
    if args.contains(&Type::Void) {
        return Lookup::WrongArguments;
    }
    match (method, args.len()) {
        ("println", 0 | 1) => Lookup::Found(sig(println, args, Type::Void)),
        ("print", 1) => Lookup::Found(sig(print, args, Type::Void)),
        ("println" | "print", _) => Lookup::WrongArguments,
        _ => Lookup::NoSuchMethod,
    }
}

/// `Class.method(args)` on one of the [`BUILTIN_CLASSES`].
pub fn resolve_static(class: &str, method: &str, args: &[Type]) -> Lookup {
    use Builtin::*;
    let (int, long, double, boolean, character, string) = (
        Type::Int,
        Type::Long,
        Type::Double,
        Type::Boolean,
        Type::Char,
        Type::String,
    );

    let candidates = match (class, method) {
        ("Math", "abs") => vec![
            sig(Abs, &[int.clone()], int.clone()),
            sig(Abs, &[long.clone()], long.clone()),
            sig(Abs, &[double.clone()], double.clone()),
        ],
        ("Math", "max" | "min") => {
            let builtin = if method == "max" { Max } else { Min };
            vec![
                sig(builtin, &[int.clone(), int.clone()], int.clone()),
                sig(builtin, &[long.clone(), long.clone()], long.clone()),
                sig(builtin, &[double.clone(), double.clone()], double.clone()),
            ]
        }
        ("Math", "pow") => vec![sig(Pow, &[double.clone(), double.clone()], double.clone())],
        ("Math", "hypot") => vec![sig(Hypot, &[double.clone(), double.clone()], double.clone())],
        ("Math", "sqrt") => vec![sig(Sqrt, &[double.clone()], double.clone())],
        ("Math", "cbrt") => vec![sig(Cbrt, &[double.clone()], double.clone())],
        ("Math", "floor") => vec![sig(Floor, &[double.clone()], double.clone())],
        ("Math", "ceil") => vec![sig(Ceil, &[double.clone()], double.clone())],
        ("Math", "signum") => vec![sig(Signum, &[double.clone()], double.clone())],
        ("Math", "round") => vec![sig(Round, &[double.clone()], long.clone())],
        ("Math", "floorDiv" | "floorMod") => {
            let builtin = if method == "floorDiv" { FloorDiv } else { FloorMod };
            vec![
                sig(builtin, &[int.clone(), int.clone()], int.clone()),
                sig(builtin, &[long.clone(), long.clone()], long.clone()),
            ]
        }

        ("Integer", "parseInt") => vec![sig(ParseInt, &[string.clone()], int.clone())],
        ("Integer", "valueOf") => vec![
            sig(ValueOf, &[int.clone()], int.clone()),
            sig(ParseInt, &[string.clone()], int.clone()),
        ],
        ("Integer", "toString") => vec![sig(NumberToString, &[int.clone()], string.clone())],
        ("Integer", "toBinaryString") => {
            vec![sig(ToBinaryString, &[int.clone()], string.clone())]
        }
        ("Integer", "toHexString") => vec![sig(ToHexString, &[int.clone()], string.clone())],
        ("Long", "parseLong") => vec![sig(ParseLong, &[string.clone()], long.clone())],
        ("Long", "valueOf") => vec![
            sig(ValueOf, &[long.clone()], long.clone()),
            sig(ParseLong, &[string.clone()], long.clone()),
        ],
        ("Long", "toString") => vec![sig(NumberToString, &[long.clone()], string.clone())],
        ("Double", "parseDouble") => vec![sig(ParseDouble, &[string.clone()], double.clone())],
        ("Double", "valueOf") => vec![
            sig(ValueOf, &[double.clone()], double.clone()),
            sig(ParseDouble, &[string.clone()], double.clone()),
        ],
        ("Double", "toString") => {
            vec![sig(NumberToString, &[double.clone()], string.clone())]
        }
        ("Boolean", "parseBoolean") => {
            vec![sig(ParseBoolean, &[string.clone()], boolean.clone())]
        }
        ("String", "valueOf") => any_single(StringValueOf, args, string.clone()),

        ("Character", "isDigit") => vec![sig(IsDigit, &[character.clone()], boolean.clone())],
        ("Character", "isLetter") => vec![sig(IsLetter, &[character.clone()], boolean.clone())],
        ("Character", "isLetterOrDigit") => {
            vec![sig(IsLetterOrDigit, &[character.clone()], boolean.clone())]
        }
        ("Character", "isUpperCase") => {
            vec![sig(IsUpperCase, &[character.clone()], boolean.clone())]
        }
        ("Character", "isLowerCase") => {
            vec![sig(IsLowerCase, &[character.clone()], boolean.clone())]
        }
        ("Character", "isWhitespace") => {
            vec![sig(IsWhitespace, &[character.clone()], boolean.clone())]
        }
        ("Character", "toUpperCase") => {
            vec![sig(CharToUpperCase, &[character.clone()], character.clone())]
        }
        ("Character", "toLowerCase") => {
            vec![sig(CharToLowerCase, &[character.clone()], character.clone())]
        }
        ("Character", "getNumericValue") => {
            vec![sig(GetNumericValue, &[character.clone()], int.clone())]
        }

        ("Arrays", "toString") => match args {
            [Type::Array(_) | Type::Null] => any_single(ArraysToString, args, string.clone()),
            _ => vec![sig(ArraysToString, &[array_of(int.clone())], string.clone())],
        },
        ("Arrays", "sort") => match args {
            [Type::Array(element)] if element.is_numeric() || **element == Type::String => {
                vec![sig(ArraysSort, args, Type::Void)]
            }
            _ => vec![sig(ArraysSort, &[array_of(int.clone())], Type::Void)],
        },
        ("Arrays", "fill") => match args {
            [Type::Array(element), _] => vec![sig(
                ArraysFill,
                &[array_of((**element).clone()), (**element).clone()],
                Type::Void,
            )],
            _ => vec![sig(
                ArraysFill,
                &[array_of(int.clone()), int.clone()],
                Type::Void,
            )],
        },
        _ => vec![],
    };
    select(candidates, args)
}

/// `receiver.method(args)` on a value of type `receiver`.
pub fn resolve_instance(receiver: &Type, method: &str, args: &[Type]) -> Lookup {
    use Builtin::*;
    let (int, boolean, character, string) = (Type::Int, Type::Boolean, Type::Char, Type::String);

    let candidates = match receiver {
        Type::String => match method {
            "length" => vec![sig(Length, &[], int.clone())],
            "charAt" => vec![sig(CharAt, &[int.clone()], character.clone())],
            "substring" => vec![
                sig(Substring, &[int.clone()], string.clone()),
                sig(Substring, &[int.clone(), int.clone()], string.clone()),
            ],
            "indexOf" | "lastIndexOf" => {
                let builtin = if method == "indexOf" { IndexOf } else { LastIndexOf };
                vec![
                    sig(builtin, &[string.clone()], int.clone()),
                    sig(builtin, &[int.clone()], int.clone()),
                    sig(builtin, &[string.clone(), int.clone()], int.clone()),
                    sig(builtin, &[int.clone(), int.clone()], int.clone()),
                ]
            }
            "contains" => vec![sig(Contains, &[string.clone()], boolean.clone())],
            "equals" => any_single(Equals, args, boolean.clone()),
            "equalsIgnoreCase" => {
                vec![sig(EqualsIgnoreCase, &[string.clone()], boolean.clone())]
            }
            "isEmpty" => vec![sig(IsEmpty, &[], boolean.clone())],
            "isBlank" => vec![sig(IsBlank, &[], boolean.clone())],
            "toUpperCase" => vec![sig(ToUpperCase, &[], string.clone())],
            "toLowerCase" => vec![sig(ToLowerCase, &[], string.clone())],
            "trim" | "strip" => vec![sig(Trim, &[], string.clone())],
            "startsWith" => vec![sig(StartsWith, &[string.clone()], boolean.clone())],
            "endsWith" => vec![sig(EndsWith, &[string.clone()], boolean.clone())],
            "replace" => vec![
                sig(Replace, &[character.clone(), character.clone()], string.clone()),
                sig(Replace, &[string.clone(), string.clone()], string.clone()),
            ],
            "concat" => vec![sig(Concat, &[string.clone()], string.clone())],
            "compareTo" => vec![sig(CompareTo, &[string.clone()], int.clone())],
            "split" => vec![sig(Split, &[string.clone()], array_of(string.clone()))],
            "toCharArray" => vec![sig(ToCharArray, &[], array_of(character.clone()))],
            "matches" => vec![sig(Matches, &[string.clone()], boolean.clone())],
            "repeat" => vec![sig(Repeat, &[int.clone()], string.clone())],
            _ => vec![],
        },
        Type::Exception(_) => match method {
            "getMessage" => vec![sig(GetMessage, &[], string.clone())],
            _ => vec![],
        },
        _ => vec![],
    };
    select(candidates, args)
}

/// Constants such as `Math.PI` and `Integer.MAX_VALUE`.
pub fn static_field(class: &str, name: &str) -> Option<Value> {
    let value = match (class, name) {
        ("Math", "PI") => Value::Double(std::f64::consts::PI),
        ("Math", "E") => Value::Double(std::f64::consts::E),
        ("Integer", "MAX_VALUE") => Value::Int(i32::MAX),
        ("Integer", "MIN_VALUE") => Value::Int(i32::MIN),
        ("Long", "MAX_VALUE") => Value::Long(i64::MAX),
        ("Long", "MIN_VALUE") => Value::Long(i64::MIN),
        ("Double", "MAX_VALUE") => Value::Double(f64::MAX),
        ("Double", "MIN_VALUE") => Value::Double(f64::from_bits(1)),
        ("Double", "POSITIVE_INFINITY") => Value::Double(f64::INFINITY),
        ("Double", "NEGATIVE_INFINITY") => Value::Double(f64::NEG_INFINITY),
        ("Double", "NaN") => Value::Double(f64::NAN),
        ("Character", "MAX_VALUE") => Value::Char('\u{ffff}'),
        ("Character", "MIN_VALUE") => Value::Char('\0'),
        _ => return None,
    };
    Some(value)
}
