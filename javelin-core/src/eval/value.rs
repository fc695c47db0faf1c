//! Runtime values.
//!
//! Strings, arrays and exceptions are references: cloning a [`Value`] shares
//! the underlying object, and `==` on them compares identity.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::ast::Type;

/// Named values handed to a snippet at call time.
pub type Bindings = BTreeMap<String, Value>;

#[derive(Debug, Clone)]
pub enum Value {
    Int(i32),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Char(char),
    Str(Arc<StringValue>),
    Array(Arc<ArrayValue>),
    Exception(Arc<ExceptionValue>),
    Null,
    Void,
}

/// Immutable string contents. Length and indexing by character are O(1):
/// ASCII text is indexed by byte, anything else through a character table
/// built once when the string is created.
#[derive(Debug)]
pub struct StringValue {
    text: Box<str>,
    chars: Option<Box<[char]>>,
}

impl StringValue {
    pub fn new(text: impl Into<Box<str>>) -> Self {
        let text = text.into();
        let chars = (!text.is_ascii()).then(|| text.chars().collect());
        Self { text, chars }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_ascii(&self) -> bool {
        self.chars.is_none()
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        match &self.chars {
            Some(chars) => chars.len(),
            None => self.text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        match &self.chars {
            Some(chars) => chars.get(index).copied(),
            None => self.text.as_bytes().get(index).map(|b| *b as char),
        }
    }

    /// Characters `begin..end`; the caller checks the bounds.
    pub fn slice(&self, begin: usize, end: usize) -> String {
        match &self.chars {
            Some(chars) => chars[begin..end].iter().collect(),
            None => self.text[begin..end].to_string(),
        }
    }

    /// First occurrence of `needle` at or after character `from`, or -1.
    pub fn index_of(&self, needle: &str, from: i64) -> i64 {
        match &self.chars {
            Some(chars) => {
                let needle: Vec<char> = needle.chars().collect();
                index_of(chars, &needle, from)
            }
            None if needle.is_ascii() => index_of(self.text.as_bytes(), needle.as_bytes(), from),
            None => -1,
        }
    }

    /// Last occurrence of `needle` starting at or before character `from`, or -1.
    pub fn last_index_of(&self, needle: &str, from: i64) -> i64 {
        match &self.chars {
            Some(chars) => {
                let needle: Vec<char> = needle.chars().collect();
                last_index_of(chars, &needle, from)
            }
            None if needle.is_ascii() => {
                last_index_of(self.text.as_bytes(), needle.as_bytes(), from)
            }
            None => -1,
        }
    }
}

impl std::ops::Deref for StringValue {
    type Target = str;

    fn deref(&self) -> &str {
        &self.text
    }
}

fn index_of<T: PartialEq>(haystack: &[T], needle: &[T], from: i64) -> i64 {
    let start = from.max(0) as usize;
    if needle.is_empty() {
        return start.min(haystack.len()) as i64;
    }
    if start >= haystack.len() {
        return -1;
    }
    haystack[start..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map_or(-1, |offset| (start + offset) as i64)
}

fn last_index_of<T: PartialEq>(haystack: &[T], needle: &[T], from: i64) -> i64 {
    if from < 0 || needle.len() > haystack.len() {
        return -1;
    }
    let start = (from as usize).min(haystack.len() - needle.len());
    (0..=start)
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
        .map_or(-1, |i| i as i64)
}

#[derive(Debug)]
pub struct ArrayValue {
    element: Type,
    items: Mutex<Vec<Value>>,
}

impl ArrayValue {
    pub fn new(element: Type, items: Vec<Value>) -> Self {
        Self {
            element,
            items: Mutex::new(items),
        }
    }

    pub fn element_type(&self) -> &Type {
        &self.element
    }

    pub fn items(&self) -> MutexGuard<'_, Vec<Value>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.items().get(index).cloned()
    }

    /// Returns false when `index` is out of bounds.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.items().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// A shallow copy of the elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.items().clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionValue {
    pub class: String,
    pub message: Option<String>,
}

impl Value {
    pub fn string(s: &str) -> Value {
        Value::Str(Arc::new(StringValue::new(s)))
    }

    pub fn array(element: Type, items: Vec<Value>) -> Value {
        Value::Array(Arc::new(ArrayValue::new(element, items)))
    }

    pub fn exception(class: impl Into<String>, message: Option<String>) -> Value {
        Value::Exception(Arc::new(ExceptionValue {
            class: class.into(),
            message,
        }))
    }

    /// The value a variable or array element of type `ty` starts with.
    pub fn default_for(ty: &Type) -> Value {
        match ty {
            Type::Int => Value::Int(0),
            Type::Long => Value::Long(0),
            Type::Double => Value::Double(0.0),
            Type::Boolean => Value::Boolean(false),
            Type::Char => Value::Char('\0'),
            _ => Value::Null,
        }
    }

    /// The static type a binding with this value gets. `null` has none.
    pub fn static_type(&self) -> Option<Type> {
        match self {
            Value::Int(_) => Some(Type::Int),
            Value::Long(_) => Some(Type::Long),
            Value::Double(_) => Some(Type::Double),
            Value::Boolean(_) => Some(Type::Boolean),
            Value::Char(_) => Some(Type::Char),
            Value::Str(_) => Some(Type::String),
            Value::Array(array) => Some(Type::Array(Box::new(array.element_type().clone()))),
            Value::Exception(e) => Some(Type::Exception(e.class.clone())),
            Value::Null | Value::Void => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Char(c) => Some(*c as i32),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(l) => Some(*l),
            Value::Int(i) => Some(*i as i64),
            Value::Char(c) => Some(*c as i64),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Long(l) => Some(*l as f64),
            Value::Int(i) => Some(*i as f64),
            Value::Char(c) => Some(*c as u32 as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Primitive conversion as done by casts and widening. References pass
    /// through unchanged.
    pub fn convert(self, to: &Type) -> Value {
        match (to, &self) {
            (Type::Int, Value::Long(l)) => Value::Int(*l as i32),
            (Type::Int, Value::Double(d)) => Value::Int(*d as i32),
            (Type::Int, Value::Char(c)) => Value::Int(*c as i32),
            (Type::Long, Value::Int(i)) => Value::Long(*i as i64),
            (Type::Long, Value::Double(d)) => Value::Long(*d as i64),
            (Type::Long, Value::Char(c)) => Value::Long(*c as i64),
            (Type::Double, Value::Int(i)) => Value::Double(*i as f64),
            (Type::Double, Value::Long(l)) => Value::Double(*l as f64),
            (Type::Double, Value::Char(c)) => Value::Double(*c as u32 as f64),
            (Type::Char, Value::Int(i)) => Value::Char(char_from_code(*i as u16)),
            (Type::Char, Value::Long(l)) => Value::Char(char_from_code(*l as u16)),
            (Type::Char, Value::Double(d)) => Value::Char(char_from_code(*d as i32 as u16)),
            _ => self,
        }
    }
}

/// A `char` for a UTF-16 code unit. Lone surrogates have no `char` and
/// become U+FFFD.
pub fn char_from_code(code: u16) -> char {
    char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Formats a double the way `Double.toString` does.
pub fn format_double(d: f64) -> String {
    if d.is_nan() {
        return "NaN".to_string();
    }
    if d.is_infinite() {
        return if d > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if d == 0.0 {
        return if d.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    let magnitude = d.abs();
    if (1e-3..1e7).contains(&magnitude) {
        let text = d.to_string();
        if text.contains('.') {
            text
        } else {
            format!("{}.0", text)
        }
    } else {
        let text = format!("{:e}", d);
        let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
        if mantissa.contains('.') {
            format!("{}E{}", mantissa, exponent)
        } else {
            format!("{}.0E{}", mantissa, exponent)
        }
    }
}

fn type_descriptor(ty: &Type) -> String {
    match ty {
        Type::Int => "I".to_string(),
        Type::Long => "J".to_string(),
        Type::Double => "D".to_string(),
        Type::Boolean => "Z".to_string(),
        Type::Char => "C".to_string(),
        Type::Array(inner) => format!("[{}", type_descriptor(inner)),
        Type::String => "Ljava.lang.String;".to_string(),
        other => format!("L{};", other),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a.as_str() == b.as_str(),
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Exception(a), Value::Exception(b)) => a == b,
            (Value::Null, Value::Null) | (Value::Void, Value::Void) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(l) => write!(f, "{}", l),
            Value::Double(d) => write!(f, "{}", format_double(*d)),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::Str(s) => write!(f, "{}", s.as_str()),
            Value::Array(array) => write!(
                f,
                "[{}@{:x}",
                type_descriptor(array.element_type()),
                (Arc::as_ptr(array) as usize >> 4) & 0xffff_ffff
            ),
            Value::Exception(e) => match &e.message {
                Some(message) => write!(f, "java.lang.{}: {}", e.class, message),
                None => write!(f, "java.lang.{}", e.class),
            },
            Value::Null => write!(f, "null"),
            Value::Void => write!(f, "void"),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Arc::new(StringValue::new(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_double() {
        assert_eq!(format_double(4.0), "4.0");
        assert_eq!(format_double(0.1), "0.1");
        assert_eq!(format_double(-2.5), "-2.5");
        assert_eq!(format_double(1e7), "1.0E7");
        assert_eq!(format_double(1.5e-5), "1.5E-5");
        assert_eq!(format_double(123456.789), "123456.789");
        assert_eq!(format_double(f64::NAN), "NaN");
        assert_eq!(format_double(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_double(-0.0), "-0.0");
    }

    #[test]
    fn test_reference_equality() {
        let a = Value::array(Type::Int, vec![Value::Int(1)]);
        let b = Value::array(Type::Int, vec![Value::Int(1)]);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(Value::from("abc"), Value::string("abc"));
    }

    #[test]
    fn test_static_type() {
        assert_eq!(Value::from(1).static_type(), Some(Type::Int));
        assert_eq!(
            Value::array(Type::Char, vec![]).static_type(),
            Some(Type::Array(Box::new(Type::Char)))
        );
        assert_eq!(Value::Null.static_type(), None);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Value::Double(3.99).convert(&Type::Int), Value::Int(3));
        assert_eq!(Value::Double(f64::NAN).convert(&Type::Int), Value::Int(0));
        assert_eq!(Value::Double(1e20).convert(&Type::Int), Value::Int(i32::MAX));
        assert_eq!(Value::Long(1 << 32).convert(&Type::Int), Value::Int(0));
        assert_eq!(Value::Int(65).convert(&Type::Char), Value::Char('A'));
        assert_eq!(Value::Char('a').convert(&Type::Int), Value::Int(97));
        assert_eq!(Value::Int(7).convert(&Type::Double), Value::Double(7.0));
    }

    #[test]
    fn test_string_indexing() {
        let ascii = StringValue::new("banana");
        assert!(ascii.is_ascii());
        assert_eq!(ascii.len(), 6);
        assert_eq!(ascii.char_at(2), Some('n'));
        assert_eq!(ascii.char_at(6), None);
        assert_eq!(ascii.slice(1, 4), "ana");
        assert_eq!(ascii.index_of("an", 2), 3);
        assert_eq!(ascii.last_index_of("a", 6), 5);
        assert_eq!(ascii.index_of("é", 0), -1);

        let accented = StringValue::new("héllo wörld");
        assert!(!accented.is_ascii());
        assert_eq!(accented.len(), 11);
        assert_eq!(accented.char_at(1), Some('é'));
        assert_eq!(accented.slice(6, 11), "wörld");
        assert_eq!(accented.index_of("ö", 0), 7);
        assert_eq!(accented.last_index_of("l", 11), 9);
    }

    #[test]
    fn test_array_access() {
        let array = ArrayValue::new(Type::Int, vec![Value::Int(0); 3]);
        assert!(array.set(1, Value::Int(5)));
        assert!(!array.set(3, Value::Int(5)));
        assert_eq!(array.get(1), Some(Value::Int(5)));
        assert_eq!(array.len(), 3);
    }
}
