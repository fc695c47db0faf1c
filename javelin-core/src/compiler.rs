//! Source text to [`Program`]: tokenize, preprocess, parse and type check,
//! with an optional cache of finished programs.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error, warn};

use crate::{
    analyzer::parse_compilation_unit,
    builtins::is_builtin_class,
    error::EvaluationError,
    ast::Type,
    eval::value::{Bindings, Value},
    preprocessor::{Preprocessor, SourceMap, TokenPreprocessor},
    program::Program,
    tokenizer::{keyword::is_reserved_word, token::Tokenizer},
    type_checker::{BindingTypes, TypeChecker, conversion::is_assignable},
};

type CacheKey = (String, BindingTypes);

/// Static types of `bindings`, in the order they become globals.
pub fn binding_types(bindings: &Bindings) -> Result<BindingTypes, EvaluationError> {
    bindings
        .iter()
        .map(|(name, value)| Ok((name.clone(), binding_type(name, value)?)))
        .collect()
}

fn binding_type(name: &str, value: &Value) -> Result<Type, EvaluationError> {
    let ty = match value {
        Value::Null => {
            return Err(EvaluationError::compile(format!(
                "cannot infer type of binding '{}' from null",
                name
            )));
        }
        Value::Void => {
            return Err(EvaluationError::compile(format!(
                "binding '{}' has no value: void cannot be bound",
                name
            )));
        }
        other => other.static_type(),
    };
    check_elements(name, value)?;
    ty.ok_or_else(|| EvaluationError::compile(format!("binding '{}' has no type", name)))
}

/// Every element of a bound array must already have the array's element
/// type: primitives exactly, references by assignment. Elements are never
/// converted at run time.
fn check_elements(name: &str, value: &Value) -> Result<(), EvaluationError> {
    let Value::Array(array) = value else {
        return Ok(());
    };
    let element = array.element_type();
    for (index, item) in array.to_vec().iter().enumerate() {
        let fits = match item.static_type() {
            Some(found) if element.is_reference() => is_assignable(&found, element, None),
            Some(found) => found == *element,
            None => item.is_null() && element.is_reference(),
        };
        if !fits {
            let found = item
                .static_type()
                .map_or_else(|| item.to_string(), |ty| ty.to_string());
            return Err(EvaluationError::compile(format!(
                "incompatible types in binding '{}': element {} is {}, expected {}",
                name, index, found, element
            )));
        }
        check_elements(name, item)?;
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn check_binding_names(types: &BindingTypes) -> Result<(), EvaluationError> {
    for (name, _) in types {
        if is_reserved_word(name) || is_builtin_class(name) {
            return Err(EvaluationError::compile(format!(
                "'{}' is a reserved name and cannot be used as a binding",
                name
            )));
        }
        if !is_identifier(name) {
            return Err(EvaluationError::compile(format!(
                "'{}' is not a valid binding name",
                name
            )));
        }
    }
    Ok(())
}

fn located(message: impl Into<String>, source_map: &SourceMap, pos: usize) -> EvaluationError {
    let span = source_map.span(pos);
    EvaluationError::compile_at(message, span.line, span.column)
}

/// Runs the whole front end on `source`.
#[tracing::instrument(level = "debug", skip(source, types), fields(len = source.len()))]
pub fn compile(source: &str, types: &BindingTypes) -> Result<Program, EvaluationError> {
    if source.trim().is_empty() {
        return Err(EvaluationError::compile("Code is empty"));
    }
    check_binding_names(types)?;

    let spans = Tokenizer::new().tokenize(source).map_err(|e| {
        error!("tokenizer failed: {}", e);
        let span = e.span();
        EvaluationError::compile_at(e.message(), span.line, span.column)
    })?;
    let tokens = TokenPreprocessor::new().process(spans);
    debug!(tokens = tokens.tokens.len(), "tokenized");

    let unit = parse_compilation_unit(&tokens.tokens)
        .map_err(|e| located(e.describe(), &tokens.source_map, e.get_position()))?;

    let mut program = TypeChecker::new()
        .check(&unit, types)
        .map_err(|e| located(e.to_string(), &tokens.source_map, e.pos()))?;
    program.source_map = tokens.source_map;
    Ok(program)
}

/// Compiles sources and keeps the results, keyed by source text and binding
/// types. A full cache drops an arbitrary entry to make room.
#[derive(Debug)]
pub struct Compiler {
    cache: DashMap<CacheKey, Arc<Program>>,
    capacity: usize,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Compiler {
    /// A `capacity` of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: DashMap::new(),
            capacity,
        }
    }

    pub fn compile(
        &self,
        source: &str,
        types: &BindingTypes,
    ) -> Result<Arc<Program>, EvaluationError> {
        if self.capacity == 0 {
            return compile(source, types).map(Arc::new);
        }

        let key = (source.to_string(), types.clone());
        if let Some(program) = self.cache.get(&key) {
            debug!("compile cache hit");
            return Ok(program.clone());
        }

        let program = Arc::new(compile(source, types)?);
        if self.cache.len() >= self.capacity {
            let evicted = self.cache.iter().next().map(|entry| entry.key().clone());
            if let Some(evicted) = evicted {
                warn!(capacity = self.capacity, "compile cache full, evicting an entry");
                self.cache.remove(&evicted);
            }
        }
        self.cache.insert(key, program.clone());
        Ok(program)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}
