use std::time::Duration;

use javelin_core::{
    ast::Type, config::MIN_TIMEOUT, evaluate, evaluate_with_config, Bindings, EngineConfig,
    EvaluationError, Value,
};
use proptest::prelude::*;

fn bindings(pairs: &[(&str, Value)]) -> Bindings {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[test]
fn test_adds_bindings() {
    let bindings = bindings(&[("a", Value::Int(2)), ("b", Value::Int(3))]);
    assert_eq!(evaluate("a + b", &bindings), Ok(Value::Int(5)));
}

#[test]
fn test_reports_division_by_zero_as_runtime_error() {
    let bindings = bindings(&[("a", Value::Int(10))]);
    let error = evaluate("a / 0", &bindings).unwrap_err();
    match error {
        EvaluationError::Runtime {
            exception, message, ..
        } => {
            assert_eq!(exception, "ArithmeticException");
            assert_eq!(message.as_deref(), Some("/ by zero"));
        }
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn test_reports_malformed_syntax_as_compile_error() {
    let error = evaluate("x *", &Bindings::new()).unwrap_err();
    assert!(error.is_compile(), "{:?}", error);
}

#[test]
fn test_reports_unresolved_identifiers_as_compile_error() {
    let bindings = bindings(&[("a", Value::Int(1))]);
    let error = evaluate("a + missing", &bindings).unwrap_err();
    assert!(error.is_compile());
    assert!(error.to_string().contains("missing"));
}

#[test]
fn test_rejects_empty_source() {
    for source in ["", "   ", "\n\t\n"] {
        let error = evaluate(source, &Bindings::new()).unwrap_err();
        assert_eq!(error, EvaluationError::compile("Code is empty"));
    }
}

#[test]
fn test_rejects_reserved_binding_names() {
    let bindings = bindings(&[("class", Value::Int(1))]);
    let error = evaluate("1", &bindings).unwrap_err();
    assert!(error.is_compile());
}

#[test]
fn test_keeps_binding_types() {
    let bindings = bindings(&[
        ("name", Value::from("Ada")),
        ("n", Value::Long(1i64 << 40)),
        ("ratio", Value::Double(0.5)),
        ("flag", Value::Boolean(true)),
    ]);
    assert_eq!(
        evaluate("name + \"!\"", &bindings),
        Ok(Value::from("Ada!"))
    );
    assert_eq!(evaluate("n * 2", &bindings), Ok(Value::Long(1i64 << 41)));
    assert_eq!(evaluate("ratio * 4", &bindings), Ok(Value::Double(2.0)));
    assert_eq!(evaluate("!flag", &bindings), Ok(Value::Boolean(false)));
}

#[test]
fn test_returns_values_from_statement_blocks() {
    let source = r#"
        int total = 0;
        for (int i = 1; i <= 10; i++) {
            total += i;
        }
        return total;
    "#;
    assert_eq!(evaluate(source, &Bindings::new()), Ok(Value::Int(55)));
}

#[test]
fn test_returns_void_for_printing_programs() {
    let source = r#"System.out.println("hi");"#;
    assert_eq!(evaluate(source, &Bindings::new()), Ok(Value::Void));
}

#[test]
fn test_times_out_infinite_loops() {
    let config = EngineConfig::default().with_timeout(MIN_TIMEOUT);
    let error = evaluate_with_config("while (true) {}", &Bindings::new(), &config).unwrap_err();
    assert_eq!(error, EvaluationError::Timeout { limit: MIN_TIMEOUT });
    assert!(error.to_string().contains("timed out"));
}

#[test]
fn test_times_out_very_long_loops() {
    let config = EngineConfig::default().with_timeout(Duration::from_millis(600));
    let source = r#"
        long count = 0;
        for (long i = 0; i < 100000000000L; i++) {
            count += i % 7;
        }
        System.out.println(count);
    "#;
    let error = evaluate_with_config(source, &Bindings::new(), &config).unwrap_err();
    assert!(error.is_timeout());
}

#[test]
fn test_overflows_the_stack_on_unbounded_recursion() {
    let source = r#"
        static int down(int n) {
            return down(n + 1);
        }
        public static void main(String[] args) {
            down(0);
        }
    "#;
    let error = evaluate(source, &Bindings::new()).unwrap_err();
    match error {
        EvaluationError::Runtime { exception, .. } => assert_eq!(exception, "StackOverflowError"),
        other => panic!("expected StackOverflowError, got {:?}", other),
    }
}

proptest! {
    #[test]
    fn prop_pure_expressions_are_deterministic(a in any::<i32>(), b in any::<i32>()) {
        let bindings = bindings(&[("a", Value::Int(a)), ("b", Value::Int(b))]);
        let source = "(a ^ b) * 31 + (a >> 3) - b % 7";
        let first = evaluate(source, &bindings);
        let second = evaluate(source, &bindings);
        prop_assert_eq!(&first, &second);
        let expected = (a ^ b)
            .wrapping_mul(31)
            .wrapping_add(a >> 3)
            .wrapping_sub(b % 7);
        prop_assert_eq!(first, Ok(Value::Int(expected)));
    }

    #[test]
    fn prop_addition_matches_wrapping_arithmetic(a in any::<i32>(), b in any::<i32>()) {
        let bindings = bindings(&[("a", Value::Int(a)), ("b", Value::Int(b))]);
        prop_assert_eq!(evaluate("a + b", &bindings), Ok(Value::Int(a.wrapping_add(b))));
    }
}

fn compile_message(source: &str) -> String {
    match evaluate(source, &Bindings::new()) {
        Err(EvaluationError::Compile { message, .. }) => message,
        other => panic!("expected a compile error, got {:?}", other),
    }
}

#[test]
fn test_rejects_deeply_nested_code() {
    let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
    assert!(compile_message(&parens).contains("code too deeply nested"));

    let chain = vec!["1"; 20_000].join(" + ");
    assert!(compile_message(&chain).contains("code too deeply nested"));

    let blocks = format!("{}{}", "{".repeat(5_000), "}".repeat(5_000));
    assert!(compile_message(&blocks).contains("code too deeply nested"));

    let shallow = format!("{}1{}", "(".repeat(100), ")".repeat(100));
    assert_eq!(evaluate(&shallow, &Bindings::new()), Ok(Value::Int(1)));
}

#[test]
fn test_string_cap_follows_config() {
    let config = EngineConfig {
        max_string_len: 8,
        ..EngineConfig::default()
    };
    let bindings = bindings(&[("a", Value::from("abcd")), ("b", Value::from("efghi"))]);
    assert_eq!(
        evaluate_with_config("a + b.substring(1)", &bindings, &config),
        Ok(Value::from("abcdfghi"))
    );
    match evaluate_with_config("a + b", &bindings, &config) {
        Err(EvaluationError::Runtime {
            exception, message, ..
        }) => {
            assert_eq!(exception, "OutOfMemoryError");
            assert_eq!(message.as_deref(), Some("Java heap space"));
        }
        other => panic!("expected OutOfMemoryError, got {:?}", other),
    }
}

#[test]
fn test_array_bindings_must_match_their_element_type() {
    let mixed = bindings(&[(
        "arr",
        Value::array(Type::Int, vec![Value::from("x"), Value::Double(2.5)]),
    )]);
    let error = evaluate("arr[0] + 1", &mixed).unwrap_err();
    assert!(error.is_compile(), "{:?}", error);
    assert!(error.to_string().contains("incompatible types in binding 'arr'"), "{}", error);

    let ints = bindings(&[("arr", Value::array(Type::Int, vec![Value::Int(1), Value::Int(2)]))]);
    assert_eq!(evaluate("arr[0] + arr[1]", &ints), Ok(Value::Int(3)));

    let void = bindings(&[("v", Value::Void)]);
    let error = evaluate("v", &void).unwrap_err();
    assert!(error.to_string().contains("void cannot be bound"), "{}", error);
}

#[test]
fn test_index_side_effects_run_once() {
    let source = r#"
        int[] a = new int[3];
        int i = 0;
        a[i++] += 5;
        a[i++] = a[0] * 2;
        int picked = i > 1 ? a[--i] : a[i];
        return a[0] + a[1] * 100 + i * 10000 + picked * 1000000;
    "#;
    assert_eq!(
        evaluate(source, &Bindings::new()),
        Ok(Value::Int(5 + 1000 + 10000 + 10_000_000))
    );
}

#[test]
fn test_integer_literal_too_large() {
    let message = compile_message("2147483648");
    assert!(message.contains("integer number too large"), "{}", message);
    assert_eq!(
        evaluate("-2147483648", &Bindings::new()),
        Ok(Value::Int(i32::MIN))
    );
}
