use javelin_core::{
    compiler::compile,
    eval::{Interpreter, Interrupt},
    type_checker::BindingTypes,
    Bindings, EvaluationError, Outcome,
};
use pretty_assertions::assert_eq;

fn run(source: &str) -> Result<Outcome, EvaluationError> {
    run_with_args(source, &[])
}

fn run_with_args(source: &str, args: &[&str]) -> Result<Outcome, EvaluationError> {
    let program = compile(source, &BindingTypes::new())?;
    let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
    Interpreter::default().run(&program, &Bindings::new(), &args, Interrupt::default())
}

fn output(source: &str) -> String {
    match run(source) {
        Ok(outcome) => outcome.output,
        Err(error) => panic!("program failed: {}", error.report()),
    }
}

fn runtime_error(source: &str) -> (String, String) {
    match run(source) {
        Err(EvaluationError::Runtime {
            exception, message, ..
        }) => (exception, message.unwrap_or_default()),
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

fn compile_error(source: &str) -> String {
    match compile(source, &BindingTypes::new()) {
        Err(error) if error.is_compile() => error.to_string(),
        other => panic!("expected a compile error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_prints_hello_world() {
    assert_eq!(output(r#"System.out.println("Hello, World!");"#), "Hello, World!\n");
}

#[test]
fn test_runs_a_complete_class() {
    let source = r#"
        public class Calculator {
            static int square(int x) {
                return x * x;
            }

            public static void main(String[] args) {
                System.out.println("7^2 = " + square(7));
            }
        }
    "#;
    assert_eq!(output(source), "7^2 = 49\n");
}

#[test]
fn test_runs_methods_with_main() {
    let source = r#"
        static int fib(int n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }

        public static void main(String[] args) {
            for (int i = 0; i < 10; i++) {
                System.out.print(fib(i) + " ");
            }
            System.out.println();
        }
    "#;
    assert_eq!(output(source), "0 1 1 2 3 5 8 13 21 34 \n");
}

#[test]
fn test_sums_across_statements() {
    let source = r#"
        int a = 5;
        int b = 10;
        int sum = a + b;
        System.out.println("Sum: " + sum);
    "#;
    assert_eq!(output(source), "Sum: 15\n");
}

#[test]
fn test_runs_loops() {
    let source = r#"
        int i = 0;
        while (i < 3) {
            System.out.print(i);
            i++;
        }
        do {
            i--;
        } while (i > 0);
        for (int j = 0; j < 10; j++) {
            if (j % 2 == 0) continue;
            if (j > 5) break;
            System.out.print(j);
        }
        System.out.println(" " + i);
    "#;
    assert_eq!(output(source), "012135 0\n");
}

#[test]
fn test_iterates_arrays() {
    let source = r#"
        int[] numbers = {3, 1, 4, 1, 5};
        int total = 0;
        for (int n : numbers) {
            total += n;
        }
        System.out.println(total + " " + numbers.length);
        String[] words = new String[2];
        words[0] = "a";
        System.out.println(words[1]);
    "#;
    assert_eq!(output(source), "14 5\nnull\n");
}

#[test]
fn test_prints_escape_sequences() {
    let source = r#"System.out.println("tab\there \"quoted\" back\\slash\nnext");"#;
    assert_eq!(output(source), "tab\there \"quoted\" back\\slash\nnext\n");
}

#[test]
fn test_formats_doubles_like_java() {
    assert_eq!(output("System.out.println(Math.sqrt(16));"), "4.0\n");
    assert_eq!(output("System.out.println(1.0 / 4);"), "0.25\n");
    assert_eq!(output("System.out.println(10 / 4);"), "2\n");
}

#[test]
fn test_uses_string_methods() {
    let source = r#"
        String s = "Hello";
        System.out.println(s.length() + " " + s.toUpperCase() + " " + s.charAt(1) + " " + s.substring(1, 3));
        System.out.println(s.equals("Hello") + " " + s.indexOf("l") + " " + s.contains("ell"));
    "#;
    assert_eq!(output(source), "5 HELLO e el\ntrue 2 true\n");
}

#[test]
fn test_passes_program_arguments() {
    let source = r#"
        public static void main(String[] args) {
            int n = Integer.parseInt(args[0]);
            System.out.println(n * 2);
        }
    "#;
    let outcome = run_with_args(source, &["21"]).unwrap();
    assert_eq!(outcome.output, "42\n");
}

#[test]
fn test_reports_array_index_out_of_bounds() {
    let (exception, message) = runtime_error("int[] a = new int[3];\na[5] = 1;");
    assert_eq!(exception, "ArrayIndexOutOfBoundsException");
    assert!(message.contains("bounds"), "{}", message);
}

#[test]
fn test_reports_null_dereference() {
    let (exception, message) = runtime_error("String s = null;\nSystem.out.println(s.length());");
    assert_eq!(exception, "NullPointerException");
    assert!(message.contains("null"), "{}", message);
}

#[test]
fn test_reports_thrown_exceptions_with_stack_trace() {
    let source = r#"
public class Main {
    static int check(int value) {
        if (value < 0) {
            throw new IllegalArgumentException("negative: " + value);
        }
        return value;
    }

    public static void main(String[] args) {
        System.out.println(check(1));
        System.out.println(check(-2));
    }
}
"#;
    match run(source) {
        Err(EvaluationError::Runtime {
            exception,
            message,
            stack,
            output,
        }) => {
            assert_eq!(exception, "IllegalArgumentException");
            assert_eq!(message.as_deref(), Some("negative: -2"));
            assert_eq!(output, "1\n");
            assert_eq!(stack.len(), 2);
            assert_eq!(stack[0].method, "check");
            assert_eq!(stack[0].line, 5);
            assert_eq!(stack[1].method, "main");
            assert_eq!(stack[1].line, 12);
        }
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn test_keeps_output_printed_before_a_failure() {
    match run("System.out.println(\"before\");\nint x = 1 / 0;") {
        Err(error) => {
            assert_eq!(error.output(), Some("before\n"));
            assert_eq!(error.line(), Some(2));
        }
        Ok(outcome) => panic!("expected a failure, got {:?}", outcome),
    }
}

#[test]
fn test_rejects_invalid_programs() {
    let missing_semicolon = compile_error("int x = 5\nSystem.out.println(x);");
    assert!(missing_semicolon.contains("';' expected"), "{}", missing_semicolon);

    let undeclared = compile_error("System.out.println(y);");
    assert!(undeclared.contains("cannot find symbol"), "{}", undeclared);

    let mismatch = compile_error("String text = 123;");
    assert!(mismatch.contains("incompatible types"), "{}", mismatch);
}

#[test]
fn test_truncates_long_output() {
    let source = r#"
        for (int i = 0; i < 5000; i++) {
            System.out.print("0123456789");
        }
    "#;
    let outcome = run(source).unwrap();
    assert_eq!(outcome.output.chars().count(), 10_000);
    assert_eq!(
        outcome.warnings,
        vec!["Output truncated: exceeded 10000 characters".to_string()]
    );
}

#[test]
fn test_huge_strings_exhaust_the_heap() {
    let heap = ("OutOfMemoryError".to_string(), "Java heap space".to_string());
    assert_eq!(
        runtime_error(r#"int n = "abcdefghijklmnop".repeat(Integer.MAX_VALUE).length();"#),
        heap
    );
    assert_eq!(
        runtime_error(
            r#"
            String s = "abcdefghijklmnop";
            for (int i = 0; i < 40; i++) {
                s = s + s;
            }
            "#
        ),
        heap
    );
    assert_eq!(
        runtime_error(
            r#"
            String s = "abcdefghijklmnop";
            for (int i = 0; i < 40; i++) {
                s += s;
            }
            "#
        ),
        heap
    );
    assert_eq!(
        runtime_error(r#"String s = "a".repeat(1 << 20).replace("a", "0123456789abcdefghij");"#),
        heap
    );
}

#[test]
fn test_side_effects_run_once() {
    let source = r#"
        public class Once {
            static int calls = 0;

            static int next() {
                calls++;
                System.out.println("next " + calls);
                return calls;
            }

            public static void main(String[] args) {
                int[] a = new int[4];
                a[next()] += 10;
                int v = next() > 1 ? next() : -1;
                int i = 0;
                a[i++]++;
                System.out.println(calls + " " + a[0] + " " + a[1] + " " + v + " " + i);
            }
        }
    "#;
    assert_eq!(output(source), "next 1\nnext 2\nnext 3\n3 1 10 3 1\n");
}

#[test]
fn test_out_of_range_literals() {
    assert!(compile_error("int x = 2147483648;").contains("integer number too large"));
    assert!(compile_error("int x = 5 - 2147483648;").contains("integer number too large"));
    assert!(compile_error("long x = 9223372036854775808L;").contains("long number too large"));
    assert_eq!(output("System.out.println(-2147483648);"), "-2147483648\n");
}

#[test]
fn test_char_indexing_is_linear() {
    let source = r#"
        String s = "ab".repeat(100000);
        int count = 0;
        for (int i = 0; i < s.length(); i++) {
            if (s.charAt(i) == 'a') count++;
        }
        String t = "héllo wörld";
        System.out.println(count + " " + t.length() + " " + t.charAt(7) + " " + t.indexOf("w"));
    "#;
    assert_eq!(output(source), "100000 11 ö 6\n");
}
