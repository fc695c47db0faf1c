use std::time::Duration;

use javelin_core::{
    config::MIN_TIMEOUT, Bindings, Engine, EngineConfig, ErrorKind, EvaluationError, TestCase,
    Value,
};

fn engine() -> Engine {
    Engine::new(EngineConfig::default()).expect("engine")
}

#[tokio::test]
async fn test_executes_programs() {
    let engine = engine();
    let result = engine
        .execute(r#"System.out.println("Hello, World!");"#)
        .await;
    assert!(result.success, "{:?}", result);
    assert_eq!(result.output, "Hello, World!\n");
    assert!(result.summary().starts_with("Success ("));
    engine.shutdown().await;
}

#[tokio::test]
async fn test_classifies_failures() {
    let engine = engine();

    let compile = engine.execute("int x = 5;\nint y = z;").await;
    assert_eq!(compile.error_kind, Some(ErrorKind::Compilation));
    assert_eq!(compile.error_line, Some(2));
    let text = compile.formatted_error_message().expect("message");
    assert_eq!(
        text,
        "❌ Compilation Error (Line 2)\n\nLine 2, Column 9: cannot find symbol: variable z"
    );

    let runtime = engine
        .execute("System.out.println(\"start\");\nint[] a = new int[1];\na[3] = 1;")
        .await;
    assert_eq!(runtime.error_kind, Some(ErrorKind::Runtime));
    assert_eq!(runtime.output, "start\n");
    let text = runtime.formatted_error_message().expect("message");
    assert!(text.contains("ArrayIndexOutOfBoundsException"), "{}", text);
    assert!(text.ends_with("Output before error:\nstart\n"), "{}", text);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_times_out_infinite_loops() {
    let engine = engine();
    engine.set_timeout(MIN_TIMEOUT);
    let result = engine.execute("while (true) {}").await;
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
    assert!(
        result.error_message.as_deref().unwrap_or_default().contains("timed out"),
        "{:?}",
        result
    );

    // The worker is free again afterwards.
    let after = engine.execute("System.out.println(1);").await;
    assert!(after.success, "{:?}", after);
    engine.shutdown().await;
}

#[tokio::test]
async fn test_evaluates_with_bindings() {
    let engine = engine();
    let mut bindings = Bindings::new();
    bindings.insert("a".to_string(), Value::Int(10));
    let value = engine.evaluate("a * 3 + 1", &bindings).await;
    assert_eq!(value, Ok(Value::Int(31)));

    let error = engine.evaluate("a / 0", &bindings).await.unwrap_err();
    assert!(error.is_runtime());
    engine.shutdown().await;
}

#[tokio::test]
async fn test_passes_the_self_test() {
    let engine = engine();
    assert!(engine.run_self_test().await);
    engine.shutdown().await;
}

#[tokio::test]
async fn test_runs_test_cases() {
    let engine = engine();
    let source = r#"
        public static void main(String[] args) {
            if (args.length == 0) {
                System.out.println("none");
                return;
            }
            int n = Integer.parseInt(args[0]);
            System.out.println(n * n);
        }
    "#;
    let cases = vec![
        TestCase::new("3", "9"),
        TestCase::new("", "none").named("no input"),
        TestCase::new("4", "15"),
    ];
    let report = engine.execute_with_tests(source, &cases).await;
    assert!(!report.success);
    assert_eq!(report.summary, "Tests: 2/3 passed");
    assert_eq!(report.results[0].name, "Test 1");
    assert!(report.results[0].passed);
    assert_eq!(report.results[1].name, "no input");
    assert!(report.results[1].passed);
    assert_eq!(report.results[2].actual, "16\n");
    assert!(!report.results[2].passed);
    engine.shutdown().await;
}

#[tokio::test]
async fn test_fails_every_case_when_code_does_not_compile() {
    let engine = engine();
    let cases = vec![TestCase::new("1", "1"), TestCase::new("2", "2")];
    let report = engine.execute_with_tests("int x = ;", &cases).await;
    assert_eq!(report.summary, "Tests: 0/2 passed");
    assert!(report.results.iter().all(|result| result.error.is_some()));
    engine.shutdown().await;
}

#[tokio::test]
async fn test_caches_compiled_programs() {
    let engine = engine();
    for _ in 0..3 {
        assert!(engine.execute("System.out.println(2 + 2);").await.success);
    }
    assert_eq!(engine.cached_programs(), 1);
    engine.execute("System.out.println(3 + 3);").await;
    assert_eq!(engine.cached_programs(), 2);
    engine.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_runs_jobs_on_several_workers() {
    let config = EngineConfig {
        workers: 3,
        ..EngineConfig::default()
    };
    let engine = std::sync::Arc::new(Engine::new(config).expect("engine"));
    let mut handles = Vec::new();
    for i in 0..6 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .execute(&format!("System.out.println({} * 2);", i))
                .await
        }));
    }
    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.expect("join");
        assert_eq!(result.output, format!("{}\n", i * 2));
    }
    engine.shutdown().await;
}

#[tokio::test]
async fn test_cancels_work_on_shutdown() {
    let config = EngineConfig {
        timeout: Duration::from_secs(10),
        ..EngineConfig::default()
    };
    let engine = std::sync::Arc::new(Engine::new(config).expect("engine"));
    let running = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.execute("while (true) {}").await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    engine.shutdown().await;

    let result = running.await.expect("join");
    assert_eq!(result.error_kind, Some(ErrorKind::Cancelled));
    assert_eq!(
        engine.evaluate("1", &Bindings::new()).await,
        Err(EvaluationError::Cancelled)
    );
}

#[tokio::test]
async fn test_compile_errors_run_nothing() {
    let engine = engine();
    let result = engine.execute("System.out.println(\"a\");\nx *").await;
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::Compilation));
    assert_eq!(result.output, "");
    engine.shutdown().await;
}

#[tokio::test]
async fn test_conditional_prints_once() {
    let engine = engine();
    let source = r#"
        static int shout(String word) {
            System.out.println(word);
            return word.length();
        }

        public static void main(String[] args) {
            int n = shout("cond") > 3 ? shout("yes") : shout("no");
            System.out.println(n);
        }
    "#;
    let result = engine.execute(source).await;
    assert!(result.success, "{:?}", result);
    assert_eq!(result.output, "cond\nyes\n3\n");
    engine.shutdown().await;
}
