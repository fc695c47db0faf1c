use clap::{Parser, Subcommand};
use javelin_cli::{
    bindings::collect_bindings,
    config::{CliError, load_engine_config, load_test_cases, read_source},
};
use javelin_core::{Bindings, Engine, ExecutionResult, TestReport};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to an engine config file (JSON)
    #[arg(short, long, env = "JAVELIN_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Time budget per run in milliseconds (clamped to 500..=10000)
    #[arg(long, env = "JAVELIN_TIMEOUT_MS", global = true)]
    timeout_ms: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program file and print its output
    Run {
        /// Path to the program
        file: PathBuf,

        /// Arguments passed to main
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Evaluate an expression or snippet and print its value
    Eval {
        /// Source text
        source: String,

        /// Binding as name=value; may be repeated
        #[arg(short, long = "bind", value_name = "NAME=VALUE")]
        bind: Vec<String>,

        /// JSON object of bindings
        #[arg(long, value_name = "FILE")]
        bindings: Option<PathBuf>,
    },

    /// Compile a program without running it
    Check {
        /// Path to the program
        file: PathBuf,
    },

    /// Run a program against test cases
    Test {
        /// Path to the program
        file: PathBuf,

        /// JSON array of test cases
        #[arg(long)]
        cases: PathBuf,
    },

    /// Check that the engine can run a trivial program
    SelfTest,
}

fn output_json<T: serde::Serialize>(data: &T) -> Result<(), CliError> {
    let output = serde_json::to_string_pretty(data).map_err(|source| CliError::Json {
        path: PathBuf::from("<stdout>"),
        source,
    })?;
    println!("{}", output);
    Ok(())
}

fn print_execution(result: &ExecutionResult, json: bool) -> Result<(), CliError> {
    if json {
        return output_json(result);
    }
    if result.success {
        print!("{}", result.output);
        for warning in &result.warnings {
            eprintln!("warning: {}", warning);
        }
    } else if let Some(message) = result.formatted_error_message() {
        eprintln!("{}", message);
    }
    Ok(())
}

fn print_report(report: &TestReport, json: bool) -> Result<(), CliError> {
    if json {
        return output_json(report);
    }
    for result in &report.results {
        if result.passed {
            println!("✅ {}", result.name);
        } else {
            println!("❌ {}", result.name);
            println!("   expected: {:?}", result.expected.trim());
            println!("   actual:   {:?}", result.actual.trim());
            if let Some(error) = &result.error {
                println!("   error:    {}", error.lines().next().unwrap_or_default());
            }
        }
    }
    println!("{}", report.summary);
    Ok(())
}

/// Returns whether the command succeeded.
async fn run(cli: &Cli) -> Result<bool, CliError> {
    let config = load_engine_config(cli.config.as_deref(), cli.timeout_ms)?;
    debug!("config: {:?}", config);
    let engine = Engine::new(config)?;

    let succeeded = match &cli.command {
        Commands::Run { file, args } => {
            let source = read_source(file)?;
            let result = engine.execute_with_args(&source, args.clone()).await;
            info!("{}", result.summary());
            print_execution(&result, cli.json)?;
            result.success
        }
        Commands::Eval {
            source,
            bind,
            bindings,
        } => {
            let bindings = collect_bindings(bindings.as_deref(), bind)?;
            match engine.evaluate(source, &bindings).await {
                Ok(value) => {
                    if cli.json {
                        output_json(&serde_json::json!({
                            "success": true,
                            "value": value.to_string(),
                            "type": value.static_type().map(|ty| ty.to_string()),
                        }))?;
                    } else {
                        println!("{}", value);
                    }
                    true
                }
                Err(error) => {
                    if cli.json {
                        output_json(&serde_json::json!({
                            "success": false,
                            "error": error.report(),
                        }))?;
                    } else {
                        eprintln!("{}", error.report());
                    }
                    false
                }
            }
        }
        Commands::Check { file } => {
            let source = read_source(file)?;
            match engine.compile(&source, &Bindings::new()) {
                Ok(()) => {
                    println!("OK: {}", file.display());
                    true
                }
                Err(error) => {
                    eprintln!("{}", error);
                    false
                }
            }
        }
        Commands::Test { file, cases } => {
            let source = read_source(file)?;
            let cases = load_test_cases(cases)?;
            let report = engine.execute_with_tests(&source, &cases).await;
            print_report(&report, cli.json)?;
            report.success
        }
        Commands::SelfTest => {
            let passed = engine.run_self_test().await;
            println!("Self test {}", if passed { "passed" } else { "failed" });
            passed
        }
    };

    engine.shutdown().await;
    Ok(succeeded)
}

#[tokio::main]
async fn main() {
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}
