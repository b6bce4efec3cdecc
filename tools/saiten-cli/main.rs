use clap::{Parser, Subcommand};
use saiten::prelude::*;
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const CLI_CHALLENGE_ID: &str = "cli";
const CLI_USER_ID: &str = "cli";

/// Validate flow definitions and grade payloads against them
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that a flow definition is well formed
    Validate {
        /// Path to the flow definition JSON file
        flow_path: String,
        /// Optional engine config JSON file
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Grade a payload against a flow definition
    Grade {
        /// Path to the flow definition JSON file
        flow_path: String,
        /// Path to the submission payload JSON file
        payload_path: String,
        /// Score awarded when every check passes
        #[arg(short, long)]
        max_score: Option<f64>,
        /// Grade as a trial run that does not count towards official scoring
        #[arg(long)]
        pre_execute: bool,
        /// Optional engine config JSON file
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { flow_path, config } => run_validate(&flow_path, config.as_deref()),
        Command::Grade {
            flow_path,
            payload_path,
            max_score,
            pre_execute,
            config,
        } => {
            run_grade(
                &flow_path,
                &payload_path,
                max_score,
                pre_execute,
                config.as_deref(),
            )
            .await
        }
    }
}

fn load_config(config_path: Option<&str>) -> EngineConfig {
    match config_path {
        Some(path) => EngineConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => EngineConfig::default(),
    }
}

fn load_flow(flow_path: &str, config: &EngineConfig) -> FlowDefinition {
    let raw = fs::read_to_string(flow_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read flow file '{}': {}", flow_path, e))
    });
    let validator = FlowValidator::from_config(KindRegistry::with_builtins(), config);
    validator.validate_str(&raw).unwrap_or_else(|e| {
        let path = e.path();
        let location = if path.is_root() {
            "root".to_string()
        } else {
            path.to_string()
        };
        match e.expected_kind() {
            Some(kind) => exit_with_error(&format!(
                "Invalid flow definition at {} ({}): {}",
                location, kind, e
            )),
            None => exit_with_error(&format!(
                "Invalid flow definition at {}: {}",
                location, e
            )),
        }
    })
}

fn run_validate(flow_path: &str, config_path: Option<&str>) {
    let config = load_config(config_path);
    let flow = load_flow(flow_path, &config);

    println!("OK: {} checks", flow.leaf_count());
    print!("{}", flow.root());
}

async fn run_grade(
    flow_path: &str,
    payload_path: &str,
    max_score: Option<f64>,
    pre_execute: bool,
    config_path: Option<&str>,
) {
    let total_start = Instant::now();
    let config = load_config(config_path);

    let mut flow = load_flow(flow_path, &config);
    if let Some(max_score) = max_score {
        flow = flow.with_max_score(max_score);
    }

    let payload_json = fs::read_to_string(payload_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read payload file '{}': {}",
            payload_path, e
        ))
    });
    let payload: Value = serde_json::from_str(&payload_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse payload JSON: {}", e)));

    let store = Arc::new(InMemoryStore::new());
    let registry = KindRegistry::with_builtins();
    let coordinator = Coordinator::new(store.clone(), registry.clone(), config.clone());

    let flow = store
        .publish_flow(CLI_CHALLENGE_ID, flow)
        .await
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to publish flow: {}", e)));

    let submission_type = if pre_execute {
        SubmissionType::PreExecute
    } else {
        SubmissionType::Execute
    };
    let new = NewSubmission {
        challenge_id: CLI_CHALLENGE_ID.to_string(),
        user_id: CLI_USER_ID.to_string(),
        submission_type,
        payload: Payload::new(payload),
    };
    let id = coordinator
        .enqueue(new)
        .await
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to create submission: {}", e)));

    let eval_start = Instant::now();
    let verdict = coordinator
        .dispatch(id)
        .await
        .unwrap_or_else(|e| exit_with_error(&format!("Grading failed: {}", e)));
    let eval_duration = eval_start.elapsed();

    println!("\nGrading Finished!");
    println!("  -> Status:       {:?}", verdict.status);
    println!("  -> Score:        {} / {}", verdict.score, flow.max_score());
    println!("  -> Correct Rate: {}", verdict.correct_rate);
    println!("  -> Scope:        {:?}", submission_type.scoring_scope());
    if !verdict.message.is_empty() {
        println!("  -> Message:      {}", verdict.message);
    }

    // Re-run the pure interpreter to show the outcome tree; the store holds only the verdict.
    let interpreter = Interpreter::from_config(registry, &config);
    let submission = store
        .get_submission(id)
        .await
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to reload submission: {}", e)));
    match interpreter.evaluate(&flow, &submission.payload).await {
        Ok(result) => {
            println!("\n--- Outcome ---");
            print!("{}", TraceFormatter::format_tree(&result));
        }
        Err(e) => println!("\nOutcome unavailable: {}", e),
    }

    println!("\n--- Performance Summary ---");
    println!("Grading:          {:?}", eval_duration);
    println!("Total Execution:  {:?}", total_start.elapsed());
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
