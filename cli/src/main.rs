use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use vitrine::classify::Classifier;
use vitrine::normalize::normalize;
use vitrine::render::{EventInit, Node, view};
use vitrine::{Preview, PreviewConfig, PreviewState};

/// Outcome was Rendering or Placeholder.
const EXIT_OK: u8 = 0;
/// Bad input, I/O or argument problems.
const EXIT_CLI: u8 = 1;
/// Outcome was Failed, or the Render Guard caught an error.
const EXIT_PREVIEW_FAILED: u8 = 2;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("no click listener with text {0:?}")]
    NoListener(String),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "vitrine", about = "Live preview sandbox for generated TSX components")]
struct Cli {
    #[command(flatten)]
    limits: LimitArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct LimitArgs {
    #[arg(long, global = true, env = "VITRINE_MAX_STEPS")]
    max_steps: Option<u64>,

    #[arg(long, global = true, env = "VITRINE_MAX_CALL_DEPTH")]
    max_call_depth: Option<usize>,

    #[arg(long, global = true, env = "VITRINE_MAX_RENDER_PASSES")]
    max_render_passes: Option<usize>,

    #[arg(long, global = true, env = "VITRINE_SEED")]
    seed: Option<u64>,

    #[arg(long, global = true, env = "VITRINE_CLOCK_EPOCH_MS")]
    clock_epoch_ms: Option<i64>,

    #[arg(long, global = true, env = "VITRINE_EXTRA_DENY_MODULES", value_delimiter = ',')]
    deny: Vec<String>,
}

impl LimitArgs {
    fn config(&self) -> PreviewConfig {
        let mut config = PreviewConfig::default();
        if let Some(max_steps) = self.max_steps.filter(|n| *n > 0) {
            config.limits.max_steps = max_steps;
        }
        if let Some(depth) = self.max_call_depth.filter(|n| *n > 0) {
            config.limits.max_call_depth = depth;
        }
        if let Some(passes) = self.max_render_passes.filter(|n| *n > 0) {
            config.max_render_passes = passes;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(epoch) = self.clock_epoch_ms {
            config.clock_epoch_ms = epoch;
        }
        config.extra_deny_modules =
            self.deny.iter().map(|m| m.trim()).filter(|m| !m.is_empty()).map(str::to_owned).collect();
        config
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a snippet through the pipeline and print the preview.
    Render(RenderArgs),
    /// Print the unsupported modules a snippet references.
    Classify {
        #[arg(default_value = "-", help = "Snippet file, or - for stdin")]
        input: String,
    },
    /// Print the component name, snippet form and evaluable expression.
    Normalize {
        #[arg(default_value = "-", help = "Snippet file, or - for stdin")]
        input: String,
    },
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(default_value = "-", help = "Snippet file, or - for stdin")]
    input: String,

    #[arg(long, value_enum, default_value_t = Format::Html)]
    format: Format,

    #[arg(long, help = "Click the innermost element containing TEXT; repeatable")]
    click: Vec<String>,

    #[arg(long, help = "Advance the virtual clock after the clicks")]
    advance_ms: Option<f64>,

    #[arg(long, default_value_t = false, help = "Print the component without the preview frame")]
    bare: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Html,
    Json,
    Outline,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let cli = Cli::parse();
    let config = cli.limits.config();
    let result = match cli.command {
        Command::Render(args) => run_render(config, &args),
        Command::Classify { input } => run_classify(&config, &input),
        Command::Normalize { input } => run_normalize(&input),
    };
    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(EXIT_CLI)
        }
    }
}

fn read_snippet(input: &str) -> Result<String, CliError> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(|source| CliError::Read { path: "stdin".to_owned(), source })?;
        return Ok(buf);
    }
    fs::read_to_string(input).map_err(|source| CliError::Read { path: input.to_owned(), source })
}

fn run_render(config: PreviewConfig, args: &RenderArgs) -> Result<u8, CliError> {
    let snippet = read_snippet(&args.input)?;
    let mut preview = Preview::new(config);
    let run = preview.submit(&snippet);
    debug!(run = %run, state = preview.state().as_str(), "cli: submitted");

    for text in &args.click {
        let Some(handler) = view::find_listener(&preview.component_view(), "click", text) else {
            return Err(CliError::NoListener(text.clone()));
        };
        if let Err(err) = preview.dispatch(run, handler, &EventInit::default()) {
            warn!(click = %text, error = %err, "cli: click failed");
            break;
        }
    }
    if let Some(ms) = args.advance_ms {
        if let Err(err) = preview.advance(run, ms) {
            warn!(advance_ms = ms, error = %err, "cli: advance failed");
        }
    }

    let nodes = if args.bare { preview.component_view() } else { preview.view() };
    let state = preview.state();
    println!("{}", format_view(args.format, &nodes, &state, &run.to_string())?);
    Ok(exit_code(&state))
}

fn format_view(format: Format, nodes: &[Node], state: &PreviewState, run: &str) -> Result<String, CliError> {
    Ok(match format {
        Format::Html => view::to_html(nodes),
        Format::Outline => view::outline(nodes).trim_end().to_owned(),
        Format::Json => serde_json::to_string_pretty(&json!({ "run": run, "state": state, "view": nodes }))?,
    })
}

fn exit_code(state: &PreviewState) -> u8 {
    match state {
        PreviewState::Failed { .. } | PreviewState::Errored { .. } => EXIT_PREVIEW_FAILED,
        _ => EXIT_OK,
    }
}

fn run_classify(config: &PreviewConfig, input: &str) -> Result<u8, CliError> {
    let snippet = read_snippet(input)?;
    let classification = Classifier::new(config.deny_list()).classify(&snippet);
    for module in &classification.modules {
        println!("{module}");
    }
    Ok(EXIT_OK)
}

fn run_normalize(input: &str) -> Result<u8, CliError> {
    let snippet = read_snippet(input)?;
    match normalize(&snippet) {
        Ok(source) => {
            println!("name: {}", source.name);
            println!("form: {}", source.form.as_str());
            println!();
            println!("{}", source.expression);
            Ok(EXIT_OK)
        }
        Err(err) => {
            eprintln!("{err}");
            Ok(EXIT_PREVIEW_FAILED)
        }
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
