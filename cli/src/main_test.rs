use super::*;

fn limits(args: &[&str]) -> LimitArgs {
    let mut argv = vec!["vitrine"];
    argv.extend_from_slice(args);
    argv.extend_from_slice(&["classify", "-"]);
    Cli::parse_from(argv).limits
}

#[test]
fn flags_override_config_defaults() {
    let config = limits(&["--max-steps", "1000", "--seed", "7", "--deny", "chart.js, d3"]).config();
    assert_eq!(config.limits.max_steps, 1000);
    assert_eq!(config.seed, 7);
    assert_eq!(config.extra_deny_modules, ["chart.js", "d3"]);
    assert_eq!(config.max_render_passes, PreviewConfig::default().max_render_passes);
}

#[test]
fn zero_limits_keep_defaults() {
    let config = limits(&["--max-steps", "0"]).config();
    assert_eq!(config.limits.max_steps, PreviewConfig::default().limits.max_steps);
}

#[test]
fn render_args_parse() {
    let cli = Cli::parse_from(["vitrine", "render", "card.tsx", "--format", "json", "--click", "Add", "--click", "Add", "--advance-ms", "250"]);
    let Command::Render(args) = cli.command else { panic!("expected render") };
    assert_eq!(args.input, "card.tsx");
    assert_eq!(args.format, Format::Json);
    assert_eq!(args.click, ["Add", "Add"]);
    assert_eq!(args.advance_ms, Some(250.0));
    assert!(!args.bare);
}

#[test]
fn failed_and_errored_states_exit_with_two() {
    let mut preview = Preview::default();
    preview.submit("const A = () => { return <div>;");
    assert_eq!(exit_code(&preview.state()), EXIT_PREVIEW_FAILED);
    preview.submit("const B = () => { const x = null; return <p>{x.y}</p>; };");
    assert_eq!(exit_code(&preview.state()), EXIT_PREVIEW_FAILED);
    preview.submit("import { z } from 'zod';\nconst C = () => null;");
    assert_eq!(exit_code(&preview.state()), EXIT_OK);
    preview.submit("const D = () => <p>d</p>;");
    assert_eq!(exit_code(&preview.state()), EXIT_OK);
}

#[test]
fn formats_render_the_same_nodes() {
    let mut preview = Preview::default();
    let run = preview.submit("const D = () => <p>d</p>;");
    let nodes = preview.component_view();
    let state = preview.state();
    assert_eq!(format_view(Format::Html, &nodes, &state, &run.to_string()).unwrap(), "<p>d</p>");
    let json = format_view(Format::Json, &nodes, &state, "r").unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["run"], "r");
    assert_eq!(value["state"]["state"], "rendered");
    assert_eq!(value["view"][0]["tag"], "p");
}

#[test]
fn missing_files_are_cli_errors() {
    let err = read_snippet("/definitely/not/here.tsx").unwrap_err();
    assert!(err.to_string().starts_with("failed to read /definitely/not/here.tsx"));
}
