//! `tiller` driver binary.
//!
//! Loads a JSON CLI definition, then parses tokens against it or renders its
//! usage text. The driver's own command line is itself a tiller definition
//! parsed by the engine.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, fmt};

use tiller_engine::{BoundCommand, Cli, Value, usage};
use tiller_metadata::{
    ArgumentsMetadata, CliDefinition, CommandMetadata, GlobalMetadata, OptionMetadata, ValueKind,
};

fn build_interface() -> Result<GlobalMetadata> {
    GlobalMetadata::builder("tiller")
        .description("Drive a declarative CLI definition")
        .option(
            OptionMetadata::flag(["-v", "--verbose"]).description("Enable debug logging"),
        )
        .option(
            OptionMetadata::valued(["-d", "--definition"], ValueKind::String)
                .description("Path to the CLI definition JSON")
                .required(),
        )
        .command(
            CommandMetadata::new("parse")
                .description("Parse tokens against the definition and print the resolution")
                .option(
                    OptionMetadata::flag(["--bind"])
                        .description("Fold declared defaults into the result"),
                )
                .arguments(
                    ArgumentsMetadata::new("tokens")
                        .usage("[--] <tokens...>")
                        .description("Raw tokens to classify"),
                ),
        )
        .command(
            CommandMetadata::new("usage")
                .description("Render usage text for the definition")
                .option(
                    OptionMetadata::flag(["--markdown"])
                        .description("Render the Markdown summary instead"),
                )
                .arguments(
                    ArgumentsMetadata::new("target")
                        .usage("[<group>] [<command>]")
                        .description("Scope to render; whole program when omitted"),
                ),
        )
        .command(
            CommandMetadata::new("check")
                .description("Check that the definition file is well-formed"),
        )
        .build()
        .context("driver interface definition is invalid")
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    init_tracing(verbose_requested(&args));

    let driver = Cli::new(build_interface()?).context("driver interface failed checks")?;

    let invocation = match driver.parse(args) {
        Ok(invocation) => invocation,
        Err(err) => {
            eprintln!("{err}");
            eprintln!();
            eprint!("{}", usage::global_usage(driver.metadata()));
            std::process::exit(2);
        }
    };
    let bound = driver.bind(&invocation)?;

    match bound.command() {
        "parse" => run_parse(&bound),
        "usage" => run_usage(&bound),
        "check" => run_check(&bound),
        other => bail!("unknown command: {other}"),
    }
}

fn run_parse(bound: &BoundCommand) -> Result<()> {
    let cli = load_cli(bound)?;
    let tokens = string_values(bound.arguments());
    tracing::debug!(count = tokens.len(), "parsing tokens against definition");

    let invocation = cli
        .parse(tokens)
        .map_err(|err| anyhow::Error::new(err).context("parse failed"))?;
    let rendered = if bound.flag("--bind") {
        cli.bind(&invocation)?.to_json()
    } else {
        invocation.to_json()
    };
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}

fn run_usage(bound: &BoundCommand) -> Result<()> {
    let cli = load_cli(bound)?;
    let metadata = cli.metadata();
    let target = string_values(bound.arguments());

    match target.as_slice() {
        [] if bound.flag("--markdown") => {
            print!("{}", usage::global_summary_markdown(metadata));
        }
        [] => print!("{}", usage::global_usage(metadata)),
        [name] => {
            if let Some(group) = metadata.find_group(name) {
                print!("{}", usage::group_usage(metadata, group));
            } else if let Some((command, group)) = metadata.find_command_anywhere(name) {
                print!(
                    "{}",
                    usage::command_usage(metadata, group.as_deref(), &command)
                );
            } else {
                bail!("no group or command named '{name}'");
            }
        }
        [group_name, command_name] => {
            let Some(group) = metadata.find_group(group_name) else {
                bail!("no group named '{group_name}'");
            };
            let Some(command) = group.find_command(command_name) else {
                bail!("no command named '{command_name}' in group '{group_name}'");
            };
            print!(
                "{}",
                usage::command_usage(metadata, Some(group.as_ref()), command)
            );
        }
        _ => bail!("usage takes at most a group name and a command name"),
    }
    Ok(())
}

fn run_check(bound: &BoundCommand) -> Result<()> {
    let cli = load_cli(bound)?;
    let metadata = cli.metadata();
    let grouped: usize = metadata
        .groups()
        .iter()
        .map(|group| group.commands().len())
        .sum();
    println!(
        "{}: ok ({} groups, {} commands)",
        metadata.name(),
        metadata.groups().len(),
        metadata.commands().len() + grouped,
    );
    Ok(())
}

fn load_cli(bound: &BoundCommand) -> Result<Cli> {
    let Some(path) = bound.first("-d").and_then(|value| value.as_str()) else {
        bail!("no definition path bound");
    };
    let path = PathBuf::from(path);
    let bytes = fs::read(&path)
        .with_context(|| format!("failed to read definition: {}", path.display()))?;
    let definition = CliDefinition::from_json_slice(&bytes)
        .with_context(|| format!("failed to load definition: {}", path.display()))?;
    let metadata = definition
        .into_metadata()
        .context("definition failed validation")?;
    Cli::new(metadata).context("definition failed engine checks")
}

fn string_values(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|value| value.as_str().map(str::to_string))
        .collect()
}

/// Peek for the verbose flag before the driver's own parse runs, so tracing
/// is live from the first event. Stops at `--`.
fn verbose_requested(args: &[String]) -> bool {
    args.iter()
        .take_while(|arg| arg.as_str() != "--")
        .any(|arg| arg == "-v" || arg == "--verbose")
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
