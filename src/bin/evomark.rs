//! Command-line interface for evomark
//! This binary parses, formats and executes evomark files.
//!
//! Usage:
//!   evomark parse `<path>`                                   - Print the parsed tree
//!   evomark fmt `<path>` [--check]                           - Print canonical source, or check it
//!   evomark exec `<path>` [--state `<file>`] [--no-persist]    - Execute and print the resolved tree
//!   evomark list-rules                                     - List registered rules
//!
//! Every subcommand accepts `--config <file>` to layer a TOML file over the defaults.
//! Logging goes to stderr and is filtered by `EVOMARK_LOG` (e.g. `EVOMARK_LOG=debug`).

use clap::{Arg, ArgAction, Command};
use evomark::evomark::config::{EvomarkConfig, Loader};
use evomark::evomark::core::Evomark;
use evomark::evomark::exec::ExecContext;
use evomark::evomark::formats::FormattingRules;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "EVOMARK_LOG";
const DEFAULT_USER_CONFIG: &str = "evomark.toml";

fn main() {
    let matches = Command::new("evomark")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for parsing, formatting and executing evomark files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .help("Configuration file layered over the built-in defaults"),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse a file and print its tree")
                .arg(
                    Arg::new("path")
                        .help("Path to the evomark file")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("fmt")
                .about("Print a file in canonical form")
                .arg(
                    Arg::new("path")
                        .help("Path to the evomark file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("check")
                        .long("check")
                        .action(ArgAction::SetTrue)
                        .help("Exit with an error instead of printing when the file is not formatted"),
                ),
        )
        .subcommand(
            Command::new("exec")
                .about("Execute a file and print the resolved result")
                .arg(
                    Arg::new("path")
                        .help("Path to the evomark file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("state")
                        .long("state")
                        .value_name("FILE")
                        .help("State file holding the cache and saved variables"),
                )
                .arg(
                    Arg::new("no-persist")
                        .long("no-persist")
                        .action(ArgAction::SetTrue)
                        .help("Do not write the state file back"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .value_parser(["tree", "source"])
                        .default_value("tree")
                        .help("Output format"),
                ),
        )
        .subcommand(Command::new("list-rules").about("List registered rules"))
        .get_matches();

    let config = load_config(matches.get_one::<String>("config"));
    init_logging(&config.logging.level);

    let evomark =
        Evomark::new().with_formatting(FormattingRules::from(&config.formatting));

    match matches.subcommand() {
        Some(("parse", sub)) => {
            let path = sub.get_one::<String>("path").unwrap();
            handle_parse_command(&evomark, path);
        }
        Some(("fmt", sub)) => {
            let path = sub.get_one::<String>("path").unwrap();
            handle_fmt_command(&evomark, path, sub.get_flag("check"));
        }
        Some(("exec", sub)) => {
            let path = sub.get_one::<String>("path").unwrap();
            let state_file = sub
                .get_one::<String>("state")
                .map(PathBuf::from)
                .unwrap_or_else(|| config.exec.state_file.clone());
            let persist = config.exec.persist && !sub.get_flag("no-persist");
            let format = sub.get_one::<String>("format").unwrap();
            handle_exec_command(&evomark, path, &state_file, persist, format);
        }
        Some(("list-rules", _)) => {
            handle_list_rules_command(&evomark);
        }
        _ => unreachable!(),
    }
}

fn load_config(path: Option<&String>) -> EvomarkConfig {
    let loader = match path {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new().with_optional_file(DEFAULT_USER_CONFIG),
    };
    loader.build().unwrap_or_else(|e| {
        eprintln!("Error loading configuration: {}", e);
        std::process::exit(1);
    })
}

fn init_logging(default_level: &str) {
    let default_directive = default_level
        .parse::<Directive>()
        .unwrap_or_else(|_| LevelFilter::WARN.into());
    let filter = EnvFilter::builder()
        .with_default_directive(default_directive)
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(path: &str) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file: {}", e);
        std::process::exit(1);
    })
}

/// Handle the parse command
fn handle_parse_command(evomark: &Evomark, path: &str) {
    let source = read_source(path);
    let output = evomark.parse(&source);
    print!("{}", output.tree.write_tree());
    if !output.complete {
        eprintln!("Error: parsing stopped on input no rule could consume");
        std::process::exit(1);
    }
}

/// Handle the fmt command
fn handle_fmt_command(evomark: &Evomark, path: &str, check: bool) {
    let source = read_source(path);
    let formatted = format!("{}\n", evomark.format_source(&source));
    if !check {
        print!("{}", formatted);
        return;
    }
    if formatted != source {
        eprintln!("{} is not formatted", path);
        std::process::exit(1);
    }
}

/// Handle the exec command
fn handle_exec_command(
    evomark: &Evomark,
    path: &str,
    state_file: &Path,
    persist: bool,
    format: &str,
) {
    let source = read_source(path);
    let ctx = ExecContext::load_or_default(state_file).unwrap_or_else(|e| {
        eprintln!("Error loading state: {}", e);
        std::process::exit(1);
    });

    let mut output = evomark.parse(&source);
    let state = evomark.exec(&mut output.tree, ctx).unwrap_or_else(|e| {
        eprintln!("Execution error: {}", e);
        std::process::exit(1);
    });
    if state.halt_flag {
        eprintln!("Execution halted");
    }

    if persist {
        if let Err(e) = state.context().save(state_file) {
            eprintln!("Error saving state: {}", e);
            std::process::exit(1);
        }
    }

    match format {
        "source" => println!("{}", evomark.stringify(&output.tree)),
        _ => print!("{}", output.tree.write_tree()),
    }
}

/// Handle the list-rules command
fn handle_list_rules_command(evomark: &Evomark) {
    let registry = evomark.registry();
    println!("Function rules:");
    for name in registry.list_func_rules() {
        println!("  #{}", name);
    }
    println!("\nCommand rules:");
    for name in registry.list_cmd_rules() {
        println!("  ${}", name);
    }
    println!("\nExec rules:");
    for name in registry.list_exec_rules() {
        println!("  {}", name);
    }
}
