// Command-line interface for richdown.
//
// Thin wrapper over the engine crate for inspecting and normalizing
// Markdown documents:
//
//   richdown inspect <file> [--pretty]     dump the parsed tree as JSON
//   richdown normalize <file> [-o <file>]  reserialize to canonical Markdown
//   richdown check <file>                  verify round-trip stability
//
// Parse options come from richdown.toml (see the richdown-config crate);
// `--config` or RICHDOWN_CONFIG override the default location.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use richdown_config::Config;
use richdown_engine::{ParseOptions, parse_with_options, serialize, snapshot};

#[derive(Parser)]
#[command(name = "richdown", version, about = "Inspect and normalize rich Markdown documents")]
struct Cli {
    /// Path to a richdown.toml (defaults to RICHDOWN_CONFIG or the
    /// standard config location).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a document and dump its tree as JSON.
    Inspect {
        file: PathBuf,
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
    /// Parse and reserialize a document to canonical Markdown.
    Normalize {
        file: PathBuf,
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Verify that a document's parse/serialize round trip is stable.
    Check { file: PathBuf },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let options = load_options(cli.config.as_deref())?;
    match cli.command {
        Command::Inspect { file, pretty } => {
            let doc = parse_with_options(&read(&file)?, &options);
            let snap = snapshot::snapshot(&doc);
            let json = if pretty {
                serde_json::to_string_pretty(&snap)?
            } else {
                serde_json::to_string(&snap)?
            };
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Normalize { file, output } => {
            let out = serialize(&parse_with_options(&read(&file)?, &options));
            match output {
                Some(path) => fs::write(&path, out)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => print!("{out}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { file } => {
            let first = parse_with_options(&read(&file)?, &options);
            let second = parse_with_options(&serialize(&first), &options);
            if first == second {
                println!("{}: round-trip stable", file.display());
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("{}: round-trip UNSTABLE", file.display());
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn read(file: &Path) -> anyhow::Result<String> {
    fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))
}

fn load_options(config_path: Option<&Path>) -> anyhow::Result<ParseOptions> {
    let config = match config_path {
        Some(p) => Config::load_from_path(p)?,
        None => Config::load()?,
    };
    let config = config.unwrap_or_default();
    log::debug!("parse options: {:?}", config.parsing);

    let mut options = ParseOptions::default();
    options.typographics = config.parsing.typographics;
    options.emoji_shortcuts = config.parsing.emoji_shortcuts;
    for name in &config.parsing.custom_emoji {
        options.emoji.insert(name);
    }
    Ok(options)
}
