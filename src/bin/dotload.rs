use std::env;
use std::ffi::OsString;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{self, Command};

use clap::{Args, Parser, Subcommand};
use dotload::{EnvLoader, EnvMap, MalformedPolicy};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Run commands with variables loaded from dotenv files.
#[derive(Parser, Debug)]
#[command(name = "dotload", version)]
struct Cli {
    /// Print loader diagnostics to stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load dotenv files and execute a command.
    Run(RunArgs),
    /// Print the resolved variables as `KEY=VALUE` lines.
    Print(SourceArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
struct SourceArgs {
    /// Dotenv file path(s). Repeat or pass comma-separated paths. Defaults to .env.
    #[arg(short, long = "file", env = "DOTLOAD_FILES", value_delimiter = ',')]
    files: Vec<PathBuf>,

    /// Skip dotenv files that do not exist.
    #[arg(short, long = "ignore-missing", visible_alias = "ignore")]
    ignore_missing: bool,

    /// Skip malformed lines instead of failing.
    #[arg(long)]
    lenient: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
struct RunArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Override existing environment variables.
    #[arg(short = 'o', long = "override", visible_alias = "overload")]
    override_existing: bool,

    /// Command to execute, followed by its arguments.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<OsString>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let result = match cli.command {
        Commands::Run(args) => execute_run(args),
        Commands::Print(args) => execute_print(&args),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("dotload: {err}");
            process::exit(1);
        }
    }
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn loader(args: &SourceArgs) -> EnvLoader {
    let policy = if args.lenient {
        MalformedPolicy::Lenient
    } else {
        MalformedPolicy::Strict
    };

    EnvLoader::new()
        .paths(&args.files)
        .required(!args.ignore_missing)
        .malformed_policy(policy)
}

fn execute_run(args: RunArgs) -> Result<i32, String> {
    let values = loader(&args.source)
        .override_existing(args.override_existing)
        .read_merged()
        .map_err(|err| err.to_string())?;

    let Some((program, program_args)) = args.command.split_first() else {
        return Err("missing command after `run`".to_owned());
    };
    let mut command = Command::new(program);
    command.args(program_args);

    for (key, value) in values {
        if !args.override_existing && env::var_os(&key).is_some() {
            tracing::debug!(key = %key, "keeping inherited value");
            continue;
        }
        command.env(key, value);
    }

    execute_command(command, program)
}

fn execute_print(args: &SourceArgs) -> Result<i32, String> {
    let values = loader(args).read_merged().map_err(|err| err.to_string())?;
    print!("{}", render_env(&values));
    Ok(0)
}

#[cfg(unix)]
fn execute_command(mut command: Command, program: &OsString) -> Result<i32, String> {
    let err = command.exec();
    Err(format!(
        "failed to execute `{}`: {err}",
        program.to_string_lossy()
    ))
}

#[cfg(not(unix))]
fn execute_command(mut command: Command, program: &OsString) -> Result<i32, String> {
    let status = command
        .status()
        .map_err(|err| format!("failed to execute `{}`: {err}", program.to_string_lossy()))?;
    Ok(status.code().unwrap_or(1))
}

fn render_env(values: &EnvMap) -> String {
    let mut out = String::new();
    for (key, value) in values {
        out.push_str(&render_token(key, &['=']));
        out.push('=');
        out.push_str(&render_token(value, &[]));
        out.push('\n');
    }
    out
}

/// Quote `text` when reading it back bare would change it. `${` is written as
/// `$\{` so the reader does not interpolate it.
fn render_token(text: &str, extra_special: &[char]) -> String {
    let needs_quotes = text.contains("${")
        || text.chars().any(|ch| {
            ch.is_whitespace() || matches!(ch, '#' | '"' | '\'' | '\\') || extra_special.contains(&ch)
        });
    if !needs_quotes {
        return text.to_owned();
    }

    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '$' if chars.peek() == Some(&'{') => out.push_str("$\\"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
