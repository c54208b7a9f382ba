//! Purpose: `plotpipe` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs commands, emits results on
//! stdout.
//! Invariants: Scripts and data blocks print on stdout; diagnostics go to
//! stderr (JSON when stderr is not a terminal).
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: All engine writes go through `api::Session`.
use std::fs::File;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Value as Json, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod ingest;

use ingest::{Delimiter, ErrorPolicy, IngestConfig, read_columns};
use plotpipe::api::{
    BinRule, DataInput, Error, ErrorKind, Figure, PlotElement, PlotStyle, Registry, SessionExit,
    SessionOptions, Value, hist1d, linetype_names, linetypes, palette, palette_names, quote,
    to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `plotpipe --help` for usage."));
            }
        },
    };

    command_dispatch::dispatch_command(cli.command, cli.program)
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .next()
        .unwrap_or("invalid arguments")
        .trim_start_matches("error: ")
        .to_string()
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "plotpipe",
    version,
    about = "Drive an external plotting engine through a pipe",
    long_about = None,
    after_help = r#"EXAMPLES
  $ seq 10 | awk '{print $1, $1*$1}' | plotpipe datablock
  $ plotpipe plot data.txt --with linespoints --title "squares"
  $ plotpipe plot data.txt --terminal "png size 800,600" --output out.png
  $ tail -f metrics.log | plotpipe stream --every 20 --window 500
  $ plotpipe palettes viridis

NOTES
  - The engine binary defaults to `gnuplot`; override with --program or
    the PLOTPIPE_PROGRAM environment variable.
  - `--dry-run` prints the exact command script instead of driving the
    engine."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Plotting engine binary (default: gnuplot, or PLOTPIPE_PROGRAM)",
        value_hint = ValueHint::FilePath
    )]
    program: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum DelimiterCli {
    Auto,
    Whitespace,
    Comma,
}

impl From<DelimiterCli> for Delimiter {
    fn from(value: DelimiterCli) -> Self {
        match value {
            DelimiterCli::Auto => Delimiter::Auto,
            DelimiterCli::Whitespace => Delimiter::Whitespace,
            DelimiterCli::Comma => Delimiter::Comma,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ErrorPolicyCli {
    Stop,
    Skip,
}

impl From<ErrorPolicyCli> for ErrorPolicy {
    fn from(value: ErrorPolicyCli) -> Self {
        match value {
            ErrorPolicyCli::Stop => ErrorPolicy::Stop,
            ErrorPolicyCli::Skip => ErrorPolicy::Skip,
        }
    }
}

#[derive(Args)]
struct InputArgs {
    #[arg(help = "Input file (default: stdin; - also means stdin)", value_hint = ValueHint::FilePath)]
    file: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "auto", help = "Column delimiter")]
    delimiter: DelimiterCli,
    #[arg(long, value_enum, default_value = "stop", help = "What to do with ragged rows")]
    errors: ErrorPolicyCli,
    #[arg(long, default_value_t = 1024 * 1024, help = "Per-line size cap in bytes")]
    max_line_bytes: usize,
}

impl InputArgs {
    fn config(&self) -> IngestConfig {
        IngestConfig {
            delimiter: self.delimiter.into(),
            errors: self.errors.into(),
            max_line_bytes: self.max_line_bytes,
        }
    }
}

#[derive(Args)]
struct FigureArgs {
    #[arg(long = "with", default_value = "lines", help = "Plot style (lines, points, boxes, ...)")]
    style: String,
    #[arg(long, help = "Plot title")]
    title: Option<String>,
    #[arg(long, help = "Column spec passed to the engine, e.g. 1:2")]
    using: Option<String>,
    #[arg(long, help = "Terminal line, e.g. \"png size 800,600\"")]
    terminal: Option<String>,
    #[arg(long, help = "Output file for the engine", value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
    #[arg(long, help = "Named palette (see `plotpipe palettes`)")]
    palette: Option<String>,
    #[arg(long, help = "Named linetype scheme (see `plotpipe linetypes`)")]
    linetypes: Option<String>,
    #[arg(long = "set", help = "Extra `set` option, KEY=VALUE or bare KEY (repeatable)")]
    set: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Serialize input columns to data-block text on stdout")]
    Datablock {
        #[command(flatten)]
        input: InputArgs,
    },
    #[command(about = "Plot input columns through the engine")]
    Plot {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        figure: FigureArgs,
        #[arg(long, default_value = "main", help = "Session name")]
        session: String,
        #[arg(long, help = "Print the command script instead of driving the engine")]
        dry_run: bool,
    },
    #[command(about = "Send a raw command script to the engine")]
    Script {
        #[arg(help = "Script file (default: stdin)", value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        #[arg(long, default_value = "main", help = "Session name")]
        session: String,
        #[arg(long, help = "Print the normalized script instead of driving the engine")]
        dry_run: bool,
    },
    #[command(about = "Follow stdin and replot as rows arrive")]
    Stream {
        #[command(flatten)]
        figure: FigureArgs,
        #[arg(long, value_enum, default_value = "auto", help = "Column delimiter")]
        delimiter: DelimiterCli,
        #[arg(long, default_value_t = 10, help = "Redraw after this many new rows")]
        every: u64,
        #[arg(long, default_value_t = 0, help = "Keep at most this many rows (0 = all)")]
        window: usize,
        #[arg(long, default_value = "main", help = "Session name")]
        session: String,
        #[arg(long, help = "Print the final script instead of driving the engine")]
        dry_run: bool,
    },
    #[command(about = "Bin one numeric input column and print the histogram data block")]
    Hist {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, help = "Number of bins (default: auto)", conflicts_with = "bin_width")]
        bins: Option<usize>,
        #[arg(long, help = "Fixed bin width (default: auto)")]
        bin_width: Option<f64>,
    },
    #[command(about = "List named palettes, or print one palette command")]
    Palettes {
        #[arg(help = "Palette name")]
        name: Option<String>,
        #[arg(long, help = "Emit JSON")]
        json: bool,
    },
    #[command(about = "List linetype schemes, or print one scheme's commands")]
    Linetypes {
        #[arg(help = "Scheme name")]
        name: Option<String>,
        #[arg(long, help = "Emit JSON")]
        json: bool,
    },
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(long, value_enum, help = "Shell to generate for")]
        shell: Shell,
    },
    #[command(about = "Print version information")]
    Version,
}

fn open_input(file: Option<&Path>) -> Result<Box<dyn Read>, Error> {
    match file {
        None => Ok(Box::new(io::stdin())),
        Some(path) if path.as_os_str() == "-" => Ok(Box::new(io::stdin())),
        Some(path) => {
            let file = File::open(path).map_err(|err| {
                let kind = if err.kind() == io::ErrorKind::NotFound {
                    ErrorKind::NotFound
                } else {
                    ErrorKind::Io
                };
                Error::new(kind)
                    .with_message(format!("cannot open {}", path.display()))
                    .with_source(err)
            })?;
            Ok(Box::new(file))
        }
    }
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {}", error_message(err));
        if let Some(hint) = err.hint() {
            eprintln!("hint: {hint}");
        }
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "invalid arguments".to_string(),
        ErrorKind::ShapeMismatch => "input shapes do not match".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::AlreadyExists => "already exists".to_string(),
        ErrorKind::Spawn => "failed to launch the engine".to_string(),
        ErrorKind::Closed => "session is closed".to_string(),
        ErrorKind::Io => "I/O error".to_string(),
    }
}

fn error_json(err: &Error) -> Json {
    let mut inner = serde_json::Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(session) = err.session() {
        inner.insert("session".to_string(), json!(session));
    }
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(time) = error_time_now() {
        inner.insert("time".to_string(), json!(time));
    }
    json!({ "error": Json::Object(inner) })
}

fn error_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}
