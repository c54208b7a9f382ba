//! Purpose: Hold top-level CLI command dispatch for `plotpipe`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command
//! execution.
//! Invariants: Stdout carries scripts, data blocks, and forwarded engine
//! output; nothing else.
//! Invariants: Exit code semantics stay aligned with `to_exit_code`.

use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use super::*;

pub(super) fn dispatch_command(
    command: Command,
    program: Option<PathBuf>,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Datablock { input } => {
            let reader = open_input(input.file.as_deref())?;
            let (columns, _) = read_columns(reader, input.config())?;
            let columns = require_columns(columns)?;
            for line in DataInput::Columns(columns).render()? {
                println!("{line}");
            }
            Ok(RunOutcome::ok())
        }
        Command::Plot {
            input,
            figure,
            session,
            dry_run,
        } => {
            let reader = open_input(input.file.as_deref())?;
            let (columns, _) = read_columns(reader, input.config())?;
            let columns = require_columns(columns)?;
            let figure = build_figure(&figure, columns)?;
            if dry_run {
                for line in figure.script()? {
                    println!("{line}");
                }
                return Ok(RunOutcome::ok());
            }
            let mut registry = Registry::new(session_options(program));
            figure.render_to(registry.open(&session)?)?;
            let exit = registry.close(&session)?;
            forward_exit(&session, &exit)
        }
        Command::Script {
            file,
            session,
            dry_run,
        } => {
            let mut reader = open_input(file.as_deref())?;
            let mut text = String::new();
            reader.read_to_string(&mut text).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read script")
                    .with_source(err)
            })?;
            let lines: Vec<&str> = text.lines().collect();
            if lines.is_empty() {
                return Err(Error::new(ErrorKind::Usage).with_message("script input is empty"));
            }
            if dry_run {
                for line in &lines {
                    println!("{line}");
                }
                return Ok(RunOutcome::ok());
            }
            let mut registry = Registry::new(session_options(program));
            registry.open(&session)?.send_lines(&lines)?;
            let exit = registry.close(&session)?;
            forward_exit(&session, &exit)
        }
        Command::Stream {
            figure,
            delimiter,
            every,
            window,
            session,
            dry_run,
        } => stream(
            &figure,
            delimiter.into(),
            every.max(1),
            window,
            &session,
            dry_run,
            program,
        ),
        Command::Hist {
            input,
            bins,
            bin_width,
        } => {
            let reader = open_input(input.file.as_deref())?;
            let (columns, _) = read_columns(reader, input.config())?;
            let columns = require_columns(columns)?;
            let samples = numeric_samples(&columns[0])?;
            let rule = match (bins, bin_width) {
                (Some(bins), _) => BinRule::Count(bins),
                (None, Some(width)) => BinRule::Width(width),
                (None, None) => BinRule::Auto,
            };
            let hist = hist1d(&samples, rule)?;
            if hist.skipped > 0 {
                warn!(skipped = hist.skipped, "non-finite samples ignored");
            }
            for line in hist.to_datablock().render()? {
                println!("{line}");
            }
            Ok(RunOutcome::ok())
        }
        Command::Palettes { name, json } => {
            if let Some(name) = name {
                let command = palette(&name)?;
                if json {
                    emit_json(json!({ "name": name, "command": command }));
                } else {
                    println!("{command}");
                }
            } else if json {
                emit_json(json!({ "palettes": palette_names() }));
            } else {
                for name in palette_names() {
                    println!("{name}");
                }
            }
            Ok(RunOutcome::ok())
        }
        Command::Linetypes { name, json } => {
            if let Some(name) = name {
                let commands = linetypes(&name)?;
                if json {
                    emit_json(json!({ "name": name, "commands": commands }));
                } else {
                    for command in commands {
                        println!("{command}");
                    }
                }
            } else if json {
                emit_json(json!({ "linetypes": linetype_names() }));
            } else {
                for name in linetype_names() {
                    println!("{name}");
                }
            }
            Ok(RunOutcome::ok())
        }
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "plotpipe", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            println!("plotpipe {}", env!("CARGO_PKG_VERSION"));
            Ok(RunOutcome::ok())
        }
    }
}

fn session_options(program: Option<PathBuf>) -> SessionOptions {
    let options = SessionOptions::new();
    match program {
        Some(program) => options.with_program(program),
        None => options,
    }
}

fn numeric_samples(column: &[Value]) -> Result<Vec<f64>, Error> {
    column
        .iter()
        .map(|cell| match cell {
            Value::Num(v) => Ok(*v),
            Value::Text(text) => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("histogram input must be numeric, got {text:?}"))),
        })
        .collect()
}

fn require_columns(columns: Vec<Vec<Value>>) -> Result<Vec<Vec<Value>>, Error> {
    if columns.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("input contained no data rows")
            .with_hint("Provide at least one non-comment line."));
    }
    Ok(columns)
}

fn build_figure(args: &FigureArgs, columns: Vec<Vec<Value>>) -> Result<Figure, Error> {
    let style: PlotStyle = args.style.parse()?;
    let mut figure = Figure::new();
    if let Some(terminal) = &args.terminal {
        figure.set("terminal", terminal);
    }
    if let Some(output) = &args.output {
        figure.set("output", &quote(&output.to_string_lossy()));
    }
    if let Some(name) = &args.palette {
        figure.palette(name)?;
    }
    if let Some(name) = &args.linetypes {
        figure.linetypes(name)?;
    }
    for entry in &args.set {
        match entry.split_once('=') {
            Some((key, value)) => figure.set(key.trim(), value.trim()),
            None => figure.set(entry.trim(), ""),
        };
    }
    if let Some(title) = &args.title {
        figure.title(title);
    }
    figure.data("data", &DataInput::Columns(columns))?;
    let mut element = PlotElement::block("data").with_style(style);
    if let Some(using) = &args.using {
        element = element.with_using(using);
    }
    figure.element(element);
    Ok(figure)
}

fn forward_exit(session: &str, exit: &SessionExit) -> Result<RunOutcome, Error> {
    for line in &exit.output {
        println!("{line}");
    }
    for line in &exit.errors {
        eprintln!("{line}");
    }
    if !exit.status.success() {
        return Err(Error::new(ErrorKind::Internal)
            .with_message(format!("engine exited with status {}", exit.status))
            .with_session(session));
    }
    Ok(RunOutcome::ok())
}

fn emit_json(value: serde_json::Value) {
    let json = serde_json::to_string(&value)
        .unwrap_or_else(|_| "{\"error\":{\"kind\":\"Internal\"}}".to_string());
    println!("{json}");
}

// Follow stdin, redraw every `every` ok rows, keep at most `window` rows.
fn stream(
    figure_args: &FigureArgs,
    mut delimiter: Delimiter,
    every: u64,
    window: usize,
    session: &str,
    dry_run: bool,
    program: Option<PathBuf>,
) -> Result<RunOutcome, Error> {
    let stop = Arc::new(AtomicBool::new(false));
    let _ = signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop));

    let mut live = if dry_run {
        None
    } else {
        let mut registry = Registry::new(session_options(program));
        registry.open(session)?;
        Some(registry)
    };

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut rows: VecDeque<Vec<Value>> = VecDeque::new();
    let mut line = String::new();
    let mut field_count = 0usize;
    let mut pending = 0u64;

    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                return Err(Error::new(ErrorKind::Io)
                    .with_message("failed to read stream input")
                    .with_source(err));
            }
        }

        let Some(row) = ingest::parse_row(&line, delimiter) else {
            continue;
        };
        if field_count == 0 {
            if delimiter == Delimiter::Auto {
                delimiter = if line.contains(',') {
                    Delimiter::Comma
                } else {
                    Delimiter::Whitespace
                };
            }
            field_count = row.len();
        } else if row.len() != field_count {
            warn!(fields = row.len(), expected = field_count, "skipping ragged stream row");
            continue;
        }

        rows.push_back(row);
        if window > 0 && rows.len() > window {
            rows.pop_front();
        }
        pending += 1;

        if pending >= every {
            pending = 0;
            if let Some(registry) = live.as_mut() {
                let figure = build_figure(figure_args, transpose(&rows, field_count))?;
                figure.render_to(registry.get(session)?)?;
            }
        }
    }

    if rows.is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("stream received no data rows"));
    }

    let figure = build_figure(figure_args, transpose(&rows, field_count))?;
    match live.as_mut() {
        Some(registry) => {
            if pending > 0 {
                figure.render_to(registry.get(session)?)?;
            }
            let exit = registry.close(session)?;
            forward_exit(session, &exit)
        }
        None => {
            for line in figure.script()? {
                println!("{line}");
            }
            Ok(RunOutcome::ok())
        }
    }
}

fn transpose(rows: &VecDeque<Vec<Value>>, field_count: usize) -> Vec<Vec<Value>> {
    let mut columns = vec![Vec::with_capacity(rows.len()); field_count];
    for row in rows {
        for (column, cell) in columns.iter_mut().zip(row) {
            column.push(cell.clone());
        }
    }
    columns
}
